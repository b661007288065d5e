//! Connection-ready timestamps for the HTTP prober.
//!
//! reqwest has no per-request connection hook, so the prober installs this
//! layer around the client's connector. Each probe owns its own client, which
//! means every stamp recorded here belongs to that probe's connection.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use parking_lot::Mutex;
use tower::{Layer, Service};

#[derive(Debug, Clone, Default)]
pub struct ConnectionClock {
    ready_at: Arc<Mutex<Option<Instant>>>,
}

impl ConnectionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a usable connection exists now. A later connection
    /// (e.g. after a cross-host redirect) replaces the earlier stamp.
    pub fn mark(&self) {
        *self.ready_at.lock() = Some(Instant::now());
    }

    pub fn ready_at(&self) -> Option<Instant> {
        *self.ready_at.lock()
    }

    pub fn layer(&self) -> ConnectStampLayer {
        ConnectStampLayer {
            clock: self.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectStampLayer {
    clock: ConnectionClock,
}

impl<S> Layer<S> for ConnectStampLayer {
    type Service = ConnectStamp<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ConnectStamp {
            inner,
            clock: self.clock.clone(),
        }
    }
}

/// Connector wrapper that marks the clock once the inner connector yields
/// an established (TCP + TLS) connection.
#[derive(Debug, Clone)]
pub struct ConnectStamp<S> {
    inner: S,
    clock: ConnectionClock,
}

impl<S, R> Service<R> for ConnectStamp<S>
where
    S: Service<R>,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<S::Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: R) -> Self::Future {
        let connecting = self.inner.call(req);
        let clock = self.clock.clone();
        Box::pin(async move {
            let conn = connecting.await?;
            clock.mark();
            Ok(conn)
        })
    }
}
