use std::net::IpAddr;
use std::time::{Duration, Instant, SystemTime};

use anyhow::Result;
use reqwest::{Client, StatusCode, Url};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::clock::ConnectionClock;
use super::{ProbeOutcome, ProbeStatus, error_chain};

enum Failure {
    Send(reqwest::Error),
    Body(reqwest::Error),
    Deadline,
    Cancelled,
}

fn build_client(url: &Url, clock: &ConnectionClock) -> Result<Client> {
    let mut builder = Client::builder()
        .use_rustls_tls()
        .user_agent(concat!("http-latency-probe/", env!("CARGO_PKG_VERSION")))
        .connector_layer(clock.layer());
    // Loopback targets never go through an environment proxy.
    if is_loopback(url) {
        builder = builder.no_proxy();
    }
    Ok(builder.build()?)
}

fn is_loopback(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    host.eq_ignore_ascii_case("localhost")
        || host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok_and(|ip| ip.is_loopback())
}

/// Runs one GET against `url`, bounded by `timeout` and by `cancel`,
/// whichever fires first.
///
/// Latency is measured from the moment the connection is ready to the moment
/// the whole body has been read, so DNS and dial time are excluded.
pub async fn probe_http(
    seq: u64,
    requested_at: SystemTime,
    url: &Url,
    timeout: Duration,
    cancel: &CancellationToken,
) -> ProbeOutcome {
    let clock = ConnectionClock::new();

    let client = match build_client(url, &clock) {
        Ok(client) => client,
        Err(e) => {
            let message = format!("{:#}", e);
            warn!(seq, "ERROR: {}", message);
            return ProbeOutcome::new(seq, requested_at, ProbeStatus::TransportError(message));
        }
    };

    let started = Instant::now();
    let exchange = async {
        let resp = client.get(url.clone()).send().await.map_err(Failure::Send)?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(Failure::Body)?;
        Ok::<_, Failure>((status, body.len()))
    };

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Failure::Cancelled),
        r = tokio::time::timeout(timeout, exchange) => r.unwrap_or(Err(Failure::Deadline)),
    };
    let finished = Instant::now();

    let status = classify(seq, timeout, result, || {
        let origin = clock.ready_at().unwrap_or(started);
        finished.saturating_duration_since(origin)
    });
    ProbeOutcome::new(seq, requested_at, status)
}

fn classify(
    seq: u64,
    timeout: Duration,
    result: Result<(StatusCode, usize), Failure>,
    elapsed: impl FnOnce() -> Duration,
) -> ProbeStatus {
    match result {
        Ok((status, body_len)) => {
            let elapsed = elapsed();
            info!(
                seq,
                status = status.as_u16(),
                length = body_len,
                elapsed_ms = elapsed.as_millis() as u64,
                "{}: length={} bytes time={} ms",
                status,
                body_len,
                elapsed.as_millis()
            );
            ProbeStatus::Success {
                status: status.as_u16(),
                body_len,
                elapsed,
            }
        }
        Err(Failure::Send(e)) | Err(Failure::Body(e)) if e.is_timeout() => {
            warn!(seq, "timeout: {}", error_chain(&e));
            ProbeStatus::TimedOut
        }
        Err(Failure::Send(e)) => {
            let message = error_chain(&e);
            warn!(seq, "ERROR: {}", message);
            ProbeStatus::TransportError(message)
        }
        Err(Failure::Body(e)) => {
            let message = format!("reading body: {}", error_chain(&e));
            warn!(seq, "ERROR: {}", message);
            ProbeStatus::TransportError(message)
        }
        Err(Failure::Deadline) => {
            warn!(
                seq,
                timeout_ms = timeout.as_millis() as u64,
                "timeout: no response within {:?}",
                timeout
            );
            ProbeStatus::TimedOut
        }
        Err(Failure::Cancelled) => {
            warn!(seq, "cancelled: run is shutting down");
            ProbeStatus::TimedOut
        }
    }
}
