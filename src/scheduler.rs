use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::Result;
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::prober::http::probe_http;
use crate::stats::{Aggregator, RunReport};

/// What a job learns about its own dispatch.
#[derive(Debug, Clone)]
pub struct Tick {
    /// Sequence number, starting at 1.
    pub seq: u64,
    /// Wall-clock time the scheduler dispatched the job.
    pub requested_at: SystemTime,
    /// Child of the run's token.
    pub cancel: CancellationToken,
}

pub struct Scheduler {
    interval: Duration,
    grace: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            anyhow::bail!("probe interval must be greater than zero");
        }
        Ok(Self {
            interval,
            grace: Duration::ZERO,
        })
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Dispatches `job` once per tick until `cancel` fires and returns how
    /// many jobs were dispatched.
    ///
    /// Jobs are spawned, so a slow job never delays the next tick. Jobs still
    /// running at shutdown are given up to the grace period and then aborted.
    pub async fn run<J, F>(&self, cancel: &CancellationToken, mut job: J) -> u64
    where
        J: FnMut(Tick) -> F,
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = JoinSet::new();
        let mut dispatched = 0;
        let mut next = Instant::now();
        loop {
            if cancel.is_cancelled() {
                break;
            }
            dispatched += 1;
            tasks.spawn(job(Tick {
                seq: dispatched,
                requested_at: SystemTime::now(),
                cancel: cancel.child_token(),
            }));
            while tasks.try_join_next().is_some() {}

            // Past the end of the clock the cadence no longer needs an anchor.
            let pause = match next.checked_add(self.interval) {
                Some(at) => {
                    next = at;
                    sleep_until(at)
                }
                None => sleep(self.interval),
            };
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = pause => {}
            }
        }

        self.drain(&mut tasks).await;
        dispatched
    }

    async fn drain(&self, tasks: &mut JoinSet<()>) {
        if tasks.is_empty() {
            return;
        }
        if self.grace.is_zero() {
            debug!(in_flight = tasks.len(), "abandoning in-flight probes");
        } else {
            let in_flight = tasks.len();
            let drained = tokio::time::timeout(self.grace, async {
                while tasks.join_next().await.is_some() {}
            })
            .await;
            match drained {
                Ok(()) => debug!(in_flight, "in-flight probes finished"),
                Err(_) => warn!(
                    outstanding = tasks.len(),
                    "grace period of {:?} elapsed with probes still in flight", self.grace
                ),
            }
        }
        tasks.abort_all();
    }
}

/// Probe `config.url` every `config.interval` until `cancel` fires, then
/// report what was recorded.
///
/// By default the report does not wait for probes still in flight at
/// cancellation, so a probe dispatched just before shutdown may be missing
/// from the counts. A non-zero `config.grace` waits for them (bounded).
pub async fn run_probes(config: &RunConfig, cancel: CancellationToken) -> Result<RunReport> {
    let scheduler = Scheduler::new(config.interval)?.with_grace(config.grace);
    let stats = Aggregator::new();

    info!("GET {}", config.url);

    let url = Arc::new(config.url.clone());
    let timeout = config.timeout;
    let sink = stats.clone();
    let dispatched = scheduler
        .run(&cancel, move |tick| {
            let url = url.clone();
            let sink = sink.clone();
            async move {
                let outcome =
                    probe_http(tick.seq, tick.requested_at, &url, timeout, &tick.cancel).await;
                sink.append(outcome);
            }
        })
        .await;

    info!("Gracefully shutting down...");
    let report = stats.report();
    debug!(dispatched, recorded = report.requests_sent, "probe loop stopped");
    Ok(report)
}
