use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::prober::ProbeOutcome;

/// Growing collection of probe outcomes shared by every probe task.
///
/// Clones share the same collection. All appends go through the mutex, so
/// outcomes from probes finishing at the same instant are never lost.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    outcomes: Arc<Mutex<Vec<ProbeOutcome>>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, outcome: ProbeOutcome) {
        self.outcomes.lock().push(outcome);
    }

    pub fn len(&self) -> usize {
        self.outcomes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn report(&self) -> RunReport {
        RunReport::from_outcomes(&self.outcomes.lock())
    }
}

/// Terminal counts for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    pub requests_sent: u64,
    pub responses_received: u64,
    /// Percentage of recorded probes without a successful response, in `[0, 100]`.
    pub timeout_rate: f64,
}

impl RunReport {
    pub fn new(requests_sent: u64, responses_received: u64) -> Self {
        let responses_received = responses_received.min(requests_sent);
        let timeout_rate = if requests_sent == 0 {
            0.0
        } else {
            (requests_sent - responses_received) as f64 / requests_sent as f64 * 100.0
        };
        Self {
            requests_sent,
            responses_received,
            timeout_rate,
        }
    }

    pub fn from_outcomes(outcomes: &[ProbeOutcome]) -> Self {
        let received = outcomes.iter().filter(|o| o.is_success()).count();
        Self::new(outcomes.len() as u64, received as u64)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} requests transmitted, {} responses received, {:.2}% timeout",
            self.requests_sent, self.responses_received, self.timeout_rate
        )
    }
}
