use std::fmt::Write;
use std::time::{Duration, SystemTime};

pub mod clock;
pub mod http;

/// Classified result of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    /// A response arrived and its body was read to the end.
    Success {
        status: u16,
        body_len: usize,
        elapsed: Duration,
    },
    /// The per-probe deadline (or run cancellation) fired first.
    TimedOut,
    /// DNS, connect, TLS or body read failure.
    TransportError(String),
}

/// One record per dispatched probe that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Dispatch sequence number, starting at 1.
    pub seq: u64,
    /// When the scheduler handed the probe off, not when the socket connected.
    pub requested_at: SystemTime,
    pub status: ProbeStatus,
}

impl ProbeOutcome {
    pub fn new(seq: u64, requested_at: SystemTime, status: ProbeStatus) -> Self {
        Self {
            seq,
            requested_at,
            status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, ProbeStatus::Success { .. })
    }

    /// Connection-ready to body-read latency; only present on success.
    pub fn elapsed(&self) -> Option<Duration> {
        match self.status {
            ProbeStatus::Success { elapsed, .. } => Some(elapsed),
            _ => None,
        }
    }
}

/// Flattens an error and its sources into one line.
pub(crate) fn error_chain(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = err.to_string();
    while let Some(src) = err.source() {
        let _ = write!(s, ": {}", src);
        err = src;
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[derive(Debug)]
    struct Wrapped(io::Error);

    impl std::fmt::Display for Wrapped {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "error sending request")
        }
    }

    impl std::error::Error for Wrapped {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let err = Wrapped(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"));
        assert_eq!(error_chain(&err), "error sending request: connection refused");
    }

    #[test]
    fn test_elapsed_only_on_success() {
        let now = SystemTime::now();
        let ok = ProbeOutcome::new(
            1,
            now,
            ProbeStatus::Success {
                status: 200,
                body_len: 12,
                elapsed: Duration::from_millis(7),
            },
        );
        assert!(ok.is_success());
        assert_eq!(ok.elapsed(), Some(Duration::from_millis(7)));

        let timed_out = ProbeOutcome::new(2, now, ProbeStatus::TimedOut);
        assert!(!timed_out.is_success());
        assert_eq!(timed_out.elapsed(), None);

        let failed = ProbeOutcome::new(3, now, ProbeStatus::TransportError("dns".into()));
        assert!(!failed.is_success());
        assert_eq!(failed.elapsed(), None);
    }
}
