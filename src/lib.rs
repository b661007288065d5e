pub mod cli;
pub mod config;
pub mod error;
pub mod prober;
pub mod scheduler;
pub mod signal;
pub mod stats;

pub use config::RunConfig;
pub use prober::{ProbeOutcome, ProbeStatus};
pub use scheduler::run_probes;
pub use stats::{Aggregator, RunReport};
