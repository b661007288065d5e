use thiserror::Error;

/// Bad or missing command-line input. Fatal before the probe loop starts.
#[derive(Error, Debug)]
pub enum UsageError {
    #[error(transparent)]
    Args(#[from] clap::Error),

    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{name} must be greater than zero")]
    ZeroDuration { name: &'static str },

    #[error("invalid log level: {0}. Valid levels are: trace, debug, info, warn, error")]
    LogLevel(String),
}
