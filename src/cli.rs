use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::UsageError;

/// Ping for HTTP: send a GET every interval until Ctrl+C, then print how many got answered
#[derive(Parser, Debug, Clone)]
#[command(name = "http-latency-probe")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Target URL (http or https)
    #[arg(value_name = "URL")]
    pub url: String,

    /// Interval between each request, e.g. 500ms, 2s [default: 2s]
    #[arg(long = "interval", value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,

    /// Request timeout [default: 60s]
    #[arg(long = "timeout", value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// How long to wait for in-flight requests after Ctrl+C before reporting [default: 0s]
    #[arg(long = "grace", value_parser = humantime::parse_duration)]
    pub grace: Option<Duration>,

    /// Log level (trace, debug, info, warn, error) [default: info]
    #[arg(long = "log-level", env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// JSON file with default settings; flags take precedence
    #[arg(long = "config", env = "PROBE_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Parse from an explicit argv. `--help` and `--version` come back as
    /// errors of kind `DisplayHelp`/`DisplayVersion`; callers print them and
    /// exit 0.
    pub fn try_parse_argv<I, T>(argv: I) -> Result<Self, UsageError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Ok(Self::try_parse_from(argv)?)
    }

    pub fn usage() -> String {
        Self::command().render_usage().to_string()
    }
}
