use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;

use crate::cli::Args;
use crate::error::UsageError;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_GRACE: Duration = Duration::ZERO;

/// Optional defaults loaded from `--config` / `PROBE_CONFIG`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct FileConfig {
    #[serde(default)]
    pub interval_ms: Option<u64>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub grace_ms: Option<u64>,
    #[serde(default)]
    pub log_level: Option<String>,
}

impl FileConfig {
    pub async fn load(file_path: &Path) -> Result<Self> {
        if !file_path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", file_path.display()));
        }

        let content = fs::read_to_string(file_path)
            .await
            .with_context(|| format!("Failed to read config file: {}", file_path.display()))?;
        let config: FileConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", file_path.display()))?;
        Ok(config)
    }
}

/// Settings for one run. Built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub url: Url,
    pub interval: Duration,
    pub timeout: Duration,
    /// Upper bound on waiting for in-flight probes at shutdown; zero means
    /// report immediately.
    pub grace: Duration,
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl RunConfig {
    pub fn new(url: Url, interval: Duration, timeout: Duration) -> Self {
        Self {
            url,
            interval,
            timeout,
            grace: DEFAULT_GRACE,
            log_level: default_log_level(),
        }
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Merge flags over file values over built-in defaults, then validate.
    pub fn resolve(args: &Args, file: &FileConfig) -> Result<Self, UsageError> {
        let url = parse_target(&args.url)?;

        let interval = args
            .interval
            .or(file.interval_ms.map(Duration::from_millis))
            .unwrap_or(DEFAULT_INTERVAL);
        let timeout = args
            .timeout
            .or(file.timeout_ms.map(Duration::from_millis))
            .unwrap_or(DEFAULT_TIMEOUT);
        let grace = args
            .grace
            .or(file.grace_ms.map(Duration::from_millis))
            .unwrap_or(DEFAULT_GRACE);
        let log_level = args
            .log_level
            .clone()
            .or_else(|| file.log_level.clone())
            .unwrap_or_else(default_log_level);

        if interval.is_zero() {
            return Err(UsageError::ZeroDuration { name: "interval" });
        }
        if timeout.is_zero() {
            return Err(UsageError::ZeroDuration { name: "timeout" });
        }

        let config = Self {
            url,
            interval,
            timeout,
            grace,
            log_level,
        };
        config.get_tracing_level()?;
        Ok(config)
    }

    /// Get the log level as a tracing::Level
    pub fn get_tracing_level(&self) -> Result<tracing::Level, UsageError> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(tracing::Level::TRACE),
            "debug" => Ok(tracing::Level::DEBUG),
            "info" => Ok(tracing::Level::INFO),
            "warn" | "warning" => Ok(tracing::Level::WARN),
            "error" => Ok(tracing::Level::ERROR),
            _ => Err(UsageError::LogLevel(self.log_level.clone())),
        }
    }
}

fn parse_target(raw: &str) -> Result<Url, UsageError> {
    let invalid = |reason: String| UsageError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme {other}"))),
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}
