//! Process configuration loaded from environment variables.
//!
//! Every value is read once at startup. Unparsable values are rejected
//! with a [`ConfigError`] rather than replaced by a fallback.

use std::time::Duration;

use crate::duration::{LookbackWindow, parse_duration};
use crate::error::ConfigError;

pub const DEFAULT_PROMETHEUS_PORT: u16 = 9090;
pub const DEFAULT_INACTIVITY_DURATION: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(30);

/// Effective configuration for the idler.
#[derive(Debug, Clone, PartialEq)]
pub struct IdlerConfig {
    /// Gateway base URL, always ending in `/`.
    pub gateway_url: String,
    /// Query backend host name (no scheme, no port).
    pub prometheus_host: String,
    pub prometheus_port: u16,
    /// Window without invocations after which a function is idle.
    pub inactivity_duration: Duration,
    /// Pause between reconciliation cycles.
    pub reconcile_interval: Duration,
    /// Log scale decisions instead of sending them.
    pub dry_run: bool,
    /// Maximum number of in-flight metric queries per cycle.
    pub query_concurrency: usize,
    /// Per-request timeout for outbound HTTP calls.
    pub http_timeout: Option<Duration>,
}

impl IdlerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let gateway_url = get("gateway_url").ok_or(ConfigError::Missing("gateway_url"))?;
        let gateway_url = normalize_gateway_url(&gateway_url)?;

        let prometheus_host =
            get("prometheus_host").ok_or(ConfigError::Missing("prometheus_host"))?;
        let prometheus_host = normalize_host(&prometheus_host)?;

        let prometheus_port = match get("prometheus_port") {
            Some(v) => v.parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "prometheus_port",
                value: v.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_PROMETHEUS_PORT,
        };

        let inactivity_duration = match get("inactivity_duration") {
            Some(v) => duration_value("inactivity_duration", &v)?,
            None => DEFAULT_INACTIVITY_DURATION,
        };
        non_zero("inactivity_duration", inactivity_duration)?;

        let reconcile_interval = match get("reconcile_interval") {
            Some(v) => duration_value("reconcile_interval", &v)?,
            None => DEFAULT_RECONCILE_INTERVAL,
        };
        non_zero("reconcile_interval", reconcile_interval)?;

        let dry_run = match get("dry_run") {
            Some(v) => parse_bool(&v).ok_or_else(|| ConfigError::Invalid {
                key: "dry_run",
                value: v.clone(),
                reason: "expected true or false".to_string(),
            })?,
            None => false,
        };

        let query_concurrency = match get("query_concurrency") {
            Some(v) => match v.parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "query_concurrency",
                        value: v,
                        reason: "expected a positive integer".to_string(),
                    });
                }
            },
            None => 1,
        };

        let http_timeout = match get("http_timeout") {
            Some(v) => Some(duration_value("http_timeout", &v)?),
            None => None,
        };

        Ok(Self {
            gateway_url,
            prometheus_host,
            prometheus_port,
            inactivity_duration,
            reconcile_interval,
            dry_run,
            query_concurrency,
            http_timeout,
        })
    }

    /// Range used in invocation-rate queries.
    pub fn lookback_window(&self) -> LookbackWindow {
        LookbackWindow::from_inactivity(self.inactivity_duration)
    }

    /// Base URL of the query backend, e.g. `http://prometheus:9090`.
    pub fn prometheus_url(&self) -> String {
        format!("http://{}:{}", self.prometheus_host, self.prometheus_port)
    }
}

fn duration_value(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    parse_duration(value).ok_or_else(|| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: "expected a duration such as 30s, 5m or 1m30s".to_string(),
    })
}

fn non_zero(key: &'static str, value: Duration) -> Result<(), ConfigError> {
    if value.is_zero() {
        return Err(ConfigError::Invalid {
            key,
            value: "0".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Gateway paths are appended directly, so the base must end in `/`.
fn normalize_gateway_url(url: &str) -> Result<String, ConfigError> {
    if !url.starts_with("http://") {
        return Err(ConfigError::UnsupportedScheme(url.to_string()));
    }
    if url.ends_with('/') {
        Ok(url.to_string())
    } else {
        Ok(format!("{url}/"))
    }
}

fn normalize_host(host: &str) -> Result<String, ConfigError> {
    if host.starts_with("https://") {
        return Err(ConfigError::UnsupportedScheme(host.to_string()));
    }
    let host = host.strip_prefix("http://").unwrap_or(host);
    Ok(host.trim_end_matches('/').to_string())
}
