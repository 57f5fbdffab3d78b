//! Configuration management for the record-stream server.
//!
//! Loads configuration from environment variables with sensible defaults.
//! `RUST_LOG` is read directly by the tracing subscriber.

use record_stream_runtime::PipelineConfig;
use record_stream_runtime::interval::{DEFAULT_TICK_INTERVAL, DEFAULT_TICK_MARKER};
use record_stream_runtime::partition::default_lanes;
use record_stream_runtime::pipeline::DEFAULT_MAX_DELAY;
use std::env;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Catalog seeded into the in-memory store
    pub catalog_size: u32,
    /// Pipeline configuration
    pub pipeline: PipelineConfig,
    /// Install the Prometheus recorder and serve `/metrics`
    pub metrics_enabled: bool,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
}

impl ServerConfig {
    /// `host:port` to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Unset or unparsable variables fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            server: ServerConfig {
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parsed(&lookup, "PORT").unwrap_or(8010),
                shutdown_timeout: Duration::from_secs(parsed(&lookup, "SHUTDOWN_TIMEOUT").unwrap_or(30)),
            },
            catalog_size: parsed(&lookup, "CATALOG_SIZE").unwrap_or(100),
            pipeline: PipelineConfig {
                lanes: parsed::<usize>(&lookup, "FANOUT_LANES")
                    .and_then(NonZeroUsize::new)
                    .unwrap_or_else(default_lanes),
                tick_interval: parsed(&lookup, "TICK_INTERVAL_MS")
                    .map_or(DEFAULT_TICK_INTERVAL, Duration::from_millis),
                tick_marker: lookup("TICK_MARKER")
                    .unwrap_or_else(|| DEFAULT_TICK_MARKER.to_string()),
                max_delay: parsed(&lookup, "MAX_DELAY_MS").map_or(DEFAULT_MAX_DELAY, Duration::from_millis),
            },
            metrics_enabled: parsed(&lookup, "METRICS_ENABLED").unwrap_or(true),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// Read and parse `key`, logging values that do not parse.
fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let value = lookup(key)?;
    let parsed = value.trim().parse().ok();
    if parsed.is_none() {
        tracing::warn!(key, value = %value, "Ignoring unparsable configuration value");
    }
    parsed
}
