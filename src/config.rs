//! Configuration Module
//!
//! Handles loading process configuration from environment variables and the
//! dataspace configuration document from disk.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use serde_json::{json, Value};

use crate::dataspace::null::{NULL_MODULE, NULL_NAME};
use crate::tasks::{DEFAULT_SECONDS_BETWEEN_RUNS, DEFAULT_STOP_TIMEOUT, MIN_SECONDS_BETWEEN_RUNS};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Path to the JSON document holding the `dataspace` section
    pub dataspace_config: Option<PathBuf>,
    /// Pause between reap cycles in seconds
    pub seconds_between_runs: u64,
    /// Floor for `seconds_between_runs`
    pub min_seconds_between_runs: u64,
    /// Seconds `stop` waits for the worker
    pub stop_timeout: u64,
    /// Seconds before the first cycle
    pub start_delay: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `DATASPACE_CONFIG` - Dataspace JSON file (default: none, null datasource)
    /// - `REAPER_SECONDS_BETWEEN_RUNS` - Pause between cycles (default: 28800)
    /// - `REAPER_MIN_SECONDS_BETWEEN_RUNS` - Floor for the pause (default: 3600)
    /// - `REAPER_STOP_TIMEOUT` - Stop join timeout in seconds (default: 30)
    /// - `REAPER_START_DELAY` - Delay before the first cycle (default: 0)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            dataspace_config: env::var("DATASPACE_CONFIG").ok().map(PathBuf::from),
            seconds_between_runs: env_or(
                "REAPER_SECONDS_BETWEEN_RUNS",
                defaults.seconds_between_runs,
            ),
            min_seconds_between_runs: env_or(
                "REAPER_MIN_SECONDS_BETWEEN_RUNS",
                defaults.min_seconds_between_runs,
            ),
            stop_timeout: env_or("REAPER_STOP_TIMEOUT", defaults.stop_timeout),
            start_delay: env_or("REAPER_START_DELAY", defaults.start_delay),
        }
    }

    /// Reads the dataspace document, or falls back to a null datasource with
    /// a one-year retention window when no file is configured.
    pub fn load_dataspace(&self) -> anyhow::Result<Value> {
        match &self.dataspace_config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
            }
            None => Ok(default_dataspace()),
        }
    }

    /// Stop timeout handed to the reaper.
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout)
    }

    /// Delay before the first cycle after startup.
    pub fn start_delay(&self) -> Duration {
        Duration::from_secs(self.start_delay)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            dataspace_config: None,
            seconds_between_runs: DEFAULT_SECONDS_BETWEEN_RUNS,
            min_seconds_between_runs: MIN_SECONDS_BETWEEN_RUNS,
            stop_timeout: DEFAULT_STOP_TIMEOUT.as_secs(),
            start_delay: 0,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn default_dataspace() -> Value {
    json!({
        "dataspace": {
            "retention_interval_in_days": 365,
            "datasource": {
                "module": NULL_MODULE,
                "name": NULL_NAME,
                "config": {}
            }
        }
    })
}
