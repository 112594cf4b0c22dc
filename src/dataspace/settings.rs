//! Dataspace Settings Module
//!
//! Validates the `dataspace` section of a configuration document and builds
//! the datasource it names.

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::dataspace::{DataSource, DataSourceRegistry};
use crate::error::{ReaperError, Result};

// == Configuration Keys ==
/// Top-level section holding dataspace settings
pub const DATASPACE_KEY: &str = "dataspace";
/// Retention window, in days
pub const RETENTION_KEY: &str = "retention_interval_in_days";
/// Datasource descriptor
pub const DATASOURCE_KEY: &str = "datasource";

// == DataSource Descriptor ==
/// Selector and opaque parameters for the backend to instantiate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataSourceDescriptor {
    /// Backend module selector
    pub module: String,
    /// Backend name within the module
    pub name: String,
    /// Backend-specific parameters, passed through untouched
    #[serde(default = "empty_object")]
    pub config: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

// == Reaper Config ==
/// Validated reaper inputs: retention window plus a ready datasource.
pub struct ReaperConfig {
    /// Records older than this many days are purged
    pub retention_interval_in_days: u64,
    /// Backend the reaper owns for its whole life
    pub datasource: Box<dyn DataSource>,
}

impl ReaperConfig {
    /// Wraps an already-built datasource.
    pub fn new(retention_interval_in_days: u64, datasource: Box<dyn DataSource>) -> Self {
        Self {
            retention_interval_in_days,
            datasource,
        }
    }

    // == Validation ==
    /// Validates `config` and builds its datasource from the built-in registry.
    pub fn from_value(config: &Value) -> Result<Self> {
        Self::from_value_with(config, &DataSourceRegistry::default())
    }

    /// Validates `config`, resolving the datasource through `registry`.
    ///
    /// Checks run in order: the `dataspace` section exists and is a mapping,
    /// the retention field exists and is numeric, then the datasource
    /// descriptor is parsed and instantiated. Factory failures are returned
    /// unchanged.
    pub fn from_value_with(config: &Value, registry: &DataSourceRegistry) -> Result<Self> {
        let dataspace = config
            .get(DATASPACE_KEY)
            .ok_or_else(|| {
                ReaperError::Configuration(format!("missing '{}' section", DATASPACE_KEY))
            })?
            .as_object()
            .ok_or_else(|| {
                ReaperError::Configuration(format!("'{}' must be a mapping", DATASPACE_KEY))
            })?;

        let raw_retention = dataspace.get(RETENTION_KEY).ok_or_else(|| {
            ReaperError::Configuration(format!(
                "missing '{}' in '{}'",
                RETENTION_KEY, DATASPACE_KEY
            ))
        })?;
        let retention_interval_in_days = parse_days(raw_retention)?;

        let descriptor = parse_descriptor(dataspace)?;
        let datasource = registry.build(&descriptor.module, &descriptor.name, &descriptor.config)?;

        Ok(Self::new(retention_interval_in_days, datasource))
    }
}

impl fmt::Debug for ReaperConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaperConfig")
            .field("retention_interval_in_days", &self.retention_interval_in_days)
            .finish_non_exhaustive()
    }
}

// == Parsing Helpers ==
/// Converts a retention value to whole days.
///
/// Accepts non-negative JSON numbers and numeric strings; fractions truncate.
pub fn parse_days(raw: &Value) -> Result<u64> {
    let days = match raw {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(whole_days)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_days))
        }
        _ => None,
    };

    days.ok_or_else(|| {
        ReaperError::Value(format!(
            "'{}' must be a non-negative number, got {}",
            RETENTION_KEY, raw
        ))
    })
}

fn whole_days(value: f64) -> Option<u64> {
    if value.is_finite() && value >= 0.0 && value < u64::MAX as f64 {
        Some(value.trunc() as u64)
    } else {
        None
    }
}

fn parse_descriptor(dataspace: &Map<String, Value>) -> Result<DataSourceDescriptor> {
    let raw = dataspace.get(DATASOURCE_KEY).ok_or_else(|| {
        ReaperError::Configuration(format!(
            "missing '{}' in '{}'",
            DATASOURCE_KEY, DATASPACE_KEY
        ))
    })?;

    serde_json::from_value(raw.clone()).map_err(|e| {
        ReaperError::Configuration(format!("invalid '{}' descriptor: {}", DATASOURCE_KEY, e))
    })
}
