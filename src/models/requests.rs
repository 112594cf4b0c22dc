//! Request DTOs for the operator API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for POST /start
///
/// # Fields
/// - `delay`: Optional delay in seconds before the first cycle
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartRequest {
    /// Seconds to wait before the first reap cycle
    #[serde(default)]
    pub delay: Option<u64>,
}

/// Request body for PUT /settings
///
/// Fields left out keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsRequest {
    /// New retention window in days
    #[serde(default)]
    pub retention_interval_in_days: Option<u64>,
    /// New pause between cycles in seconds
    #[serde(default)]
    pub seconds_between_runs: Option<u64>,
}

impl SettingsRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.retention_interval_in_days.is_none() && self.seconds_between_runs.is_none() {
            return Some("At least one setting must be provided".to_string());
        }
        None
    }
}
