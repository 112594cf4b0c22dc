//! Response DTOs for the operator API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::dataspace::State;

/// Response body for the status endpoint (GET /status)
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// Current lifecycle state
    pub state: State,
    /// Whether a worker task is alive
    pub running: bool,
    /// Retention window in days
    pub retention_interval_in_days: u64,
    /// Pause between cycles in seconds
    pub seconds_between_runs: u64,
    /// Floor for the pause between cycles
    pub min_seconds_between_runs: u64,
}

/// Response body for POST /start and POST /stop
#[derive(Debug, Clone, Serialize)]
pub struct StateResponse {
    /// Human-readable outcome
    pub message: String,
    /// Lifecycle state after the call
    pub state: State,
}

impl StateResponse {
    /// Creates a new StateResponse
    pub fn new(message: impl Into<String>, state: State) -> Self {
        Self {
            message: message.into(),
            state,
        }
    }
}

/// Response body for a forced reap (POST /reap)
#[derive(Debug, Clone, Serialize)]
pub struct ReapResponse {
    /// Records removed by the cycle
    pub deleted: u64,
    /// Retention window the cycle used
    pub retention_interval_in_days: u64,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
