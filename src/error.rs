//! Error types for the dataspace reaper
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Reaper Error Enum ==
/// Unified error type for the reaper and its configuration.
#[derive(Error, Debug)]
pub enum ReaperError {
    /// Dataspace section missing or structurally malformed
    #[error("Dataspace configuration error: {0}")]
    Configuration(String),

    /// Well-typed but semantically invalid value
    #[error("Invalid value: {0}")]
    Value(String),

    /// A worker is already alive for this reaper
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// No datasource registered under the requested selector
    #[error("Unknown datasource: {module}.{name}")]
    UnknownDataSource { module: String, name: String },

    /// Datasource factory refused to build the backend
    #[error("Datasource initialization failed: {0:#}")]
    DataSourceInit(anyhow::Error),

    /// Datasource failed during a reap cycle
    #[error("Datasource failure: {0:#}")]
    Backend(anyhow::Error),
}

// == IntoResponse Implementation ==
impl IntoResponse for ReaperError {
    fn into_response(self) -> Response {
        let status = match &self {
            ReaperError::Value(_) => StatusCode::BAD_REQUEST,
            ReaperError::ConcurrencyConflict(_) => StatusCode::CONFLICT,
            ReaperError::Backend(_) => StatusCode::BAD_GATEWAY,
            ReaperError::Configuration(_)
            | ReaperError::UnknownDataSource { .. }
            | ReaperError::DataSourceInit(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the reaper.
pub type Result<T> = std::result::Result<T, ReaperError>;
