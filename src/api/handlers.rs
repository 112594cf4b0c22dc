//! API Handlers
//!
//! HTTP request handlers for each operator endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{body::Bytes, extract::State, Json};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::dataspace::LifecycleState;
use crate::error::{ReaperError, Result};
use crate::models::{
    HealthResponse, ReapResponse, SettingsRequest, StartRequest, StateResponse, StatusResponse,
};
use crate::tasks::{Reaper, ReaperSettings};

/// Application state shared across all handlers.
///
/// The reaper sits behind an async mutex because `stop` awaits the worker.
/// The lifecycle handle and a settings snapshot live outside that lock, so
/// `GET /status` never waits on a slow stop or reap.
#[derive(Clone)]
pub struct AppState {
    /// Reaper under operator control
    pub reaper: Arc<Mutex<Reaper>>,
    /// Lock-free view of the reaper's lifecycle
    pub lifecycle: LifecycleState,
    /// Tunables as of the last change, written only under the reaper lock
    pub settings: Arc<RwLock<ReaperSettings>>,
}

impl AppState {
    /// Creates a new AppState around the given reaper.
    pub fn new(reaper: Reaper) -> Self {
        let lifecycle = reaper.state().clone();
        let settings = Arc::new(RwLock::new(reaper.settings()));
        Self {
            reaper: Arc::new(Mutex::new(reaper)),
            lifecycle,
            settings,
        }
    }
}

/// Handler for GET /status
///
/// Reports the lifecycle state and the current tunables.
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let settings = *state.settings.read().await;
    let current = state.lifecycle.get();

    Json(StatusResponse {
        state: current,
        running: current.has_worker(),
        retention_interval_in_days: settings.retention_interval_in_days,
        seconds_between_runs: settings.seconds_between_runs,
        min_seconds_between_runs: settings.min_seconds_between_runs,
    })
}

/// Handler for POST /start
///
/// Launches the background worker, optionally delaying its first cycle.
/// An empty body starts without delay; a body that is not a valid
/// [`StartRequest`] is rejected before anything starts.
pub async fn start_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StateResponse>> {
    let req = parse_start_request(&body)?;
    let delay = req.delay.map(Duration::from_secs).unwrap_or(Duration::ZERO);

    let mut reaper = state.reaper.lock().await;
    reaper.start(delay)?;

    Ok(Json(StateResponse::new(
        "Reaper started",
        state.lifecycle.get(),
    )))
}

/// Handler for POST /stop
///
/// Stops the background worker. Always succeeds.
pub async fn stop_handler(State(state): State<AppState>) -> Json<StateResponse> {
    let mut reaper = state.reaper.lock().await;
    reaper.stop().await;

    Json(StateResponse::new("Reaper stop requested", state.lifecycle.get()))
}

/// Handler for POST /reap
///
/// Runs one forced purge cycle outside the worker.
pub async fn reap_handler(State(state): State<AppState>) -> Result<Json<ReapResponse>> {
    // The datasource mutex serializes cycles; the reaper lock is not needed
    // while the backend runs.
    let job = state.reaper.lock().await.forced_reap();
    let retention_interval_in_days = job.retention_interval();

    let deleted = job.run().await?;
    info!("Forced reap removed {} records", deleted);

    Ok(Json(ReapResponse {
        deleted,
        retention_interval_in_days,
    }))
}

/// Handler for PUT /settings
///
/// Updates the tunables. Either both changes apply or neither does.
pub async fn settings_handler(
    State(state): State<AppState>,
    Json(req): Json<SettingsRequest>,
) -> Result<Json<StatusResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ReaperError::Value(error_msg));
    }

    {
        let mut reaper = state.reaper.lock().await;
        let previous_retention = reaper.retention_interval();

        if let Some(days) = req.retention_interval_in_days {
            reaper.set_retention_interval(days)?;
        }
        if let Some(seconds) = req.seconds_between_runs {
            if let Err(err) = reaper.set_seconds_between_runs(seconds) {
                reaper.set_retention_interval(previous_retention)?;
                return Err(err);
            }
        }

        *state.settings.write().await = reaper.settings();
    }

    Ok(status_handler(State(state)).await)
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

// == Helpers ==
fn parse_start_request(body: &[u8]) -> Result<StartRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(StartRequest::default());
    }

    serde_json::from_slice(body).map_err(|err| {
        debug!("Rejected start request body: {}", err);
        ReaperError::Value(format!("invalid start request: {}", err))
    })
}
