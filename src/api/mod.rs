//! API Module
//!
//! HTTP handlers and routing for the reaper operator API.
//!
//! # Endpoints
//! - `GET /status` - Lifecycle state and tunables
//! - `POST /start` - Launch the worker
//! - `POST /stop` - Stop the worker
//! - `POST /reap` - Forced single reap cycle
//! - `PUT /settings` - Update tunables
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
