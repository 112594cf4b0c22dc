//! Dataspace Reaper - retention service for the decision-cycle dataspace
//!
//! Periodically purges records older than a retention window through a
//! pluggable datasource, with an observable lifecycle and an operator API.

pub mod api;
pub mod config;
pub mod dataspace;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use dataspace::{DataSource, DataSourceRegistry, LifecycleState, ReaperConfig, State};
pub use error::{ReaperError, Result};
pub use tasks::Reaper;
