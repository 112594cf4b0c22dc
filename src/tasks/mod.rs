//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Reaper: purges dataspace records older than the retention window

mod reaper;

pub use reaper::{
    ForcedReap, Reaper, ReaperSettings, DEFAULT_SECONDS_BETWEEN_RUNS, DEFAULT_STOP_TIMEOUT, MIN_RETENTION_INTERVAL_DAYS,
    MIN_SECONDS_BETWEEN_RUNS,
};
