//! Dataspace Module
//!
//! Lifecycle state, datasource capability, built-in backends and the
//! configuration validator the reaper is built from.

pub mod datasource;
pub mod memory;
pub mod null;
pub mod registry;
pub mod settings;
pub mod state;


// Re-export public types
pub use datasource::DataSource;
pub use memory::{MemoryDataSource, Record};
pub use null::NullDataSource;
pub use registry::{DataSourceFactory, DataSourceRegistry};
pub use settings::{DataSourceDescriptor, ReaperConfig};
pub use state::{LifecycleState, State};
