//! Datasource Registry
//!
//! Maps `module`/`name` selectors from the dataspace configuration to
//! factories that build the matching backend.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::dataspace::memory::{MemoryDataSource, MEMORY_MODULE, MEMORY_NAME};
use crate::dataspace::null::{NullDataSource, NULL_MODULE, NULL_NAME};
use crate::dataspace::DataSource;
use crate::error::{ReaperError, Result};

/// Builds a datasource from its opaque `config` section.
pub type DataSourceFactory =
    Arc<dyn Fn(&Value) -> anyhow::Result<Box<dyn DataSource>> + Send + Sync>;

// == DataSource Registry ==
/// Known datasource factories keyed by `(module, name)`.
#[derive(Clone)]
pub struct DataSourceRegistry {
    factories: HashMap<(String, String), DataSourceFactory>,
}

impl DataSourceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    // == Register ==
    /// Registers a factory, replacing any previous one for the same selector.
    pub fn register<F>(&mut self, module: impl Into<String>, name: impl Into<String>, factory: F)
    where
        F: Fn(&Value) -> anyhow::Result<Box<dyn DataSource>> + Send + Sync + 'static,
    {
        self.factories
            .insert((module.into(), name.into()), Arc::new(factory));
    }

    /// Returns true if a factory exists for the selector.
    pub fn contains(&self, module: &str, name: &str) -> bool {
        self.factories
            .contains_key(&(module.to_string(), name.to_string()))
    }

    // == Build ==
    /// Instantiates the datasource registered under `module`/`name`.
    pub fn build(&self, module: &str, name: &str, config: &Value) -> Result<Box<dyn DataSource>> {
        let factory = self
            .factories
            .get(&(module.to_string(), name.to_string()))
            .ok_or_else(|| ReaperError::UnknownDataSource {
                module: module.to_string(),
                name: name.to_string(),
            })?;

        (factory.as_ref())(config).map_err(ReaperError::DataSourceInit)
    }
}

impl Default for DataSourceRegistry {
    /// Registry preloaded with the built-in null and memory datasources.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(NULL_MODULE, NULL_NAME, |config| {
            Ok(Box::new(NullDataSource::new(config.clone())) as Box<dyn DataSource>)
        });
        registry.register(MEMORY_MODULE, MEMORY_NAME, |config| {
            Ok(Box::new(MemoryDataSource::from_config(config)) as Box<dyn DataSource>)
        });
        registry
    }
}

impl fmt::Debug for DataSourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut selectors: Vec<String> = self
            .factories
            .keys()
            .map(|(module, name)| format!("{}.{}", module, name))
            .collect();
        selectors.sort();
        f.debug_struct("DataSourceRegistry")
            .field("selectors", &selectors)
            .finish()
    }
}
