//! Application context - Configuration and logging owned in one place

use std::sync::Arc;

use crate::infrastructure::config::{ConfigLoader, ConfigSnapshot, ConfigStore};
use crate::infrastructure::logging::LogRouter;

/// Process-wide state with an explicit lifecycle.
///
/// Created once at startup and handed to whatever needs configuration or
/// logging; tests build their own.
#[derive(Clone)]
pub struct AppContext {
    config: Arc<ConfigStore>,
    logs: LogRouter,
}

impl AppContext {
    pub fn new(config: Arc<ConfigStore>, logs: LogRouter) -> Self {
        Self { config, logs }
    }

    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.config.snapshot()
    }

    pub fn logs(&self) -> &LogRouter {
        &self.logs
    }

    /// Loader bound to this context's store and router
    pub fn loader(&self) -> ConfigLoader {
        ConfigLoader::new(self.config.clone(), self.logs.clone())
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(Arc::new(ConfigStore::default()), LogRouter::new())
    }
}
