use std::sync::Arc;

use vestibule_core::{
    ChangeNotifier, Config, DepartmentStore, QueueEngine, SanitizedConfig,
};

/// Shared application state
pub struct AppState {
    config: Config,
    engine: Arc<QueueEngine>,
    departments: Arc<dyn DepartmentStore>,
    notifier: ChangeNotifier,
}

impl AppState {
    pub fn new(
        config: Config,
        engine: Arc<QueueEngine>,
        departments: Arc<dyn DepartmentStore>,
        notifier: ChangeNotifier,
    ) -> Self {
        Self {
            config,
            engine,
            departments,
            notifier,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn engine(&self) -> &QueueEngine {
        self.engine.as_ref()
    }

    pub fn departments(&self) -> &dyn DepartmentStore {
        self.departments.as_ref()
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }
}
