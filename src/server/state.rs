//! Application state

use std::sync::Arc;

use crate::history::HistoryLog;
use crate::preprocessing::UnknownCategoryPolicy;
use crate::store::{FileModelStore, ModelStore};
use crate::training::TrainingOptions;

use super::ServerConfig;

/// State shared across handlers. The model store is injected so tests can
/// run against an in-memory store instead of the bundle file.
pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<dyn ModelStore>,
    pub history: HistoryLog,
    pub unknown_policy: UnknownCategoryPolicy,
    pub training: TrainingOptions,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let store = Arc::new(FileModelStore::new(&config.model_path));
        Self::with_store(config, store)
    }

    pub fn with_store(config: ServerConfig, store: Arc<dyn ModelStore>) -> Self {
        let history = HistoryLog::new(&config.history_path);
        Self {
            config,
            store,
            history,
            unknown_policy: UnknownCategoryPolicy::default(),
            training: TrainingOptions::default(),
        }
    }
}
