use std::sync::Arc;

use crate::config::Config;
use crate::ml::ModelStore;
use crate::services::RecommendSettings;

/// Shared application state
///
/// The model store is read-only after startup, so handlers share it without
/// locking.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ModelStore>,
    pub settings: RecommendSettings,
    pub search_limit: usize,
}

impl AppState {
    pub fn new(store: ModelStore, config: &Config) -> Self {
        Self {
            store: Arc::new(store),
            settings: RecommendSettings {
                n_neighbors: config.n_neighbors,
                top_n: config.top_n,
            },
            search_limit: config.search_limit,
        }
    }
}
