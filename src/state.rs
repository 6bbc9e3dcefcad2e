use std::sync::Arc;

use crate::{config::AppConfig, store::Store};

/// Shared handler context. The store is picked once at startup from the
/// configured storage mode; nothing downstream branches on it again.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}
