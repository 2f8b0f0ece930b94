use crate::config::Config;
use std::sync::Arc;

/// Shared by every handler. Holds configuration only: the price history is
/// re-read on each request so the dashboard always reflects the last
/// completed collection run.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}
