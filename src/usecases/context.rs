use crate::infra::{cache::SqliteCache, config::AppConfig};

/// Composition root handed to command dispatch.
#[derive(Debug)]
pub struct AppContext {
    pub config: AppConfig,
    pub cache: SqliteCache,
}

impl AppContext {
    pub fn new(config: AppConfig, cache: SqliteCache) -> Self {
        Self { config, cache }
    }
}
