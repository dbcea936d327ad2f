//! Shared helper functions for CLI commands

use school_eval_core::{config::Settings, error::Result, LibsqlStore};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Load settings, letting `--db-path` override the configured database
pub fn load_settings(config: Option<&Path>, db_path: Option<String>) -> Result<Settings> {
    let mut settings = Settings::load(config)?;
    if let Some(path) = db_path {
        settings.database.path = path;
    }
    debug!("Using database: {}", settings.database.path);
    Ok(settings)
}

/// Open the configured database, creating it when `create` is set
pub async fn open_store(settings: &Settings, create: bool) -> Result<Arc<LibsqlStore>> {
    let store = if create {
        LibsqlStore::open(&settings.database.path, true).await?
    } else {
        LibsqlStore::open_existing(&settings.database.path).await?
    };
    Ok(Arc::new(store))
}
