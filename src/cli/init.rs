//! Database initialization command

use super::helpers::open_store;
use school_eval_core::{
    config::{Settings, DEFAULT_CONFIG_FILE},
    error::Result,
    seeding,
};
use std::path::Path;
use tracing::debug;

/// Create the database, install the indicator hierarchy and optionally
/// write a configuration template
pub async fn handle(settings: &Settings, write_config: bool) -> Result<()> {
    debug!("Initializing database...");

    let store = open_store(settings, true).await?;
    let indicators = seeding::ensure_standard_hierarchy(store.as_ref()).await?;

    println!("Database initialized: {}", settings.database.path);
    println!("Standard indicators: {}", indicators);

    if write_config {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            println!("{} already exists, leaving it untouched", DEFAULT_CONFIG_FILE);
        } else {
            std::fs::write(path, settings.to_toml()?)?;
            println!("Wrote configuration template: {}", DEFAULT_CONFIG_FILE);
        }
    }
    Ok(())
}
