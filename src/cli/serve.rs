//! HTTP API server command

use super::helpers::open_store;
use school_eval_core::{
    api::{ApiServer, ApiServerConfig, AppState},
    config::Settings,
    error::Result,
    seeding, GatewayClient,
};
use std::sync::Arc;
use tracing::debug;

/// Handle API server startup command
pub async fn handle(mut settings: Settings, addr: Option<String>) -> Result<()> {
    debug!("Starting HTTP API server...");

    if let Some(addr) = addr {
        settings.server.addr = addr;
    }
    let socket_addr = settings.server_addr()?;

    let store = open_store(&settings, true).await?;
    store.check_health().await?;
    seeding::ensure_standard_hierarchy(store.as_ref()).await?;

    let llm = Arc::new(GatewayClient::new(settings.llm_config())?);

    println!();
    println!("School evaluation API");
    println!("   Address:  http://{}", socket_addr);
    println!("   Database: {}", settings.database.path);
    println!("   Model:    {}", settings.llm.model);
    println!();

    let state = AppState::new(store, llm, settings);
    let server = ApiServer::new(ApiServerConfig { addr: socket_addr }, state);
    server.serve().await?;

    Ok(())
}
