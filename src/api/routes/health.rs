//! Liveness and public reference data: schools and the indicator hierarchy

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::seeding::{self, DomainNode};
use crate::types::SchoolPublic;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/schools", get(list_schools))
        .route("/indicators", get(list_indicators))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model: String,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.settings.llm.model.clone(),
    })
}

async fn list_schools(State(state): State<AppState>) -> ApiResult<Json<Vec<SchoolPublic>>> {
    Ok(Json(state.store.list_public_schools().await?))
}

async fn list_indicators(State(state): State<AppState>) -> ApiResult<Json<Vec<DomainNode>>> {
    Ok(Json(seeding::indicator_tree(state.store.as_ref()).await?))
}
