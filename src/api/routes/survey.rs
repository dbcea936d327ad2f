//! Public respondent routes addressed by access code

use crate::api::error::ApiResult;
use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::services::survey::{self, AnswerInput, SubmissionReceipt, SurveyView};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/survey/:code", get(open_survey))
        .route("/survey/:code/responses", post(submit))
}

async fn open_survey(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<SurveyView>> {
    Ok(Json(
        survey::resolve_survey(state.store.as_ref(), &code, Utc::now()).await?,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub answers: Vec<AnswerInput>,
}

async fn submit(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ApiJson(req): ApiJson<SubmitRequest>,
) -> ApiResult<(StatusCode, Json<SubmissionReceipt>)> {
    let receipt = survey::submit_responses(
        state.store.as_ref(),
        &code,
        req.session_id,
        &req.answers,
        Utc::now(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
