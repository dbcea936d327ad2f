//! Function-style endpoints: `POST /functions/<name>` with a JSON body

use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::auth::LoginOutcome;
use crate::error::EvalError;
use crate::seeding;
use crate::services::{analysis, report, Report, TextAnalysis};
use crate::types::ProjectId;
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

const MISSING_CREDENTIALS: &str = "학교 코드와 비밀번호를 입력해주세요.";
const MISSING_PROJECT: &str = "프로젝트 ID가 필요합니다.";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/functions/secure-login", post(secure_login))
        .route(
            "/functions/generate-project-questions",
            post(generate_project_questions),
        )
        .route("/functions/analyze-responses", post(analyze_responses))
        .route("/functions/generate-report", post(generate_report))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub school_code: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: LoginOutcome,
}

async fn secure_login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (Some(code), Some(password)) = (req.school_code, req.password) else {
        return Err(ApiError::BadRequest(MISSING_CREDENTIALS.to_string()));
    };

    let outcome = state
        .auth
        .login(&code, &password)
        .await
        .map_err(|e| ApiError::masked(e, "로그인 처리 중 오류가 발생했습니다."))?;

    Ok(Json(LoginResponse {
        success: true,
        outcome,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    #[serde(default)]
    pub project_id: Option<String>,
}

impl ProjectRequest {
    fn project_id(&self) -> ApiResult<ProjectId> {
        let raw = self
            .project_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::BadRequest(MISSING_PROJECT.to_string()))?;
        Ok(ProjectId::from_string(raw).map_err(EvalError::from)?)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionsResponse {
    pub success: bool,
    pub questions_created: usize,
}

async fn generate_project_questions(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ProjectRequest>,
) -> ApiResult<Json<QuestionsResponse>> {
    let project_id = req.project_id()?;
    let created = seeding::generate_project_questions(state.store.as_ref(), project_id).await?;

    Ok(Json(QuestionsResponse {
        success: true,
        questions_created: created,
    }))
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub analysis: TextAnalysis,
}

async fn analyze_responses(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ProjectRequest>,
) -> ApiResult<Json<AnalysisResponse>> {
    let project_id = req.project_id()?;
    let analysis =
        analysis::analyze_responses(state.store.as_ref(), state.llm.as_ref(), project_id)
            .await
            .map_err(|e| ApiError::masked(e, "분석 중 오류가 발생했습니다."))?;

    Ok(Json(AnalysisResponse {
        success: true,
        analysis,
    }))
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub success: bool,
    pub report: Report,
}

async fn generate_report(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ProjectRequest>,
) -> ApiResult<Json<ReportResponse>> {
    let project_id = req.project_id()?;
    let report = report::generate_report(state.store.as_ref(), state.llm.as_ref(), project_id)
        .await
        .map_err(|e| ApiError::masked(e, "보고서 생성 중 오류가 발생했습니다."))?;

    Ok(Json(ReportResponse {
        success: true,
        report,
    }))
}
