//! School-scoped project, question, indicator, statistics and link routes
//!
//! Every handler requires a bearer session; projects of other schools read as
//! missing.

use crate::api::error::ApiResult;
use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::state::{AppState, SessionSchool};
use crate::error::EvalError;
use crate::services::questions::{self, QuestionInput, QuestionPatch};
use crate::services::{projects, survey};
use crate::stats::{self, ProjectStats};
use crate::types::{
    Project, ProjectId, ProjectStatus, Question, QuestionId, RespondentType, SurveyLink,
    SurveyLinkId,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/:id", get(get_project))
        .route("/projects/:id/status", post(update_status))
        .route(
            "/projects/:id/questions",
            get(list_questions).post(create_question),
        )
        .route("/questions/:id", patch(update_question).delete(delete_question))
        .route("/projects/:id/stats", get(project_stats))
        .route("/projects/:id/links", get(list_links).post(create_link))
        .route("/links/:id/deactivate", post(deactivate_link))
}

fn parse_project_id(raw: &str) -> Result<ProjectId, EvalError> {
    Ok(ProjectId::from_string(raw)?)
}

async fn list_projects(
    State(state): State<AppState>,
    SessionSchool(school): SessionSchool,
) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.store.list_projects(school.id).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub title: String,
    pub year: i32,
    #[serde(default)]
    pub description: Option<String>,
}

async fn create_project(
    State(state): State<AppState>,
    SessionSchool(school): SessionSchool,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<projects::ProjectCreated>)> {
    let created = projects::create_project(
        state.store.as_ref(),
        school.id,
        &req.title,
        req.year,
        req.description.as_deref(),
        state.settings.projects.auto_generate_questions,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_project(
    State(state): State<AppState>,
    SessionSchool(school): SessionSchool,
    Path(id): Path<String>,
) -> ApiResult<Json<Project>> {
    let id = parse_project_id(&id)?;
    Ok(Json(
        projects::get_owned_project(state.store.as_ref(), school.id, id).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

async fn update_status(
    State(state): State<AppState>,
    SessionSchool(school): SessionSchool,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<StatusRequest>,
) -> ApiResult<Json<Project>> {
    let id = parse_project_id(&id)?;
    let status: ProjectStatus = req.status.parse()?;
    Ok(Json(
        projects::update_status(state.store.as_ref(), school.id, id, status).await?,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionQuery {
    #[serde(default)]
    pub respondent_type: Option<String>,
}

async fn list_questions(
    State(state): State<AppState>,
    SessionSchool(school): SessionSchool,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<QuestionQuery>,
) -> ApiResult<Json<Vec<Question>>> {
    let id = parse_project_id(&id)?;
    projects::get_owned_project(state.store.as_ref(), school.id, id).await?;

    let respondent_type = query
        .respondent_type
        .as_deref()
        .map(str::parse::<RespondentType>)
        .transpose()?;
    Ok(Json(state.store.list_questions(id, respondent_type).await?))
}

async fn create_question(
    State(state): State<AppState>,
    SessionSchool(school): SessionSchool,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<QuestionInput>,
) -> ApiResult<(StatusCode, Json<Question>)> {
    let id = parse_project_id(&id)?;
    let question = questions::add_question(state.store.as_ref(), school.id, id, &input).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

fn parse_question_id(raw: &str) -> Result<QuestionId, EvalError> {
    Ok(QuestionId::from_string(raw)?)
}

async fn update_question(
    State(state): State<AppState>,
    SessionSchool(school): SessionSchool,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<QuestionPatch>,
) -> ApiResult<Json<Question>> {
    let id = parse_question_id(&id)?;
    Ok(Json(
        questions::update_question(state.store.as_ref(), school.id, id, &patch).await?,
    ))
}

async fn delete_question(
    State(state): State<AppState>,
    SessionSchool(school): SessionSchool,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_question_id(&id)?;
    questions::delete_question(state.store.as_ref(), school.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn project_stats(
    State(state): State<AppState>,
    SessionSchool(school): SessionSchool,
    Path(id): Path<String>,
) -> ApiResult<Json<ProjectStats>> {
    let id = parse_project_id(&id)?;
    projects::get_owned_project(state.store.as_ref(), school.id, id).await?;
    Ok(Json(stats::compute_project_stats(state.store.as_ref(), id).await?))
}

async fn list_links(
    State(state): State<AppState>,
    SessionSchool(school): SessionSchool,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<SurveyLink>>> {
    let id = parse_project_id(&id)?;
    projects::get_owned_project(state.store.as_ref(), school.id, id).await?;
    Ok(Json(state.store.list_survey_links(id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    pub respondent_type: RespondentType,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

async fn create_link(
    State(state): State<AppState>,
    SessionSchool(school): SessionSchool,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<CreateLinkRequest>,
) -> ApiResult<(StatusCode, Json<SurveyLink>)> {
    let id = parse_project_id(&id)?;
    projects::get_owned_project(state.store.as_ref(), school.id, id).await?;
    let link = survey::create_link(state.store.as_ref(), id, req.respondent_type, req.expires_at).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

async fn deactivate_link(
    State(state): State<AppState>,
    SessionSchool(school): SessionSchool,
    Path(id): Path<String>,
) -> ApiResult<Json<SurveyLink>> {
    let link_id = SurveyLinkId::from_string(&id).map_err(EvalError::from)?;
    let link = state.store.get_survey_link(link_id).await?;
    projects::get_owned_project(state.store.as_ref(), school.id, link.project_id).await?;
    Ok(Json(state.store.set_survey_link_active(link_id, false).await?))
}
