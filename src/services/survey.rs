//! Survey links and anonymous submission
//!
//! A link grants one respondent role access to a project's questions through
//! an 8-character access code. Respondents submit without logging in; every
//! answer is checked against the link before anything is stored.

use crate::error::{EvalError, Result};
use crate::storage::SurveyStore;
use crate::types::{
    NewResponse, Project, ProjectId, Question, QuestionId, RespondentType, SurveyLink,
    SurveyLinkId,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

const ACCESS_CODE_LEN: usize = 8;
const ACCESS_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const MAX_CODE_ATTEMPTS: usize = 5;

/// What a respondent sees after opening a link
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyView {
    pub project_id: ProjectId,
    pub project_title: String,
    pub year: i32,
    pub respondent_type: RespondentType,
    pub questions: Vec<Question>,
}

/// One submitted answer
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    pub question_id: QuestionId,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub session_id: String,
    pub responses_saved: usize,
}

/// Random uppercase alphanumeric access code
pub fn generate_access_code() -> String {
    let mut rng = rand::thread_rng();
    (0..ACCESS_CODE_LEN)
        .map(|_| ACCESS_CODE_CHARSET[rng.gen_range(0..ACCESS_CODE_CHARSET.len())] as char)
        .collect()
}

/// Create an active link for one respondent role of a project
pub async fn create_link(
    store: &dyn SurveyStore,
    project_id: ProjectId,
    respondent_type: RespondentType,
    expires_at: Option<DateTime<Utc>>,
) -> Result<SurveyLink> {
    store.get_project(project_id).await?;

    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_access_code();
        if store.find_survey_link(&code).await?.is_some() {
            debug!("Access code collision, retrying");
            continue;
        }

        let link = SurveyLink {
            id: SurveyLinkId::new(),
            project_id,
            respondent_type,
            access_code: code,
            is_active: true,
            expires_at,
            created_at: Utc::now(),
        };
        store.create_survey_link(&link).await?;
        info!(
            "Created {} link {} for project {}",
            respondent_type, link.access_code, project_id
        );
        return Ok(link);
    }

    Err(EvalError::Other(
        "could not allocate a unique access code".to_string(),
    ))
}

/// Look up a link that may be used at `now`
async fn usable_link(
    store: &dyn SurveyStore,
    access_code: &str,
    now: DateTime<Utc>,
) -> Result<SurveyLink> {
    let code = access_code.trim().to_uppercase();
    let link = store
        .find_survey_link(&code)
        .await?
        .filter(|l| l.is_active)
        .ok_or_else(|| EvalError::not_found("survey link", &code))?;

    if link.is_expired(now) {
        return Err(EvalError::InvalidInput("survey link has expired".to_string()));
    }
    Ok(link)
}

/// The project behind a link, refused once it is closed or archived
async fn open_project(store: &dyn SurveyStore, link: &SurveyLink) -> Result<Project> {
    let project = store.get_project(link.project_id).await?;
    if !project.status.accepts_responses() {
        return Err(EvalError::InvalidInput(format!(
            "survey is no longer accepting responses (project is {})",
            project.status
        )));
    }
    Ok(project)
}

/// Resolve an access code to the project title and the role's questions
pub async fn resolve_survey(
    store: &dyn SurveyStore,
    access_code: &str,
    now: DateTime<Utc>,
) -> Result<SurveyView> {
    let link = usable_link(store, access_code, now).await?;
    let project = open_project(store, &link).await?;
    let questions = store
        .list_questions(project.id, Some(link.respondent_type))
        .await?;

    Ok(SurveyView {
        project_id: project.id,
        project_title: project.title,
        year: project.year,
        respondent_type: link.respondent_type,
        questions,
    })
}

/// Store one respondent's answers in a single transaction
///
/// Draft and active projects take responses; closed and archived ones do not.
pub async fn submit_responses(
    store: &dyn SurveyStore,
    access_code: &str,
    session_id: Option<String>,
    answers: &[AnswerInput],
    now: DateTime<Utc>,
) -> Result<SubmissionReceipt> {
    if answers.is_empty() {
        return Err(EvalError::InvalidInput("no answers submitted".to_string()));
    }

    let link = usable_link(store, access_code, now).await?;
    open_project(store, &link).await?;
    let allowed: HashSet<QuestionId> = store
        .list_questions(link.project_id, Some(link.respondent_type))
        .await?
        .into_iter()
        .map(|q| q.id)
        .collect();

    let session_id = session_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut rows = Vec::with_capacity(answers.len());
    for answer in answers {
        if !allowed.contains(&answer.question_id) {
            return Err(EvalError::InvalidInput(format!(
                "question {} is not part of this {} survey",
                answer.question_id, link.respondent_type
            )));
        }
        rows.push(NewResponse {
            project_id: link.project_id,
            question_id: answer.question_id,
            respondent_type: link.respondent_type,
            session_id: session_id.clone(),
            response_value: answer.value.clone(),
            response_data: answer.data.clone(),
        });
    }

    let saved = store.insert_responses(&rows).await?;
    info!(
        "Saved {} {} responses for project {}",
        saved, link.respondent_type, link.project_id
    );

    Ok(SubmissionReceipt {
        session_id,
        responses_saved: saved,
    })
}
