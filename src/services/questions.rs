//! Hand-written questions on top of the seeded standard set
//!
//! Schools add, edit and remove questions of their own projects. Choice
//! questions (`multiple_choice`, `priority`) carry a list of options; the
//! other types carry none.

use crate::error::{EvalError, Result};
use crate::services::projects::get_owned_project;
use crate::storage::SurveyStore;
use crate::types::{
    IndicatorId, NewQuestion, ProjectId, Question, QuestionId, QuestionType, RespondentType,
    SchoolId,
};
use crate::utils::string::non_blank;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::info;

/// Fields of a new question
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    pub respondent_type: RespondentType,
    pub question_text: String,
    #[serde(default = "default_question_type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Option<Value>,
    #[serde(default)]
    pub section_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub indicator_id: Option<IndicatorId>,
    /// Placed after the last question when absent
    #[serde(default)]
    pub order_index: Option<i64>,
    #[serde(default)]
    pub is_required: Option<bool>,
}

fn default_question_type() -> QuestionType {
    QuestionType::Rating
}

/// Changes to an existing question; absent fields stay as they are
///
/// Blank text clears `sectionName`, `description` and `imageUrl`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPatch {
    pub respondent_type: Option<RespondentType>,
    pub question_text: Option<String>,
    pub question_type: Option<QuestionType>,
    pub options: Option<Value>,
    pub section_name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub order_index: Option<i64>,
    pub is_required: Option<bool>,
}

fn question_text(text: &str) -> Result<String> {
    non_blank(Some(text))
        .map(str::to_string)
        .ok_or_else(|| EvalError::InvalidInput("question text is required".to_string()))
}

/// Options normalized to a list of trimmed labels, checked against the type
fn checked_options(question_type: QuestionType, options: Option<&Value>) -> Result<Option<Value>> {
    if !question_type.takes_options() {
        return match options {
            None | Some(Value::Null) => Ok(None),
            Some(_) => Err(EvalError::InvalidInput(format!(
                "{} questions take no options",
                question_type
            ))),
        };
    }

    let items = options.and_then(Value::as_array).ok_or_else(|| {
        EvalError::InvalidInput(format!("{} questions need a list of options", question_type))
    })?;
    let labels = items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(|label| Value::String(label.to_string()))
                .ok_or_else(|| {
                    EvalError::InvalidInput("options must be non-blank strings".to_string())
                })
        })
        .collect::<Result<Vec<_>>>()?;
    if labels.is_empty() {
        return Err(EvalError::InvalidInput(format!(
            "{} questions need at least one option",
            question_type
        )));
    }
    Ok(Some(Value::Array(labels)))
}

async fn check_indicator(store: &dyn SurveyStore, id: Option<IndicatorId>) -> Result<()> {
    let Some(id) = id else {
        return Ok(());
    };
    if store.list_indicators().await?.iter().any(|i| i.id == id) {
        Ok(())
    } else {
        Err(EvalError::not_found("indicator", id))
    }
}

/// Fetch a question of a project owned by `school_id`
pub async fn get_owned_question(
    store: &dyn SurveyStore,
    school_id: SchoolId,
    question_id: QuestionId,
) -> Result<Question> {
    let question = store.get_question(question_id).await?;
    match get_owned_project(store, school_id, question.project_id).await {
        Ok(_) => Ok(question),
        Err(EvalError::NotFound { .. }) => Err(EvalError::not_found("question", question_id)),
        Err(e) => Err(e),
    }
}

/// Add a question to an owned project
pub async fn add_question(
    store: &dyn SurveyStore,
    school_id: SchoolId,
    project_id: ProjectId,
    input: &QuestionInput,
) -> Result<Question> {
    get_owned_project(store, school_id, project_id).await?;

    let text = question_text(&input.question_text)?;
    let options = checked_options(input.question_type, input.options.as_ref())?;
    check_indicator(store, input.indicator_id).await?;

    let existing = store.list_questions(project_id, None).await?;
    let order_index = match input.order_index {
        Some(order) => order,
        None => existing.iter().map(|q| q.order_index).max().unwrap_or(0) + 1,
    };

    store
        .insert_questions(&[NewQuestion {
            project_id,
            indicator_id: input.indicator_id,
            respondent_type: input.respondent_type,
            question_text: text,
            question_type: input.question_type,
            options,
            section_name: non_blank(input.section_name.as_deref()).map(str::to_string),
            description: non_blank(input.description.as_deref()).map(str::to_string),
            image_url: non_blank(input.image_url.as_deref()).map(str::to_string),
            order_index,
            is_required: input.is_required.unwrap_or(true),
        }])
        .await?;

    let known: HashSet<QuestionId> = existing.iter().map(|q| q.id).collect();
    let created = store
        .list_questions(project_id, Some(input.respondent_type))
        .await?
        .into_iter()
        .find(|q| !known.contains(&q.id))
        .ok_or_else(|| EvalError::Database("inserted question not found".to_string()))?;
    info!(
        "Added {} question {} to project {}",
        created.question_type, created.id, project_id
    );
    Ok(created)
}

/// Apply a patch to a question of an owned project
///
/// Switching to a type without options drops the stored options.
pub async fn update_question(
    store: &dyn SurveyStore,
    school_id: SchoolId,
    question_id: QuestionId,
    patch: &QuestionPatch,
) -> Result<Question> {
    let mut question = get_owned_question(store, school_id, question_id).await?;

    if let Some(text) = &patch.question_text {
        question.question_text = question_text(text)?;
    }
    if let Some(respondent_type) = patch.respondent_type {
        question.respondent_type = respondent_type;
    }
    if let Some(question_type) = patch.question_type {
        question.question_type = question_type;
    }
    let options = match &patch.options {
        Some(options) => Some(options),
        None if question.question_type.takes_options() => question.options.as_ref(),
        None => None,
    };
    question.options = checked_options(question.question_type, options)?;

    if let Some(section) = &patch.section_name {
        question.section_name = non_blank(Some(section.as_str())).map(str::to_string);
    }
    if let Some(description) = &patch.description {
        question.description = non_blank(Some(description.as_str())).map(str::to_string);
    }
    if let Some(image_url) = &patch.image_url {
        question.image_url = non_blank(Some(image_url.as_str())).map(str::to_string);
    }
    if let Some(order_index) = patch.order_index {
        question.order_index = order_index;
    }
    if let Some(is_required) = patch.is_required {
        question.is_required = is_required;
    }

    let updated = store.update_question(&question).await?;
    info!("Updated question {}", updated.id);
    Ok(updated)
}

/// Remove a question and its responses from an owned project
pub async fn delete_question(
    store: &dyn SurveyStore,
    school_id: SchoolId,
    question_id: QuestionId,
) -> Result<()> {
    get_owned_question(store, school_id, question_id).await?;
    store.delete_question(question_id).await?;
    info!("Deleted question {}", question_id);
    Ok(())
}
