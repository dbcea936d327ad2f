//! School-scoped project management

use crate::error::{EvalError, Result};
use crate::seeding;
use crate::storage::SurveyStore;
use crate::types::{NewProject, Project, ProjectId, ProjectStatus, SchoolId};
use crate::utils::string::non_blank;
use serde::Serialize;
use std::ops::RangeInclusive;
use tracing::{info, warn};

/// Accepted evaluation years
pub const YEAR_RANGE: RangeInclusive<i32> = 2020..=2099;

/// A created project and the outcome of question seeding
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreated {
    pub project: Project,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions_created: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions_error: Option<String>,
}

/// Create a draft project, seeding standard questions when asked to
///
/// A seeding failure is reported in the result; the project is kept.
pub async fn create_project(
    store: &dyn SurveyStore,
    school_id: SchoolId,
    title: &str,
    year: i32,
    description: Option<&str>,
    seed_questions: bool,
) -> Result<ProjectCreated> {
    let title = title.trim();
    if title.is_empty() {
        return Err(EvalError::InvalidInput("project title is required".to_string()));
    }
    if !YEAR_RANGE.contains(&year) {
        return Err(EvalError::InvalidInput(format!(
            "year must be within {}..={}, got {}",
            YEAR_RANGE.start(),
            YEAR_RANGE.end(),
            year
        )));
    }

    let project = store
        .create_project(&NewProject {
            school_id,
            title: title.to_string(),
            year,
            description: non_blank(description).map(str::to_string),
        })
        .await?;
    info!("Created project {} ({} {})", project.id, project.year, project.title);

    if !seed_questions {
        return Ok(ProjectCreated {
            project,
            questions_created: None,
            questions_error: None,
        });
    }

    match seeding::generate_project_questions(store, project.id).await {
        Ok(n) => Ok(ProjectCreated {
            project,
            questions_created: Some(n),
            questions_error: None,
        }),
        Err(e) => {
            warn!("Question seeding failed for project {}: {}", project.id, e);
            Ok(ProjectCreated {
                project,
                questions_created: None,
                questions_error: Some(e.to_string()),
            })
        }
    }
}

/// Fetch a project owned by `school_id`; other schools' projects read as missing
pub async fn get_owned_project(
    store: &dyn SurveyStore,
    school_id: SchoolId,
    project_id: ProjectId,
) -> Result<Project> {
    let project = store.get_project(project_id).await?;
    if project.school_id != school_id {
        return Err(EvalError::not_found("project", project_id));
    }
    Ok(project)
}

/// Change the status of an owned project
pub async fn update_status(
    store: &dyn SurveyStore,
    school_id: SchoolId,
    project_id: ProjectId,
    status: ProjectStatus,
) -> Result<Project> {
    get_owned_project(store, school_id, project_id).await?;
    let project = store.update_project_status(project_id, status).await?;
    info!("Project {} is now {}", project.id, project.status);
    Ok(project)
}
