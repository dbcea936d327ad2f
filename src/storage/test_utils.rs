//! Test utilities for storage initialization
//!
//! libsql gives every connection to `:memory:` its own database, so tests use
//! a migrated file inside a temporary directory instead.

use crate::error::Result;
use crate::storage::{LibsqlStore, NewSchool, SurveyStore};
use crate::types::{NewProject, Project, School};
use std::sync::Arc;
use tempfile::TempDir;

/// Create a migrated store; keep the returned directory alive for the test
pub async fn create_test_store() -> Result<(TempDir, Arc<LibsqlStore>)> {
    let dir = TempDir::new()?;
    let path = dir.path().join("test.db");
    let store = LibsqlStore::open(&path.to_string_lossy(), true).await?;
    Ok((dir, Arc::new(store)))
}

/// Insert a school whose credential is stored as given
pub async fn seed_school(store: &dyn SurveyStore, code: &str, credential: &str) -> Result<School> {
    store
        .create_school(&NewSchool {
            school_code: code.to_string(),
            school_name: format!("{} 초등학교", code),
            password_hash: credential.to_string(),
            region: None,
            school_type: None,
        })
        .await
}

/// Insert a draft project for `school`
pub async fn seed_project(store: &dyn SurveyStore, school: &School, year: i32) -> Result<Project> {
    store
        .create_project(&NewProject {
            school_id: school.id,
            title: format!("{} 학교평가", year),
            year,
            description: None,
        })
        .await
}
