//! Storage layer for the school evaluation service
//!
//! Provides the [`SurveyStore`] abstraction over the relational schema and
//! its libsql implementation.

pub mod libsql;
mod migrations;
#[cfg(test)]
pub(crate) mod test_utils;

pub use self::libsql::LibsqlStore;

use crate::error::Result;
use crate::types::{
    AnsweredQuestion, AreaId, DomainId, EvaluationArea, EvaluationDomain, Indicator, NewProject,
    NewQuestion, NewResponse, Project, ProjectId, ProjectStatus, Question, QuestionId,
    RespondentType, School, SchoolId, SchoolPublic, Session, SurveyLink, SurveyLinkId, UserRole,
    UserRoleType,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Insert payload for a school account
#[derive(Debug, Clone)]
pub struct NewSchool {
    pub school_code: String,
    pub school_name: String,
    pub password_hash: String,
    pub region: Option<String>,
    pub school_type: Option<String>,
}

/// Storage backend trait defining all required operations
#[async_trait]
pub trait SurveyStore: Send + Sync {
    // --- schools ---

    /// Register a school account
    async fn create_school(&self, school: &NewSchool) -> Result<School>;

    /// Fetch a school by id
    async fn get_school(&self, id: SchoolId) -> Result<School>;

    /// Look up a school by its login code
    async fn find_school_by_code(&self, code: &str) -> Result<Option<School>>;

    /// Replace the stored credential of a school
    async fn update_school_credential(&self, id: SchoolId, password_hash: &str) -> Result<()>;

    /// Public metadata of every school (no credentials)
    async fn list_public_schools(&self) -> Result<Vec<SchoolPublic>>;

    // --- sessions ---

    /// Persist an issued session
    async fn store_session(&self, session: &Session) -> Result<()>;

    /// Fetch a session by token
    async fn get_session(&self, token: &str) -> Result<Option<Session>>;

    /// Drop sessions that expired before `now`, returning how many were removed
    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize>;

    // --- user roles ---

    /// Grant a user a role within a school
    async fn assign_role(
        &self,
        user_id: Uuid,
        school_id: SchoolId,
        role: UserRoleType,
    ) -> Result<UserRole>;

    /// Roles granted within a school
    async fn list_roles(&self, school_id: SchoolId) -> Result<Vec<UserRole>>;

    // --- indicator hierarchy ---

    /// Insert a domain unless its code exists; returns the id either way
    async fn ensure_domain(
        &self,
        code: &str,
        name: &str,
        description: Option<&str>,
        order_index: i64,
    ) -> Result<DomainId>;

    /// Insert an area unless its code exists; returns the id either way
    async fn ensure_area(
        &self,
        domain_id: DomainId,
        code: &str,
        name: &str,
        order_index: i64,
    ) -> Result<AreaId>;

    /// Insert an indicator unless its code exists; returns the row either way
    async fn ensure_indicator(
        &self,
        area_id: AreaId,
        code: &str,
        name: &str,
        order_index: i64,
    ) -> Result<Indicator>;

    async fn list_domains(&self) -> Result<Vec<EvaluationDomain>>;

    async fn list_areas(&self) -> Result<Vec<EvaluationArea>>;

    async fn list_indicators(&self) -> Result<Vec<Indicator>>;

    // --- projects ---

    /// Create a project in `draft` status
    async fn create_project(&self, project: &NewProject) -> Result<Project>;

    async fn get_project(&self, id: ProjectId) -> Result<Project>;

    /// Projects of a school, newest year first
    async fn list_projects(&self, school_id: SchoolId) -> Result<Vec<Project>>;

    async fn update_project_status(&self, id: ProjectId, status: ProjectStatus)
        -> Result<Project>;

    // --- questions ---

    /// Insert questions in one transaction, returning the number inserted
    async fn insert_questions(&self, questions: &[NewQuestion]) -> Result<usize>;

    /// Questions of a project ordered by `order_index`, optionally for one role
    async fn list_questions(
        &self,
        project_id: ProjectId,
        respondent_type: Option<RespondentType>,
    ) -> Result<Vec<Question>>;

    async fn get_question(&self, id: QuestionId) -> Result<Question>;

    /// Write back the editable fields of a question
    async fn update_question(&self, question: &Question) -> Result<Question>;

    /// Delete a question together with its responses
    async fn delete_question(&self, id: QuestionId) -> Result<()>;

    // --- responses ---

    /// Insert responses in one transaction, returning the number inserted
    async fn insert_responses(&self, responses: &[NewResponse]) -> Result<usize>;

    /// Every response of a project joined with its question
    async fn list_answered(&self, project_id: ProjectId) -> Result<Vec<AnsweredQuestion>>;

    // --- survey links ---

    async fn create_survey_link(&self, link: &SurveyLink) -> Result<()>;

    async fn find_survey_link(&self, access_code: &str) -> Result<Option<SurveyLink>>;

    async fn get_survey_link(&self, id: SurveyLinkId) -> Result<SurveyLink>;

    async fn list_survey_links(&self, project_id: ProjectId) -> Result<Vec<SurveyLink>>;

    async fn set_survey_link_active(&self, id: SurveyLinkId, active: bool) -> Result<SurveyLink>;
}
