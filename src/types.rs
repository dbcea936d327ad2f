//! Core data types for the school evaluation service
//!
//! Rows mirror the relational schema in `migrations/libsql`: schools, the
//! Domain > Area > Indicator hierarchy, projects, questions, responses,
//! survey links, user roles and login sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::EvalError;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random id
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an id from its text form
            pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Identifier of a school row
    SchoolId
);
row_id!(
    /// Identifier of an evaluation project
    ProjectId
);
row_id!(
    /// Identifier of a question
    QuestionId
);
row_id!(
    /// Identifier of an indicator
    IndicatorId
);
row_id!(
    /// Identifier of an evaluation area
    AreaId
);
row_id!(
    /// Identifier of an evaluation domain
    DomainId
);
row_id!(
    /// Identifier of a survey link
    SurveyLinkId
);

/// Enums stored as lowercase text with a CHECK constraint
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident, $label:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every variant in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Text form as stored in the database
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = EvalError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(EvalError::InvalidInput(format!(
                        "unknown {}: {}",
                        $label, other
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(
    /// Lifecycle of an evaluation project
    ProjectStatus, "project status" {
        Draft => "draft",
        Active => "active",
        Closed => "closed",
        Archived => "archived",
    }
);

text_enum!(
    /// How a question is answered
    QuestionType, "question type" {
        Rating => "rating",
        MultipleChoice => "multiple_choice",
        Text => "text",
        Priority => "priority",
    }
);

text_enum!(
    /// The four respondent roles a survey targets
    RespondentType, "respondent type" {
        Teacher => "teacher",
        Staff => "staff",
        Parent => "parent",
        Student => "student",
    }
);

text_enum!(
    /// Role of a user within a school
    UserRoleType, "user role" {
        Admin => "admin",
        Manager => "manager",
        Viewer => "viewer",
    }
);

impl ProjectStatus {
    /// Whether respondents may still open and answer the project's surveys
    pub fn accepts_responses(&self) -> bool {
        matches!(self, ProjectStatus::Draft | ProjectStatus::Active)
    }
}

impl QuestionType {
    /// Whether answers are picked from a list of options
    pub fn takes_options(&self) -> bool {
        matches!(self, QuestionType::MultipleChoice | QuestionType::Priority)
    }
}

impl RespondentType {
    /// Display label used in dashboards and CLI output
    pub fn label(&self) -> &'static str {
        match self {
            RespondentType::Teacher => "교원",
            RespondentType::Staff => "직원",
            RespondentType::Parent => "학부모",
            RespondentType::Student => "학생",
        }
    }
}

/// A school account; `password_hash` never leaves the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct School {
    pub id: SchoolId,
    pub school_code: String,
    pub school_name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub region: Option<String>,
    pub school_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public school metadata (the `schools_public` view)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolPublic {
    pub id: SchoolId,
    pub school_code: String,
    pub school_name: String,
    pub region: Option<String>,
    pub school_type: Option<String>,
}

impl From<&School> for SchoolPublic {
    fn from(school: &School) -> Self {
        Self {
            id: school.id,
            school_code: school.school_code.clone(),
            school_name: school.school_name.clone(),
            region: school.region.clone(),
            school_type: school.school_type.clone(),
        }
    }
}

/// Top level of the indicator hierarchy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationDomain {
    pub id: DomainId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub order_index: i64,
}

/// Second level of the indicator hierarchy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationArea {
    pub id: AreaId,
    pub domain_id: DomainId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub order_index: i64,
}

/// Leaf of the indicator hierarchy; questions hang off indicators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicator {
    pub id: IndicatorId,
    pub area_id: AreaId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub order_index: i64,
}

/// One yearly evaluation campaign of a school
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub school_id: SchoolId,
    pub title: String,
    pub year: i32,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a project
#[derive(Debug, Clone)]
pub struct NewProject {
    pub school_id: SchoolId,
    pub title: String,
    pub year: i32,
    pub description: Option<String>,
}

/// A survey question targeted at one respondent role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub project_id: ProjectId,
    pub indicator_id: Option<IndicatorId>,
    pub respondent_type: RespondentType,
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Option<serde_json::Value>,
    pub section_name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub order_index: i64,
    pub is_required: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a question
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub project_id: ProjectId,
    pub indicator_id: Option<IndicatorId>,
    pub respondent_type: RespondentType,
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Option<serde_json::Value>,
    pub section_name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub order_index: i64,
    pub is_required: bool,
}

/// One answer to one question by one anonymous respondent session
#[derive(Debug, Clone)]
pub struct NewResponse {
    pub project_id: ProjectId,
    pub question_id: QuestionId,
    pub respondent_type: RespondentType,
    pub session_id: String,
    pub response_value: Option<String>,
    pub response_data: Option<serde_json::Value>,
}

/// A response joined with the question it answers
///
/// Statistics, analysis and reports all work over this shape.
#[derive(Debug, Clone, PartialEq)]
pub struct AnsweredQuestion {
    pub respondent_type: RespondentType,
    pub response_value: Option<String>,
    pub question_type: QuestionType,
    pub question_text: String,
    pub section_name: Option<String>,
    pub indicator_code: Option<String>,
}

/// Per-role access code granting anonymous entry to a project's questions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyLink {
    pub id: SurveyLinkId,
    pub project_id: ProjectId,
    pub respondent_type: RespondentType,
    pub access_code: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SurveyLink {
    /// Whether the link's expiry lies in the past at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

/// Scopes a user to a school
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRole {
    pub id: Uuid,
    pub user_id: Uuid,
    pub school_id: SchoolId,
    pub role: UserRoleType,
    pub created_at: DateTime<Utc>,
}

/// An issued login session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub school_id: SchoolId,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
