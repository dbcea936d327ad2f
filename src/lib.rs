//! School evaluation - survey service for school self-evaluation
//!
//! Schools sign in, create yearly evaluation projects seeded with standard
//! indicator-based questions, share per-role survey links with teachers,
//! staff, parents and students, and review statistics plus model-assisted
//! text analysis and narrative reports.
//!
//! # Architecture
//!
//! The system is organized into several layers:
//! - **Types**: Rows of the relational schema (School, Project, Question, ...)
//! - **Storage**: [`SurveyStore`] and its libsql backend
//! - **Auth / Seeding / Stats**: login and sessions, question templates,
//!   response aggregation
//! - **Services**: projects, survey links, and the chat-completion backed
//!   analysis and reports
//! - **API**: axum router exposing all of the above over HTTP
//!
//! # Example
//!
//! ```ignore
//! use school_eval_core::{seeding, stats, LibsqlStore};
//!
//! #[tokio::main]
//! async fn main() -> school_eval_core::Result<()> {
//!     let store = LibsqlStore::open("school-eval.db", true).await?;
//!     seeding::ensure_standard_hierarchy(&store).await?;
//!
//!     let created = seeding::generate_project_questions(&store, project_id).await?;
//!     let summary = stats::compute_project_stats(&store, project_id).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod seeding;
pub mod services;
pub mod stats;
pub mod storage;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use auth::{AuthService, LoginOutcome};
pub use config::Settings;
pub use error::{EvalError, Result};
pub use services::{ChatCompletion, GatewayClient};
pub use stats::{ProjectStats, ReportStats};
pub use storage::{LibsqlStore, SurveyStore};
pub use types::{
    Project, ProjectId, ProjectStatus, Question, QuestionType, RespondentType, School, SchoolId,
    SurveyLink,
};
