//! HTTP API for the school evaluation service
//!
//! Provides:
//! - Function-style endpoints (`/functions/...`) for login, question seeding,
//!   analysis and reports
//! - Session-scoped project, statistics and survey-link routes
//! - Public survey routes for respondents

pub mod error;
pub mod extract;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use extract::{ApiJson, ApiQuery};
pub use server::{ApiServer, ApiServerConfig};
pub use state::{AppState, SessionSchool};
