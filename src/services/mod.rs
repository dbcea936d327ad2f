//! Services layer for the school evaluation service
//!
//! Operations on top of the store: project and question management, survey
//! links and submission, and the two model-backed features (text analysis, reports).

pub mod analysis;
pub mod llm;
pub mod projects;
pub mod questions;
pub mod report;
pub mod survey;

pub use analysis::{analyze_responses, TextAnalysis};
pub use llm::{ChatCompletion, ChatMessage, ChatRequest, GatewayClient};
pub use report::{generate_report, Report};
