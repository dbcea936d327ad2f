//! Route groups merged by [`crate::api::ApiServer::build_router`]

pub mod functions;
pub mod health;
pub mod projects;
pub mod survey;
