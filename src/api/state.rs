//! Shared request state and the session extractor

use crate::api::error::ApiError;
use crate::auth::{bearer_token, AuthService};
use crate::config::Settings;
use crate::services::llm::ChatCompletion;
use crate::storage::SurveyStore;
use crate::types::School;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

/// Immutable handles shared by every request
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SurveyStore>,
    pub llm: Arc<dyn ChatCompletion>,
    pub auth: AuthService,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn SurveyStore>,
        llm: Arc<dyn ChatCompletion>,
        settings: Settings,
    ) -> Self {
        let auth = AuthService::new(store.clone(), &settings.auth);
        Self {
            store,
            llm,
            auth,
            settings: Arc::new(settings),
        }
    }
}

/// The school behind the request's bearer session token
pub struct SessionSchool(pub School);

#[async_trait]
impl FromRequestParts<AppState> for SessionSchool {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| ApiError::Unauthorized("missing session token".to_string()))?;

        let school = state.auth.validate_session(token).await?;
        Ok(SessionSchool(school))
    }
}
