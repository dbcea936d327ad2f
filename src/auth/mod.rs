//! School login and session validation
//!
//! A school signs in with its code and password. Legacy credentials
//! (plaintext, PBKDF2) are verified and then rewritten as bcrypt; the rewrite
//! never fails the login. A successful login yields an opaque session token
//! that authorizes the school-scoped routes until it expires.

pub mod credentials;
pub mod session;

pub use credentials::{hash_credential, verify_credential, CredentialFormat};
pub use session::{bearer_token, issue_session};

use crate::config::AuthSettings;
use crate::error::{EvalError, Result};
use crate::storage::SurveyStore;
use crate::types::{School, SchoolId};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// School fields returned to the client on login
#[derive(Debug, Clone, Serialize)]
pub struct LoginSchool {
    pub id: SchoolId,
    pub school_code: String,
    pub school_name: String,
}

/// Result of a successful login
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub school: LoginSchool,
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
    /// Whether the stored credential was rewritten as bcrypt
    #[serde(skip)]
    pub credential_upgraded: bool,
}

/// Login and session operations over a [`SurveyStore`]
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn SurveyStore>,
    session_ttl: Duration,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(store: Arc<dyn SurveyStore>, settings: &AuthSettings) -> Self {
        Self {
            store,
            session_ttl: Duration::hours(settings.session_ttl_hours),
            bcrypt_cost: settings.bcrypt_cost,
        }
    }

    /// Verify a school's credential and open a session
    pub async fn login(&self, school_code: &str, password: &str) -> Result<LoginOutcome> {
        let school_code = school_code.trim();
        if school_code.is_empty() || password.is_empty() {
            debug!("Missing credentials");
            return Err(EvalError::InvalidInput(
                "학교 코드와 비밀번호를 입력해주세요.".to_string(),
            ));
        }

        let school = match self.store.find_school_by_code(school_code).await? {
            Some(school) => school,
            None => {
                info!("School not found: {}", school_code);
                return Err(EvalError::Unauthorized(
                    "학교 코드를 찾을 수 없습니다.".to_string(),
                ));
            }
        };

        let format = CredentialFormat::detect(&school.password_hash);
        let valid = {
            let password = password.to_string();
            let stored = school.password_hash.clone();
            tokio::task::spawn_blocking(move || verify_credential(&password, &stored))
                .await
                .map_err(|e| EvalError::Other(format!("credential check aborted: {}", e)))??
        };
        if !valid {
            info!("Invalid password for school: {}", school_code);
            return Err(EvalError::Unauthorized(
                "비밀번호가 올바르지 않습니다.".to_string(),
            ));
        }

        let credential_upgraded = format.needs_upgrade() && self.upgrade(&school, password).await;

        let now = Utc::now();
        match self.store.purge_expired_sessions(now).await {
            Ok(0) => {}
            Ok(n) => debug!("Purged {} expired sessions", n),
            Err(e) => warn!("Failed to purge expired sessions: {}", e),
        }

        let session = issue_session(school.id, self.session_ttl, now);
        self.store.store_session(&session).await?;

        info!("Login successful for school: {}", school.school_name);
        Ok(LoginOutcome {
            school: LoginSchool {
                id: school.id,
                school_code: school.school_code,
                school_name: school.school_name,
            },
            session_token: session.token,
            expires_at: session.expires_at,
            credential_upgraded,
        })
    }

    /// Rewrite a legacy credential as bcrypt; failures are logged, not returned
    async fn upgrade(&self, school: &School, password: &str) -> bool {
        info!("Upgrading credential to bcrypt for school: {}", school.school_code);
        let hashed = match self.hash_password(password).await {
            Ok(hashed) => hashed,
            Err(e) => {
                warn!("Credential upgrade failed for {}: {}", school.school_code, e);
                return false;
            }
        };
        match self.store.update_school_credential(school.id, &hashed).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Credential upgrade failed for {}: {}", school.school_code, e);
                false
            }
        }
    }

    /// bcrypt-hash a password off the async runtime
    pub async fn hash_password(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || hash_credential(&password, cost))
            .await
            .map_err(|e| EvalError::Other(format!("credential hashing aborted: {}", e)))?
    }

    /// Resolve a session token to its school
    pub async fn validate_session(&self, token: &str) -> Result<School> {
        let session = self
            .store
            .get_session(token)
            .await?
            .ok_or_else(|| EvalError::Unauthorized("invalid session".to_string()))?;

        if session.expires_at <= Utc::now() {
            debug!("Rejected expired session for school {}", session.school_id);
            return Err(EvalError::Unauthorized("session expired".to_string()));
        }

        self.store.get_school(session.school_id).await
    }
}
