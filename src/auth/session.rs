//! Opaque session tokens

use crate::types::{SchoolId, Session};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Issue a fresh random token for `school_id`, valid for `ttl` from `now`
pub fn issue_session(school_id: SchoolId, ttl: Duration, now: DateTime<Utc>) -> Session {
    Session {
        token: Uuid::new_v4().to_string(),
        school_id,
        expires_at: now + ttl,
        created_at: now,
    }
}

/// Strip an optional `Bearer ` prefix from an authorization header value
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .unwrap_or(header)
        .trim();
    (!token.is_empty()).then_some(token)
}
