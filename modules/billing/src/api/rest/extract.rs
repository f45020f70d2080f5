use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::contract::model::UserRef;

/// Caller identity injected by the auth gateway as headers. Billing never
/// authenticates anyone itself; it only needs the user id and the
/// account-creation timestamp (the last-resort anchor).
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_CREATED_AT_HEADER: &str = "x-user-created-at";

#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserRef);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header_str(parts, USER_ID_HEADER)
            .and_then(|v| Uuid::parse_str(v).ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;
        let created_at = header_str(parts, USER_CREATED_AT_HEADER)
            .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(CurrentUser(UserRef { id, created_at }))
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}
