use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::api::rest::dto::LimitExceededDto;
use crate::domain::error::DomainError;

/// Map a domain error to an HTTP response.
///
/// LimitExceeded is the only error shown verbatim to end users: it becomes a
/// 402 with the full structured payload so the UI can render the upgrade
/// prompt without a second round-trip. Everything else is a generic 500.
pub fn domain_error_response(error: DomainError) -> Response {
    match error {
        DomainError::LimitExceeded(payload) => {
            let dto = LimitExceededDto::from(payload);
            (StatusCode::PAYMENT_REQUIRED, Json(dto)).into_response()
        }
        DomainError::Database { .. } | DomainError::SubscriptionLookup { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "code": "INTERNAL", "message": "Something went wrong, try again" })),
        )
            .into_response(),
    }
}
