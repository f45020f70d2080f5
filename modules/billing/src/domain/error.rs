use thiserror::Error;

use crate::contract::model::LimitExceeded;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{}", .0.message)]
    LimitExceeded(LimitExceeded),

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Subscription lookup failed: {message}")]
    SubscriptionLookup { message: String },
}

impl DomainError {
    pub fn limit_exceeded(payload: LimitExceeded) -> Self {
        Self::LimitExceeded(payload)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn subscription_lookup(message: impl Into<String>) -> Self {
        Self::SubscriptionLookup {
            message: message.into(),
        }
    }
}
