use thiserror::Error;

use crate::contract::model::LimitExceeded;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone)]
pub enum BillingError {
    /// Expected, user-facing, recoverable by upgrading. Carries the full
    /// payload the UI needs for the upgrade prompt.
    #[error("{}", .0.message)]
    LimitExceeded(LimitExceeded),

    /// Storage or provider failure. The metered action did not happen.
    #[error("Internal billing error")]
    Internal,
}

impl BillingError {
    pub fn limit_exceeded(payload: LimitExceeded) -> Self {
        Self::LimitExceeded(payload)
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}
