//! Application-level errors

use ai_core::ProviderError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// The classification gate refused the request
    ///
    /// Fatal to the request and never retried; carries the human-readable
    /// reason and a suggested escalation path. A failed detection maps here
    /// too, per the fail-closed policy.
    #[error("Message processing blocked: {reason}")]
    ClassificationBlocked {
        reason: String,
        suggested_action: String,
    },

    /// No healthy provider is available
    ///
    /// Surfaced as "configure a provider"; not retried automatically.
    #[error("No healthy AI provider available - configure a provider")]
    ProviderUnavailable,

    /// A backend call failed after the executor's retry budget
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ApplicationError {
    /// Whether the caller may reasonably retry the request
    ///
    /// Classification decisions are final within a request; transport
    /// failures may be retried at a higher level.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider(_))
    }
}
