//! Provider errors

use domain::ProviderKind;
use thiserror::Error;

use crate::executor::REQUEST_TIMEOUT_MS;

/// Errors that can occur while talking to a backend provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Failed to connect to the backend
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request failed after exhausting the retry budget
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Request timed out
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Backend returned a non-success status
    #[error("Server error (status {status}): {body}")]
    ServerError { status: u16, body: String },

    /// Response envelope could not be parsed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A credentialed provider was configured without a credential
    #[error("Missing credential for provider: {0}")]
    MissingCredential(ProviderKind),

    /// Configuration declared a provider kind this build does not support
    #[error("Unsupported provider kind: {0}")]
    UnsupportedProvider(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(REQUEST_TIMEOUT_MS)
        } else if err.is_connect() {
            Self::ConnectionFailed(err.to_string())
        } else {
            Self::RequestFailed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_message_includes_status_and_body() {
        let err = ProviderError::ServerError {
            status: 503,
            body: "overloaded".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("overloaded"));
    }

    #[test]
    fn timeout_message_includes_budget() {
        let err = ProviderError::Timeout(30_000);
        assert!(err.to_string().contains("30000"));
    }

    #[test]
    fn missing_credential_names_the_provider() {
        let err = ProviderError::MissingCredential(ProviderKind::OpenAi);
        assert!(err.to_string().contains("openai"));
    }

    #[test]
    fn unsupported_provider_names_the_tag() {
        let err = ProviderError::UnsupportedProvider("watson".to_string());
        assert!(err.to_string().contains("watson"));
    }
}
