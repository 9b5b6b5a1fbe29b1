//! Provider kind tag identifying a backend family

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// The closed set of supported backend families
///
/// Configuration declares providers by this tag; unknown tags are rejected at
/// parse time rather than silently defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Key-authenticated OpenAI-compatible cloud API
    OpenAi,
    /// Unauthenticated local Ollama API
    Ollama,
}

impl ProviderKind {
    /// Stable string tag used in configuration and logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        }
    }

    /// All supported kinds, in the order providers are configured
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::OpenAi, Self::Ollama]
    }

    /// Whether this family authenticates with a bearer credential
    #[must_use]
    pub const fn requires_credential(&self) -> bool {
        matches!(self, Self::OpenAi)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(DomainError::UnknownProvider(other.to_string())),
        }
    }
}
