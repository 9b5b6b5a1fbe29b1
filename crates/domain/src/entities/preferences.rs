//! User preferences consumed by the core
//!
//! Callers construct these from their own settings storage; the core treats
//! them as read-only input. Provider credentials are wrapped in
//! [`SecretString`] so they never appear in debug output.

use std::collections::HashMap;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::value_objects::{EmailAddress, ProviderKind};

/// Communication tone used for relationships and signoffs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Formal,
    #[default]
    Professional,
    Casual,
    Friendly,
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Formal => "formal",
            Self::Professional => "professional",
            Self::Casual => "casual",
            Self::Friendly => "friendly",
        };
        write!(f, "{s}")
    }
}

/// A known correspondent and how to talk to them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeholderRecord {
    /// Relationship description, e.g. "direct manager"
    pub relationship: String,
    /// Preferred tone when replying to this person
    pub preferred_tone: Tone,
    /// Free-form notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Signature configuration for generated replies
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignaturePreferences {
    /// Signoff for professional replies, e.g. "Best regards,\n{name}"
    #[serde(default)]
    pub professional_signoff: String,
    /// Signoff for personal replies
    #[serde(default)]
    pub personal_signoff: String,
    /// Overrides both when set; supports `{name}`, `{firstName}`,
    /// `{jobTitle}`, `{department}` and `{email}` placeholders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_template: Option<String>,
}

/// The user on whose behalf replies are drafted
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailAddress>,
    #[serde(default)]
    pub signature: SignaturePreferences,
}

/// Settings for the key-authenticated cloud family
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiSettings {
    /// API credential; the provider is skipped when absent or empty
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Endpoint base URL
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    /// Preferred default model
    #[serde(default = "default_openai_model")]
    pub default_model: String,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            default_model: default_openai_model(),
        }
    }
}

/// Settings for the unauthenticated local family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaSettings {
    /// Endpoint base URL; the provider is skipped when absent
    #[serde(default)]
    pub base_url: Option<String>,
    /// Preferred default model
    #[serde(default = "default_ollama_model")]
    pub default_model: String,
}

fn default_ollama_model() -> String {
    "llama3.2".to_string()
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            default_model: default_ollama_model(),
        }
    }
}

/// Provider configuration plus the default-provider selector
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    /// Which configured provider to prefer
    #[serde(default = "default_provider_kind")]
    pub default_provider: ProviderKind,
    #[serde(default)]
    pub openai: OpenAiSettings,
    #[serde(default)]
    pub ollama: OllamaSettings,
}

const fn default_provider_kind() -> ProviderKind {
    ProviderKind::Ollama
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            default_provider: default_provider_kind(),
            openai: OpenAiSettings::default(),
            ollama: OllamaSettings::default(),
        }
    }
}

impl ProviderSettings {
    /// Whether the given family has enough configuration to construct
    #[must_use]
    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        match kind {
            ProviderKind::OpenAi => self
                .openai
                .api_key
                .as_ref()
                .is_some_and(|key| !key.expose_secret().is_empty()),
            ProviderKind::Ollama => self.ollama.base_url.is_some(),
        }
    }
}

/// Everything the core needs to know about the user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub providers: ProviderSettings,
    /// Known correspondents keyed by lowercase address
    #[serde(default)]
    pub stakeholders: HashMap<String, StakeholderRecord>,
    #[serde(default)]
    pub profile: UserProfile,
}

impl UserPreferences {
    /// Look up the stakeholder record for a sender address
    #[must_use]
    pub fn stakeholder_for(&self, email: &EmailAddress) -> Option<&StakeholderRecord> {
        self.stakeholders.get(email.as_str())
    }

    /// Whether the sender's domain matches any registered stakeholder domain
    #[must_use]
    pub fn shares_stakeholder_domain(&self, email: &EmailAddress) -> bool {
        let domain = email.domain();
        !domain.is_empty()
            && self
                .stakeholders
                .keys()
                .filter_map(|addr| addr.split('@').nth(1))
                .any(|known| known == domain)
    }
}
