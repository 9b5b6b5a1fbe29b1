//! Port definitions for provider adapters
//!
//! Defines the capability contract every backend variant implements, plus
//! the descriptor and health types the manager tracks per provider. Variants
//! differ only in auth, endpoint shapes and response unwrapping; callers
//! never see an endpoint-specific response shape.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{MessageContext, ProviderKind, UserPreferences};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::prompt::{self, StyleFlags};

/// Feature capabilities of a backend family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    pub streaming: bool,
    pub function_calling: bool,
    pub vision: bool,
    pub embedding: bool,
    pub max_context_length: u32,
}

/// Rate limits of a backend family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits {
    pub requests_per_minute: u32,
    pub tokens_per_minute: u32,
    pub concurrent_requests: u32,
}

/// Static description of a configured provider
///
/// Created at initialization from user configuration and replaced wholesale
/// on re-initialization; never partially mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub kind: ProviderKind,
    pub display_name: String,
    pub base_url: String,
    /// Whether a credential is configured (the credential itself never
    /// leaves the executor)
    pub has_credential: bool,
    pub capabilities: ProviderCapabilities,
    pub rate_limits: RateLimits,
}

impl ProviderDescriptor {
    /// Descriptor for the key-authenticated cloud family
    #[must_use]
    pub fn openai(base_url: impl Into<String>) -> Self {
        Self {
            kind: ProviderKind::OpenAi,
            display_name: "OpenAI".to_string(),
            base_url: base_url.into(),
            has_credential: true,
            capabilities: ProviderCapabilities {
                streaming: true,
                function_calling: true,
                vision: false,
                embedding: true,
                max_context_length: 128_000,
            },
            rate_limits: RateLimits {
                requests_per_minute: 60,
                tokens_per_minute: 150_000,
                concurrent_requests: 10,
            },
        }
    }

    /// Descriptor for the unauthenticated local family
    #[must_use]
    pub fn ollama(base_url: impl Into<String>) -> Self {
        Self {
            kind: ProviderKind::Ollama,
            display_name: "Ollama".to_string(),
            base_url: base_url.into(),
            has_credential: false,
            capabilities: ProviderCapabilities {
                streaming: true,
                function_calling: false,
                vision: false,
                embedding: false,
                max_context_length: 128_000,
            },
            rate_limits: RateLimits {
                requests_per_minute: 1000,
                tokens_per_minute: 1_000_000,
                concurrent_requests: 5,
            },
        }
    }
}

/// Health of one provider, keyed by kind in the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub is_healthy: bool,
    /// Only moves forward; written unconditionally on every check
    pub last_checked_at: DateTime<Utc>,
}

/// Performance estimates for a discovered model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPerformance {
    pub average_response_time_ms: u32,
    pub tokens_per_second: u32,
    pub quality_score: f32,
    pub reliability: f32,
}

/// Per-token pricing for a discovered model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    /// USD per 1K input tokens
    pub input_tokens: f64,
    /// USD per 1K output tokens
    pub output_tokens: f64,
    pub currency: String,
}

/// A model offered by a provider
///
/// Rebuilt on each discovery call; never diffed against previous state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub context_length: u32,
    pub capabilities: Vec<String>,
    pub performance: ModelPerformance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing: Option<ModelPricing>,
    pub is_default: bool,
    pub is_available: bool,
}

/// Result of a connectivity test against one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_ms: u64,
}

/// Capability contract implemented by every backend variant
#[async_trait]
pub trait ProviderAdapter: Send + Sync + std::fmt::Debug {
    /// Which family this adapter belongs to
    fn kind(&self) -> ProviderKind;

    /// Human-readable provider name
    fn display_name(&self) -> &str;

    /// Static descriptor built from this adapter's configuration
    fn descriptor(&self) -> ProviderDescriptor;

    /// The model used when the caller does not pick one
    fn default_model(&self) -> &str;

    /// Send a fully-built prompt to the backend and return its text
    ///
    /// This is the only variant-specific generation entry point; prompt
    /// construction happens in the provided `generate` wrappers.
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Check whether the backend is reachable and serving
    async fn is_healthy(&self) -> Result<bool, ProviderError>;

    /// List the models the backend currently offers
    async fn discover_models(&self) -> Result<Vec<ModelDescriptor>, ProviderError>;

    /// Probe the backend and measure round-trip latency
    async fn test_connectivity(&self) -> ConnectivityReport;

    /// Generate a reply for a message
    async fn generate(
        &self,
        base_prompt: &str,
        content: &MessageContext,
        prefs: &UserPreferences,
    ) -> Result<String, ProviderError> {
        self.complete(&prompt::build_prompt(base_prompt, content, prefs))
            .await
    }

    /// Generate a reply with style flags and optional custom instructions
    async fn generate_styled(
        &self,
        base_prompt: &str,
        content: &MessageContext,
        prefs: &UserPreferences,
        style: StyleFlags,
        custom_instructions: Option<&str>,
    ) -> Result<String, ProviderError> {
        self.complete(&prompt::build_styled_prompt(
            base_prompt,
            content,
            prefs,
            style,
            custom_instructions,
        ))
        .await
    }
}
