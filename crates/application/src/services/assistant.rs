//! Assistant pipeline
//!
//! The end-to-end flow for one logical request: classification gate →
//! provider selection → generation → (for analysis) response structuring.
//! Steps run strictly in that order; a blocked classification means no
//! backend adapter is ever invoked.

use std::sync::Arc;

use ai_core::{ProviderManager, StyleFlags};
use domain::{
    ClassificationAuditEvent, ClassificationOutcome, MessageAnalysis, MessageContext,
    UserPreferences,
};
use tracing::{debug, instrument};

use crate::error::ApplicationError;
use crate::services::analysis::{analysis_prompt, parse_analysis};
use crate::services::audit::ClassificationAuditLog;
use crate::services::classification::ClassificationEngine;

/// Orchestrates the classification gate and the provider layer for callers
#[derive(Debug)]
pub struct AssistantService {
    gate: ClassificationEngine,
    providers: Arc<ProviderManager>,
}

impl AssistantService {
    /// Create a service around an initialized provider manager
    #[must_use]
    pub fn new(providers: Arc<ProviderManager>) -> Self {
        Self {
            gate: ClassificationEngine::new(),
            providers,
        }
    }

    /// Share an existing audit log instead of creating one
    #[must_use]
    pub fn with_audit_log(providers: Arc<ProviderManager>, audit: Arc<ClassificationAuditLog>) -> Self {
        Self {
            gate: ClassificationEngine::with_audit_log(audit),
            providers,
        }
    }

    /// The provider manager backing this service
    #[must_use]
    pub fn providers(&self) -> &Arc<ProviderManager> {
        &self.providers
    }

    /// Classify without generating (also records an audit event)
    #[must_use]
    pub fn classify(&self, content: &MessageContext) -> ClassificationOutcome {
        self.gate.classify(content)
    }

    /// Snapshot of the classification audit trail, oldest first
    #[must_use]
    pub fn audit_events(&self) -> Vec<ClassificationAuditEvent> {
        self.gate.audit_log().snapshot()
    }

    /// Draft a reply to a message
    ///
    /// Returns the selected adapter's output unmodified.
    #[instrument(skip_all, fields(content_id = %content.id))]
    pub async fn draft_reply(
        &self,
        base_prompt: &str,
        content: &MessageContext,
        prefs: &UserPreferences,
    ) -> Result<String, ApplicationError> {
        self.gate.validate_for_processing(content)?;
        let provider = self.select_provider(prefs)?;
        Ok(provider.generate(base_prompt, content, prefs).await?)
    }

    /// Draft a reply with style flags and optional custom instructions
    #[instrument(skip_all, fields(content_id = %content.id))]
    pub async fn draft_reply_styled(
        &self,
        base_prompt: &str,
        content: &MessageContext,
        prefs: &UserPreferences,
        style: StyleFlags,
        custom_instructions: Option<&str>,
    ) -> Result<String, ApplicationError> {
        self.gate.validate_for_processing(content)?;
        let provider = self.select_provider(prefs)?;
        Ok(provider
            .generate_styled(base_prompt, content, prefs, style, custom_instructions)
            .await?)
    }

    /// Analyze a message into a structured result
    ///
    /// Backend output that fails to parse is never an error; the structuring
    /// layer resolves it through named fallbacks.
    #[instrument(skip_all, fields(content_id = %content.id))]
    pub async fn analyze(
        &self,
        content: &MessageContext,
        prefs: &UserPreferences,
    ) -> Result<MessageAnalysis, ApplicationError> {
        self.gate.validate_for_processing(content)?;
        let provider = self.select_provider(prefs)?;

        let raw = provider.complete(&analysis_prompt(content)).await?;
        Ok(parse_analysis(content, prefs, &raw))
    }

    fn select_provider(
        &self,
        prefs: &UserPreferences,
    ) -> Result<Arc<dyn ai_core::ProviderAdapter>, ApplicationError> {
        self.providers.default_provider(prefs).map_or_else(
            || {
                debug!("No healthy provider available");
                Err(ApplicationError::ProviderUnavailable)
            },
            Ok,
        )
    }
}
