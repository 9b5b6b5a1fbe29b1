//! OpenAI-compatible cloud adapter
//!
//! Key-authenticated family: bearer credential on every request, `/models`
//! for health and discovery, `/chat/completions` for generation.

use async_trait::async_trait;
use domain::{OpenAiSettings, ProviderKind};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::GenerationOptions;
use crate::error::ProviderError;
use crate::executor::{AuthScheme, RequestExecutor, RetryPolicy};
use crate::ports::{
    ConnectivityReport, ModelDescriptor, ModelPerformance, ModelPricing, ProviderAdapter,
    ProviderDescriptor,
};

const SYSTEM_PROMPT: &str =
    "You are a helpful email assistant. Provide professional, contextually appropriate responses.";

/// Adapter for the bearer-credential OpenAI-compatible API
#[derive(Debug)]
pub struct OpenAiAdapter {
    executor: RequestExecutor,
    default_model: String,
    options: GenerationOptions,
}

impl OpenAiAdapter {
    /// Construct from settings; fails without a non-empty credential
    pub fn new(settings: &OpenAiSettings) -> Result<Self, ProviderError> {
        let api_key = settings
            .api_key
            .as_ref()
            .filter(|key| !key.expose_secret().is_empty())
            .ok_or(ProviderError::MissingCredential(ProviderKind::OpenAi))?;

        let executor =
            RequestExecutor::new(&settings.base_url, AuthScheme::Bearer(api_key.clone()))?;

        Ok(Self {
            executor,
            default_model: settings.default_model.clone(),
            options: GenerationOptions::default(),
        })
    }

    /// Override generation options
    #[must_use]
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Override the retry policy (tests shrink the delays)
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.executor = self.executor.with_retry_policy(retry);
        self
    }

    fn model_description(model_id: &str) -> String {
        match model_id {
            "gpt-4o" => "Flagship multimodal model".to_string(),
            "gpt-4o-mini" => "Fast, low-cost multimodal model".to_string(),
            "gpt-4-turbo" => "GPT-4 Turbo with extended context".to_string(),
            "gpt-4" => "GPT-4 base model".to_string(),
            "gpt-3.5-turbo" => "Fast, economical chat model".to_string(),
            _ => "OpenAI chat model".to_string(),
        }
    }

    fn context_length(model_id: &str) -> u32 {
        match model_id {
            "gpt-4o" | "gpt-4o-mini" | "gpt-4-turbo" => 128_000,
            "gpt-4" => 8_192,
            "gpt-3.5-turbo" => 16_385,
            _ => 4_096,
        }
    }

    fn pricing(model_id: &str) -> ModelPricing {
        let (input, output) = match model_id {
            "gpt-4o" => (0.0025, 0.01),
            "gpt-4o-mini" => (0.000_15, 0.0006),
            "gpt-4-turbo" => (0.01, 0.03),
            "gpt-4" => (0.03, 0.06),
            _ => (0.0005, 0.0015),
        };
        ModelPricing {
            input_tokens: input,
            output_tokens: output,
            currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn display_name(&self) -> &str {
        "OpenAI"
    }

    fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor::openai(self.executor.base_url())
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    #[instrument(skip(self, prompt), fields(model = %self.default_model))]
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = ChatCompletionRequest {
            model: self.default_model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
        };

        debug!("Sending chat completion request");
        let response: ChatCompletionResponse = self
            .executor
            .post_json("/chat/completions", &request)
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                ProviderError::InvalidResponse("chat completion returned no choices".to_string())
            })
    }

    #[instrument(skip(self))]
    async fn is_healthy(&self) -> Result<bool, ProviderError> {
        match self.executor.get("/models").await {
            Ok(()) => Ok(true),
            Err(
                ProviderError::ServerError { .. }
                | ProviderError::Timeout(_)
                | ProviderError::ConnectionFailed(_),
            ) => Ok(false),
            Err(err) => Err(err),
        }
    }

    #[instrument(skip(self))]
    async fn discover_models(&self) -> Result<Vec<ModelDescriptor>, ProviderError> {
        let response: ModelsResponse = self.executor.get_json("/models").await?;

        let models = response
            .data
            .into_iter()
            .filter(|model| model.id.starts_with("gpt"))
            .map(|model| ModelDescriptor {
                display_name: model.id.clone(),
                description: Self::model_description(&model.id),
                context_length: Self::context_length(&model.id),
                capabilities: vec!["text-generation".to_string(), "conversation".to_string()],
                performance: ModelPerformance {
                    average_response_time_ms: 2000,
                    tokens_per_second: 50,
                    quality_score: 0.9,
                    reliability: 0.95,
                },
                pricing: Some(Self::pricing(&model.id)),
                is_default: model.id == self.default_model,
                is_available: true,
                id: model.id,
            })
            .collect();

        Ok(models)
    }

    #[instrument(skip(self))]
    async fn test_connectivity(&self) -> ConnectivityReport {
        let start = std::time::Instant::now();
        let result = self.executor.get("/models").await;
        #[allow(clippy::cast_possible_truncation)]
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => ConnectivityReport {
                success: true,
                error: None,
                latency_ms,
            },
            Err(err) => {
                warn!(error = %err, "Connectivity test failed");
                ConnectivityReport {
                    success: false,
                    error: Some(err.to_string()),
                    latency_ms,
                }
            },
        }
    }
}
