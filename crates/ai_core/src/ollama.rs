//! Local Ollama adapter
//!
//! Unauthenticated family: no auth headers, `/api/tags` for health and
//! discovery, `/api/generate` for generation.

use async_trait::async_trait;
use domain::{OllamaSettings, ProviderKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::GenerationOptions;
use crate::error::ProviderError;
use crate::executor::{AuthScheme, RequestExecutor, RetryPolicy};
use crate::ports::{
    ConnectivityReport, ModelDescriptor, ModelPerformance, ModelPricing, ProviderAdapter,
    ProviderDescriptor,
};

/// Default base URL when the caller configures none
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Adapter for the unauthenticated local Ollama API
#[derive(Debug)]
pub struct OllamaAdapter {
    executor: RequestExecutor,
    default_model: String,
    options: GenerationOptions,
}

impl OllamaAdapter {
    /// Construct from settings; the base URL falls back to localhost
    pub fn new(settings: &OllamaSettings) -> Result<Self, ProviderError> {
        let base_url = settings.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let executor = RequestExecutor::new(base_url, AuthScheme::None)?;

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

    fn model_description(model_name: &str) -> String {
        let known = match model_name {
            "llama3.2" => "Latest Llama 3.2 model with improved reasoning",
            "llama3.1" => "Llama 3.1 with enhanced capabilities",
            "llama3" => "Meta's Llama 3 language model",
            "mistral" => "Mistral AI's efficient language model",
            "mixtral" => "Mistral's mixture of experts model",
            "codellama" => "Code-specialized version of Llama",
            "phi3" => "Microsoft's Phi-3 small language model",
            _ => "Local language model via Ollama",
        };
        known.to_string()
    }

    fn context_length(model_name: &str) -> u32 {
        match model_name {
            "llama3.2" | "llama3.1" => 128_000,
            "mixtral" => 32_768,
            "codellama" => 16_384,
            "llama3" | "mistral" => 8_192,
            _ => 4_096,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

#[async_trait]
impl ProviderAdapter for OllamaAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    fn display_name(&self) -> &str {
        "Ollama"
    }

    fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor::ollama(self.executor.base_url())
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    #[instrument(skip(self, prompt), fields(model = %self.default_model))]
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = GenerateRequest {
            model: self.default_model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: GenerateOptions {
                temperature: self.options.temperature,
                top_p: self.options.top_p,
                num_predict: self.options.max_tokens,
            },
        };

        debug!("Sending generate request");
        let response: GenerateResponse = self.executor.post_json("/api/generate", &request).await?;
        Ok(response.response)
    }

    #[instrument(skip(self))]
    async fn is_healthy(&self) -> Result<bool, ProviderError> {
        match self.executor.get("/api/tags").await {
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
        let response: TagsResponse = self.executor.get_json("/api/tags").await?;

        let models = response
            .models
            .into_iter()
            .map(|model| ModelDescriptor {
                display_name: model.name.clone(),
                description: Self::model_description(&model.name),
                context_length: Self::context_length(&model.name),
                capabilities: vec!["text-generation".to_string(), "conversation".to_string()],
                performance: ModelPerformance {
                    average_response_time_ms: 3000,
                    tokens_per_second: 30,
                    quality_score: 0.8,
                    reliability: 0.9,
                },
                pricing: Some(ModelPricing {
                    input_tokens: 0.0,
                    output_tokens: 0.0,
                    currency: "USD".to_string(),
                }),
                is_default: model.name == self.default_model,
                is_available: true,
                id: model.name,
            })
            .collect();

        Ok(models)
    }

    #[instrument(skip(self))]
    async fn test_connectivity(&self) -> ConnectivityReport {
        let start = std::time::Instant::now();
        let result = self.executor.get("/api/tags").await;
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
