//! AI Core - Provider adapters and orchestration
//!
//! Adapts two fixed external backend families (a bearer-credential
//! OpenAI-compatible API and a local unauthenticated Ollama API) behind one
//! capability trait, and manages their lifecycle: health monitoring,
//! default-provider selection, retries with backoff, and model discovery.

pub mod config;
pub mod error;
pub mod executor;
pub mod manager;
pub mod ollama;
pub mod openai;
pub mod ports;
pub mod prompt;

pub use config::GenerationOptions;
pub use error::ProviderError;
pub use executor::{AuthScheme, RequestExecutor, RetryPolicy};
pub use manager::{ManagerConfig, ProviderFactory, ProviderManager, ProviderTestReport};
pub use ollama::OllamaAdapter;
pub use openai::OpenAiAdapter;
pub use ports::{
    ConnectivityReport, HealthRecord, ModelDescriptor, ProviderAdapter, ProviderCapabilities,
    ProviderDescriptor, RateLimits,
};
pub use prompt::StyleFlags;
