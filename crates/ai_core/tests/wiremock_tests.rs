//! Integration tests for the provider adapters and manager using WireMock
//!
//! These tests mock the two backend HTTP APIs to verify executor retry
//! behavior, adapter contracts, and manager lifecycle without requiring real
//! servers.

use std::time::Duration;

use ai_core::{
    AuthScheme, OllamaAdapter, OpenAiAdapter, ProviderAdapter, ProviderManager, RequestExecutor,
    RetryPolicy,
};
use domain::{OllamaSettings, OpenAiSettings, ProviderKind, UserPreferences};
use secrecy::SecretString;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

// =============================================================================
// Test Helpers
// =============================================================================

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(5),
    }
}

fn ollama_settings(base_url: &str) -> OllamaSettings {
    OllamaSettings {
        base_url: Some(base_url.to_string()),
        ..Default::default()
    }
}

fn openai_settings(base_url: &str) -> OpenAiSettings {
    OpenAiSettings {
        api_key: Some(SecretString::from("sk-test")),
        base_url: base_url.to_string(),
        ..Default::default()
    }
}

fn prefs_for(ollama_url: Option<&str>, openai_url: Option<&str>) -> UserPreferences {
    let mut prefs = UserPreferences::default();
    if let Some(url) = ollama_url {
        prefs.providers.ollama = ollama_settings(url);
    }
    if let Some(url) = openai_url {
        prefs.providers.openai = openai_settings(url);
    }
    prefs
}

fn ollama_generate_response() -> serde_json::Value {
    serde_json::json!({
        "model": "llama3.2",
        "response": "Thanks for the update - I'll review it today.",
        "done": true
    })
}

fn ollama_tags_response() -> serde_json::Value {
    serde_json::json!({
        "models": [
            {"name": "llama3.2"},
            {"name": "mistral"},
            {"name": "codellama"}
        ]
    })
}

fn openai_models_response() -> serde_json::Value {
    serde_json::json!({
        "data": [
            {"id": "gpt-4o"},
            {"id": "gpt-3.5-turbo"},
            {"id": "whisper-1"},
            {"id": "text-embedding-3-small"}
        ]
    })
}

fn openai_chat_response(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [
            {"message": {"role": "assistant", "content": content}}
        ]
    })
}

// =============================================================================
// Request Executor Tests
// =============================================================================

mod executor_tests {
    use super::*;

    #[tokio::test]
    async fn persistent_failure_retries_exactly_three_attempts() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(500).set_body_string("broken"))
            .expect(3)
            .mount(&mock_server)
            .await;

        let executor = RequestExecutor::new(mock_server.uri(), AuthScheme::None)
            .unwrap()
            .with_retry_policy(fast_retry());

        let err = executor.get("/api/tags").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("broken"));
    }

    #[tokio::test]
    async fn transient_failure_recovers_within_budget() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ollama_tags_response()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let executor = RequestExecutor::new(mock_server.uri(), AuthScheme::None)
            .unwrap()
            .with_retry_policy(fast_retry());

        assert!(executor.get("/api/tags").await.is_ok());
    }

    #[tokio::test]
    async fn success_does_not_retry() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ollama_tags_response()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let executor = RequestExecutor::new(mock_server.uri(), AuthScheme::None)
            .unwrap()
            .with_retry_policy(fast_retry());

        assert!(executor.get("/api/tags").await.is_ok());
    }

    #[tokio::test]
    async fn json_content_type_is_injected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ollama_tags_response()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let executor = RequestExecutor::new(mock_server.uri(), AuthScheme::None).unwrap();
        assert!(executor.get("/api/tags").await.is_ok());
    }

    #[tokio::test]
    async fn bearer_auth_header_is_merged() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(openai_models_response()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let executor = RequestExecutor::new(
            mock_server.uri(),
            AuthScheme::Bearer(SecretString::from("sk-test")),
        )
        .unwrap();

        assert!(executor.get("/models").await.is_ok());
    }
}

// =============================================================================
// Ollama Adapter Tests
// =============================================================================

mod ollama_tests {
    use super::*;

    #[tokio::test]
    async fn generate_returns_backend_text_unmodified() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ollama_generate_response()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let adapter = OllamaAdapter::new(&ollama_settings(&mock_server.uri())).unwrap();
        let output = adapter.complete("Say hello").await.unwrap();

        assert_eq!(output, "Thanks for the update - I'll review it today.");
    }

    #[tokio::test]
    async fn generate_surfaces_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .expect(3)
            .mount(&mock_server)
            .await;

        let adapter = OllamaAdapter::new(&ollama_settings(&mock_server.uri()))
            .unwrap()
            .with_retry_policy(fast_retry());

        let err = adapter.complete("Say hello").await.unwrap_err();
        assert!(err.to_string().contains("model not loaded"));
    }

    #[tokio::test]
    async fn invalid_envelope_is_an_invalid_response_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let adapter = OllamaAdapter::new(&ollama_settings(&mock_server.uri())).unwrap();
        let err = adapter.complete("Say hello").await.unwrap_err();
        assert!(err.to_string().contains("Invalid response"));
    }

    #[tokio::test]
    async fn health_check_true_when_serving() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ollama_tags_response()))
            .mount(&mock_server)
            .await;

        let adapter = OllamaAdapter::new(&ollama_settings(&mock_server.uri())).unwrap();
        assert!(adapter.is_healthy().await.unwrap());
    }

    #[tokio::test]
    async fn health_check_false_on_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let adapter = OllamaAdapter::new(&ollama_settings(&mock_server.uri()))
            .unwrap()
            .with_retry_policy(fast_retry());

        assert!(!adapter.is_healthy().await.unwrap());
    }

    #[tokio::test]
    async fn discovery_enriches_known_models() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ollama_tags_response()))
            .mount(&mock_server)
            .await;

        let adapter = OllamaAdapter::new(&ollama_settings(&mock_server.uri())).unwrap();
        let models = adapter.discover_models().await.unwrap();

        assert_eq!(models.len(), 3);
        let default = models.iter().find(|m| m.id == "llama3.2").unwrap();
        assert!(default.is_default);
        assert_eq!(default.context_length, 128_000);
        assert!(!models.iter().find(|m| m.id == "mistral").unwrap().is_default);
    }

    #[tokio::test]
    async fn connectivity_report_on_failure_carries_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let adapter = OllamaAdapter::new(&ollama_settings(&mock_server.uri()))
            .unwrap()
            .with_retry_policy(fast_retry());

        let report = adapter.test_connectivity().await;
        assert!(!report.success);
        assert!(report.error.unwrap().contains("500"));
    }
}

// =============================================================================
// OpenAI Adapter Tests
// =============================================================================

mod openai_tests {
    use super::*;

    #[tokio::test]
    async fn generate_unwraps_first_choice() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(openai_chat_response("Sounds good.")),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let adapter = OpenAiAdapter::new(&openai_settings(&mock_server.uri())).unwrap();
        let output = adapter.complete("Draft a reply").await.unwrap();

        assert_eq!(output, "Sounds good.");
    }

    #[tokio::test]
    async fn empty_choices_is_an_invalid_response_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&mock_server)
            .await;

        let adapter = OpenAiAdapter::new(&openai_settings(&mock_server.uri())).unwrap();
        let err = adapter.complete("Draft a reply").await.unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }

    #[tokio::test]
    async fn discovery_filters_to_gpt_models() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(openai_models_response()))
            .mount(&mock_server)
            .await;

        let adapter = OpenAiAdapter::new(&openai_settings(&mock_server.uri())).unwrap();
        let models = adapter.discover_models().await.unwrap();

        assert_eq!(models.len(), 2);
        assert!(models.iter().all(|m| m.id.starts_with("gpt")));
        assert!(models.iter().find(|m| m.id == "gpt-3.5-turbo").unwrap().is_default);
        assert!(models.iter().all(|m| m.pricing.is_some()));
    }

    #[tokio::test]
    async fn health_check_reflects_models_endpoint() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(openai_models_response()))
            .mount(&mock_server)
            .await;

        let adapter = OpenAiAdapter::new(&openai_settings(&mock_server.uri())).unwrap();
        assert!(adapter.is_healthy().await.unwrap());
    }
}

// =============================================================================
// Property-Based Tests
// =============================================================================

mod proptest_tests {
    use ai_core::prompt::format_file_size;
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn backoff_delay_doubles_per_attempt(
            base_ms in 1u64..1000,
            attempt in 0u32..10
        ) {
            let policy = RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(base_ms),
            };
            let delay = policy.delay_for_attempt(attempt);
            let next = policy.delay_for_attempt(attempt + 1);
            prop_assert_eq!(next, delay * 2);
        }

        #[test]
        fn file_sizes_always_render_a_known_unit(bytes in 0u64..u64::MAX / 2) {
            let rendered = format_file_size(bytes);
            prop_assert!(
                ["Bytes", "KB", "MB", "GB"].iter().any(|unit| rendered.ends_with(unit)),
                "unexpected rendering: {}",
                rendered
            );
        }
    }
}

// =============================================================================
// Provider Manager Tests
// =============================================================================

mod manager_tests {
    use super::*;

    async fn serving_ollama() -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ollama_tags_response()))
            .mount(&mock_server)
            .await;
        mock_server
    }

    async fn serving_openai() -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(openai_models_response()))
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn initialize_checks_every_configured_provider() {
        let ollama = serving_ollama().await;
        let openai = serving_openai().await;

        let manager = ProviderManager::default();
        manager
            .initialize(&prefs_for(Some(&ollama.uri()), Some(&openai.uri())))
            .await;

        let health = manager.health_status();
        assert!(health[&ProviderKind::Ollama].is_healthy);
        assert!(health[&ProviderKind::OpenAi].is_healthy);
        assert_eq!(
            manager.configured_kinds(),
            vec![ProviderKind::OpenAi, ProviderKind::Ollama]
        );

        manager.shutdown();
    }

    #[tokio::test]
    async fn unconfigured_providers_are_skipped() {
        let ollama = serving_ollama().await;

        let manager = ProviderManager::default();
        manager
            .initialize(&prefs_for(Some(&ollama.uri()), None))
            .await;

        assert_eq!(manager.configured_kinds(), vec![ProviderKind::Ollama]);
        assert!(manager.provider(ProviderKind::OpenAi).is_none());

        manager.shutdown();
    }

    #[tokio::test]
    async fn healthy_default_provider_is_selected() {
        let ollama = serving_ollama().await;

        let manager = ProviderManager::default();
        let prefs = prefs_for(Some(&ollama.uri()), None);
        manager.initialize(&prefs).await;

        let selected = manager.default_provider(&prefs).unwrap();
        assert_eq!(selected.kind(), ProviderKind::Ollama);

        manager.shutdown();
    }

    #[tokio::test]
    async fn reinitialize_fully_replaces_state() {
        let ollama = serving_ollama().await;
        let openai = serving_openai().await;

        let manager = ProviderManager::default();
        manager
            .initialize(&prefs_for(Some(&ollama.uri()), None))
            .await;
        assert_eq!(manager.configured_kinds(), vec![ProviderKind::Ollama]);

        // Second initialization drops Ollama and configures OpenAI instead.
        manager
            .initialize(&prefs_for(None, Some(&openai.uri())))
            .await;

        assert_eq!(manager.configured_kinds(), vec![ProviderKind::OpenAi]);
        assert!(manager.provider(ProviderKind::Ollama).is_none());
        let health = manager.health_status();
        assert!(!health.contains_key(&ProviderKind::Ollama));
        assert!(health[&ProviderKind::OpenAi].is_healthy);

        manager.shutdown();
    }

    #[tokio::test]
    async fn test_and_discover_reports_models_and_latency() {
        let ollama = serving_ollama().await;

        let manager = ProviderManager::default();
        manager
            .initialize(&prefs_for(Some(&ollama.uri()), None))
            .await;

        let report = manager.test_and_discover(ProviderKind::Ollama).await;
        assert!(report.success);
        assert_eq!(report.models_found, 3);
        assert!(report.errors.is_empty());

        manager.shutdown();
    }
}
