//! Provider lifecycle management
//!
//! One [`ProviderManager`] instance owns the configured adapters for one
//! session: it constructs them from user preferences, runs the periodic
//! health loop, resolves "the provider to use now" from preference plus live
//! health, and exposes connectivity/discovery tooling. State is replaced
//! wholesale on re-initialization, never merged.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use domain::{ProviderKind, ProviderSettings, UserPreferences};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::ProviderError;
use crate::ollama::OllamaAdapter;
use crate::openai::OpenAiAdapter;
use crate::ports::{ConnectivityReport, HealthRecord, ModelDescriptor, ProviderAdapter};

/// Threshold above which a connectivity latency is flagged as slow
const SLOW_LATENCY_MS: u64 = 5000;

/// Constructs adapters from the closed set of provider kinds
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderFactory;

impl ProviderFactory {
    /// Build the adapter for a declared provider kind
    ///
    /// A credentialed family without a credential is a construction error;
    /// the manager logs it and continues with the remaining providers.
    pub fn create(
        kind: ProviderKind,
        settings: &ProviderSettings,
    ) -> Result<Arc<dyn ProviderAdapter>, ProviderError> {
        match kind {
            ProviderKind::OpenAi => {
                OpenAiAdapter::new(&settings.openai).map(|a| Arc::new(a) as Arc<dyn ProviderAdapter>)
            },
            ProviderKind::Ollama => {
                OllamaAdapter::new(&settings.ollama).map(|a| Arc::new(a) as Arc<dyn ProviderAdapter>)
            },
        }
    }

    /// Build an adapter from a raw configuration tag
    ///
    /// Unknown tags are rejected with a configuration error rather than
    /// silently mapped to a default family.
    pub fn create_from_tag(
        tag: &str,
        settings: &ProviderSettings,
    ) -> Result<Arc<dyn ProviderAdapter>, ProviderError> {
        let kind: ProviderKind = tag
            .parse()
            .map_err(|_| ProviderError::UnsupportedProvider(tag.to_string()))?;
        Self::create(kind, settings)
    }
}

/// Manager configuration
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Interval of the recurring health loop (default: 5 minutes)
    pub health_check_interval: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            health_check_interval: Duration::from_secs(5 * 60),
        }
    }
}

/// Report produced by [`ProviderManager::test_and_discover`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTestReport {
    pub provider: ProviderKind,
    pub success: bool,
    pub models_found: usize,
    pub avg_latency_ms: u64,
    pub errors: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Providers in configuration order plus their health records
struct ProviderState {
    providers: Vec<(ProviderKind, Arc<dyn ProviderAdapter>)>,
    health: HashMap<ProviderKind, HealthRecord>,
}

impl ProviderState {
    fn empty() -> Self {
        Self {
            providers: Vec::new(),
            health: HashMap::new(),
        }
    }

    fn adapter(&self, kind: ProviderKind) -> Option<Arc<dyn ProviderAdapter>> {
        self.providers
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, adapter)| Arc::clone(adapter))
    }

    fn is_healthy(&self, kind: ProviderKind) -> bool {
        self.health.get(&kind).is_some_and(|record| record.is_healthy)
    }
}

/// Per-session owner of the configured provider set
pub struct ProviderManager {
    state: Arc<RwLock<ProviderState>>,
    config: ManagerConfig,
    monitor: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl std::fmt::Debug for ProviderManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("ProviderManager")
            .field("config", &self.config)
            .field(
                "providers",
                &state.providers.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
            )
            .field("health", &state.health)
            .finish_non_exhaustive()
    }
}

impl Default for ProviderManager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

impl ProviderManager {
    /// Create a manager with no providers configured yet
    #[must_use]
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(ProviderState::empty())),
            config,
            monitor: Mutex::new(None),
        }
    }

    /// (Re-)initialize providers from user preferences
    ///
    /// Existing provider and health state is fully replaced before any new
    /// check runs, so a stale adapter can never be selected mid-swap. Each
    /// constructed provider gets one immediate health check, then the
    /// recurring loop takes over.
    #[instrument(skip(self, prefs))]
    pub async fn initialize(&self, prefs: &UserPreferences) {
        self.stop_monitor();

        let mut providers: Vec<(ProviderKind, Arc<dyn ProviderAdapter>)> = Vec::new();
        for kind in ProviderKind::all() {
            if !prefs.providers.is_configured(*kind) {
                debug!(provider = %kind, "Provider not configured, skipping");
                continue;
            }
            match ProviderFactory::create(*kind, &prefs.providers) {
                Ok(adapter) => providers.push((*kind, adapter)),
                Err(err) => {
                    warn!(provider = %kind, error = %err, "Failed to construct provider, continuing");
                },
            }
        }

        let kinds: Vec<ProviderKind> = providers.iter().map(|(kind, _)| *kind).collect();
        {
            let mut state = self.state.write();
            state.providers = providers;
            state.health.clear();
        }

        info!(providers = ?kinds, "Providers initialized");

        for kind in kinds {
            run_health_check(&self.state, kind).await;
        }

        self.start_monitor();
    }

    /// Resolve the provider to use now
    ///
    /// The configured default wins if and only if its health record says
    /// healthy; otherwise the first healthy provider in configuration order;
    /// otherwise `None`, which callers must treat as "no provider available".
    #[must_use]
    pub fn default_provider(&self, prefs: &UserPreferences) -> Option<Arc<dyn ProviderAdapter>> {
        let state = self.state.read();
        let preferred = prefs.providers.default_provider;

        if state.is_healthy(preferred) {
            if let Some(adapter) = state.adapter(preferred) {
                return Some(adapter);
            }
        }

        state
            .providers
            .iter()
            .find(|(kind, _)| state.is_healthy(*kind))
            .map(|(_, adapter)| Arc::clone(adapter))
    }

    /// Get a specific provider by kind
    #[must_use]
    pub fn provider(&self, kind: ProviderKind) -> Option<Arc<dyn ProviderAdapter>> {
        self.state.read().adapter(kind)
    }

    /// Kinds currently configured, in configuration order
    #[must_use]
    pub fn configured_kinds(&self) -> Vec<ProviderKind> {
        self.state
            .read()
            .providers
            .iter()
            .map(|(kind, _)| *kind)
            .collect()
    }

    /// Check one provider's health and update its record unconditionally
    ///
    /// An adapter error counts as unhealthy, not as unknown; nothing
    /// propagates past this boundary.
    pub async fn check_health(&self, kind: ProviderKind) -> bool {
        run_health_check(&self.state, kind).await
    }

    /// Snapshot of the health records for all configured providers
    #[must_use]
    pub fn health_status(&self) -> HashMap<ProviderKind, HealthRecord> {
        self.state.read().health.clone()
    }

    /// Run connectivity test and model discovery back-to-back
    #[instrument(skip(self))]
    pub async fn test_and_discover(&self, kind: ProviderKind) -> ProviderTestReport {
        let Some(adapter) = self.provider(kind) else {
            let recommendation = if kind.requires_credential() {
                "An API key is required for this provider".to_string()
            } else {
                "Check provider configuration and network connectivity".to_string()
            };
            return ProviderTestReport {
                provider: kind,
                success: false,
                models_found: 0,
                avg_latency_ms: 0,
                errors: vec![format!("Provider {kind} is not configured")],
                recommendations: vec![recommendation],
            };
        };

        let connectivity = adapter.test_connectivity().await;
        let mut errors = Vec::new();
        if !connectivity.success {
            errors.push(
                connectivity
                    .error
                    .clone()
                    .unwrap_or_else(|| "Connectivity test failed".to_string()),
            );
        }

        let models = match adapter.discover_models().await {
            Ok(models) => models,
            Err(err) => {
                errors.push(err.to_string());
                Vec::new()
            },
        };

        let recommendations =
            recommendations_for(kind, &adapter.descriptor().base_url, &models, &connectivity);

        ProviderTestReport {
            provider: kind,
            success: connectivity.success && !models.is_empty(),
            models_found: models.len(),
            avg_latency_ms: connectivity.latency_ms,
            errors,
            recommendations,
        }
    }

    /// Stop the health loop; it restarts on the next `initialize`
    pub fn shutdown(&self) {
        self.stop_monitor();
    }

    fn start_monitor(&self) {
        let state = Arc::clone(&self.state);
        let interval = self.config.health_check_interval;

        let interval_ms = i64::try_from(interval.as_millis()).unwrap_or(i64::MAX);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; initialization already
            // checked every provider, so skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let due: Vec<ProviderKind> = {
                    let state = state.read();
                    let now = Utc::now();
                    state
                        .providers
                        .iter()
                        .map(|(kind, _)| *kind)
                        .filter(|kind| {
                            state.health.get(kind).is_none_or(|record| {
                                let age = now.signed_duration_since(record.last_checked_at);
                                age.num_milliseconds() >= interval_ms
                            })
                        })
                        .collect()
                };
                for kind in due {
                    run_health_check(&state, kind).await;
                }
            }
        });

        *self.monitor.lock() = Some(handle);
    }

    fn stop_monitor(&self) {
        if let Some(handle) = self.monitor.lock().take() {
            handle.abort();
            debug!("Health monitor stopped");
        }
    }
}

impl Drop for ProviderManager {
    fn drop(&mut self) {
        self.stop_monitor();
    }
}

/// Check one provider and record the result, holding no lock across the call
async fn run_health_check(state: &Arc<RwLock<ProviderState>>, kind: ProviderKind) -> bool {
    let adapter = state.read().adapter(kind);
    let Some(adapter) = adapter else {
        return false;
    };

    let is_healthy = match adapter.is_healthy().await {
        Ok(healthy) => healthy,
        Err(err) => {
            warn!(provider = %kind, error = %err, "Health check failed");
            false
        },
    };

    state.write().health.insert(
        kind,
        HealthRecord {
            is_healthy,
            last_checked_at: Utc::now(),
        },
    );
    debug!(provider = %kind, healthy = is_healthy, "Health record updated");

    is_healthy
}

/// Fixed remediation heuristics for a test report
fn recommendations_for(
    kind: ProviderKind,
    base_url: &str,
    models: &[ModelDescriptor],
    connectivity: &ConnectivityReport,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if connectivity.latency_ms > SLOW_LATENCY_MS {
        recommendations
            .push("Consider using a closer server location for better performance".to_string());
    }

    if models.is_empty() {
        match kind {
            ProviderKind::Ollama => recommendations.push(
                "No models found. Run \"ollama pull llama3.2\" to download a model".to_string(),
            ),
            ProviderKind::OpenAi => recommendations
                .push("No models available. Check API key permissions".to_string()),
        }
    }

    if kind == ProviderKind::Ollama && base_url.contains("localhost:11434") {
        recommendations.push(
            "Ensure Ollama is started with CORS enabled: OLLAMA_ORIGINS=\"*\" ollama serve"
                .to_string(),
        );
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use crate::ports::ProviderDescriptor;

    use super::*;

    #[derive(Debug)]
    struct StubAdapter {
        kind: ProviderKind,
        healthy: bool,
    }

    #[async_trait]
    impl ProviderAdapter for StubAdapter {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        fn display_name(&self) -> &str {
            "Stub"
        }

        fn descriptor(&self) -> ProviderDescriptor {
            match self.kind {
                ProviderKind::OpenAi => ProviderDescriptor::openai("https://api.openai.com/v1"),
                ProviderKind::Ollama => ProviderDescriptor::ollama("http://localhost:11434"),
            }
        }

        fn default_model(&self) -> &str {
            "stub-model"
        }

        async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
            Ok("stub output".to_string())
        }

        async fn is_healthy(&self) -> Result<bool, ProviderError> {
            Ok(self.healthy)
        }

        async fn discover_models(&self) -> Result<Vec<ModelDescriptor>, ProviderError> {
            Ok(Vec::new())
        }

        async fn test_connectivity(&self) -> ConnectivityReport {
            ConnectivityReport {
                success: self.healthy,
                error: (!self.healthy).then(|| "unreachable".to_string()),
                latency_ms: 10,
            }
        }
    }

    fn manager_with(entries: Vec<(ProviderKind, bool)>) -> ProviderManager {
        let manager = ProviderManager::default();
        {
            let mut state = manager.state.write();
            for (kind, healthy) in entries {
                state
                    .providers
                    .push((kind, Arc::new(StubAdapter { kind, healthy })));
                state.health.insert(
                    kind,
                    HealthRecord {
                        is_healthy: healthy,
                        last_checked_at: Utc::now(),
                    },
                );
            }
        }
        manager
    }

    fn prefs_with_default(kind: ProviderKind) -> UserPreferences {
        let mut prefs = UserPreferences::default();
        prefs.providers.default_provider = kind;
        prefs
    }

    #[test]
    fn healthy_default_is_selected() {
        let manager = manager_with(vec![
            (ProviderKind::OpenAi, true),
            (ProviderKind::Ollama, true),
        ]);

        let selected = manager
            .default_provider(&prefs_with_default(ProviderKind::Ollama))
            .unwrap();
        assert_eq!(selected.kind(), ProviderKind::Ollama);
    }

    #[test]
    fn unhealthy_default_falls_back_in_configuration_order() {
        let manager = manager_with(vec![
            (ProviderKind::OpenAi, true),
            (ProviderKind::Ollama, false),
        ]);

        let selected = manager
            .default_provider(&prefs_with_default(ProviderKind::Ollama))
            .unwrap();
        assert_eq!(selected.kind(), ProviderKind::OpenAi);
    }

    #[test]
    fn no_healthy_provider_yields_none() {
        let manager = manager_with(vec![
            (ProviderKind::OpenAi, false),
            (ProviderKind::Ollama, false),
        ]);

        assert!(manager
            .default_provider(&prefs_with_default(ProviderKind::Ollama))
            .is_none());
    }

    #[test]
    fn provider_without_health_record_is_not_selected() {
        let manager = ProviderManager::default();
        {
            let mut state = manager.state.write();
            state.providers.push((
                ProviderKind::Ollama,
                Arc::new(StubAdapter {
                    kind: ProviderKind::Ollama,
                    healthy: true,
                }),
            ));
            // No health record: the provider has never been checked.
        }

        assert!(manager
            .default_provider(&prefs_with_default(ProviderKind::Ollama))
            .is_none());
    }

    #[tokio::test]
    async fn check_health_updates_record_and_timestamp() {
        let manager = manager_with(vec![(ProviderKind::Ollama, false)]);
        let before = manager.health_status()[&ProviderKind::Ollama].last_checked_at;

        // Stub reports unhealthy; record must still be rewritten.
        let healthy = manager.check_health(ProviderKind::Ollama).await;
        assert!(!healthy);

        let record = manager.health_status()[&ProviderKind::Ollama];
        assert!(!record.is_healthy);
        assert!(record.last_checked_at >= before);
    }

    #[tokio::test]
    async fn check_health_of_unknown_provider_is_false() {
        let manager = ProviderManager::default();
        assert!(!manager.check_health(ProviderKind::OpenAi).await);
    }

    #[test]
    fn factory_rejects_unknown_tag() {
        let err = ProviderFactory::create_from_tag("watson", &ProviderSettings::default())
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedProvider(tag) if tag == "watson"));
    }

    #[test]
    fn factory_requires_credential_for_openai() {
        let err =
            ProviderFactory::create(ProviderKind::OpenAi, &ProviderSettings::default()).unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential(_)));
    }

    #[test]
    fn factory_builds_ollama_without_credential() {
        let settings = ProviderSettings::default();
        let adapter = ProviderFactory::create(ProviderKind::Ollama, &settings).unwrap();
        assert_eq!(adapter.kind(), ProviderKind::Ollama);
    }

    #[tokio::test]
    async fn test_report_for_unconfigured_provider() {
        let manager = ProviderManager::default();
        let report = manager.test_and_discover(ProviderKind::OpenAi).await;

        assert!(!report.success);
        assert_eq!(report.models_found, 0);
        assert!(report.errors[0].contains("not configured"));
        assert!(report.recommendations[0].contains("API key"));
    }

    #[test]
    fn slow_latency_recommendation() {
        let report = ConnectivityReport {
            success: true,
            error: None,
            latency_ms: 6000,
        };
        let recommendations =
            recommendations_for(ProviderKind::OpenAi, "https://api.openai.com/v1", &[], &report);
        assert!(recommendations
            .iter()
            .any(|r| r.contains("closer server location")));
    }

    #[test]
    fn empty_models_recommendation_is_family_specific() {
        let report = ConnectivityReport {
            success: true,
            error: None,
            latency_ms: 10,
        };

        let ollama = recommendations_for(ProviderKind::Ollama, "http://remote:11434", &[], &report);
        assert!(ollama.iter().any(|r| r.contains("ollama pull")));

        let openai =
            recommendations_for(ProviderKind::OpenAi, "https://api.openai.com/v1", &[], &report);
        assert!(openai.iter().any(|r| r.contains("API key permissions")));
    }

    #[test]
    fn localhost_ollama_gets_cors_hint() {
        let report = ConnectivityReport {
            success: true,
            error: None,
            latency_ms: 10,
        };
        let recommendations =
            recommendations_for(ProviderKind::Ollama, "http://localhost:11434", &[], &report);
        assert!(recommendations.iter().any(|r| r.contains("OLLAMA_ORIGINS")));
    }

    #[test]
    fn manager_debug_lists_providers() {
        let manager = manager_with(vec![(ProviderKind::Ollama, true)]);
        let debug = format!("{manager:?}");
        assert!(debug.contains("ProviderManager"));
        assert!(debug.contains("Ollama"));
    }
}
