use std::collections::HashMap;
use std::sync::Arc;

use crate::agent::ModelSettings;
use crate::errors::AgentsError;
use crate::model::{ProviderId, RunOptions};
use crate::provider::ModelProvider;

/// Settings controlling how runs are dispatched.
///
/// Immutable once built. Pass it by reference to `Runner::run_streamed`; the
/// runner never mutates it.
#[derive(Clone)]
pub struct RunConfig {
    providers: HashMap<ProviderId, Arc<dyn ModelProvider>>,
    default_provider: Option<ProviderId>,
    model: Option<String>,
    model_settings: Option<ModelSettings>,
    options: RunOptions,
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut providers: Vec<&str> = self.providers.keys().map(ProviderId::as_str).collect();
        providers.sort_unstable();
        f.debug_struct("RunConfig")
            .field("providers", &providers)
            .field("default_provider", &self.default_provider)
            .field("model", &self.model)
            .field("model_settings", &self.model_settings)
            .field("options", &self.options)
            .finish()
    }
}

impl RunConfig {
    /// Starts a builder for registering providers.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }

    /// Looks up a registered provider, falling back to the default provider
    /// when `id` is `None`.
    pub(crate) fn resolve_provider(
        &self,
        id: Option<&ProviderId>,
    ) -> Result<Arc<dyn ModelProvider>, AgentsError> {
        let id = match (id, self.default_provider.as_ref()) {
            (Some(id), _) | (None, Some(id)) => id,
            (None, None) => {
                return Err(AgentsError::Config(
                    "no model provider registered in run config".into(),
                ));
            }
        };
        self.providers
            .get(id)
            .cloned()
            .ok_or_else(|| AgentsError::ProviderNotFound { provider: id.clone() })
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn model_settings(&self) -> Option<&ModelSettings> {
        self.model_settings.as_ref()
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }
}

/// Builder used to register model providers before creating a `RunConfig`.
#[derive(Default)]
pub struct RunConfigBuilder {
    providers: Vec<Arc<dyn ModelProvider>>,
    default_provider: Option<ProviderId>,
    model: Option<String>,
    model_settings: Option<ModelSettings>,
    options: RunOptions,
}

impl RunConfigBuilder {
    /// Registers a model provider.
    ///
    /// The first registered provider becomes the default unless
    /// `default_provider` names another one.
    pub fn register_provider(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Selects the provider used when model settings do not name one.
    pub fn default_provider(mut self, id: impl Into<ProviderId>) -> Self {
        self.default_provider = Some(id.into());
        self
    }

    /// Overrides the model for every run, regardless of the agent's model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Settings that override the agent's settings field by field.
    pub fn model_settings(mut self, settings: ModelSettings) -> Self {
        self.model_settings = Some(settings);
        self
    }

    pub fn options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the config and validates provider registration (including
    /// duplicates and an unknown default provider).
    pub fn build(self) -> Result<RunConfig, AgentsError> {
        let mut providers: HashMap<ProviderId, Arc<dyn ModelProvider>> = HashMap::new();
        let mut first: Option<ProviderId> = None;
        for provider in self.providers {
            let id = provider.id();
            if providers.contains_key(&id) {
                return Err(AgentsError::Config(format!(
                    "duplicate provider registration: {id}"
                )));
            }
            first.get_or_insert_with(|| id.clone());
            providers.insert(id, provider);
        }

        let default_provider = match self.default_provider {
            Some(id) if !providers.contains_key(&id) => {
                return Err(AgentsError::ProviderNotFound { provider: id });
            }
            Some(id) => Some(id),
            None => first,
        };

        Ok(RunConfig {
            providers,
            default_provider,
            model: self.model.filter(|m| !m.trim().is_empty()),
            model_settings: self.model_settings,
            options: self.options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderError;
    use crate::provider::{ModelRequest, ResponseStream};

    struct DummyProvider(&'static str);

    #[async_trait::async_trait]
    impl ModelProvider for DummyProvider {
        fn id(&self) -> ProviderId {
            ProviderId::new(self.0)
        }

        async fn stream_response(
            &self,
            _req: ModelRequest,
        ) -> Result<ResponseStream, ProviderError> {
            unreachable!("not used in this test")
        }
    }

    #[test]
    fn build_rejects_duplicate_provider_ids() {
        let result = RunConfig::builder()
            .register_provider(Arc::new(DummyProvider("azure_openai")))
            .register_provider(Arc::new(DummyProvider("azure_openai")))
            .build();
        assert!(
            matches!(result, Err(AgentsError::Config(message)) if message.contains("duplicate provider"))
        );
    }

    #[test]
    fn first_registered_provider_is_default() {
        let config = RunConfig::builder()
            .register_provider(Arc::new(DummyProvider("azure_openai")))
            .register_provider(Arc::new(DummyProvider("openai")))
            .build()
            .expect("config");
        let provider = config.resolve_provider(None).expect("default provider");
        assert_eq!(provider.id(), ProviderId::new("azure_openai"));
        let named = config
            .resolve_provider(Some(&ProviderId::new("openai")))
            .expect("named provider");
        assert_eq!(named.id(), ProviderId::new("openai"));
    }

    #[test]
    fn unknown_default_provider_is_rejected() {
        let result = RunConfig::builder()
            .register_provider(Arc::new(DummyProvider("openai")))
            .default_provider("azure_openai")
            .build();
        assert!(matches!(result, Err(AgentsError::ProviderNotFound { .. })));
    }

    #[test]
    fn resolving_without_providers_is_a_config_error() {
        let config = RunConfig::builder().build().expect("empty config");
        assert!(matches!(
            config.resolve_provider(None),
            Err(AgentsError::Config(_))
        ));
        assert!(matches!(
            config.resolve_provider(Some(&ProviderId::new("azure_openai"))),
            Err(AgentsError::ProviderNotFound { .. })
        ));
    }
}
