use std::time::Duration;

use crate::errors::AgentsError;

/// API version used when `AZURE_OPENAI_API_VERSION` is not set.
pub const DEFAULT_API_VERSION: &str = "2024-10-21";

/// Connection settings for an Azure OpenAI resource.
#[derive(Clone)]
pub struct AzureOpenAiConfig {
    /// Key sent in the `api-key` header.
    pub api_key: String,
    /// Resource endpoint, for example `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    pub api_version: String,
    /// Deployment to call. When unset, the run's model name is used as the
    /// deployment name.
    pub deployment: Option<String>,
    /// Connect timeout and longest wait for the next body read. A streamed
    /// answer as a whole is bounded only by `RunOptions::timeout`.
    pub timeout: Duration,
}

impl std::fmt::Debug for AzureOpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureOpenAiConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("deployment", &self.deployment)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AzureOpenAiConfig {
    /// Creates a config with the default API version and timeout.
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            deployment: None,
            timeout: Duration::from_secs(120),
        }
    }

    /// Builds a config from the process environment.
    ///
    /// Reads `AZURE_OPENAI_API_KEY` and `AZURE_OPENAI_ENDPOINT` (required),
    /// `AZURE_OPENAI_API_VERSION` and `AZURE_OPENAI_DEPLOYMENT` (optional).
    pub fn from_env() -> Result<Self, AgentsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AgentsError> {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = read("AZURE_OPENAI_API_KEY").ok_or_else(|| {
            AgentsError::Config("missing AZURE_OPENAI_API_KEY for Azure OpenAI provider".into())
        })?;
        let endpoint = read("AZURE_OPENAI_ENDPOINT").ok_or_else(|| {
            AgentsError::Config("missing AZURE_OPENAI_ENDPOINT for Azure OpenAI provider".into())
        })?;

        let mut config = Self::new(api_key, endpoint);
        if let Some(version) = read("AZURE_OPENAI_API_VERSION") {
            config.api_version = version;
        }
        config.deployment = read("AZURE_OPENAI_DEPLOYMENT");
        Ok(config)
    }

    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn deployment(mut self, deployment: impl Into<String>) -> Self {
        self.deployment = Some(deployment.into());
        self
    }

    /// Overrides the connect and read timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn chat_completions_url(&self, deployment: &str) -> String {
        format!(
            "{}/openai/deployments/{deployment}/chat/completions",
            self.endpoint.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn from_lookup_reads_required_and_optional_values() {
        let config = AzureOpenAiConfig::from_lookup(lookup(&[
            ("AZURE_OPENAI_API_KEY", "secret"),
            ("AZURE_OPENAI_ENDPOINT", "https://astro.openai.azure.com/"),
            ("AZURE_OPENAI_API_VERSION", "2024-06-01"),
            ("AZURE_OPENAI_DEPLOYMENT", "gpt-4o-astro"),
        ]))
        .expect("config");
        assert_eq!(config.api_version, "2024-06-01");
        assert_eq!(config.deployment.as_deref(), Some("gpt-4o-astro"));
        assert_eq!(
            config.chat_completions_url("gpt-4o-astro"),
            "https://astro.openai.azure.com/openai/deployments/gpt-4o-astro/chat/completions"
        );
    }

    #[test]
    fn optional_values_fall_back_to_defaults() {
        let config = AzureOpenAiConfig::from_lookup(lookup(&[
            ("AZURE_OPENAI_API_KEY", "secret"),
            ("AZURE_OPENAI_ENDPOINT", "https://astro.openai.azure.com"),
            ("AZURE_OPENAI_DEPLOYMENT", "  "),
        ]))
        .expect("config");
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.deployment, None);
    }

    #[test]
    fn missing_endpoint_is_config_error() {
        let err = AzureOpenAiConfig::from_lookup(lookup(&[("AZURE_OPENAI_API_KEY", "secret")]))
            .expect_err("missing endpoint");
        assert!(matches!(err, AgentsError::Config(msg) if msg.contains("AZURE_OPENAI_ENDPOINT")));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = AzureOpenAiConfig::new("super-secret", "https://astro.openai.azure.com");
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
