use tracing::debug;

use crate::content::render_input;
use crate::errors::{AgentsError, ProviderError};
use crate::model::{AZURE_OPENAI, ProviderId};
use crate::provider::{ModelProvider, ModelRequest, ResponseStream};
use crate::sse;

use super::config::AzureOpenAiConfig;
use super::transport::ChatStreamTranslator;

/// Provider adapter for Azure OpenAI chat completions (streaming).
///
/// Chat completion chunks are translated into Responses-style events so
/// consumers see the same event shapes regardless of vendor.
pub struct AzureOpenAiProvider {
    client: reqwest::Client,
    config: AzureOpenAiConfig,
}

impl AzureOpenAiProvider {
    /// Creates a provider from explicit configuration.
    pub fn new(config: AzureOpenAiConfig) -> Result<Self, AgentsError> {
        if config.api_key.trim().is_empty() {
            return Err(AgentsError::Config(
                "Azure OpenAI config api_key must not be empty".into(),
            ));
        }
        if config.endpoint.trim().is_empty() {
            return Err(AgentsError::Config(
                "Azure OpenAI config endpoint must not be empty".into(),
            ));
        }
        // Streamed answers can run longer than any fixed total, so only
        // connecting and each read wait are bounded here.
        let client = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .read_timeout(config.timeout)
            .build()
            .map_err(|e| {
                AgentsError::Config(format!("failed to build Azure OpenAI client: {e}"))
            })?;
        Ok(Self { client, config })
    }

    /// Creates a provider from the `AZURE_OPENAI_*` environment variables.
    pub fn from_env() -> Result<Self, AgentsError> {
        Self::new(AzureOpenAiConfig::from_env()?)
    }

    pub fn config(&self) -> &AzureOpenAiConfig {
        &self.config
    }

    fn deployment_for<'a>(&'a self, req: &'a ModelRequest) -> &'a str {
        self.config.deployment.as_deref().unwrap_or(&req.model)
    }
}

#[async_trait::async_trait]
impl ModelProvider for AzureOpenAiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::new(AZURE_OPENAI)
    }

    async fn stream_response(&self, req: ModelRequest) -> Result<ResponseStream, ProviderError> {
        let provider_id = self.id();
        let body = build_request_body(&req)?;
        let deployment = self.deployment_for(&req);
        debug!(run_id = %req.run_id, deployment, api_version = %self.config.api_version, "starting Azure OpenAI chat stream");

        let mut http_req = self
            .client
            .post(self.config.chat_completions_url(deployment))
            .query(&[("api-version", self.config.api_version.as_str())])
            .header("api-key", &self.config.api_key)
            .json(&body);
        if let Some(timeout) = req.options.timeout {
            http_req = http_req.timeout(timeout);
        }

        let response = http_req.send().await.map_err(|e| {
            ProviderError::transport(
                provider_id.clone(),
                format!("Azure OpenAI request failed: {e}"),
            )
        })?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::provider(
                provider_id,
                format!("Azure OpenAI chat request failed with status {status}: {body}"),
                Some(status.as_u16()),
            ));
        }

        Ok(sse::event_stream(
            provider_id,
            Box::pin(response.bytes_stream()),
            ChatStreamTranslator::default(),
        ))
    }
}

/// Builds the chat completions body. The deployment lives in the URL, so no
/// `model` field is sent.
pub(crate) fn build_request_body(req: &ModelRequest) -> Result<serde_json::Value, ProviderError> {
    let user_payload = render_input(&req.input).map_err(|e| {
        ProviderError::protocol(
            AZURE_OPENAI,
            format!("failed to serialize input parts: {e}"),
        )
    })?;

    let mut messages = Vec::new();
    if let Some(instructions) = req.instructions.as_deref() {
        messages.push(serde_json::json!({
            "role": "system",
            "content": instructions,
        }));
    }
    messages.push(serde_json::json!({
        "role": "user",
        "content": user_payload,
    }));

    let mut body = serde_json::json!({
        "messages": messages,
        "stream": true,
        "stream_options": { "include_usage": true },
    });
    if let Some(temperature) = req.settings.temperature {
        body["temperature"] = serde_json::json!(temperature);
    }
    if let Some(top_p) = req.settings.top_p {
        body["top_p"] = serde_json::json!(top_p);
    }
    if let Some(max_tokens) = req.settings.max_tokens {
        body["max_tokens"] = serde_json::json!(max_tokens);
    }
    Ok(body)
}
