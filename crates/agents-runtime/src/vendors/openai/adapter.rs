use tracing::debug;

use crate::content::render_input;
use crate::errors::{AgentsError, ProviderError};
use crate::model::{OPENAI, ProviderId};
use crate::provider::{ModelProvider, ModelRequest, ResponseStream};
use crate::sse;

use super::config::OpenAiClientConfig;
use super::transport::ResponsesMapper;

/// Provider adapter for OpenAI's Responses API (streaming).
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: OpenAiClientConfig,
}

impl OpenAiProvider {
    /// Creates a provider from explicit client configuration.
    pub fn new(config: OpenAiClientConfig) -> Result<Self, AgentsError> {
        if config.api_key.trim().is_empty() {
            return Err(AgentsError::Config(
                "OpenAI client config api_key must not be empty".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .read_timeout(config.timeout)
            .build()
            .map_err(|e| AgentsError::Config(format!("failed to build OpenAI client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Creates a provider using `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self, AgentsError> {
        Self::new(OpenAiClientConfig::from_env()?)
    }
}

#[async_trait::async_trait]
impl ModelProvider for OpenAiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::new(OPENAI)
    }

    async fn stream_response(&self, req: ModelRequest) -> Result<ResponseStream, ProviderError> {
        let provider_id = self.id();
        let body = build_request_body(&req)?;
        debug!(run_id = %req.run_id, model = %req.model, "starting OpenAI responses stream");

        let mut http_req = self
            .client
            .post(self.config.responses_url())
            .bearer_auth(&self.config.api_key)
            .json(&body);
        if let Some(timeout) = req.options.timeout {
            http_req = http_req.timeout(timeout);
        }

        let response = http_req.send().await.map_err(|e| {
            ProviderError::transport(provider_id.clone(), format!("OpenAI request failed: {e}"))
        })?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::provider(
                provider_id,
                format!("OpenAI responses request failed with status {status}: {body}"),
                Some(status.as_u16()),
            ));
        }

        Ok(sse::event_stream(
            provider_id,
            Box::pin(response.bytes_stream()),
            ResponsesMapper,
        ))
    }
}

pub(crate) fn build_request_body(req: &ModelRequest) -> Result<serde_json::Value, ProviderError> {
    let user_payload = render_input(&req.input).map_err(|e| {
        ProviderError::protocol(OPENAI, format!("failed to serialize input parts: {e}"))
    })?;

    let mut input = Vec::new();
    if let Some(instructions) = req.instructions.as_deref() {
        input.push(serde_json::json!({
            "role": "system",
            "content": instructions,
        }));
    }
    input.push(serde_json::json!({
        "role": "user",
        "content": user_payload,
    }));

    let mut body = serde_json::json!({
        "model": req.model,
        "input": input,
        "stream": true,
        "store": false,
    });
    if let Some(temperature) = req.settings.temperature {
        body["temperature"] = serde_json::json!(temperature);
    }
    if let Some(top_p) = req.settings.top_p {
        body["top_p"] = serde_json::json!(top_p);
    }
    if let Some(max_tokens) = req.settings.max_tokens {
        body["max_output_tokens"] = serde_json::json!(max_tokens);
    }
    Ok(body)
}
