use crate::model::ProviderId;

/// Model used when neither the agent nor the run configuration names one.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Model-level settings for a run.
///
/// Every field is optional; unset fields are left to the provider's defaults
/// and are omitted from the request body.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelSettings {
    /// Provider that should resolve the model call (for example `azure_openai`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderId>,
    /// Sampling temperature, passed through uninterpreted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling, passed through uninterpreted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Maximum number of output tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ModelSettings {
    pub fn provider(mut self, provider: impl Into<ProviderId>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Returns these settings with every field set in `overrides` replacing
    /// the corresponding field here.
    pub fn resolve(&self, overrides: Option<&ModelSettings>) -> ModelSettings {
        let Some(overrides) = overrides else {
            return self.clone();
        };
        ModelSettings {
            provider: overrides.provider.clone().or_else(|| self.provider.clone()),
            temperature: overrides.temperature.or(self.temperature),
            top_p: overrides.top_p.or(self.top_p),
            max_tokens: overrides.max_tokens.or(self.max_tokens),
        }
    }
}

/// Named configuration bundle describing how a model should behave for a run.
#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    pub name: String,
    /// System prompt sent ahead of the user input.
    pub instructions: Option<String>,
    /// Provider-specific model name (an Azure deployment, `gpt-4o`, ...).
    pub model: Option<String>,
    pub model_settings: ModelSettings,
}

impl Agent {
    /// Creates an agent with default model settings and no instructions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: None,
            model: None,
            model_settings: ModelSettings::default(),
        }
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn model_settings(mut self, settings: ModelSettings) -> Self {
        self.model_settings = settings;
        self
    }
}
