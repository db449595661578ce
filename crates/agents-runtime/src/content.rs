/// Input content sent to a model run.
///
/// Text-first, but the enum is non-exhaustive so new content kinds can be
/// added without breaking callers.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[non_exhaustive]
pub enum InputPart {
    /// Plain text input.
    Text(String),
    /// Structured JSON input, sent to the model as serialized text.
    Json(serde_json::Value),
}

impl InputPart {
    /// Renders the part as the text the model receives.
    pub fn render(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Text(text) => Ok(text.clone()),
            Self::Json(value) => serde_json::to_string(value),
        }
    }
}

/// Joins input parts into a single user message, one part per line.
pub(crate) fn render_input(parts: &[InputPart]) -> Result<String, serde_json::Error> {
    let mut segments = Vec::with_capacity(parts.len());
    for part in parts {
        segments.push(part.render()?);
    }
    Ok(segments.join("\n"))
}

/// Output content produced by a model run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[non_exhaustive]
pub enum OutputPart {
    /// Plain text output.
    Text(String),
    /// Structured JSON output.
    Json(serde_json::Value),
}

/// Token accounting reported by the provider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    /// Reads usage from either Chat Completions (`prompt_tokens`) or
    /// Responses (`input_tokens`) field names.
    pub(crate) fn from_json(value: &serde_json::Value) -> Option<Self> {
        let field = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| value.get(*name).and_then(|v| v.as_u64()))
        };
        let input_tokens = field(&["input_tokens", "prompt_tokens"])?;
        let output_tokens = field(&["output_tokens", "completion_tokens"]).unwrap_or(0);
        let total_tokens =
            field(&["total_tokens"]).unwrap_or(input_tokens.saturating_add(output_tokens));
        Some(Self {
            input_tokens,
            output_tokens,
            total_tokens,
        })
    }
}

/// Final aggregated output for a completed run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, Default)]
pub struct RunOutput {
    /// Output parts in the order they were produced.
    pub parts: Vec<OutputPart>,
    /// Vendor-specific finish reason when available (for example `stop`).
    pub finish_reason: Option<String>,
    /// Token usage when the provider reported it.
    pub usage: Option<Usage>,
}

impl RunOutput {
    /// Concatenates all text parts in order and ignores non-text parts.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            if let OutputPart::Text(text) = part {
                out.push_str(text);
            }
        }
        out
    }
}
