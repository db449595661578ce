use std::time::Duration;

use crate::model::ProviderId;

/// Errors returned by a model provider before they are normalized for the
/// run stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Provider returned an application-level failure (HTTP status, auth, etc.).
    #[error("provider error ({provider}): {message}")]
    Provider {
        provider: ProviderId,
        message: String,
        status_code: Option<u16>,
    },
    /// Transport or stream I/O failed.
    #[error("transport error ({provider}): {message}")]
    Transport {
        provider: ProviderId,
        message: String,
    },
    /// Provider response shape or event sequencing was invalid.
    #[error("protocol error ({provider}): {message}")]
    Protocol {
        provider: ProviderId,
        message: String,
    },
}

impl ProviderError {
    /// Creates a provider-level error.
    pub fn provider(
        provider: impl Into<ProviderId>,
        message: impl Into<String>,
        status_code: Option<u16>,
    ) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            status_code,
        }
    }

    /// Creates a transport-level error.
    pub fn transport(provider: impl Into<ProviderId>, message: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates a protocol-level error.
    pub fn protocol(provider: impl Into<ProviderId>, message: impl Into<String>) -> Self {
        Self::Protocol {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Returns the provider associated with this error.
    pub fn provider_id(&self) -> &ProviderId {
        match self {
            Self::Provider { provider, .. }
            | Self::Transport { provider, .. }
            | Self::Protocol { provider, .. } => provider,
        }
    }

    /// Returns the HTTP status code when the provider reported one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Provider { status_code, .. } => *status_code,
            Self::Transport { .. } | Self::Protocol { .. } => None,
        }
    }
}

/// Terminal failure of a started run, yielded as the last item of the run
/// stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum RunFailure {
    /// Provider returned a terminal failure.
    #[error("provider failure ({provider}): {message}")]
    Provider { provider: String, message: String },
    /// Network/stream transport failed.
    #[error("transport failure ({provider}): {message}")]
    Transport { provider: String, message: String },
    /// The runtime detected a protocol or invariant error.
    #[error("protocol failure: {message}")]
    Protocol { message: String },
    /// The run was cancelled through its `AbortHandle`.
    #[error("run cancelled")]
    Cancelled,
    /// The run exceeded `RunOptions::timeout`.
    #[error("run timed out after {timeout:?}")]
    Timeout { timeout: Duration },
}

impl From<ProviderError> for RunFailure {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Provider {
                provider, message, ..
            } => Self::Provider {
                provider: provider.to_string(),
                message,
            },
            ProviderError::Transport { provider, message } => Self::Transport {
                provider: provider.to_string(),
                message,
            },
            ProviderError::Protocol { provider, message } => Self::Protocol {
                message: format!("provider={provider}: {message}"),
            },
        }
    }
}

/// Top-level error type for the public runtime API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentsError {
    /// Invalid runtime/provider configuration (including missing credentials).
    #[error("config error: {0}")]
    Config(String),
    /// Invalid agent, input, or run options.
    #[error("validation error: {0}")]
    Validation(String),
    /// Requested provider is not registered in the run configuration.
    #[error("provider not found: {provider}")]
    ProviderNotFound { provider: ProviderId },
    /// Provider error surfaced outside a run stream.
    #[error(transparent)]
    Provider(ProviderError),
    /// Terminal failure of a started run.
    #[error(transparent)]
    RunFailed(RunFailure),
    /// Internal protocol misuse or invariant violation.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// Reading input or writing to the output sink failed.
    #[error("io error: {0}")]
    Io(String),
}

impl AgentsError {
    pub(crate) fn protocol_msg(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}

impl From<RunFailure> for AgentsError {
    fn from(value: RunFailure) -> Self {
        AgentsError::RunFailed(value)
    }
}

impl From<ProviderError> for AgentsError {
    fn from(value: ProviderError) -> Self {
        AgentsError::Provider(value)
    }
}

impl From<std::io::Error> for AgentsError {
    fn from(value: std::io::Error) -> Self {
        AgentsError::Io(value.to_string())
    }
}
