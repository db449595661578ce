//! Azure OpenAI provider.
//!
//! Azure deployments are called through the Chat Completions API; the chunk
//! stream is translated into the same response events the OpenAI Responses
//! API produces, so consumers see one event model for every provider.
mod adapter;
mod config;
pub(crate) mod transport;

pub use adapter::AzureOpenAiProvider;
pub use config::{AzureOpenAiConfig, DEFAULT_API_VERSION};
