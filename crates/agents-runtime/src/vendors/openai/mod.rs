//! OpenAI provider integration over the Responses API.
mod adapter;
mod config;
pub(crate) mod transport;

pub use adapter::OpenAiProvider;
pub use config::OpenAiClientConfig;
