//! Streamed agent runs over hosted model providers.
//!
//! An [`Agent`] describes how a model should behave, a [`RunConfig`] selects
//! which provider resolves the call, and [`Runner::run_streamed`] starts a run
//! whose events can be consumed incrementally. [`render::render_stream`] turns
//! that event stream into terminal text.
//!
//! Vendor-specific APIs are namespaced under `vendors::*`.
//!
//! # Streaming text (Azure OpenAI)
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use agents_runtime::prelude::*;
//! use agents_runtime::vendors::azure_openai::AzureOpenAiProvider;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), AgentsError> {
//! let run_config = RunConfig::builder()
//!     .register_provider(Arc::new(AzureOpenAiProvider::from_env()?))
//!     .build()?;
//!
//! let agent = Agent::new("Streaming Agent")
//!     .instructions("Answer briefly.")
//!     .model_settings(ModelSettings::default().provider("azure_openai").temperature(0.7));
//!
//! let mut result = Runner::run_streamed(&agent, "Why does Saturn have rings?", &run_config)?;
//! render_stream(result.stream_events(), &mut std::io::stdout()).await?;
//! # Ok(())
//! # }
//! ```

/// Agent descriptor and model-level settings.
pub mod agent;
/// Run configuration and provider registration.
pub mod config;
/// Input/output content types and final run output helpers.
pub mod content;
/// Public error types.
pub mod errors;
/// Response payload events and normalized run stream events.
pub mod events;
/// Provider and generic run option types.
pub mod model;
/// Tracing subscriber setup.
pub mod observability;
/// Common imports for typical usage.
pub mod prelude;
/// Model provider contract used by vendor integrations.
pub mod provider;
/// Terminal rendering of streamed text.
pub mod render;
/// Streamed runner, run handle, and cancellation handle.
pub mod runner;
pub(crate) mod sse;
/// Vendor-specific integrations.
pub mod vendors;

pub use agent::{Agent, DEFAULT_MODEL, ModelSettings};
pub use config::{RunConfig, RunConfigBuilder};
pub use content::{InputPart, OutputPart, RunOutput, Usage};
pub use errors::{AgentsError, ProviderError, RunFailure};
pub use events::{OutputItem, ResponseEvent, RunItem, StreamEvent};
pub use model::{ProviderId, RunOptions};
pub use provider::{ModelProvider, ModelRequest, ResponseStream};
pub use render::{SegmentState, TextRenderer, render_stream};
pub use runner::{AbortHandle, RunResultStreaming, Runner};
