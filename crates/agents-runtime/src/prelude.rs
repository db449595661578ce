//! Common imports for typical runtime usage.
//!
//! Exports the types needed to configure an agent, start a streamed run, and
//! render it, so examples and application code need fewer import lines.
pub use crate::{
    AbortHandle, Agent, AgentsError, InputPart, ModelSettings, OutputPart, ProviderId,
    ResponseEvent, RunConfig, RunOptions, RunOutput, RunResultStreaming, Runner, StreamEvent,
    render_stream,
};
