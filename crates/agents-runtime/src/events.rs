//! Two layers of events flow out of a streamed run.
//!
//! [`ResponseEvent`] is the provider-level payload, shaped after the OpenAI
//! Responses streaming protocol regardless of which vendor produced it.
//! [`StreamEvent`] is what a run handle yields: raw payloads wrapped with run
//! metadata, plus higher-level items and agent updates.
use crate::content::RunOutput;

/// Kind of output item opened or closed within a response.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum OutputItem {
    /// Assistant message. `text` is empty when the item is opened and holds
    /// the full message text when it is closed.
    Message { id: Option<String>, text: String },
    /// Function/tool call requested by the model. `arguments` is complete only
    /// when the item is closed.
    FunctionCall {
        call_id: String,
        name: String,
        arguments: String,
    },
    /// Reasoning summary item.
    Reasoning,
    /// Item type this runtime does not model.
    Other { kind: String },
}

/// One unit of streaming output from a model provider.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum ResponseEvent {
    /// Response accepted by the provider.
    Created { response_id: Option<String> },
    OutputItemAdded {
        output_index: u32,
        item: OutputItem,
    },
    ContentPartAdded {
        output_index: u32,
        content_index: u32,
    },
    /// Newly generated text since the previous delta.
    TextDelta {
        output_index: u32,
        content_index: u32,
        delta: String,
    },
    /// Full text of a finished content part.
    TextDone {
        output_index: u32,
        content_index: u32,
        text: String,
    },
    /// One logical content segment finished.
    ContentPartDone {
        output_index: u32,
        content_index: u32,
    },
    FunctionCallArgumentsDelta {
        output_index: u32,
        call_id: String,
        delta: String,
    },
    OutputItemDone {
        output_index: u32,
        item: OutputItem,
    },
    /// Terminal success. `output` carries the provider's own aggregate when it
    /// sends one.
    Completed { output: Option<RunOutput> },
    /// Wire event type this runtime does not model.
    Other { kind: String },
}

impl ResponseEvent {
    /// Wire name of the event, used in logs.
    pub fn kind(&self) -> &str {
        match self {
            Self::Created { .. } => "response.created",
            Self::OutputItemAdded { .. } => "response.output_item.added",
            Self::ContentPartAdded { .. } => "response.content_part.added",
            Self::TextDelta { .. } => "response.output_text.delta",
            Self::TextDone { .. } => "response.output_text.done",
            Self::ContentPartDone { .. } => "response.content_part.done",
            Self::FunctionCallArgumentsDelta { .. } => "response.function_call_arguments.delta",
            Self::OutputItemDone { .. } => "response.output_item.done",
            Self::Completed { .. } => "response.completed",
            Self::Other { kind } => kind.as_str(),
        }
    }
}

/// Higher-level item produced when an output item closes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunItem {
    MessageOutput { text: String },
    /// Surfaced for observers; the runtime never executes tools.
    ToolCall {
        call_id: String,
        name: String,
        arguments: String,
    },
}

/// Events yielded by `RunResultStreaming`.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    /// First event for every run.
    AgentUpdated {
        run_id: uuid::Uuid,
        agent_name: String,
    },
    /// Provider payload, forwarded unchanged in arrival order.
    RawResponse {
        run_id: uuid::Uuid,
        seq: u64,
        data: ResponseEvent,
    },
    RunItem { run_id: uuid::Uuid, item: RunItem },
}

impl StreamEvent {
    pub fn run_id(&self) -> uuid::Uuid {
        match self {
            Self::AgentUpdated { run_id, .. }
            | Self::RawResponse { run_id, .. }
            | Self::RunItem { run_id, .. } => *run_id,
        }
    }

    /// Returns the provider payload when this is a raw response event.
    pub fn raw(&self) -> Option<&ResponseEvent> {
        match self {
            Self::RawResponse { data, .. } => Some(data),
            Self::AgentUpdated { .. } | Self::RunItem { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_events_report_their_wire_kind() {
        let event = ResponseEvent::Other {
            kind: "response.reasoning_summary_text.delta".into(),
        };
        assert_eq!(event.kind(), "response.reasoning_summary_text.delta");
        assert_eq!(
            ResponseEvent::ContentPartDone {
                output_index: 0,
                content_index: 0
            }
            .kind(),
            "response.content_part.done"
        );
    }

    #[test]
    fn raw_is_only_available_on_raw_response_events() {
        let run_id = uuid::Uuid::new_v4();
        let raw = StreamEvent::RawResponse {
            run_id,
            seq: 0,
            data: ResponseEvent::Created { response_id: None },
        };
        let updated = StreamEvent::AgentUpdated {
            run_id,
            agent_name: "Streaming Agent".into(),
        };
        assert!(raw.raw().is_some());
        assert!(updated.raw().is_none());
        assert_eq!(updated.run_id(), run_id);
    }
}
