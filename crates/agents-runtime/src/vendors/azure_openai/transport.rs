use std::collections::BTreeMap;

use crate::content::{OutputPart, RunOutput, Usage};
use crate::errors::ProviderError;
use crate::events::{OutputItem, ResponseEvent};
use crate::model::ProviderId;
use crate::sse::{FrameMapper, SseFrame};

struct MessageState {
    output_index: u32,
    text: String,
}

struct ToolCallState {
    output_index: u32,
    call_id: String,
    name: String,
    arguments: String,
}

/// Translates Chat Completions chunks into Responses-style events.
///
/// Chat chunks only carry deltas, so the translator opens output items and
/// content parts on first sight and closes all of them at `[DONE]`. A body
/// that ends without `[DONE]` still completes when a finish reason arrived;
/// otherwise the answer was cut off and the stream fails.
#[derive(Default)]
pub(crate) struct ChatStreamTranslator {
    started: bool,
    response_id: Option<String>,
    next_output_index: u32,
    message: Option<MessageState>,
    tool_calls: BTreeMap<u64, ToolCallState>,
    finish_reason: Option<String>,
    usage: Option<Usage>,
    finished: bool,
}

impl ChatStreamTranslator {
    pub fn push_chunk(
        &mut self,
        provider: &ProviderId,
        chunk: &serde_json::Value,
    ) -> Result<Vec<ResponseEvent>, ProviderError> {
        if let Some(error) = chunk.get("error").filter(|e| !e.is_null()) {
            let message = error
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("Azure OpenAI stream error");
            return Err(ProviderError::provider(provider.clone(), message, None));
        }

        let mut events = Vec::new();
        if !self.started {
            self.started = true;
            self.response_id = chunk
                .get("id")
                .and_then(|v| v.as_str())
                .filter(|id| !id.is_empty())
                .map(ToOwned::to_owned);
            events.push(ResponseEvent::Created {
                response_id: self.response_id.clone(),
            });
        }
        if let Some(usage) = chunk.get("usage").and_then(Usage::from_json) {
            self.usage = Some(usage);
        }

        // Azure may send a leading chunk with only prompt filter results and
        // an empty `choices` array.
        let Some(choice) = chunk
            .get("choices")
            .and_then(|v| v.as_array())
            .and_then(|choices| choices.first())
        else {
            return Ok(events);
        };

        if let Some(delta) = choice.get("delta") {
            if let Some(text) = delta
                .get("content")
                .and_then(|v| v.as_str())
                .filter(|t| !t.is_empty())
            {
                self.push_text(text, &mut events);
            }
            if let Some(tool_calls) = delta.get("tool_calls").and_then(|v| v.as_array()) {
                for tool_call in tool_calls {
                    self.push_tool_call(tool_call, &mut events);
                }
            }
        }
        if let Some(reason) = choice.get("finish_reason").and_then(|v| v.as_str()) {
            self.finish_reason = Some(reason.to_string());
        }
        Ok(events)
    }

    fn allocate_output_index(&mut self) -> u32 {
        let index = self.next_output_index;
        self.next_output_index += 1;
        index
    }

    fn push_text(&mut self, text: &str, events: &mut Vec<ResponseEvent>) {
        if self.message.is_none() {
            let output_index = self.allocate_output_index();
            events.push(ResponseEvent::OutputItemAdded {
                output_index,
                item: OutputItem::Message {
                    id: self.response_id.clone(),
                    text: String::new(),
                },
            });
            events.push(ResponseEvent::ContentPartAdded {
                output_index,
                content_index: 0,
            });
            self.message = Some(MessageState {
                output_index,
                text: String::new(),
            });
        }
        if let Some(message) = self.message.as_mut() {
            message.text.push_str(text);
            events.push(ResponseEvent::TextDelta {
                output_index: message.output_index,
                content_index: 0,
                delta: text.to_string(),
            });
        }
    }

    fn push_tool_call(&mut self, tool_call: &serde_json::Value, events: &mut Vec<ResponseEvent>) {
        let index = tool_call.get("index").and_then(|v| v.as_u64()).unwrap_or(0);
        let function = tool_call.get("function");
        let name = function
            .and_then(|f| f.get("name"))
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        if !self.tool_calls.contains_key(&index) {
            let output_index = self.allocate_output_index();
            let call_id = tool_call
                .get("id")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            events.push(ResponseEvent::OutputItemAdded {
                output_index,
                item: OutputItem::FunctionCall {
                    call_id: call_id.clone(),
                    name: name.to_string(),
                    arguments: String::new(),
                },
            });
            self.tool_calls.insert(
                index,
                ToolCallState {
                    output_index,
                    call_id,
                    name: name.to_string(),
                    arguments: String::new(),
                },
            );
        }

        let Some(state) = self.tool_calls.get_mut(&index) else {
            return;
        };
        if state.name.is_empty() && !name.is_empty() {
            state.name = name.to_string();
        }
        if let Some(arguments) = function
            .and_then(|f| f.get("arguments"))
            .and_then(|v| v.as_str())
            .filter(|a| !a.is_empty())
        {
            state.arguments.push_str(arguments);
            events.push(ResponseEvent::FunctionCallArgumentsDelta {
                output_index: state.output_index,
                call_id: state.call_id.clone(),
                delta: arguments.to_string(),
            });
        }
    }

    /// Closes every open item in output order and emits `Completed`.
    pub fn finish(&mut self) -> Vec<ResponseEvent> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;

        let mut closing: Vec<(u32, Vec<ResponseEvent>)> = Vec::new();
        let mut parts = Vec::new();
        if let Some(message) = self.message.take() {
            let output_index = message.output_index;
            parts.push(OutputPart::Text(message.text.clone()));
            closing.push((
                output_index,
                vec![
                    ResponseEvent::TextDone {
                        output_index,
                        content_index: 0,
                        text: message.text.clone(),
                    },
                    ResponseEvent::ContentPartDone {
                        output_index,
                        content_index: 0,
                    },
                    ResponseEvent::OutputItemDone {
                        output_index,
                        item: OutputItem::Message {
                            id: self.response_id.clone(),
                            text: message.text,
                        },
                    },
                ],
            ));
        }
        for state in std::mem::take(&mut self.tool_calls).into_values() {
            closing.push((
                state.output_index,
                vec![ResponseEvent::OutputItemDone {
                    output_index: state.output_index,
                    item: OutputItem::FunctionCall {
                        call_id: state.call_id,
                        name: state.name,
                        arguments: state.arguments,
                    },
                }],
            ));
        }
        closing.sort_by_key(|(output_index, _)| *output_index);

        let mut events: Vec<ResponseEvent> = closing.into_iter().flat_map(|(_, e)| e).collect();
        events.push(ResponseEvent::Completed {
            output: Some(RunOutput {
                parts,
                finish_reason: self.finish_reason.clone(),
                usage: self.usage,
            }),
        });
        events
    }
}

impl FrameMapper for ChatStreamTranslator {
    fn map_frame(
        &mut self,
        provider: &ProviderId,
        frame: &SseFrame,
    ) -> Result<Vec<ResponseEvent>, ProviderError> {
        if self.finished || frame.data.trim().is_empty() {
            return Ok(Vec::new());
        }
        if frame.is_done() {
            return Ok(self.finish());
        }
        let chunk: serde_json::Value = serde_json::from_str(&frame.data).map_err(|e| {
            ProviderError::protocol(provider.clone(), format!("invalid SSE JSON frame: {e}"))
        })?;
        self.push_chunk(provider, &chunk)
    }

    fn finish(&mut self, provider: &ProviderId) -> Result<Vec<ResponseEvent>, ProviderError> {
        if !self.finished && self.finish_reason.is_none() {
            self.finished = true;
            return Err(ProviderError::protocol(
                provider.clone(),
                "chat stream ended before [DONE] without a finish reason",
            ));
        }
        Ok(ChatStreamTranslator::finish(self))
    }
}
