use crate::content::{OutputPart, RunOutput, Usage};
use crate::errors::ProviderError;
use crate::events::{OutputItem, ResponseEvent};
use crate::model::ProviderId;
use crate::sse::{FrameMapper, SseFrame};

/// Maps Responses API stream frames one-to-one onto [`ResponseEvent`]s.
#[derive(Default)]
pub(crate) struct ResponsesMapper;

impl FrameMapper for ResponsesMapper {
    fn map_frame(
        &mut self,
        provider: &ProviderId,
        frame: &SseFrame,
    ) -> Result<Vec<ResponseEvent>, ProviderError> {
        if frame.data.trim().is_empty() || frame.is_done() {
            return Ok(Vec::new());
        }
        let value: serde_json::Value = serde_json::from_str(&frame.data).map_err(|e| {
            ProviderError::protocol(provider.clone(), format!("invalid SSE JSON frame: {e}"))
        })?;
        map_responses_json(provider, &value)
    }
}

fn index(value: &serde_json::Value, key: &str) -> u32 {
    value
        .get(key)
        .and_then(|v| v.as_u64())
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}

fn string(value: &serde_json::Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

pub(crate) fn map_responses_json(
    provider: &ProviderId,
    value: &serde_json::Value,
) -> Result<Vec<ResponseEvent>, ProviderError> {
    let Some(event_type) = value.get("type").and_then(|v| v.as_str()) else {
        return Ok(Vec::new());
    };
    let output_index = index(value, "output_index");
    let content_index = index(value, "content_index");
    let event = match event_type {
        "response.created" => ResponseEvent::Created {
            response_id: value
                .get("response")
                .and_then(|r| r.get("id"))
                .and_then(|v| v.as_str())
                .map(ToOwned::to_owned),
        },
        "response.output_item.added" => ResponseEvent::OutputItemAdded {
            output_index,
            item: parse_output_item(value.get("item")),
        },
        "response.content_part.added" => ResponseEvent::ContentPartAdded {
            output_index,
            content_index,
        },
        "response.output_text.delta" => ResponseEvent::TextDelta {
            output_index,
            content_index,
            delta: string(value, "delta"),
        },
        "response.output_text.done" => ResponseEvent::TextDone {
            output_index,
            content_index,
            text: string(value, "text"),
        },
        "response.content_part.done" => ResponseEvent::ContentPartDone {
            output_index,
            content_index,
        },
        "response.function_call_arguments.delta" => ResponseEvent::FunctionCallArgumentsDelta {
            output_index,
            call_id: string(value, "item_id"),
            delta: string(value, "delta"),
        },
        "response.output_item.done" => ResponseEvent::OutputItemDone {
            output_index,
            item: parse_output_item(value.get("item")),
        },
        "response.completed" => {
            let response = value.get("response").unwrap_or(value);
            ResponseEvent::Completed {
                output: Some(completed_output(response)),
            }
        }
        "response.error" | "response.failed" | "error" => {
            let message = value
                .get("response")
                .and_then(|r| r.get("error"))
                .or_else(|| value.get("error"))
                .and_then(|e| e.get("message"))
                .and_then(|v| v.as_str())
                .or_else(|| value.get("message").and_then(|v| v.as_str()))
                .unwrap_or("OpenAI stream error");
            return Err(ProviderError::provider(provider.clone(), message, None));
        }
        other => ResponseEvent::Other {
            kind: other.to_string(),
        },
    };
    Ok(vec![event])
}

fn parse_output_item(item: Option<&serde_json::Value>) -> OutputItem {
    let Some(item) = item else {
        return OutputItem::Other {
            kind: "unknown".into(),
        };
    };
    match item.get("type").and_then(|v| v.as_str()).unwrap_or_default() {
        "message" => OutputItem::Message {
            id: item
                .get("id")
                .and_then(|v| v.as_str())
                .map(ToOwned::to_owned),
            text: message_text(item),
        },
        "function_call" => OutputItem::FunctionCall {
            call_id: string(item, "call_id"),
            name: string(item, "name"),
            arguments: string(item, "arguments"),
        },
        "reasoning" => OutputItem::Reasoning,
        other => OutputItem::Other {
            kind: other.to_string(),
        },
    }
}

fn message_text(item: &serde_json::Value) -> String {
    let mut text = String::new();
    if let Some(content) = item.get("content").and_then(|v| v.as_array()) {
        for part in content {
            if let Some(t) = part.get("text").and_then(|v| v.as_str()) {
                text.push_str(t);
            }
        }
    }
    text
}

fn completed_output(response: &serde_json::Value) -> RunOutput {
    let finish_reason = response
        .get("incomplete_details")
        .and_then(|d| d.get("reason"))
        .and_then(|v| v.as_str())
        .or_else(|| response.get("status").and_then(|v| v.as_str()))
        .map(ToOwned::to_owned);
    RunOutput {
        parts: extract_output_text(response)
            .map(OutputPart::Text)
            .into_iter()
            .collect(),
        finish_reason,
        usage: response.get("usage").and_then(Usage::from_json),
    }
}

pub(crate) fn extract_output_text(response: &serde_json::Value) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(items) = response.get("output").and_then(|v| v.as_array()) {
        for item in items {
            if item.get("type").and_then(|v| v.as_str()) != Some("message") {
                continue;
            }
            parts.push(message_text(item));
        }
    }
    let joined = parts.join("");
    if !joined.is_empty() {
        return Some(joined);
    }
    response
        .get("output_text")
        .and_then(|v| v.as_str())
        .filter(|t| !t.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> ProviderId {
        ProviderId::new("openai")
    }

    fn map_one(value: serde_json::Value) -> ResponseEvent {
        let mut events = map_responses_json(&provider(), &value).expect("map");
        assert_eq!(events.len(), 1);
        events.remove(0)
    }

    #[test]
    fn maps_delta_and_content_part_events() {
        assert_eq!(
            map_one(serde_json::json!({
                "type": "response.output_text.delta",
                "output_index": 0,
                "content_index": 0,
                "delta": "Hi"
            })),
            ResponseEvent::TextDelta {
                output_index: 0,
                content_index: 0,
                delta: "Hi".into()
            }
        );
        assert_eq!(
            map_one(serde_json::json!({
                "type": "response.content_part.done",
                "output_index": 1,
                "content_index": 2
            })),
            ResponseEvent::ContentPartDone {
                output_index: 1,
                content_index: 2
            }
        );
    }

    #[test]
    fn maps_completed_with_text_and_usage() {
        let event = map_one(serde_json::json!({
            "type": "response.completed",
            "response": {
                "status": "completed",
                "output": [{"type": "message", "content": [{"text": "Hi there"}]}],
                "usage": {"input_tokens": 4, "output_tokens": 2, "total_tokens": 6}
            }
        }));
        let ResponseEvent::Completed {
            output: Some(output),
        } = event
        else {
            panic!("expected completed");
        };
        assert_eq!(output.text(), "Hi there");
        assert_eq!(output.finish_reason.as_deref(), Some("completed"));
        assert_eq!(output.usage.map(|u| u.output_tokens), Some(2));
    }

    #[test]
    fn completed_without_text_is_accepted_for_delta_only_streams() {
        let event = map_one(serde_json::json!({
            "type": "response.completed",
            "response": {"status": "completed", "output": []}
        }));
        let ResponseEvent::Completed {
            output: Some(output),
        } = event
        else {
            panic!("expected completed");
        };
        assert!(output.parts.is_empty());
    }

    #[test]
    fn maps_function_call_items() {
        let event = map_one(serde_json::json!({
            "type": "response.output_item.done",
            "output_index": 1,
            "item": {
                "type": "function_call",
                "call_id": "call_7",
                "name": "lookup_planet",
                "arguments": "{\"planet\":\"venus\"}"
            }
        }));
        assert_eq!(
            event,
            ResponseEvent::OutputItemDone {
                output_index: 1,
                item: OutputItem::FunctionCall {
                    call_id: "call_7".into(),
                    name: "lookup_planet".into(),
                    arguments: "{\"planet\":\"venus\"}".into(),
                },
            }
        );
    }

    #[test]
    fn unknown_types_are_forwarded_as_other() {
        assert_eq!(
            map_one(serde_json::json!({"type": "response.in_progress"})),
            ResponseEvent::Other {
                kind: "response.in_progress".into()
            }
        );
    }

    #[test]
    fn maps_response_failed_to_provider_error() {
        let failed = serde_json::json!({
            "type": "response.failed",
            "response": {"error": {"message": "quota exceeded"}}
        });
        let err = map_responses_json(&provider(), &failed).expect_err("should fail");
        assert!(matches!(err, ProviderError::Provider { message, .. } if message == "quota exceeded"));
    }

    #[test]
    fn done_sentinel_maps_to_nothing() {
        let frame = SseFrame {
            event: None,
            data: "[DONE]".into(),
        };
        assert!(ResponsesMapper.map_frame(&provider(), &frame).expect("done").is_empty());
    }
}
