//! Incremental `text/event-stream` decoding shared by the vendor adapters.
use std::collections::VecDeque;
use std::pin::Pin;

use futures::StreamExt as _;
use futures::stream;

use crate::errors::ProviderError;
use crate::events::ResponseEvent;
use crate::model::ProviderId;
use crate::provider::ResponseStream;

pub(crate) type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

impl SseFrame {
    /// The `[DONE]` sentinel both OpenAI wire protocols send last.
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }
}

/// Buffers raw body chunks and yields complete frames as they arrive.
#[derive(Default)]
pub(crate) struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some((idx, delim_len)) = find_frame_delimiter(&self.buf) {
            let frame = parse_sse_frame(&self.buf[..idx]);
            self.buf.drain(..idx + delim_len);
            frames.extend(frame);
        }
        frames
    }

    /// Flushes a trailing frame the server did not terminate with a blank
    /// line before closing the body.
    pub fn finish(&mut self) -> Option<SseFrame> {
        let rest = std::mem::take(&mut self.buf);
        parse_sse_frame(&rest)
    }
}

/// Vendor-specific translation of decoded frames into response events.
pub(crate) trait FrameMapper: Send + 'static {
    fn map_frame(
        &mut self,
        provider: &ProviderId,
        frame: &SseFrame,
    ) -> Result<Vec<ResponseEvent>, ProviderError>;

    /// Called once when the body ends, after the last frame. Returning an
    /// error reports a body that closed before the protocol's terminal frame.
    fn finish(&mut self, _provider: &ProviderId) -> Result<Vec<ResponseEvent>, ProviderError> {
        Ok(Vec::new())
    }
}

/// Turns an SSE response body into a stream of response events.
pub(crate) fn event_stream<M: FrameMapper>(
    provider_id: ProviderId,
    bytes_stream: ByteStream,
    mapper: M,
) -> ResponseStream {
    struct State<M> {
        provider_id: ProviderId,
        bytes_stream: ByteStream,
        decoder: SseDecoder,
        mapper: M,
        pending: VecDeque<ResponseEvent>,
        failed: Option<ProviderError>,
        done: bool,
    }

    Box::pin(stream::try_unfold(
        State {
            provider_id,
            bytes_stream,
            decoder: SseDecoder::default(),
            mapper,
            pending: VecDeque::new(),
            failed: None,
            done: false,
        },
        |mut state| async move {
            loop {
                if let Some(event) = state.pending.pop_front() {
                    return Ok(Some((event, state)));
                }
                // Events decoded ahead of a bad frame are yielded first.
                if let Some(err) = state.failed.take() {
                    return Err(err);
                }
                if state.done {
                    return Ok(None);
                }

                match state.bytes_stream.next().await {
                    Some(Ok(chunk)) => {
                        for frame in state.decoder.push_chunk(&chunk) {
                            match state.mapper.map_frame(&state.provider_id, &frame) {
                                Ok(events) => state.pending.extend(events),
                                Err(err) => {
                                    state.failed = Some(err);
                                    break;
                                }
                            }
                        }
                    }
                    Some(Err(e)) => {
                        return Err(ProviderError::transport(
                            state.provider_id,
                            format!("streaming read failed: {e}"),
                        ));
                    }
                    None => {
                        if let Some(frame) = state.decoder.finish() {
                            let events = state.mapper.map_frame(&state.provider_id, &frame)?;
                            state.pending.extend(events);
                        }
                        state.done = true;
                        match state.mapper.finish(&state.provider_id) {
                            Ok(events) => state.pending.extend(events),
                            Err(err) => state.failed = Some(err),
                        }
                    }
                }
            }
        },
    ))
}

fn find_frame_delimiter(buf: &[u8]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i + 1 < buf.len() {
        if buf[i] == b'\n' && buf[i + 1] == b'\n' {
            return Some((i, 2));
        }
        if buf[i..].starts_with(b"\r\n\r\n") {
            return Some((i, 4));
        }
        i += 1;
    }
    None
}

fn parse_sse_frame(bytes: &[u8]) -> Option<SseFrame> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    let text = String::from_utf8_lossy(bytes);
    let mut event: Option<String> = None;
    let mut data_lines: Vec<&str> = Vec::new();
    for raw_line in text.split('\n') {
        let line = raw_line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("event:") {
            event = Some(rest.trim_start().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }
    if event.is_none() && data_lines.is_empty() {
        return None;
    }
    Some(SseFrame {
        event,
        data: data_lines.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoder_handles_partial_chunk_boundaries() {
        let mut decoder = SseDecoder::default();
        let frames = decoder.push_chunk(b"data: {\"choices\":[{\"delta\":{\"content\":\"Sat");
        assert!(frames.is_empty());
        let frames = decoder.push_chunk(b"urn\"}}]}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, None);
        assert!(frames[0].data.ends_with("\"Saturn\"}}]}"));
    }

    #[test]
    fn decoder_accepts_crlf_delimiters_and_comments() {
        let mut decoder = SseDecoder::default();
        let frames = decoder.push_chunk(
            b": keep-alive\r\n\r\nevent: response.created\r\ndata: {}\r\n\r\ndata: [DONE]\r\n\r\n",
        );
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].event.as_deref(), Some("response.created"));
        assert_eq!(frames[0].data, "{}");
        assert!(frames[1].is_done());
    }

    #[test]
    fn multi_line_data_is_joined_with_newlines() {
        let mut decoder = SseDecoder::default();
        let frames = decoder.push_chunk(b"data: first\ndata: second\n\n");
        assert_eq!(frames[0].data, "first\nsecond");
    }

    #[test]
    fn finish_flushes_unterminated_frame() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push_chunk(b"data: [DONE]").is_empty());
        let frame = decoder.finish().expect("trailing frame");
        assert!(frame.is_done());
        assert_eq!(decoder.finish(), None);
    }

    #[derive(Default)]
    struct EchoMapper {
        truncated: bool,
    }

    impl FrameMapper for EchoMapper {
        fn map_frame(
            &mut self,
            provider: &ProviderId,
            frame: &SseFrame,
        ) -> Result<Vec<ResponseEvent>, ProviderError> {
            if frame.data == "boom" {
                return Err(ProviderError::protocol(provider.clone(), "boom"));
            }
            Ok(vec![ResponseEvent::Other {
                kind: frame.data.clone(),
            }])
        }

        fn finish(&mut self, provider: &ProviderId) -> Result<Vec<ResponseEvent>, ProviderError> {
            if self.truncated {
                return Err(ProviderError::protocol(provider.clone(), "cut off"));
            }
            Ok(vec![ResponseEvent::Completed { output: None }])
        }
    }

    fn body(chunks: &[&'static str]) -> ByteStream {
        Box::pin(stream::iter(
            chunks
                .iter()
                .copied()
                .map(|chunk| Ok::<_, reqwest::Error>(bytes::Bytes::from_static(chunk.as_bytes())))
                .collect::<Vec<_>>(),
        ))
    }

    #[tokio::test]
    async fn event_stream_maps_frames_then_finishes() {
        let events: Vec<_> = event_stream(
            ProviderId::new("test"),
            body(&["data: a\n\nda", "ta: b\n\ndata: c"]),
            EchoMapper::default(),
        )
        .collect()
        .await;
        let kinds: Vec<String> = events
            .into_iter()
            .map(|event| event.expect("ok").kind().to_string())
            .collect();
        assert_eq!(kinds, vec!["a", "b", "c", "response.completed"]);
    }

    #[tokio::test]
    async fn event_stream_stops_at_mapper_error() {
        let mut events = event_stream(
            ProviderId::new("test"),
            body(&["data: a\n\ndata: boom\n\ndata: c\n\n"]),
            EchoMapper::default(),
        );
        assert!(matches!(events.next().await, Some(Ok(ResponseEvent::Other { .. }))));
        assert!(matches!(
            events.next().await,
            Some(Err(ProviderError::Protocol { .. }))
        ));
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn finish_error_follows_events_already_decoded() {
        let mut events = event_stream(
            ProviderId::new("test"),
            body(&["data: a\n\n"]),
            EchoMapper { truncated: true },
        );
        assert!(matches!(events.next().await, Some(Ok(ResponseEvent::Other { .. }))));
        assert!(matches!(
            events.next().await,
            Some(Err(ProviderError::Protocol { message, .. })) if message == "cut off"
        ));
        assert!(events.next().await.is_none());
    }
}
