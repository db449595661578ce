//! Typewriter-style rendering of a run's text output.
//!
//! Only two payloads matter here: a text delta is written and flushed as
//! soon as it arrives, and a finished content part ends the current line.
//! Everything else a run multiplexes onto its stream (agent updates, run
//! items, item/part markers, tool-call arguments) is skipped.
//!
//! The renderer holds no text of its own. Each fragment goes straight to the
//! sink, so memory use does not depend on the length of the response.
use std::io::Write;

use futures::StreamExt as _;

use crate::events::{ResponseEvent, StreamEvent};

/// Where the renderer is relative to content-part boundaries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SegmentState {
    /// Nothing written yet, or a line break was just written.
    #[default]
    Boundary,
    /// At least one fragment written since the last boundary.
    MidSegment,
}

/// Writes streamed text to a sink, flushing after every fragment.
pub struct TextRenderer<W: Write> {
    sink: W,
    state: SegmentState,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            state: SegmentState::Boundary,
        }
    }

    pub fn state(&self) -> SegmentState {
        self.state
    }

    /// Applies one event to the sink.
    pub fn handle(&mut self, event: &StreamEvent) -> std::io::Result<()> {
        let Some(data) = event.raw() else {
            return Ok(());
        };
        match data {
            ResponseEvent::TextDelta { delta, .. } => {
                self.sink.write_all(delta.as_bytes())?;
                self.sink.flush()?;
                self.state = SegmentState::MidSegment;
            }
            ResponseEvent::ContentPartDone { .. } => {
                self.sink.write_all(b"\n")?;
                self.sink.flush()?;
                self.state = SegmentState::Boundary;
            }
            _ => {}
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

/// Consumes `events` in order and renders them into `sink`.
///
/// Returns at the first stream error, unchanged; text already written stays
/// on the sink. Sink failures are converted with `E: From<io::Error>`. No
/// trailing line break is added when the stream ends mid-segment; the
/// returned state tells the caller where rendering stopped.
pub async fn render_stream<S, E, W>(events: S, sink: W) -> Result<SegmentState, E>
where
    S: futures::Stream<Item = Result<StreamEvent, E>>,
    E: From<std::io::Error>,
    W: Write,
{
    let mut events = std::pin::pin!(events);
    let mut renderer = TextRenderer::new(sink);
    while let Some(event) = events.next().await {
        renderer.handle(&event?)?;
    }
    Ok(renderer.state())
}
