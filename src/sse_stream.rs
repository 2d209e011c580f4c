//! Stream adapter for parsing SSE (Server-Sent Events) from byte chunks.

use crate::Error;
use futures_util::{Stream, StreamExt};
use memchr::memmem;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// Upper bound on a single buffered, not yet terminated event.
const MAX_PENDING_BYTES: usize = 4 * 1024 * 1024;

/// A Server-Sent Events (SSE) event.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    /// Value of the `event:` field, if any.
    pub event_type: Option<String>,
    /// `data:` lines joined with `\n`.
    pub data: String,
    pub id: Option<String>,
}

impl SseEvent {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            event_type: None,
            data: data.into(),
            id: None,
        }
    }

    /// OpenAI-style end-of-stream sentinel.
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }

    /// Parse one event block (the text between two blank lines).
    fn parse(block: &str) -> Option<SseEvent> {
        let mut event_type = None;
        let mut data_lines: Vec<&str> = Vec::new();
        let mut id = None;

        for line in block.lines() {
            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };

            match field {
                "event" => event_type = Some(value.to_string()),
                "data" => data_lines.push(value),
                "id" => id = Some(value.to_string()),
                _ => {}
            }
        }

        if data_lines.is_empty() {
            return None;
        }

        Some(SseEvent {
            event_type,
            data: data_lines.join("\n"),
            id,
        })
    }
}

/// Parses SSE events out of a byte stream, holding back partial events across chunks.
pub struct SseStream<S> {
    inner: S,
    pending: Vec<u8>,
    ready: VecDeque<SseEvent>,
    finished: bool,
}

impl<S> SseStream<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            pending: Vec::new(),
            ready: VecDeque::new(),
            finished: false,
        }
    }

    /// Move every complete event in `pending` to `ready`.
    fn drain_complete_events(&mut self) -> Result<(), Error> {
        let finder = memmem::Finder::new(b"\n\n");
        let mut consumed = 0;

        while let Some(offset) = finder.find(&self.pending[consumed..]) {
            let end = consumed + offset;
            let block = std::str::from_utf8(&self.pending[consumed..end])
                .map_err(|e| Error::streaming(format!("Invalid UTF-8 in SSE event: {e}")))?;
            if let Some(event) = SseEvent::parse(block) {
                self.ready.push_back(event);
            }
            consumed = end + 2;
        }

        if consumed > 0 {
            self.pending.drain(..consumed);
        }
        Ok(())
    }

    /// Parse whatever is left once the byte stream ends without a trailing blank line.
    fn flush_tail(&mut self) -> Result<Option<SseEvent>, Error> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        let tail = std::mem::take(&mut self.pending);
        let text = std::str::from_utf8(&tail)
            .map_err(|e| Error::streaming(format!("Invalid UTF-8 in SSE event: {e}")))?;
        Ok(SseEvent::parse(text.trim_end()))
    }
}

impl<S, E> Stream for SseStream<S>
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    type Item = Result<SseEvent, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if self.finished {
                return Poll::Ready(None);
            }

            match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => {
                    // CR is only ever a line terminator in SSE; dropping it normalizes CRLF.
                    self.pending
                        .extend(chunk.iter().copied().filter(|byte| *byte != b'\r'));
                    if let Err(e) = self.drain_complete_events() {
                        return Poll::Ready(Some(Err(e)));
                    }
                    if self.pending.len() > MAX_PENDING_BYTES {
                        self.pending.clear();
                        return Poll::Ready(Some(Err(Error::streaming(
                            "SSE event exceeded maximum size",
                        ))));
                    }
                }
                Some(Err(e)) => {
                    return Poll::Ready(Some(Err(Error::streaming(format!(
                        "Stream error: {e}"
                    )))));
                }
                None => {
                    self.finished = true;
                    match self.flush_tail() {
                        Ok(Some(event)) => return Poll::Ready(Some(Ok(event))),
                        Ok(None) => return Poll::Ready(None),
                        Err(e) => return Poll::Ready(Some(Err(e))),
                    }
                }
            }
        }
    }
}

/// Extension trait to add SSE parsing to byte streams.
pub trait SseStreamExt: Stream {
    fn sse_events(self) -> SseStream<Self>
    where
        Self: Sized,
    {
        SseStream::new(self)
    }
}

impl<S: Stream> SseStreamExt for S {}
