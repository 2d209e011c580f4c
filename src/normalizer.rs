//! Turns a provider's native SSE event sequence into a uniform chunk stream.
//!
//! Each provider implements [`StreamNormalizer`] for its event type; [`normalize`] drives
//! it over an SSE stream one event at a time, so memory stays bounded by the chunks a
//! single event produces plus whatever per-tool-call state the normalizer keeps.

use std::collections::VecDeque;

use futures_util::{Stream, StreamExt};
use serde::de::DeserializeOwned;

use crate::response::ChunkStream;
use crate::sse_stream::SseEvent;
use crate::types::ChatCompletionChunk;
use crate::Error;

/// Output of one native event.
#[derive(Debug, Default)]
pub struct Step {
    pub chunks: Vec<ChatCompletionChunk>,
    /// The provider signalled completion; nothing after this event is read.
    pub done: bool,
}

impl Step {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn emit(chunk: ChatCompletionChunk) -> Self {
        Step {
            chunks: vec![chunk],
            done: false,
        }
    }

    pub fn done() -> Self {
        Step {
            chunks: Vec::new(),
            done: true,
        }
    }
}

/// Per-provider state machine from native stream events to chunks.
pub trait StreamNormalizer: Send + 'static {
    /// The provider's native stream event.
    type Event: DeserializeOwned;

    /// Provider name used in errors and logs.
    fn provider(&self) -> &'static str;

    /// Process one native event.
    fn on_event(&mut self, event: Self::Event) -> Result<Step, Error>;

    /// Called once when the stream completes (completion event, `[DONE]` or EOF).
    /// Returns chunks that were held back waiting for more context.
    fn finish(&mut self) -> Vec<ChatCompletionChunk> {
        Vec::new()
    }
}

/// Decode the JSON payload of an SSE event into the normalizer's native event type.
///
/// Payloads that are not JSON objects (keep-alives, vendor noise) are skipped.
fn decode<E: DeserializeOwned>(provider: &str, event: &SseEvent) -> Result<Option<E>, Error> {
    let data = event.data.trim();
    if data.is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<E>(data) {
        Ok(native) => Ok(Some(native)),
        Err(_) if !data.starts_with('{') => {
            tracing::warn!(provider, data, "skipping non-JSON SSE payload");
            Ok(None)
        }
        Err(e) => Err(Error::provider(
            provider,
            format!("Failed to parse SSE event: {e}"),
        )),
    }
}

struct DriverState<S, N> {
    events: S,
    normalizer: N,
    queue: VecDeque<ChatCompletionChunk>,
    done: bool,
}

impl<S, N: StreamNormalizer> DriverState<S, N> {
    fn complete(&mut self) {
        self.done = true;
        let tail = self.normalizer.finish();
        self.queue.extend(tail);
    }
}

/// Drive `normalizer` over `events`, yielding chunks as they become available.
///
/// The SSE stream is polled only when the consumer asks for a chunk and no chunk is
/// queued. After an error item the stream ends.
pub fn normalize<S, N>(events: S, normalizer: N) -> ChunkStream
where
    S: Stream<Item = Result<SseEvent, Error>> + Send + Unpin + 'static,
    N: StreamNormalizer,
{
    let state = DriverState {
        events,
        normalizer,
        queue: VecDeque::new(),
        done: false,
    };

    let stream = futures_util::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(chunk) = state.queue.pop_front() {
                return Some((Ok(chunk), state));
            }
            if state.done {
                return None;
            }

            match state.events.next().await {
                Some(Ok(sse)) => {
                    if sse.is_done() {
                        state.complete();
                        continue;
                    }
                    let provider = state.normalizer.provider();
                    let native = match decode::<N::Event>(provider, &sse) {
                        Ok(Some(native)) => native,
                        Ok(None) => continue,
                        Err(e) => {
                            state.done = true;
                            return Some((Err(e), state));
                        }
                    };
                    match state.normalizer.on_event(native) {
                        Ok(step) => {
                            state.queue.extend(step.chunks);
                            if step.done {
                                tracing::debug!(provider, "stream completed");
                                state.complete();
                            }
                        }
                        Err(e) => {
                            state.done = true;
                            return Some((Err(e), state));
                        }
                    }
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(e), state));
                }
                None => state.complete(),
            }
        }
    });

    ChunkStream::from_stream(stream)
}
