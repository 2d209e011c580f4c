//! The caller-facing stream of normalized chunks.

use crate::accumulator::ChunkAccumulator;
use crate::types::{ChatCompletionChunk, ChatCompletionResult};
use crate::Error;
use futures_util::stream::Stream;
use futures_util::StreamExt;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A lazy, finite, non-restartable sequence of chunks.
///
/// Nothing is read from the transport until the consumer polls. Dropping the stream
/// releases the underlying connection.
pub struct ChunkStream {
    inner: Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk, Error>> + Send>>,
}

impl ChunkStream {
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<ChatCompletionChunk, Error>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    /// Consume the stream and fold it into a complete result.
    pub async fn collect_result(mut self) -> Result<ChatCompletionResult, Error> {
        let mut accumulator = ChunkAccumulator::new();
        while let Some(chunk) = self.inner.next().await {
            accumulator.process_chunk(chunk?);
        }
        Ok(accumulator.finalize())
    }

    /// Consume the stream and return only the concatenated text.
    pub async fn text(self) -> Result<String, Error> {
        Ok(self.collect_result().await?.content)
    }
}

impl Stream for ChunkStream {
    type Item = Result<ChatCompletionChunk, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for ChunkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStream").finish_non_exhaustive()
    }
}
