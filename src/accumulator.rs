//! Folds a chunk sequence back into a complete chat result.

use crate::types::{
    ChatCompletionChunk, ChatCompletionResult, FinishReason, Role, ToolCall, Usage,
};

/// Accumulates streamed chunks into a [`ChatCompletionResult`].
#[derive(Debug, Default)]
pub struct ChunkAccumulator {
    id: Option<String>,
    model: Option<String>,
    content: String,
    tool_calls: Vec<ToolCall>,
    finish_reason: Option<FinishReason>,
    usage: Option<Usage>,
}

impl ChunkAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one chunk into the accumulation.
    pub fn process_chunk(&mut self, chunk: ChatCompletionChunk) {
        if self.id.is_none() && !chunk.id.is_empty() {
            self.id = Some(chunk.id);
        }
        if self.model.is_none() && !chunk.model.is_empty() {
            self.model = Some(chunk.model);
        }
        self.content.push_str(&chunk.content);
        self.tool_calls.extend(chunk.tool_calls);
        if chunk.finish_reason.is_some() {
            self.finish_reason = chunk.finish_reason;
        }
        if chunk.usage.is_some() {
            self.usage = chunk.usage;
        }
    }

    /// Content accumulated so far.
    pub fn current_content(&self) -> &str {
        &self.content
    }

    /// Tool calls completed so far.
    pub fn completed_tool_calls(&self) -> &[ToolCall] {
        &self.tool_calls
    }

    /// Whether a usage-bearing terminal chunk was seen.
    pub fn has_usage(&self) -> bool {
        self.usage.is_some()
    }

    pub fn finalize(self) -> ChatCompletionResult {
        ChatCompletionResult {
            id: self.id.unwrap_or_default(),
            model: self.model.unwrap_or_default(),
            content: self.content,
            role: Role::Assistant,
            finish_reason: self.finish_reason,
            usage: self.usage.unwrap_or_default(),
            tool_calls: self.tool_calls,
        }
    }
}
