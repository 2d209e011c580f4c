//! Types for streaming responses.

use serde::{Deserialize, Serialize};

use crate::types::{FinishReason, Role, ToolCall, Usage};

/// One incremental unit of a streamed chat completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub model: String,
    /// Text delta. Empty on chunks that only carry terminal metadata or tool calls.
    pub content: String,
    /// Set to `Assistant` on the first emitted chunk only.
    pub role: Option<Role>,
    /// `None` until the terminal chunk.
    pub finish_reason: Option<FinishReason>,
    /// Present only on the terminal chunk.
    pub usage: Option<Usage>,
    /// Tool calls completed at this point of the stream.
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

impl ChatCompletionChunk {
    /// A content delta chunk.
    pub fn delta(id: impl Into<String>, model: impl Into<String>, content: impl Into<String>) -> Self {
        ChatCompletionChunk {
            id: id.into(),
            model: model.into(),
            content: content.into(),
            role: None,
            finish_reason: None,
            usage: None,
            tool_calls: Vec::new(),
        }
    }

    /// Whether this chunk carries terminal metadata.
    pub fn is_terminal(&self) -> bool {
        self.finish_reason.is_some() || self.usage.is_some()
    }
}
