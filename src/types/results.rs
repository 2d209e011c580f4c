use serde::{Deserialize, Serialize};

use super::message::{Role, ToolCall};

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    /// Build usage from prompt and completion counts, deriving the total.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Usage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Reason why generation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
}

/// Terminal result of a non-streamed chat completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionResult {
    pub id: String,
    pub model: String,
    pub content: String,
    pub role: Role,
    pub finish_reason: Option<FinishReason>,
    pub usage: Usage,
    /// Tool invocations requested by the model, in order.
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

/// Result of single-prompt text generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextGenerationResult {
    pub id: String,
    pub model: String,
    pub text: String,
    pub finish_reason: Option<FinishReason>,
    pub usage: Usage,
}

impl From<ChatCompletionResult> for TextGenerationResult {
    fn from(result: ChatCompletionResult) -> Self {
        TextGenerationResult {
            id: result.id,
            model: result.model,
            text: result.content,
            finish_reason: result.finish_reason,
            usage: result.usage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizeResult {
    pub id: String,
    pub model: String,
    pub summary: String,
    pub usage: Usage,
}

/// Token usage of an embedding request. Embeddings have no completion side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingUsage {
    pub prompt_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResult {
    pub id: String,
    pub model: String,
    /// One vector per input, in input order.
    pub embeddings: Vec<Vec<f32>>,
    pub usage: EmbeddingUsage,
}

/// Schema-shaped output plus the exact text the model produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredOutputResult {
    pub data: serde_json::Value,
    pub raw_text: String,
}

impl StructuredOutputResult {
    /// Deserialize `data` into a caller type.
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }
}
