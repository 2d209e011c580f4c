//! Request options for every unified operation.

use serde::{Deserialize, Serialize};

use super::message::{Message, Tool, ToolChoice};

/// Opaque provider-specific fields merged last into the wire payload.
pub type ProviderOptions = serde_json::Map<String, serde_json::Value>;

/// Options for a chat completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatCompletionOptions {
    /// Model id. Empty means "use the adapter's default model".
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
    pub stop_sequences: Option<Vec<String>>,
    pub stream: Option<bool>,
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    /// Escape hatch for provider-specific fields. Not covered by the normalization
    /// guarantees.
    pub provider_options: Option<ProviderOptions>,
    pub tools: Option<Vec<Tool>>,
    pub tool_choice: Option<ToolChoice>,
}

impl ChatCompletionOptions {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            ..Default::default()
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn frequency_penalty(mut self, penalty: f32) -> Self {
        self.frequency_penalty = Some(penalty);
        self
    }

    pub fn presence_penalty(mut self, penalty: f32) -> Self {
        self.presence_penalty = Some(penalty);
        self
    }

    pub fn stop_sequences(mut self, stop: Vec<String>) -> Self {
        self.stop_sequences = Some(stop);
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Map<String, serde_json::Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn provider_options(mut self, options: ProviderOptions) -> Self {
        self.provider_options = Some(options);
        self
    }

    pub fn tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }
}

/// Options for single-prompt text generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextGenerationOptions {
    pub model: String,
    pub prompt: String,
    pub system: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub stop_sequences: Option<Vec<String>>,
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    pub provider_options: Option<ProviderOptions>,
}

impl TextGenerationOptions {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Shape of a generated summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStyle {
    #[default]
    Paragraph,
    BulletPoints,
}

/// Options for summarization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummarizeOptions {
    pub model: String,
    pub text: String,
    /// Upper bound on the summary length, in words.
    pub max_length: Option<u32>,
    pub style: SummaryStyle,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub provider_options: Option<ProviderOptions>,
}

impl SummarizeOptions {
    pub fn new(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn max_length(mut self, words: u32) -> Self {
        self.max_length = Some(words);
        self
    }

    pub fn style(mut self, style: SummaryStyle) -> Self {
        self.style = style;
        self
    }
}

/// Embedding input: one string or an ordered batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingInput {
    Single(String),
    Batch(Vec<String>),
}

impl EmbeddingInput {
    /// Number of embeddings the provider must return.
    pub fn len(&self) -> usize {
        match self {
            EmbeddingInput::Single(_) => 1,
            EmbeddingInput::Batch(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            EmbeddingInput::Single(text) => text.is_empty(),
            EmbeddingInput::Batch(items) => items.is_empty() || items.iter().any(|s| s.is_empty()),
        }
    }
}

impl From<&str> for EmbeddingInput {
    fn from(s: &str) -> Self {
        EmbeddingInput::Single(s.to_string())
    }
}

impl From<String> for EmbeddingInput {
    fn from(s: String) -> Self {
        EmbeddingInput::Single(s)
    }
}

impl From<Vec<String>> for EmbeddingInput {
    fn from(items: Vec<String>) -> Self {
        EmbeddingInput::Batch(items)
    }
}

/// Options for an embedding request.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingOptions {
    pub model: String,
    pub input: EmbeddingInput,
    pub dimensions: Option<u32>,
    pub user: Option<String>,
    pub provider_options: Option<ProviderOptions>,
}

impl EmbeddingOptions {
    pub fn new(model: impl Into<String>, input: impl Into<EmbeddingInput>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            dimensions: None,
            user: None,
            provider_options: None,
        }
    }

    pub fn dimensions(mut self, dimensions: u32) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

/// Options for structured output extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredOutputOptions {
    pub chat: ChatCompletionOptions,
    /// Target JSON Schema.
    pub schema: serde_json::Value,
    pub schema_description: Option<String>,
}

impl StructuredOutputOptions {
    pub fn new(chat: ChatCompletionOptions, schema: serde_json::Value) -> Self {
        Self {
            chat,
            schema,
            schema_description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.schema_description = Some(description.into());
        self
    }
}
