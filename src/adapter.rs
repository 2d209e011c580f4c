use std::fmt;
use std::str::FromStr;

use crate::base;
use crate::response::ChunkStream;
use crate::types::{
    ChatCompletionOptions, ChatCompletionResult, EmbeddingOptions, EmbeddingResult,
    StructuredOutputOptions, StructuredOutputResult, SummarizeOptions, SummarizeResult,
    TextGenerationOptions, TextGenerationResult,
};
use crate::Error;

/// The fixed set of providers an adapter can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAI),
            "anthropic" => Ok(ProviderKind::Anthropic),
            other => Err(Error::config(format!(
                "Unknown provider '{other}'. Valid values are: openai, anthropic"
            ))),
        }
    }
}

/// What an adapter variant can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub streaming: bool,
    pub tool_calling: bool,
    pub embeddings: bool,
    pub structured_output: bool,
}

/// The uniform contract every provider adapter implements.
///
/// Every operation validates its options locally before any network call and issues
/// exactly one request to the provider. Nothing is retried.
#[async_trait::async_trait]
pub trait LLMAdapter: Send + Sync + 'static {
    /// Human-readable adapter name.
    fn name(&self) -> &str;

    fn kind(&self) -> ProviderKind;

    fn capabilities(&self) -> Capabilities;

    async fn chat_completion(
        &self,
        options: &ChatCompletionOptions,
    ) -> Result<ChatCompletionResult, Error>;

    /// Start a streamed chat completion. The request is sent before this returns; the
    /// body is read as the returned stream is polled.
    async fn chat_completion_stream(
        &self,
        options: &ChatCompletionOptions,
    ) -> Result<ChunkStream, Error>;

    async fn generate_text(
        &self,
        options: &TextGenerationOptions,
    ) -> Result<TextGenerationResult, Error> {
        let chat = base::text_chat_options(options)?;
        Ok(self.chat_completion(&chat).await?.into())
    }

    async fn generate_text_stream(
        &self,
        options: &TextGenerationOptions,
    ) -> Result<ChunkStream, Error> {
        let chat = base::text_chat_options(options)?;
        self.chat_completion_stream(&chat).await
    }

    async fn summarize(&self, options: &SummarizeOptions) -> Result<SummarizeResult, Error> {
        let chat = base::summarize_chat_options(options)?;
        let result = self.chat_completion(&chat).await?;
        Ok(SummarizeResult {
            id: result.id,
            model: result.model,
            summary: result.content.trim().to_string(),
            usage: result.usage,
        })
    }

    async fn create_embeddings(&self, options: &EmbeddingOptions)
        -> Result<EmbeddingResult, Error>;

    /// Produce schema-shaped JSON, using the strategy the capability table selects for
    /// this provider and model.
    async fn structured_output(
        &self,
        options: &StructuredOutputOptions,
    ) -> Result<StructuredOutputResult, Error>;
}
