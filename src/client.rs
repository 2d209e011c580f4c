//! Provider-agnostic entry point that delegates to a swappable adapter.

use std::sync::{Arc, RwLock};

use crate::adapter::{Capabilities, LLMAdapter, ProviderKind};
use crate::response::ChunkStream;
use crate::types::{
    ChatCompletionOptions, ChatCompletionResult, EmbeddingOptions, EmbeddingResult,
    StructuredOutputOptions, StructuredOutputResult, SummarizeOptions, SummarizeResult,
    TextGenerationOptions, TextGenerationResult,
};
use crate::Error;

/// Delegates every operation to the adapter it currently holds.
///
/// [`LLMClient::swap_adapter`] affects only calls issued after it returns. A call that
/// already started keeps the adapter it started with until it completes.
pub struct LLMClient {
    adapter: RwLock<Arc<dyn LLMAdapter>>,
}

impl LLMClient {
    pub fn new(adapter: Arc<dyn LLMAdapter>) -> Self {
        Self {
            adapter: RwLock::new(adapter),
        }
    }

    /// Replace the adapter, returning the previous one.
    pub fn swap_adapter(&self, adapter: Arc<dyn LLMAdapter>) -> Arc<dyn LLMAdapter> {
        let mut guard = self.adapter.write().unwrap_or_else(|e| e.into_inner());
        tracing::debug!(from = guard.name(), to = adapter.name(), "swapping adapter");
        std::mem::replace(&mut *guard, adapter)
    }

    /// The adapter new calls will use. The lock is released before this returns.
    pub fn adapter(&self) -> Arc<dyn LLMAdapter> {
        let guard = self.adapter.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn adapter_name(&self) -> String {
        self.adapter().name().to_string()
    }

    pub fn kind(&self) -> ProviderKind {
        self.adapter().kind()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.adapter().capabilities()
    }

    pub async fn chat_completion(
        &self,
        options: &ChatCompletionOptions,
    ) -> Result<ChatCompletionResult, Error> {
        let adapter = self.adapter();
        adapter.chat_completion(options).await
    }

    pub async fn chat_completion_stream(
        &self,
        options: &ChatCompletionOptions,
    ) -> Result<ChunkStream, Error> {
        let adapter = self.adapter();
        adapter.chat_completion_stream(options).await
    }

    pub async fn generate_text(
        &self,
        options: &TextGenerationOptions,
    ) -> Result<TextGenerationResult, Error> {
        let adapter = self.adapter();
        adapter.generate_text(options).await
    }

    pub async fn generate_text_stream(
        &self,
        options: &TextGenerationOptions,
    ) -> Result<ChunkStream, Error> {
        let adapter = self.adapter();
        adapter.generate_text_stream(options).await
    }

    pub async fn summarize(&self, options: &SummarizeOptions) -> Result<SummarizeResult, Error> {
        let adapter = self.adapter();
        adapter.summarize(options).await
    }

    pub async fn create_embeddings(
        &self,
        options: &EmbeddingOptions,
    ) -> Result<EmbeddingResult, Error> {
        let adapter = self.adapter();
        adapter.create_embeddings(options).await
    }

    pub async fn structured_output(
        &self,
        options: &StructuredOutputOptions,
    ) -> Result<StructuredOutputResult, Error> {
        let adapter = self.adapter();
        adapter.structured_output(options).await
    }
}

impl std::fmt::Debug for LLMClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LLMClient")
            .field("adapter", &self.adapter_name())
            .finish()
    }
}
