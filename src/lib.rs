//! A unified abstraction over multiple LLM providers.
//!
//! This library provides one API for chat, text generation, summarization, embeddings and
//! structured output against OpenAI and Anthropic, with normalized streaming responses
//! and tool calling.

pub mod accumulator;
pub mod adapter;
pub mod base;
pub mod client;
pub mod error;
pub mod factory;
pub mod normalizer;
pub mod providers;
pub mod response;
pub mod sse_stream;
pub mod structured;
pub mod types;

// Re-export core types for easy usage
pub use accumulator::ChunkAccumulator;
pub use adapter::{Capabilities, LLMAdapter, ProviderKind};
pub use client::LLMClient;
pub use error::Error;
pub use factory::{AdapterFactory, ProviderConfig};
pub use providers::*;
pub use response::ChunkStream;
pub use sse_stream::SseEvent;
pub use structured::{CapabilityTable, StructuredOutputMode};
pub use types::*;
