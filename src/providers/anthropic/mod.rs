//! Anthropic Messages API adapter.

pub mod client;
pub mod stream;
pub mod types;

pub use client::AnthropicAdapter;
pub use stream::AnthropicStreamNormalizer;
