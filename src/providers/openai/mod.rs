//! OpenAI Chat Completions adapter.

pub mod client;
pub mod stream;
pub mod types;

pub use client::OpenAIAdapter;
pub use stream::OpenAIStreamNormalizer;
