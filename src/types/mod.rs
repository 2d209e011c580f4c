//! Core types used throughout the library.

pub mod config;
pub mod message;
pub mod options;
pub mod results;
pub mod streaming;

// Re-export commonly used types
pub use config::*;
pub use message::*;
pub use options::*;
pub use results::*;
pub use streaming::*;
