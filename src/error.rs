use thiserror::Error;

/// Errors that can occur when using the unillm library.
#[derive(Error, Debug)]
pub enum Error {
    /// A required field was missing or malformed. Raised before any network call.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with an error status or an error event.
    #[error("Provider error: {provider} ({}) - {message}", status_label(.status))]
    Provider {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    /// Schema-constrained output did not parse as JSON.
    #[error("Structured output parse error: {message}")]
    StructuredOutputParse { message: String, raw_text: String },

    #[error("{provider} does not support {capability}")]
    UnsupportedCapability {
        provider: String,
        capability: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Streaming error: {0}")]
    Streaming(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "stream".to_string(),
    }
}

impl Error {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Provider {
            provider: provider.into(),
            status: None,
            message: message.into(),
        }
    }

    pub fn provider_status(
        provider: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Error::Provider {
            provider: provider.into(),
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn structured_output_parse(message: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Error::StructuredOutputParse {
            message: message.into(),
            raw_text: raw_text.into(),
        }
    }

    pub fn unsupported(provider: impl Into<String>, capability: impl Into<String>) -> Self {
        Error::UnsupportedCapability {
            provider: provider.into(),
            capability: capability.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn streaming(message: impl Into<String>) -> Self {
        Error::Streaming(message.into())
    }

    /// Whether this error came from the provider transport (network, HTTP status or
    /// provider error event).
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Provider { .. } | Error::Streaming(_))
    }

    /// The offending text of a structured output parse failure.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            Error::StructuredOutputParse { raw_text, .. } => Some(raw_text),
            _ => None,
        }
    }
}
