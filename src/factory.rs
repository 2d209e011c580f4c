use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::adapter::{LLMAdapter, ProviderKind};
use crate::providers::{AnthropicAdapter, OpenAIAdapter};
use crate::types::AdapterConfig;
use crate::Error;

/// Configuration for creating adapters.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub adapter: AdapterConfig,
}

impl ProviderConfig {
    /// Create configuration for the OpenAI adapter.
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            kind: ProviderKind::OpenAI,
            adapter: AdapterConfig::new(api_key).default_model(OpenAIAdapter::DEFAULT_MODEL),
        }
    }

    /// Create configuration for the Anthropic adapter.
    pub fn anthropic(api_key: impl Into<String>) -> Self {
        Self {
            kind: ProviderKind::Anthropic,
            adapter: AdapterConfig::new(api_key).default_model(AnthropicAdapter::DEFAULT_MODEL),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// `PROVIDER_TYPE` selects the provider explicitly; without it the first API key found
    /// (`OPENAI_API_KEY`, then `ANTHROPIC_API_KEY`) decides. `OPENAI_BASE_URL` /
    /// `ANTHROPIC_BASE_URL`, `LLM_MODEL` and `LLM_TIMEOUT_SECS` are optional.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let kind = match var("PROVIDER_TYPE") {
            Some(value) => value.parse::<ProviderKind>()?,
            None if var("OPENAI_API_KEY").is_some() => ProviderKind::OpenAI,
            None if var("ANTHROPIC_API_KEY").is_some() => ProviderKind::Anthropic,
            None => {
                return Err(Error::config(
                    "No API credentials found in environment. Set PROVIDER_TYPE (openai/anthropic) \
                     with OPENAI_API_KEY or ANTHROPIC_API_KEY",
                ))
            }
        };

        let (key_var, url_var) = match kind {
            ProviderKind::OpenAI => ("OPENAI_API_KEY", "OPENAI_BASE_URL"),
            ProviderKind::Anthropic => ("ANTHROPIC_API_KEY", "ANTHROPIC_BASE_URL"),
        };
        let api_key = var(key_var).ok_or_else(|| {
            Error::config(format!(
                "{key_var} environment variable is required for the {kind} provider"
            ))
        })?;

        let mut config = match kind {
            ProviderKind::OpenAI => Self::openai(api_key),
            ProviderKind::Anthropic => Self::anthropic(api_key),
        };
        if let Some(base_url) = var(url_var) {
            config.adapter = config.adapter.base_url(base_url);
        }
        if let Some(model) = var("LLM_MODEL") {
            config.adapter = config.adapter.default_model(model);
        }
        if let Some(secs) = var("LLM_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::config(format!("LLM_TIMEOUT_SECS must be a whole number of seconds, got '{secs}'"))
            })?;
            config.adapter = config.adapter.timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

/// Factory for creating LLM adapters.
pub struct AdapterFactory;

impl AdapterFactory {
    /// Create an adapter from configuration.
    pub fn create(config: &ProviderConfig) -> Result<Arc<dyn LLMAdapter>, Error> {
        if config.adapter.api_key.trim().is_empty() {
            return Err(Error::config(format!(
                "API key required for the {} provider",
                config.kind
            )));
        }

        tracing::debug!(provider = %config.kind, "creating adapter");
        let adapter: Arc<dyn LLMAdapter> = match config.kind {
            ProviderKind::OpenAI => Arc::new(OpenAIAdapter::with_config(config.adapter.clone())?),
            ProviderKind::Anthropic => {
                Arc::new(AnthropicAdapter::with_config(config.adapter.clone())?)
            }
        };
        Ok(adapter)
    }

    /// Create an adapter from environment variables.
    pub fn from_env() -> Result<Arc<dyn LLMAdapter>, Error> {
        let config = ProviderConfig::from_env()?;
        Self::create(&config)
    }
}
