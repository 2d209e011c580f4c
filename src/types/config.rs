use std::collections::HashMap;
use std::time::Duration;

/// Transport configuration accepted by every adapter.
///
/// Values are forwarded to the HTTP transport as given; the core does not reinterpret them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdapterConfig {
    pub api_key: String,
    /// Overrides the provider's default API base URL.
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    /// Retry count for the transport. The reqwest transport performs no retries of its own.
    pub max_retries: Option<u32>,
    /// Extra headers sent with every request.
    pub headers: HashMap<String, String>,
    /// Model used when a request leaves `model` empty.
    pub default_model: Option<String>,
}

impl AdapterConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }
}
