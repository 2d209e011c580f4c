//! Utilities shared by every adapter: ids, validation, default resolution, provider
//! option merging and transport setup.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use uuid::Uuid;

use crate::types::{
    AdapterConfig, ChatCompletionOptions, EmbeddingOptions, Message, ProviderOptions, Role,
    SummarizeOptions, SummaryStyle, TextGenerationOptions,
};
use crate::Error;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Generate a process-unique id such as `emb_4f0c...`.
pub fn generate_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

/// Pick the requested model, falling back to the configured default.
pub fn resolve_model(requested: &str, default_model: Option<&str>) -> Result<String, Error> {
    let requested = requested.trim();
    if !requested.is_empty() {
        return Ok(requested.to_string());
    }
    match default_model.map(str::trim) {
        Some(model) if !model.is_empty() => Ok(model.to_string()),
        _ => Err(Error::invalid_argument(
            "model must not be empty and no default model is configured",
        )),
    }
}

/// Check the conversation invariants before anything is sent.
pub fn validate_messages(messages: &[Message]) -> Result<(), Error> {
    if messages.is_empty() {
        return Err(Error::invalid_argument("messages must not be empty"));
    }

    for (index, message) in messages.iter().enumerate() {
        match message.role {
            Role::Tool => {
                let has_id = message
                    .tool_call_id
                    .as_deref()
                    .is_some_and(|id| !id.is_empty());
                if !has_id {
                    return Err(Error::invalid_argument(format!(
                        "messages[{index}]: tool messages must carry tool_call_id"
                    )));
                }
            }
            Role::Assistant => {
                let mut seen = HashSet::new();
                for call in message.tool_calls() {
                    if call.id.is_empty() {
                        return Err(Error::invalid_argument(format!(
                            "messages[{index}]: tool call ids must not be empty"
                        )));
                    }
                    if !seen.insert(call.id.as_str()) {
                        return Err(Error::invalid_argument(format!(
                            "messages[{index}]: duplicate tool call id '{}'",
                            call.id
                        )));
                    }
                }
            }
            Role::System | Role::User => {
                if message.has_tool_calls() {
                    return Err(Error::invalid_argument(format!(
                        "messages[{index}]: only assistant messages may carry tool calls"
                    )));
                }
            }
        }
    }

    Ok(())
}

pub fn validate_chat(options: &ChatCompletionOptions) -> Result<(), Error> {
    validate_messages(&options.messages)
}

pub fn validate_embeddings(options: &EmbeddingOptions) -> Result<(), Error> {
    if options.input.is_empty() {
        return Err(Error::invalid_argument(
            "embedding input must contain at least one non-empty string",
        ));
    }
    Ok(())
}

/// Translate a single-prompt request into a chat request.
pub fn text_chat_options(options: &TextGenerationOptions) -> Result<ChatCompletionOptions, Error> {
    if options.prompt.trim().is_empty() {
        return Err(Error::invalid_argument("prompt must not be empty"));
    }

    let mut messages = Vec::with_capacity(2);
    if let Some(system) = options.system.as_deref().filter(|s| !s.is_empty()) {
        messages.push(Message::system(system));
    }
    messages.push(Message::user(options.prompt.clone()));

    Ok(ChatCompletionOptions {
        model: options.model.clone(),
        messages,
        temperature: options.temperature,
        max_tokens: options.max_tokens,
        top_p: options.top_p,
        stop_sequences: options.stop_sequences.clone(),
        metadata: options.metadata.clone(),
        provider_options: options.provider_options.clone(),
        ..Default::default()
    })
}

/// Translate a summarization request into a chat request.
pub fn summarize_chat_options(options: &SummarizeOptions) -> Result<ChatCompletionOptions, Error> {
    if options.text.trim().is_empty() {
        return Err(Error::invalid_argument("text must not be empty"));
    }

    let shape = match options.style {
        SummaryStyle::Paragraph => "a concise paragraph",
        SummaryStyle::BulletPoints => "a short list of bullet points",
    };
    let limit = options
        .max_length
        .map(|words| format!(" Use at most {words} words."))
        .unwrap_or_default();
    let system = format!(
        "You are a helpful assistant that summarizes text. Write the summary as {shape}.{limit} \
         Reply with the summary only."
    );

    Ok(ChatCompletionOptions {
        model: options.model.clone(),
        messages: vec![
            Message::system(system),
            Message::user(format!("Summarize the following text:\n\n{}", options.text)),
        ],
        temperature: options.temperature,
        max_tokens: options.max_tokens,
        provider_options: options.provider_options.clone(),
        ..Default::default()
    })
}

/// Merge provider options into a serialized payload.
///
/// Keys already present in the payload keep their unified value unless listed in
/// `overridable`.
pub fn merge_provider_options(
    payload: &mut Value,
    options: Option<&ProviderOptions>,
    overridable: &[&str],
) {
    let (Some(options), Some(target)) = (options, payload.as_object_mut()) else {
        return;
    };
    for (key, value) in options {
        if !target.contains_key(key) || overridable.contains(&key.as_str()) {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// Build the HTTP transport from adapter configuration.
pub fn build_http_client(config: &AdapterConfig) -> Result<Client, Error> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::config(format!("Invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::config(format!("Invalid value for header '{name}': {e}")))?;
        headers.insert(name, value);
    }

    let client = Client::builder()
        .timeout(config.timeout.unwrap_or(DEFAULT_TIMEOUT))
        .default_headers(headers)
        .build()?;
    Ok(client)
}

/// Turn a non-success HTTP status into a provider error carrying the response body.
pub async fn ensure_success(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await?;
    tracing::debug!(provider, status = status.as_u16(), "provider returned an error status");
    Err(Error::provider_status(
        provider,
        status.as_u16(),
        format!("API error: {body}"),
    ))
}
