use reqwest::Client;
use serde_json::Value;

use super::stream::{map_stop_reason, AnthropicStreamNormalizer};
use super::types::*;
use crate::adapter::{Capabilities, LLMAdapter, ProviderKind};
use crate::base;
use crate::normalizer;
use crate::response::ChunkStream;
use crate::sse_stream::SseStreamExt;
use crate::structured::{self, CapabilityTable, StructuredOutputMode, STRUCTURED_OUTPUT_NAME};
use crate::types::{
    AdapterConfig, ChatCompletionOptions, ChatCompletionResult, EmbeddingOptions,
    EmbeddingResult, Message, Role, StructuredOutputOptions, StructuredOutputResult, ToolCall,
    ToolChoice, Usage,
};
use crate::Error;

const PROVIDER: &str = "Anthropic";
const API_VERSION: &str = "2023-06-01";
const STRUCTURED_OUTPUTS_BETA: &str = "structured-outputs-2025-11-13";

/// Anthropic adapter (Messages API).
pub struct AnthropicAdapter {
    client: Client,
    config: AdapterConfig,
    base_url: String,
    capability_table: CapabilityTable,
}

impl AnthropicAdapter {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com";
    /// Model used when neither the request nor the configuration names one.
    pub const DEFAULT_MODEL: &'static str = "claude-sonnet-4-5";
    /// `max_tokens` is mandatory on the Messages API.
    pub const DEFAULT_MAX_TOKENS: u32 = 4096;

    pub fn new(api_key: impl Into<String>) -> Result<Self, Error> {
        Self::with_config(AdapterConfig::new(api_key).default_model(Self::DEFAULT_MODEL))
    }

    /// Create an adapter against a custom base URL (proxies, tests).
    pub fn new_with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, Error> {
        Self::with_config(
            AdapterConfig::new(api_key)
                .base_url(base_url)
                .default_model(Self::DEFAULT_MODEL),
        )
    }

    pub fn with_config(config: AdapterConfig) -> Result<Self, Error> {
        let client = base::build_http_client(&config)?;
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            config,
            base_url,
            capability_table: CapabilityTable::builtin(),
        })
    }

    /// Replace the structured output capability table.
    pub fn with_capability_table(mut self, table: CapabilityTable) -> Self {
        self.capability_table = table;
        self
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn resolve_model(&self, requested: &str) -> Result<String, Error> {
        base::resolve_model(requested, self.config.default_model.as_deref())
    }

    /// Convert unified chat options into a Messages API payload.
    pub(crate) fn build_payload(
        &self,
        options: &ChatCompletionOptions,
        stream: bool,
    ) -> Result<Value, Error> {
        base::validate_chat(options)?;
        let model = self.resolve_model(&options.model)?;
        let (system, messages) = Self::convert_messages(&options.messages)?;

        let tools_disabled = matches!(options.tool_choice, Some(ToolChoice::None));
        let tools = options
            .tools
            .as_ref()
            .filter(|tools| !tools.is_empty() && !tools_disabled)
            .map(|tools| {
                tools
                    .iter()
                    .map(|tool| AnthropicTool {
                        name: tool.function.name.clone(),
                        description: tool.function.description.clone(),
                        input_schema: tool.function.parameters.clone(),
                    })
                    .collect::<Vec<_>>()
            });
        let tool_choice = match (&tools, &options.tool_choice) {
            (Some(_), Some(choice)) => Self::convert_tool_choice(choice),
            _ => None,
        };

        let metadata = options
            .metadata
            .as_ref()
            .and_then(|m| m.get("user_id"))
            .and_then(Value::as_str)
            .map(|user_id| AnthropicMetadata {
                user_id: user_id.to_string(),
            });

        let request = AnthropicRequest {
            model,
            messages,
            max_tokens: options.max_tokens.unwrap_or(Self::DEFAULT_MAX_TOKENS),
            system,
            temperature: options.temperature,
            top_p: options.top_p,
            stop_sequences: options.stop_sequences.clone().filter(|s| !s.is_empty()),
            metadata,
            tools,
            tool_choice,
            output_format: None,
            stream: stream.then_some(true),
        };

        let mut payload = serde_json::to_value(&request)?;
        base::merge_provider_options(&mut payload, options.provider_options.as_ref(), &[]);

        // Extended thinking rejects sampling overrides.
        let thinking = options
            .provider_options
            .as_ref()
            .is_some_and(|o| o.contains_key("thinking"));
        if let (true, Some(object)) = (thinking, payload.as_object_mut()) {
            object.remove("temperature");
            object.remove("top_p");
        }
        Ok(payload)
    }

    /// Split system text from the conversation and convert each turn.
    fn convert_messages(
        messages: &[Message],
    ) -> Result<(Option<String>, Vec<AnthropicMessage>), Error> {
        let mut system_parts = Vec::new();
        let mut converted = Vec::with_capacity(messages.len());

        for message in messages {
            match message.role {
                Role::System => system_parts.push(message.content.as_str()),
                Role::User => converted.push(AnthropicMessage {
                    role: "user".to_string(),
                    content: AnthropicContent::Text(message.content.clone()),
                }),
                Role::Assistant if message.has_tool_calls() => {
                    let mut blocks = Vec::with_capacity(message.tool_calls().len() + 1);
                    if !message.content.is_empty() {
                        blocks.push(AnthropicContentBlock::Text {
                            text: message.content.clone(),
                        });
                    }
                    for call in message.tool_calls() {
                        blocks.push(Self::tool_use_block(call)?);
                    }
                    converted.push(AnthropicMessage {
                        role: "assistant".to_string(),
                        content: AnthropicContent::Blocks(blocks),
                    });
                }
                Role::Assistant => converted.push(AnthropicMessage {
                    role: "assistant".to_string(),
                    content: AnthropicContent::Text(message.content.clone()),
                }),
                Role::Tool => converted.push(AnthropicMessage {
                    role: "user".to_string(),
                    content: AnthropicContent::Blocks(vec![AnthropicContentBlock::ToolResult {
                        tool_use_id: message.tool_call_id.clone().unwrap_or_default(),
                        content: message.content.clone(),
                    }]),
                }),
            }
        }

        let system = (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));
        Ok((system, converted))
    }

    fn tool_use_block(call: &ToolCall) -> Result<AnthropicContentBlock, Error> {
        let input = call.parsed_arguments().map_err(|e| {
            Error::invalid_argument(format!(
                "arguments of tool call '{}' are not valid JSON: {e}",
                call.id
            ))
        })?;
        Ok(AnthropicContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.function.name.clone(),
            input,
        })
    }

    fn convert_tool_choice(choice: &ToolChoice) -> Option<AnthropicToolChoice> {
        match choice {
            ToolChoice::Auto => Some(AnthropicToolChoice::Auto),
            ToolChoice::Required => Some(AnthropicToolChoice::Any),
            ToolChoice::Function(name) => Some(AnthropicToolChoice::Tool { name: name.clone() }),
            ToolChoice::None => None,
        }
    }

    fn convert_response(response: AnthropicResponse) -> ChatCompletionResult {
        let mut content = String::new();
        let mut tool_calls = Vec::new();
        for block in response.content {
            match block {
                AnthropicContentBlock::Text { text } => content.push_str(&text),
                AnthropicContentBlock::ToolUse { id, name, input } => {
                    tool_calls.push(ToolCall::function(id, name, input.to_string()));
                }
                _ => {}
            }
        }

        ChatCompletionResult {
            id: response.id,
            model: response.model,
            content,
            role: Role::Assistant,
            finish_reason: map_stop_reason(response.stop_reason.as_deref()),
            usage: response.usage.map(Usage::from).unwrap_or_default(),
            tool_calls,
        }
    }

    async fn post(&self, payload: &Value, beta: Option<&str>) -> Result<reqwest::Response, Error> {
        let url = format!("{}/v1/messages", self.base_url);
        tracing::debug!(provider = PROVIDER, %url, beta, "sending request");

        let mut request = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .header("Content-Type", "application/json")
            .json(payload);
        if let Some(beta) = beta {
            request = request.header("anthropic-beta", beta);
        }

        let response = request.send().await?;
        base::ensure_success(PROVIDER, response).await
    }

    async fn send(&self, payload: &Value, beta: Option<&str>) -> Result<AnthropicResponse, Error> {
        Ok(self.post(payload, beta).await?.json().await?)
    }
}

#[async_trait::async_trait]
impl LLMAdapter for AnthropicAdapter {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            streaming: true,
            tool_calling: true,
            embeddings: false,
            structured_output: true,
        }
    }

    async fn chat_completion(
        &self,
        options: &ChatCompletionOptions,
    ) -> Result<ChatCompletionResult, Error> {
        let payload = self.build_payload(options, false)?;
        let response = self.send(&payload, None).await?;
        Ok(Self::convert_response(response))
    }

    async fn chat_completion_stream(
        &self,
        options: &ChatCompletionOptions,
    ) -> Result<ChunkStream, Error> {
        let payload = self.build_payload(options, true)?;
        let response = self.post(&payload, None).await?;

        let events = Box::pin(response.bytes_stream()).sse_events();
        Ok(normalizer::normalize(events, AnthropicStreamNormalizer::new()))
    }

    async fn create_embeddings(
        &self,
        _options: &EmbeddingOptions,
    ) -> Result<EmbeddingResult, Error> {
        Err(Error::unsupported(PROVIDER, "embeddings"))
    }

    async fn structured_output(
        &self,
        options: &StructuredOutputOptions,
    ) -> Result<StructuredOutputResult, Error> {
        structured::validate(options)?;
        let model = self.resolve_model(&options.chat.model)?;

        match self.capability_table.resolve(ProviderKind::Anthropic, &model)? {
            StructuredOutputMode::JsonSchema => {
                let chat = structured::schema_mode_options(options, &model);
                let mut payload = self.build_payload(&chat, false)?;
                let format = OutputFormat {
                    r#type: "json_schema".to_string(),
                    schema: options.schema.clone(),
                };
                payload["output_format"] = serde_json::to_value(format)?;

                let response = self.send(&payload, Some(STRUCTURED_OUTPUTS_BETA)).await?;
                let result = Self::convert_response(response);
                structured::extract_from_text(&result.content)
            }
            StructuredOutputMode::ToolUse => {
                let chat = structured::tool_mode_options(options, &model);
                let payload = self.build_payload(&chat, false)?;
                let response = self.send(&payload, None).await?;

                let mut text = String::new();
                for block in response.content {
                    match block {
                        AnthropicContentBlock::ToolUse { name, input, .. }
                            if name == STRUCTURED_OUTPUT_NAME =>
                        {
                            return structured::extract_from_tool_input(input);
                        }
                        AnthropicContentBlock::Text { text: t } => text.push_str(&t),
                        _ => {}
                    }
                }
                Err(structured::missing_tool_call(&text))
            }
        }
    }
}
