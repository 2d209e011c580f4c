use reqwest::Client;
use serde_json::{json, Value};

use super::stream::{map_finish_reason, OpenAIStreamNormalizer};
use super::types::{
    ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse, JsonSchemaFormat,
    OpenAIMessage, ResponseFormat, StreamOptions,
};
use crate::adapter::{Capabilities, LLMAdapter, ProviderKind};
use crate::base;
use crate::normalizer;
use crate::response::ChunkStream;
use crate::sse_stream::SseStreamExt;
use crate::structured::{self, CapabilityTable, StructuredOutputMode, STRUCTURED_OUTPUT_NAME};
use crate::types::{
    AdapterConfig, ChatCompletionOptions, ChatCompletionResult, EmbeddingOptions,
    EmbeddingResult, EmbeddingUsage, Message, Role, StructuredOutputOptions,
    StructuredOutputResult, ToolChoice, Usage,
};
use crate::Error;

const PROVIDER: &str = "OpenAI";

/// Payload keys provider options may replace even when set by the unified request.
const OVERRIDABLE_FIELDS: &[&str] = &["stream_options"];

/// OpenAI adapter (Chat Completions and Embeddings APIs).
///
/// Also works against OpenAI-compatible servers through a custom base URL.
pub struct OpenAIAdapter {
    client: Client,
    config: AdapterConfig,
    base_url: String,
    capability_table: CapabilityTable,
}

impl OpenAIAdapter {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    /// Model used when neither the request nor the configuration names one.
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";

    pub fn new(api_key: impl Into<String>) -> Result<Self, Error> {
        Self::with_config(AdapterConfig::new(api_key).default_model(Self::DEFAULT_MODEL))
    }

    /// Create an adapter against a custom base URL (OpenAI-compatible servers, tests).
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
        if let Some(retries) = config.max_retries {
            tracing::debug!(retries, "OpenAI transport does not retry; max_retries recorded only");
        }

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

    /// Convert unified chat options into the JSON payload sent to `/chat/completions`.
    pub(crate) fn build_chat_payload(
        &self,
        options: &ChatCompletionOptions,
        stream: bool,
    ) -> Result<Value, Error> {
        base::validate_chat(options)?;
        let model = self.resolve_model(&options.model)?;

        let request = ChatRequest {
            model,
            messages: options.messages.iter().map(Self::convert_message).collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
            frequency_penalty: options.frequency_penalty,
            presence_penalty: options.presence_penalty,
            stop: options.stop_sequences.clone().filter(|s| !s.is_empty()),
            metadata: options.metadata.clone(),
            tools: options.tools.clone().filter(|t| !t.is_empty()),
            tool_choice: options.tool_choice.as_ref().map(Self::convert_tool_choice),
            response_format: None,
            stream,
            stream_options: stream.then_some(StreamOptions {
                include_usage: true,
            }),
        };

        let mut payload = serde_json::to_value(&request)?;
        base::merge_provider_options(
            &mut payload,
            options.provider_options.as_ref(),
            OVERRIDABLE_FIELDS,
        );
        Ok(payload)
    }

    fn convert_message(message: &Message) -> OpenAIMessage {
        let tool_calls = message.tool_calls.clone().filter(|calls| !calls.is_empty());
        let content = if tool_calls.is_some() && message.content.is_empty() {
            None
        } else {
            Some(message.content.clone())
        };

        OpenAIMessage {
            role: message.role.as_str().to_string(),
            content,
            name: message.name.clone(),
            tool_calls,
            tool_call_id: match message.role {
                Role::Tool => message.tool_call_id.clone(),
                _ => None,
            },
        }
    }

    fn convert_tool_choice(choice: &ToolChoice) -> Value {
        match choice {
            ToolChoice::Auto => json!("auto"),
            ToolChoice::None => json!("none"),
            ToolChoice::Required => json!("required"),
            ToolChoice::Function(name) => json!({
                "type": "function",
                "function": {"name": name}
            }),
        }
    }

    fn convert_response(response: ChatResponse) -> Result<ChatCompletionResult, Error> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::provider(PROVIDER, "response contained no choices"))?;

        Ok(ChatCompletionResult {
            id: response.id,
            model: response.model,
            content: choice.message.content.unwrap_or_default(),
            role: Role::Assistant,
            finish_reason: map_finish_reason(choice.finish_reason.as_deref()),
            usage: response.usage.map(Usage::from).unwrap_or_default(),
            tool_calls: choice.message.tool_calls.unwrap_or_default(),
        })
    }

    async fn post(&self, path: &str, payload: &Value) -> Result<reqwest::Response, Error> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(provider = PROVIDER, %url, "sending request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await?;
        base::ensure_success(PROVIDER, response).await
    }

    async fn send_chat(&self, payload: &Value) -> Result<ChatResponse, Error> {
        let response = self.post("/chat/completions", payload).await?;
        Ok(response.json::<ChatResponse>().await?)
    }
}

#[async_trait::async_trait]
impl LLMAdapter for OpenAIAdapter {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            streaming: true,
            tool_calling: true,
            embeddings: true,
            structured_output: true,
        }
    }

    async fn chat_completion(
        &self,
        options: &ChatCompletionOptions,
    ) -> Result<ChatCompletionResult, Error> {
        let payload = self.build_chat_payload(options, false)?;
        let response = self.send_chat(&payload).await?;
        Self::convert_response(response)
    }

    async fn chat_completion_stream(
        &self,
        options: &ChatCompletionOptions,
    ) -> Result<ChunkStream, Error> {
        let payload = self.build_chat_payload(options, true)?;
        let response = self.post("/chat/completions", &payload).await?;

        let events = Box::pin(response.bytes_stream()).sse_events();
        Ok(normalizer::normalize(events, OpenAIStreamNormalizer::new()))
    }

    async fn create_embeddings(
        &self,
        options: &EmbeddingOptions,
    ) -> Result<EmbeddingResult, Error> {
        base::validate_embeddings(options)?;
        let request = EmbeddingRequest {
            model: self.resolve_model(&options.model)?,
            input: options.input.clone(),
            encoding_format: "float".to_string(),
            dimensions: options.dimensions,
            user: options.user.clone(),
        };
        let mut payload = serde_json::to_value(&request)?;
        base::merge_provider_options(&mut payload, options.provider_options.as_ref(), &[]);

        let response: EmbeddingResponse = self.post("/embeddings", &payload).await?.json().await?;

        let expected = options.input.len();
        if response.data.len() != expected {
            return Err(Error::provider(
                PROVIDER,
                format!(
                    "expected {expected} embeddings, received {}",
                    response.data.len()
                ),
            ));
        }

        let mut data = response.data;
        data.sort_by_key(|item| item.index);
        let usage = response.usage.unwrap_or_default();

        Ok(EmbeddingResult {
            id: base::generate_id("emb"),
            model: response.model,
            embeddings: data.into_iter().map(|item| item.embedding).collect(),
            usage: EmbeddingUsage {
                prompt_tokens: usage.prompt_tokens,
                total_tokens: usage.total_tokens,
            },
        })
    }

    async fn structured_output(
        &self,
        options: &StructuredOutputOptions,
    ) -> Result<StructuredOutputResult, Error> {
        structured::validate(options)?;
        let model = self.resolve_model(&options.chat.model)?;

        match self.capability_table.resolve(ProviderKind::OpenAI, &model)? {
            StructuredOutputMode::JsonSchema => {
                let chat = structured::schema_mode_options(options, &model);
                let mut payload = self.build_chat_payload(&chat, false)?;
                let format = ResponseFormat {
                    r#type: "json_schema".to_string(),
                    json_schema: JsonSchemaFormat {
                        name: STRUCTURED_OUTPUT_NAME.to_string(),
                        description: options.schema_description.clone(),
                        schema: options.schema.clone(),
                    },
                };
                payload["response_format"] = serde_json::to_value(format)?;

                let response = self.send_chat(&payload).await?;
                let refusal = response
                    .choices
                    .first()
                    .and_then(|choice| choice.message.refusal.clone());
                let result = Self::convert_response(response)?;
                match refusal {
                    Some(refusal) if result.content.is_empty() => {
                        Err(Error::structured_output_parse(
                            "model refused to produce structured output",
                            refusal,
                        ))
                    }
                    _ => structured::extract_from_text(&result.content),
                }
            }
            StructuredOutputMode::ToolUse => {
                let chat = structured::tool_mode_options(options, &model);
                let payload = self.build_chat_payload(&chat, false)?;
                let result = Self::convert_response(self.send_chat(&payload).await?)?;

                let call = result
                    .tool_calls
                    .iter()
                    .find(|call| call.function.name == STRUCTURED_OUTPUT_NAME)
                    .ok_or_else(|| structured::missing_tool_call(&result.content))?;
                structured::extract_from_tool_arguments(&call.function.arguments)
            }
        }
    }
}
