use std::collections::HashMap;

use super::types::{AnthropicContentBlock, AnthropicContentDelta, AnthropicStreamEvent};
use crate::normalizer::{Step, StreamNormalizer};
use crate::types::{ChatCompletionChunk, FinishReason, Role, ToolCall};
use crate::Error;

/// Map an Anthropic `stop_reason` to the unified value.
pub(crate) fn map_stop_reason(reason: Option<&str>) -> Option<FinishReason> {
    match reason? {
        "end_turn" | "stop_sequence" | "pause_turn" => Some(FinishReason::Stop),
        "max_tokens" => Some(FinishReason::Length),
        "tool_use" => Some(FinishReason::ToolCalls),
        "refusal" => Some(FinishReason::ContentFilter),
        _ => None,
    }
}

#[derive(Debug, Default)]
struct PendingToolUse {
    id: String,
    name: String,
    /// Input from `content_block_start`, used when no JSON deltas follow.
    initial_input: Option<serde_json::Value>,
    partial_json: String,
}

impl PendingToolUse {
    fn into_tool_call(self) -> ToolCall {
        let arguments = if !self.partial_json.is_empty() {
            self.partial_json
        } else {
            self.initial_input
                .filter(|input| input.as_object().is_some_and(|o| !o.is_empty()))
                .map(|input| input.to_string())
                .unwrap_or_else(|| "{}".to_string())
        };
        ToolCall::function(self.id, self.name, arguments)
    }
}

/// Normalizes Messages API stream events.
#[derive(Debug, Default)]
pub struct AnthropicStreamNormalizer {
    id: String,
    model: String,
    input_tokens: u32,
    role_sent: bool,
    tool_uses: HashMap<u32, PendingToolUse>,
}

impl AnthropicStreamNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn chunk(&mut self, content: String) -> ChatCompletionChunk {
        let mut chunk = ChatCompletionChunk::delta(self.id.clone(), self.model.clone(), content);
        if !self.role_sent {
            chunk.role = Some(Role::Assistant);
            self.role_sent = true;
        }
        chunk
    }
}

impl StreamNormalizer for AnthropicStreamNormalizer {
    type Event = AnthropicStreamEvent;

    fn provider(&self) -> &'static str {
        "Anthropic"
    }

    fn on_event(&mut self, event: AnthropicStreamEvent) -> Result<Step, Error> {
        match event {
            AnthropicStreamEvent::MessageStart { message } => {
                self.id = message.id;
                self.model = message.model;
                self.input_tokens = message
                    .usage
                    .and_then(|usage| usage.input_tokens)
                    .unwrap_or(0);
                Ok(Step::none())
            }
            AnthropicStreamEvent::ContentBlockStart {
                index,
                content_block,
            } => match content_block {
                AnthropicContentBlock::Text { text } if !text.is_empty() => {
                    Ok(Step::emit(self.chunk(text)))
                }
                AnthropicContentBlock::ToolUse { id, name, input } => {
                    self.tool_uses.insert(
                        index,
                        PendingToolUse {
                            id,
                            name,
                            initial_input: Some(input),
                            partial_json: String::new(),
                        },
                    );
                    Ok(Step::none())
                }
                _ => Ok(Step::none()),
            },
            AnthropicStreamEvent::ContentBlockDelta { index, delta } => match delta {
                AnthropicContentDelta::TextDelta { text } if !text.is_empty() => {
                    Ok(Step::emit(self.chunk(text)))
                }
                AnthropicContentDelta::InputJsonDelta { partial_json } => {
                    match self.tool_uses.get_mut(&index) {
                        Some(pending) => pending.partial_json.push_str(&partial_json),
                        None => tracing::warn!(index, "input_json_delta for unknown content block"),
                    }
                    Ok(Step::none())
                }
                _ => Ok(Step::none()),
            },
            AnthropicStreamEvent::ContentBlockStop { index } => {
                match self.tool_uses.remove(&index) {
                    Some(pending) => {
                        let mut chunk = self.chunk(String::new());
                        chunk.tool_calls = vec![pending.into_tool_call()];
                        Ok(Step::emit(chunk))
                    }
                    None => Ok(Step::none()),
                }
            }
            AnthropicStreamEvent::MessageDelta { delta, usage } => {
                let mut chunk = self.chunk(String::new());
                chunk.finish_reason = map_stop_reason(delta.stop_reason.as_deref());
                chunk.usage = Some(usage.unwrap_or_default().to_usage(self.input_tokens));
                Ok(Step::emit(chunk))
            }
            AnthropicStreamEvent::MessageStop => Ok(Step::done()),
            AnthropicStreamEvent::Ping => Ok(Step::none()),
            AnthropicStreamEvent::Error { error } => Err(Error::provider(
                "Anthropic",
                format!("{}: {}", error.r#type, error.message),
            )),
        }
    }
}
