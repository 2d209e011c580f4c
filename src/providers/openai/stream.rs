use std::collections::BTreeMap;

use super::types::{ChatChunk, OpenAIUsage};
use crate::normalizer::{Step, StreamNormalizer};
use crate::types::{ChatCompletionChunk, FinishReason, Role, ToolCall, Usage};
use crate::Error;

/// Map an OpenAI `finish_reason` to the unified value.
pub(crate) fn map_finish_reason(reason: Option<&str>) -> Option<FinishReason> {
    match reason? {
        "stop" => Some(FinishReason::Stop),
        "length" => Some(FinishReason::Length),
        "content_filter" => Some(FinishReason::ContentFilter),
        "tool_calls" | "function_call" => Some(FinishReason::ToolCalls),
        _ => None,
    }
}

impl From<OpenAIUsage> for Usage {
    fn from(usage: OpenAIUsage) -> Self {
        Usage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

/// A tool call whose arguments are still arriving.
#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Normalizes `chat.completion.chunk` events.
///
/// OpenAI reports the finish reason and the usage totals in separate chunks. The finish
/// reason is held until a usage chunk arrives (or the stream ends) so that exactly one
/// terminal chunk is emitted. Usage reported before the finish reason is kept, and the
/// latest report wins.
#[derive(Debug, Default)]
pub struct OpenAIStreamNormalizer {
    id: String,
    model: String,
    role_pending: bool,
    role_sent: bool,
    tool_calls: BTreeMap<u32, PartialToolCall>,
    pending_finish: Option<FinishReason>,
    usage: Option<Usage>,
    finish_seen: bool,
    terminal_sent: bool,
}

impl OpenAIStreamNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn chunk(&mut self, content: String) -> ChatCompletionChunk {
        let mut chunk = ChatCompletionChunk::delta(self.id.clone(), self.model.clone(), content);
        if self.role_pending && !self.role_sent {
            chunk.role = Some(Role::Assistant);
            self.role_sent = true;
        }
        chunk
    }

    fn take_tool_calls(&mut self) -> Vec<ToolCall> {
        std::mem::take(&mut self.tool_calls)
            .into_values()
            .map(|partial| ToolCall::function(partial.id, partial.name, partial.arguments))
            .collect()
    }

    fn terminal(&mut self) -> ChatCompletionChunk {
        self.terminal_sent = true;
        ChatCompletionChunk {
            finish_reason: self.pending_finish.take(),
            usage: self.usage.take(),
            ..self.chunk(String::new())
        }
    }
}

impl StreamNormalizer for OpenAIStreamNormalizer {
    type Event = ChatChunk;

    fn provider(&self) -> &'static str {
        "OpenAI"
    }

    fn on_event(&mut self, event: ChatChunk) -> Result<Step, Error> {
        if let Some(error) = event.error {
            let message = match error.r#type {
                Some(kind) => format!("{kind}: {}", error.message),
                None => error.message,
            };
            return Err(Error::provider("OpenAI", message));
        }
        if self.terminal_sent {
            return Ok(Step::none());
        }
        if !event.id.is_empty() {
            self.id = event.id;
        }
        if !event.model.is_empty() {
            self.model = event.model;
        }

        let mut step = Step::none();

        // Only the first choice is normalized.
        if let Some(choice) = event.choices.into_iter().find(|c| c.index == 0) {
            if choice.delta.role.as_deref() == Some("assistant") {
                self.role_pending = true;
            }

            if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                step.chunks.push(self.chunk(content));
            }

            for delta in choice.delta.tool_calls.unwrap_or_default() {
                let partial = self.tool_calls.entry(delta.index).or_default();
                if let Some(id) = delta.id {
                    partial.id = id;
                }
                if let Some(function) = delta.function {
                    if let Some(name) = function.name {
                        partial.name.push_str(&name);
                    }
                    if let Some(arguments) = function.arguments {
                        partial.arguments.push_str(&arguments);
                    }
                }
            }

            if choice.finish_reason.is_some() {
                self.finish_seen = true;
                self.pending_finish = map_finish_reason(choice.finish_reason.as_deref());
                let calls = self.take_tool_calls();
                if !calls.is_empty() {
                    let mut chunk = self.chunk(String::new());
                    chunk.tool_calls = calls;
                    step.chunks.push(chunk);
                }
            }
        }

        if let Some(usage) = event.usage {
            self.usage = Some(usage.into());
            if self.finish_seen {
                let terminal = self.terminal();
                step.chunks.push(terminal);
            }
        }

        Ok(step)
    }

    fn finish(&mut self) -> Vec<ChatCompletionChunk> {
        let mut chunks = Vec::new();
        let calls = self.take_tool_calls();
        if !calls.is_empty() {
            let mut chunk = self.chunk(String::new());
            chunk.tool_calls = calls;
            chunks.push(chunk);
        }
        if !self.terminal_sent && (self.finish_seen || self.usage.is_some()) {
            chunks.push(self.terminal());
        }
        chunks
    }
}
