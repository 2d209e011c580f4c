//! Structured output: schema-constrained completions with a forced-tool fallback.
//!
//! Which strategy a call uses is decided up front from a [`CapabilityTable`] keyed by
//! provider and model prefix. The choice never depends on how an earlier call went.

use serde_json::Value;

use crate::adapter::ProviderKind;
use crate::types::{
    ChatCompletionOptions, StructuredOutputOptions, StructuredOutputResult, Tool, ToolChoice,
};
use crate::Error;

/// Name of the schema directive and of the synthetic fallback tool.
pub const STRUCTURED_OUTPUT_NAME: &str = "structured_output";

const DEFAULT_TOOL_DESCRIPTION: &str = "Respond with a JSON object matching the input schema.";

/// How structured output is obtained from a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredOutputMode {
    /// The schema travels as a native structured-output directive.
    JsonSchema,
    /// A single tool carrying the schema is forced; its input is the output.
    ToolUse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CapabilityRule {
    provider: ProviderKind,
    model_prefix: String,
    /// `None` marks models with no implemented strategy.
    mode: Option<StructuredOutputMode>,
}

/// Static table mapping provider + model prefix to a structured output mode.
///
/// Rules are checked in order and the first matching prefix wins. Rules added with
/// [`CapabilityTable::with_rule`] take precedence over the built-in ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityTable {
    rules: Vec<CapabilityRule>,
}

impl CapabilityTable {
    /// A table with no rules; every lookup is unsupported.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// The built-in capability table.
    pub fn builtin() -> Self {
        use ProviderKind::{Anthropic, OpenAI};
        use StructuredOutputMode::{JsonSchema, ToolUse};

        let rules: &[(ProviderKind, &str, Option<StructuredOutputMode>)] = &[
            // The first gpt-4o snapshot predates json_schema response formats.
            (OpenAI, "gpt-4o-2024-05-13", Some(ToolUse)),
            (OpenAI, "gpt-4o", Some(JsonSchema)),
            (OpenAI, "gpt-4.1", Some(JsonSchema)),
            (OpenAI, "gpt-5", Some(JsonSchema)),
            (OpenAI, "o1-mini", None),
            (OpenAI, "o1", Some(JsonSchema)),
            (OpenAI, "o3", Some(JsonSchema)),
            (OpenAI, "o4", Some(JsonSchema)),
            (OpenAI, "gpt-4", Some(ToolUse)),
            (OpenAI, "gpt-3.5-turbo", Some(ToolUse)),
            // OpenAI-compatible servers generally implement function tools.
            (OpenAI, "", Some(ToolUse)),
            (Anthropic, "claude-sonnet-4-5", Some(JsonSchema)),
            (Anthropic, "claude-opus-4-5", Some(JsonSchema)),
            (Anthropic, "claude-opus-4-1", Some(JsonSchema)),
            (Anthropic, "claude-haiku-4-5", Some(JsonSchema)),
            (Anthropic, "claude-2", None),
            (Anthropic, "claude-instant", None),
            (Anthropic, "claude", Some(ToolUse)),
        ];

        Self {
            rules: rules
                .iter()
                .map(|(provider, prefix, mode)| CapabilityRule {
                    provider: *provider,
                    model_prefix: prefix.to_string(),
                    mode: *mode,
                })
                .collect(),
        }
    }

    /// Add a rule ahead of every existing rule. `None` marks the models unsupported.
    pub fn with_rule(
        mut self,
        provider: ProviderKind,
        model_prefix: impl Into<String>,
        mode: Option<StructuredOutputMode>,
    ) -> Self {
        self.rules.insert(
            0,
            CapabilityRule {
                provider,
                model_prefix: model_prefix.into(),
                mode,
            },
        );
        self
    }

    /// The mode for a provider and model, `None` when unsupported.
    pub fn mode_for(&self, provider: ProviderKind, model: &str) -> Option<StructuredOutputMode> {
        self.rules
            .iter()
            .find(|rule| rule.provider == provider && model.starts_with(&rule.model_prefix))
            .and_then(|rule| rule.mode)
    }

    /// Like [`CapabilityTable::mode_for`], failing with `UnsupportedCapability`.
    pub fn resolve(
        &self,
        provider: ProviderKind,
        model: &str,
    ) -> Result<StructuredOutputMode, Error> {
        let mode = self.mode_for(provider, model).ok_or_else(|| {
            Error::unsupported(provider.as_str(), format!("structured output on model '{model}'"))
        })?;
        tracing::debug!(%provider, model, ?mode, "structured output mode selected");
        Ok(mode)
    }
}

impl Default for CapabilityTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Check structured output options before any network call.
pub fn validate(options: &StructuredOutputOptions) -> Result<(), Error> {
    if !options.schema.is_object() {
        return Err(Error::invalid_argument("schema must be a JSON object"));
    }
    crate::base::validate_chat(&options.chat)
}

/// Chat options for a schema-mode call: the caller's options with streaming disabled and
/// caller tools removed, so the answer arrives as text.
pub fn schema_mode_options(options: &StructuredOutputOptions, model: &str) -> ChatCompletionOptions {
    ChatCompletionOptions {
        model: model.to_string(),
        stream: Some(false),
        tools: None,
        tool_choice: None,
        ..options.chat.clone()
    }
}

/// Chat options for the tool-use fallback: the only tool is `structured_output`, and it
/// is forced.
pub fn tool_mode_options(options: &StructuredOutputOptions, model: &str) -> ChatCompletionOptions {
    let description = options
        .schema_description
        .clone()
        .unwrap_or_else(|| DEFAULT_TOOL_DESCRIPTION.to_string());

    ChatCompletionOptions {
        model: model.to_string(),
        stream: Some(false),
        tools: Some(vec![Tool::function(
            STRUCTURED_OUTPUT_NAME,
            description,
            options.schema.clone(),
        )]),
        tool_choice: Some(ToolChoice::Function(STRUCTURED_OUTPUT_NAME.to_string())),
        ..options.chat.clone()
    }
}

/// Schema mode: the model's text is the raw output and must parse as JSON.
pub fn extract_from_text(text: &str) -> Result<StructuredOutputResult, Error> {
    let data: Value = serde_json::from_str(text).map_err(|e| {
        Error::structured_output_parse(format!("model output is not valid JSON: {e}"), text)
    })?;
    Ok(StructuredOutputResult {
        data,
        raw_text: text.to_string(),
    })
}

/// Tool-use fallback where the provider returns the tool input as an object.
pub fn extract_from_tool_input(input: Value) -> Result<StructuredOutputResult, Error> {
    let raw_text = serde_json::to_string(&input)?;
    Ok(StructuredOutputResult {
        data: input,
        raw_text,
    })
}

/// Tool-use fallback where the provider returns the tool input as JSON text.
pub fn extract_from_tool_arguments(arguments: &str) -> Result<StructuredOutputResult, Error> {
    let input: Value = serde_json::from_str(arguments).map_err(|e| {
        Error::structured_output_parse(format!("tool arguments are not valid JSON: {e}"), arguments)
    })?;
    extract_from_tool_input(input)
}

/// Error for a fallback response that never invoked the structured output tool.
pub fn missing_tool_call(raw_text: &str) -> Error {
    Error::structured_output_parse(
        format!("model did not invoke the {STRUCTURED_OUTPUT_NAME} tool"),
        raw_text,
    )
}
