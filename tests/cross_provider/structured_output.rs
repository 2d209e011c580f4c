use serde::Deserialize;
use serde_json::json;
use unillm::{
    AnthropicAdapter, ChatCompletionOptions, Error, LLMAdapter, Message, OpenAIAdapter,
    StructuredOutputOptions, Tool, ToolChoice,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct Person {
    name: String,
    age: u32,
}

fn person_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "age": {"type": "number"}
        },
        "required": ["name", "age"]
    })
}

fn options(model: &str, prompt: &str) -> StructuredOutputOptions {
    StructuredOutputOptions::new(
        ChatCompletionOptions::new(model, vec![Message::user(prompt)]),
        person_schema(),
    )
}

fn options_with_caller_tool(model: &str) -> StructuredOutputOptions {
    let chat = ChatCompletionOptions::new(model, vec![Message::user("Extract: Alice is 30")])
        .tools(vec![Tool::function(
            "lookup_weather",
            "w",
            json!({"type": "object"}),
        )])
        .tool_choice(ToolChoice::Auto);
    StructuredOutputOptions::new(chat, person_schema())
}

async fn recorded_body(mock_server: &MockServer) -> serde_json::Value {
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    serde_json::from_slice(&requests[0].body).unwrap()
}

fn openai_text_response(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-so1",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 20, "completion_tokens": 9, "total_tokens": 29}
    }))
}

fn anthropic_response(content: serde_json::Value, stop_reason: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "msg_so1",
        "type": "message",
        "role": "assistant",
        "model": "claude-sonnet-4-5-20250929",
        "content": content,
        "stop_reason": stop_reason,
        "usage": {"input_tokens": 30, "output_tokens": 12}
    }))
}

#[tokio::test]
async fn test_openai_schema_mode() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "stream": false,
            "response_format": {
                "type": "json_schema",
                "json_schema": {"name": "structured_output", "schema": person_schema()}
            }
        })))
        .respond_with(openai_text_response(r#"{"name":"Alice","age":30}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let adapter = OpenAIAdapter::new_with_base_url("test-api-key", mock_server.uri()).unwrap();
    let result = adapter
        .structured_output(&options("gpt-4o-mini", "Extract: Alice is 30"))
        .await
        .unwrap();

    assert_eq!(result.data, json!({"name": "Alice", "age": 30}));
    assert_eq!(result.raw_text, r#"{"name":"Alice","age":30}"#);
    assert_eq!(
        result.parse::<Person>().unwrap(),
        Person {
            name: "Alice".to_string(),
            age: 30
        }
    );
}

#[tokio::test]
async fn test_openai_schema_mode_drops_caller_tools() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(openai_text_response(r#"{"name":"Alice","age":30}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let adapter = OpenAIAdapter::new_with_base_url("test-api-key", mock_server.uri()).unwrap();
    let result = adapter
        .structured_output(&options_with_caller_tool("gpt-4o-mini"))
        .await
        .unwrap();
    assert_eq!(result.data, json!({"name": "Alice", "age": 30}));

    let body = recorded_body(&mock_server).await;
    assert!(body.get("response_format").is_some());
    assert!(body.get("tools").is_none());
    assert!(body.get("tool_choice").is_none());
}

#[tokio::test]
async fn test_openai_schema_mode_invalid_json() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(openai_text_response("not valid json"))
        .mount(&mock_server)
        .await;

    let adapter = OpenAIAdapter::new_with_base_url("test-api-key", mock_server.uri()).unwrap();
    let err = adapter
        .structured_output(&options("gpt-4o", "Extract"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::StructuredOutputParse { .. }));
    assert_eq!(err.raw_text(), Some("not valid json"));
}

#[tokio::test]
async fn test_openai_schema_mode_refusal() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-so3",
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "refusal": "I can't help with that request."
                },
                "finish_reason": "stop"
            }]
        })))
        .mount(&mock_server)
        .await;

    let adapter = OpenAIAdapter::new_with_base_url("test-api-key", mock_server.uri()).unwrap();
    let err = adapter
        .structured_output(&options("gpt-4o-mini", "Extract"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::StructuredOutputParse { .. }));
    assert_eq!(err.raw_text(), Some("I can't help with that request."));
}

#[tokio::test]
async fn test_openai_tool_fallback() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "model": "gpt-4-turbo",
            "tool_choice": {"type": "function", "function": {"name": "structured_output"}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-so2",
            "model": "gpt-4-turbo",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "structured_output", "arguments": "{\"name\": \"Bob\", \"age\": 25}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let adapter = OpenAIAdapter::new_with_base_url("test-api-key", mock_server.uri()).unwrap();
    let result = adapter
        .structured_output(&options("gpt-4-turbo", "Extract: Bob is 25"))
        .await
        .unwrap();

    assert_eq!(result.data, json!({"name": "Bob", "age": 25}));
    assert_eq!(result.raw_text, r#"{"name":"Bob","age":25}"#);
}

#[tokio::test]
async fn test_anthropic_schema_mode_sends_beta_header() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("anthropic-beta", "structured-outputs-2025-11-13"))
        .and(body_partial_json(json!({
            "model": "claude-sonnet-4-5",
            "output_format": {"type": "json_schema", "schema": person_schema()}
        })))
        .respond_with(anthropic_response(
            json!([{"type": "text", "text": "{\"name\":\"Alice\",\"age\":30}"}]),
            "end_turn",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let adapter = AnthropicAdapter::new_with_base_url("test-api-key", mock_server.uri()).unwrap();
    let result = adapter
        .structured_output(&options("", "Extract: Alice is 30"))
        .await
        .unwrap();

    assert_eq!(result.data, json!({"name": "Alice", "age": 30}));
    assert_eq!(result.raw_text, r#"{"name":"Alice","age":30}"#);
}

#[tokio::test]
async fn test_anthropic_schema_mode_drops_caller_tools() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(anthropic_response(
            json!([{"type": "text", "text": "{\"name\":\"Alice\",\"age\":30}"}]),
            "end_turn",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let adapter = AnthropicAdapter::new_with_base_url("test-api-key", mock_server.uri()).unwrap();
    let result = adapter
        .structured_output(&options_with_caller_tool("claude-sonnet-4-5"))
        .await
        .unwrap();
    assert_eq!(result.data, json!({"name": "Alice", "age": 30}));

    let body = recorded_body(&mock_server).await;
    assert!(body.get("output_format").is_some());
    assert!(body.get("tools").is_none());
    assert!(body.get("tool_choice").is_none());
}

#[tokio::test]
async fn test_anthropic_tool_fallback() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({
            "model": "claude-3-5-haiku-latest",
            "tool_choice": {"type": "tool", "name": "structured_output"},
            "tools": [{"name": "structured_output", "input_schema": person_schema()}]
        })))
        .respond_with(anthropic_response(
            json!([{
                "type": "tool_use",
                "id": "toolu_1",
                "name": "structured_output",
                "input": {"name": "Bob", "age": 25}
            }]),
            "tool_use",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let adapter = AnthropicAdapter::new_with_base_url("test-api-key", mock_server.uri()).unwrap();
    let result = adapter
        .structured_output(&options("claude-3-5-haiku-latest", "Extract: Bob is 25"))
        .await
        .unwrap();

    assert_eq!(result.data, json!({"name": "Bob", "age": 25}));
    assert_eq!(result.raw_text, r#"{"name":"Bob","age":25}"#);
}

#[tokio::test]
async fn test_anthropic_tool_fallback_without_invocation() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(anthropic_response(
            json!([{"type": "text", "text": "I cannot do that."}]),
            "end_turn",
        ))
        .mount(&mock_server)
        .await;

    let adapter = AnthropicAdapter::new_with_base_url("test-api-key", mock_server.uri()).unwrap();
    let err = adapter
        .structured_output(&options("claude-3-5-haiku-latest", "Extract"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::StructuredOutputParse { .. }));
    assert_eq!(err.raw_text(), Some("I cannot do that."));
}

#[tokio::test]
async fn test_unsupported_model_fails_before_network() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let adapter = AnthropicAdapter::new_with_base_url("test-api-key", mock_server.uri()).unwrap();
    let err = adapter
        .structured_output(&options("claude-2.1", "Extract"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedCapability { .. }));
}
