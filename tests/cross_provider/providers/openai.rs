use std::sync::Arc;

use super::{
    create_weather_tool, sse_response, ProviderTestSetup, FUNCTION_RESULT, SYSTEM_PROMPT,
    USER_PROMPT,
};
use serde_json::json;
use unillm::{LLMAdapter, OpenAIAdapter};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer};

pub struct OpenAITestSetup;

#[async_trait::async_trait]
impl ProviderTestSetup for OpenAITestSetup {
    const NAME: &'static str = "OpenAI";
    const MODEL: &'static str = "gpt-4o-mini";

    fn create_adapter(base_url: &str) -> Arc<dyn LLMAdapter> {
        let adapter = OpenAIAdapter::new_with_base_url("test-api-key", base_url)
            .expect("Failed to create OpenAI adapter");
        Arc::new(adapter)
    }

    fn expected_call_id() -> &'static str {
        "call_abc123def456"
    }

    async fn mount_function_calling_mocks(mock_server: &MockServer) {
        let weather_tool = create_weather_tool();
        let initial_request_payload = json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": USER_PROMPT}
            ],
            "temperature": 0.5,
            "max_tokens": 150,
            "tools": [
                {
                    "type": "function",
                    "function": {
                        "name": weather_tool.function.name,
                        "description": weather_tool.function.description,
                        "parameters": weather_tool.function.parameters
                    }
                }
            ],
            "stream": true,
            "stream_options": {"include_usage": true}
        });

        let followup_request_payload = json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": USER_PROMPT},
                {
                    "role": "assistant",
                    "content": "I'll help you get the weather for Paris.",
                    "tool_calls": [
                        {
                            "id": "call_abc123def456",
                            "type": "function",
                            "function": {
                                "name": "get_weather",
                                "arguments": "{\"location\": \"Paris\"}"
                            }
                        }
                    ]
                },
                {
                    "role": "tool",
                    "content": FUNCTION_RESULT,
                    "tool_call_id": "call_abc123def456"
                }
            ],
            "temperature": 0.5,
            "max_tokens": 150,
            "stream": true,
            "stream_options": {"include_usage": true}
        });

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-api-key"))
            .and(body_json(initial_request_payload))
            .respond_with(sse_response("openai/function_call_response.sse"))
            .expect(1)
            .mount(mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_json(followup_request_payload))
            .respond_with(sse_response("openai/followup_response.sse"))
            .expect(1)
            .mount(mock_server)
            .await;
    }
}
