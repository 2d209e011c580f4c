pub mod openai;

use std::sync::Arc;

use unillm::{LLMAdapter, Tool};
use wiremock::{MockServer, ResponseTemplate};

pub const SYSTEM_PROMPT: &str =
    "You have access to weather data. Use the get_weather function when asked about weather.";
pub const USER_PROMPT: &str = "What's the weather like in Paris?";
pub const FUNCTION_RESULT: &str =
    "The weather in Paris is sunny with a temperature of 22°C (72°F). Perfect weather for sightseeing!";

/// Create a weather function tool for testing
pub fn create_weather_tool() -> Tool {
    Tool::function(
        "get_weather",
        "Get the current weather for a location",
        serde_json::json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The city and state, e.g. San Francisco, CA"
                }
            },
            "required": ["location"]
        }),
    )
}

/// Load test fixture from file
pub fn load_fixture(relative: &str) -> String {
    let path = format!(
        "{}/tests/cross_provider/fixtures/{relative}",
        env!("CARGO_MANIFEST_DIR")
    );
    std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to load test fixture: {path}"))
}

/// A 200 response streaming the given fixture as server-sent events.
pub fn sse_response(fixture: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(load_fixture(fixture))
        .insert_header("content-type", "text/event-stream")
        .insert_header("cache-control", "no-cache")
}

/// Provider-specific test setup
#[async_trait::async_trait]
pub trait ProviderTestSetup {
    const NAME: &'static str;
    const MODEL: &'static str;

    /// Create the adapter pointed at the mock server
    fn create_adapter(base_url: &str) -> Arc<dyn LLMAdapter>;

    /// Expected id of the call the fixture asks for
    fn expected_call_id() -> &'static str;

    /// Mount the required mocks for the function calling test on the provided mock server
    async fn mount_function_calling_mocks(mock_server: &MockServer);
}
