use futures_util::StreamExt;
use serde_json::json;
use unillm::{
    AnthropicAdapter, ChatCompletionOptions, EmbeddingInput, EmbeddingOptions, Error, LLMAdapter,
    LLMClient, Message, OpenAIAdapter, SummarizeOptions, TextGenerationOptions,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::providers::sse_response;

const FOLLOWUP_TEXT: &str = "It's sunny in Paris at 22°C, perfect for sightseeing.";

fn openai_completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-def456",
        "object": "chat.completion",
        "model": "gpt-4o-mini-2024-07-18",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 140, "completion_tokens": 15, "total_tokens": 155}
    }))
}

#[tokio::test]
async fn test_openai_streamed_content_matches_non_streamed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(sse_response("openai/followup_response.sse"))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"stream": false})))
        .respond_with(openai_completion(FOLLOWUP_TEXT))
        .mount(&mock_server)
        .await;

    let adapter = OpenAIAdapter::new_with_base_url("test-api-key", mock_server.uri()).unwrap();
    let options = ChatCompletionOptions::new("gpt-4o-mini", vec![Message::user("Weather?")]);

    let direct = adapter.chat_completion(&options).await.unwrap();
    let streamed = adapter
        .chat_completion_stream(&options)
        .await
        .unwrap()
        .collect_result()
        .await
        .unwrap();

    assert_eq!(streamed.content, direct.content);
    assert_eq!(streamed.id, direct.id);
    assert_eq!(streamed.finish_reason, direct.finish_reason);
    assert_eq!(streamed.usage, direct.usage);
}

#[tokio::test]
async fn test_anthropic_streamed_content_matches_non_streamed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(sse_response("anthropic/followup_response.sse"))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_02AbCdEf",
            "type": "message",
            "role": "assistant",
            "model": "claude-sonnet-4-5-20250929",
            "content": [{"type": "text", "text": FOLLOWUP_TEXT}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 512, "output_tokens": 15}
        })))
        .mount(&mock_server)
        .await;

    let adapter = AnthropicAdapter::new_with_base_url("test-api-key", mock_server.uri()).unwrap();
    let options = ChatCompletionOptions::new("claude-sonnet-4-5", vec![Message::user("Weather?")]);

    let direct = adapter.chat_completion(&options).await.unwrap();
    let streamed = adapter
        .chat_completion_stream(&options)
        .await
        .unwrap()
        .collect_result()
        .await
        .unwrap();

    assert_eq!(streamed.content, direct.content);
    assert_eq!(streamed.finish_reason, direct.finish_reason);
    assert_eq!(streamed.usage, direct.usage);
}

#[tokio::test]
async fn test_openai_midstream_error_reaches_caller() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(sse_response("openai/midstream_error.sse"))
        .mount(&mock_server)
        .await;

    let adapter = OpenAIAdapter::new_with_base_url("test-api-key", mock_server.uri()).unwrap();
    let options = ChatCompletionOptions::new("gpt-4o-mini", vec![Message::user("Weather?")]);

    let items: Vec<_> = adapter
        .chat_completion_stream(&options)
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap().content, "Hel");
    match &items[1] {
        Err(Error::Provider { message, .. }) => assert!(message.contains("server_error")),
        other => panic!("unexpected item: {other:?}"),
    }

    let err = adapter
        .chat_completion_stream(&options)
        .await
        .unwrap()
        .collect_result()
        .await
        .unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_model_defaults_to_configured_model() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": "gpt-4o-mini"})))
        .respond_with(openai_completion("Hello"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let adapter = OpenAIAdapter::new_with_base_url("test-api-key", mock_server.uri()).unwrap();
    let explicit = ChatCompletionOptions::new("gpt-4o-mini", vec![Message::user("Hi")]);
    let defaulted = ChatCompletionOptions::new("", vec![Message::user("Hi")]);

    adapter.chat_completion(&explicit).await.unwrap();
    adapter.chat_completion(&defaulted).await.unwrap();
}

#[tokio::test]
async fn test_embeddings_lengths() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(body_partial_json(json!({"input": "hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{"object": "embedding", "index": 0, "embedding": [0.1, 0.2, 0.3]}],
            "model": "text-embedding-3-small",
            "usage": {"prompt_tokens": 1, "total_tokens": 1}
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(body_partial_json(json!({"input": ["a", "b", "c"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [
                {"object": "embedding", "index": 2, "embedding": [3.0]},
                {"object": "embedding", "index": 0, "embedding": [1.0]},
                {"object": "embedding", "index": 1, "embedding": [2.0]}
            ],
            "model": "text-embedding-3-small",
            "usage": {"prompt_tokens": 3, "total_tokens": 3}
        })))
        .mount(&mock_server)
        .await;

    let adapter = OpenAIAdapter::new_with_base_url("test-api-key", mock_server.uri()).unwrap();

    let single = adapter
        .create_embeddings(&EmbeddingOptions::new("text-embedding-3-small", "hello"))
        .await
        .unwrap();
    assert_eq!(single.embeddings.len(), 1);
    assert_eq!(single.embeddings[0].len(), 3);
    assert!(single.id.starts_with("emb_"));

    let batch = EmbeddingInput::Batch(vec!["a".into(), "b".into(), "c".into()]);
    let batch = adapter
        .create_embeddings(&EmbeddingOptions::new("text-embedding-3-small", batch))
        .await
        .unwrap();
    assert_eq!(batch.embeddings, vec![vec![1.0], vec![2.0], vec![3.0]]);
    assert_eq!(batch.usage.total_tokens, 3);
}

#[tokio::test]
async fn test_provider_error_status_is_surfaced() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_string(r#"{"type":"error","error":{"type":"rate_limit_error"}}"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let adapter = AnthropicAdapter::new_with_base_url("test-api-key", mock_server.uri()).unwrap();
    let options = ChatCompletionOptions::new("claude-sonnet-4-5", vec![Message::user("Hi")]);
    let err = adapter.chat_completion(&options).await.unwrap_err();

    match err {
        Error::Provider {
            status, message, ..
        } => {
            assert_eq!(status, Some(429));
            assert!(message.contains("rate_limit_error"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_client_text_and_summary() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [{"role": "system", "content": "You are a poet"}]
        })))
        .respond_with(openai_completion("Autumn leaves falling"))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(openai_completion("  A short summary.\n"))
        .mount(&mock_server)
        .await;

    let adapter = OpenAIAdapter::new_with_base_url("test-api-key", mock_server.uri()).unwrap();
    let client = LLMClient::new(std::sync::Arc::new(adapter));
    assert_eq!(client.adapter_name(), "OpenAI");

    let text = client
        .generate_text(&TextGenerationOptions::new("", "Write a haiku").system("You are a poet"))
        .await
        .unwrap();
    assert_eq!(text.text, "Autumn leaves falling");

    let summary = client
        .summarize(&SummarizeOptions::new("", "A very long article about the weather."))
        .await
        .unwrap();
    assert_eq!(summary.summary, "A short summary.");
    assert_eq!(summary.usage.total_tokens, 155);
}
