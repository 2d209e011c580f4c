//! Minimal example: one chat completion and one streamed completion.
//!
//! Reads `PROVIDER_TYPE` and the matching API key from the environment (or `.env`).

use futures_util::StreamExt;
use std::io::Write;
use unillm::{AdapterFactory, ChatCompletionOptions, LLMClient, Message};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = LLMClient::new(AdapterFactory::from_env()?);
    println!("Using {}", client.adapter_name());

    // An empty model selects the adapter's default.
    let options = ChatCompletionOptions::new(
        "",
        vec![
            Message::system("You are a concise assistant."),
            Message::user("What is the capital of France?"),
        ],
    )
    .max_tokens(100);

    let result = client.chat_completion(&options).await?;
    println!("AI: {}", result.content);
    println!("Tokens: {}", result.usage.total_tokens);

    let options = ChatCompletionOptions::new(
        "",
        vec![Message::user("Count from one to five in words.")],
    );
    let mut stream = client.chat_completion_stream(&options).await?;
    print!("Streaming: ");
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        print!("{}", chunk.content);
        std::io::stdout().flush()?;
        if let Some(reason) = chunk.finish_reason {
            println!("\n[finished: {reason:?}]");
        }
    }

    Ok(())
}
