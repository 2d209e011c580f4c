//! Extracts a typed record with schema-constrained output.

use serde::Deserialize;
use serde_json::json;
use unillm::{AdapterFactory, ChatCompletionOptions, LLMClient, Message, StructuredOutputOptions};

#[derive(Debug, Deserialize)]
struct Person {
    name: String,
    age: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = LLMClient::new(AdapterFactory::from_env()?);

    let chat = ChatCompletionOptions::new(
        "",
        vec![Message::user(
            "Extract the person: Alice turned thirty last week.",
        )],
    );
    let schema = json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "age": {"type": "integer"}
        },
        "required": ["name", "age"],
        "additionalProperties": false
    });
    let options = StructuredOutputOptions::new(chat, schema).description("A person record");

    let result = client.structured_output(&options).await?;
    println!("Raw: {}", result.raw_text);

    let person: Person = result.parse()?;
    println!("{} is {} years old", person.name, person.age);

    Ok(())
}
