//! The `greeting` prompt used by the doc examples and integration tests.

use async_trait::async_trait;
use mcp_protocol::{PromptHandler, RequestContext, Result};
use serde_json::{json, Value};

/// Renders a single user-role message greeting `name` (default `"there"`).
pub struct GreetingPrompt;

#[async_trait]
impl PromptHandler for GreetingPrompt {
    fn definition(&self) -> Value {
        json!({
            "name": "greeting",
            "description": "Produces a friendly greeting for the given name.",
            "arguments": [
                { "name": "name", "description": "Who to greet", "required": false }
            ]
        })
    }

    async fn get(&self, arguments: Value, _ctx: &RequestContext) -> Result<Value> {
        let name = arguments
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("there");

        Ok(json!({
            "description": "A friendly greeting",
            "messages": [
                {
                    "role": "user",
                    "content": { "type": "text", "text": format!("Hello, {name}!") }
                }
            ]
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn defaults_to_a_generic_greeting() {
        let prompt = GreetingPrompt;
        let ctx = RequestContext::default();
        let result = prompt.get(json!({}), &ctx).await.unwrap();
        let text = result["messages"][0]["content"]["text"].as_str().unwrap();
        assert_eq!(text, "Hello, there!");
    }

    #[tokio::test]
    async fn uses_the_supplied_name() {
        let prompt = GreetingPrompt;
        let ctx = RequestContext::default();
        let result = prompt.get(json!({"name": "Ada"}), &ctx).await.unwrap();
        let text = result["messages"][0]["content"]["text"].as_str().unwrap();
        assert_eq!(text, "Hello, Ada!");
    }
}
