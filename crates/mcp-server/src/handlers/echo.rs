//! The `echo` tool used by the end-to-end "initialize + tool call" scenario
//! and the doc examples.

use async_trait::async_trait;
use mcp_protocol::{Error, RequestContext, Result, ToolHandler};
use serde_json::{json, Value};

/// Echoes its `text` argument back as `"Echo: <text>"`.
pub struct EchoTool;

#[async_trait]
impl ToolHandler for EchoTool {
    fn definition(&self) -> Value {
        json!({
            "name": "echo",
            "description": "Echoes the given text back, prefixed with \"Echo: \".",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            }
        })
    }

    async fn call(&self, arguments: Value, _ctx: &RequestContext) -> Result<Value> {
        let text = arguments
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidParams("missing or non-string `text`".to_string()))?;

        Ok(json!({
            "content": [
                { "type": "text", "text": format!("Echo: {text}") }
            ]
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_the_given_text() {
        let tool = EchoTool;
        let ctx = RequestContext::default();
        let result = tool.call(json!({"text": "hi"}), &ctx).await.unwrap();
        assert_eq!(
            result,
            json!({"content": [{"type": "text", "text": "Echo: hi"}]})
        );
    }

    #[tokio::test]
    async fn missing_text_is_invalid_params() {
        let tool = EchoTool;
        let ctx = RequestContext::default();
        let result = tool.call(json!({}), &ctx).await;
        assert!(matches!(result, Err(Error::InvalidParams(_))));
    }
}
