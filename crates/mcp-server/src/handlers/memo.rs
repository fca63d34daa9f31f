//! The `memo://insights` resource used by the doc examples and integration
//! tests: a small, process-lifetime, in-memory note.

use async_trait::async_trait;
use mcp_protocol::{RequestContext, Result};
use parking_lot::RwLock;
use serde_json::{json, Value};

/// A single plain-text note, readable and (via [`MemoResource::set`])
/// mutable for the lifetime of the process — no persistence across restarts,
/// per this workspace's scope.
pub struct MemoResource {
    uri: String,
    text: RwLock<String>,
}

impl MemoResource {
    /// A memo at `memo://insights` seeded with `initial_text`.
    pub fn new(initial_text: impl Into<String>) -> Self {
        Self {
            uri: "memo://insights".to_string(),
            text: RwLock::new(initial_text.into()),
        }
    }

    /// Overwrite the memo's contents.
    pub fn set(&self, text: impl Into<String>) {
        *self.text.write() = text.into();
    }
}

impl Default for MemoResource {
    fn default() -> Self {
        Self::new("No insights recorded yet.")
    }
}

#[async_trait]
impl mcp_protocol::ResourceHandler for MemoResource {
    fn definition(&self) -> Value {
        json!({
            "uri": self.uri,
            "name": "memo",
            "description": "A short in-memory note.",
            "mimeType": "text/plain"
        })
    }

    async fn read(&self, _ctx: &RequestContext) -> Result<Value> {
        let text = self.text.read().clone();
        Ok(json!({
            "contents": [
                { "uri": self.uri, "mimeType": "text/plain", "text": text }
            ]
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_back_the_seeded_text() {
        let memo = MemoResource::new("hello");
        let ctx = RequestContext::default();
        let result = memo.read(&ctx).await.unwrap();
        assert_eq!(result["contents"][0]["text"], "hello");
    }

    #[tokio::test]
    async fn set_updates_subsequent_reads() {
        let memo = MemoResource::default();
        memo.set("updated");
        let ctx = RequestContext::default();
        let result = memo.read(&ctx).await.unwrap();
        assert_eq!(result["contents"][0]["text"], "updated");
    }
}
