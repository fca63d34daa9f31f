//! Server-Sent Events encoding and decoding.
//!
//! Pure, no-I/O SSE framing for the Streamable HTTP transport. An event is:
//!
//! ```text
//! id: event-123
//! event: message
//! data: {"jsonrpc": "2.0", ...}
//!
//! ```
//!
//! terminated by a blank line; lines starting with `:` are comments, used
//! here for keep-alive pings.

/// A single Server-Sent Event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SseEvent {
    /// Event id, used by clients for `Last-Event-ID` resume.
    pub id: Option<String>,
    /// Event type; defaults to `"message"` on the wire when absent.
    pub event: Option<String>,
    /// Event payload, possibly multiline.
    pub data: String,
    /// Suggested client reconnect delay in milliseconds.
    pub retry: Option<u32>,
}

impl SseEvent {
    /// A plain `data:`-only event.
    pub fn message(data: impl Into<String>) -> Self {
        Self {
            id: None,
            event: None,
            data: data.into(),
            retry: None,
        }
    }

    /// An event carrying a resumption id.
    pub fn with_id(id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            event: None,
            data: data.into(),
            retry: None,
        }
    }

    /// Start building a fully-specified event.
    pub fn builder() -> SseEventBuilder {
        SseEventBuilder::default()
    }
}

/// Builder for [`SseEvent`]s with more than one field set.
#[derive(Default)]
pub struct SseEventBuilder {
    id: Option<String>,
    event: Option<String>,
    data: Option<String>,
    retry: Option<u32>,
}

impl SseEventBuilder {
    /// Set the event id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the event type.
    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Set the event payload.
    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set the reconnect delay in milliseconds.
    pub fn retry(mut self, retry_ms: u32) -> Self {
        self.retry = Some(retry_ms);
        self
    }

    /// Build the event.
    ///
    /// # Panics
    ///
    /// Panics if `data` was never set.
    pub fn build(self) -> SseEvent {
        SseEvent {
            id: self.id,
            event: self.event,
            data: self.data.expect("SseEvent requires data"),
            retry: self.retry,
        }
    }
}

/// Encodes [`SseEvent`]s to wire bytes.
pub struct SseEncoder;

impl SseEncoder {
    /// Encode a single event, terminated by a blank line.
    pub fn encode(event: &SseEvent) -> String {
        let mut out = String::new();

        if let Some(id) = &event.id {
            out.push_str("id: ");
            out.push_str(id);
            out.push('\n');
        }
        if let Some(event_type) = &event.event {
            out.push_str("event: ");
            out.push_str(event_type);
            out.push('\n');
        }
        if let Some(retry) = event.retry {
            out.push_str("retry: ");
            out.push_str(&retry.to_string());
            out.push('\n');
        }
        for line in event.data.lines() {
            out.push_str("data: ");
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
        out
    }

    /// Encode a comment line, invisible to clients but keeps the connection open.
    pub fn encode_comment(comment: &str) -> String {
        let mut out = String::new();
        for line in comment.lines() {
            out.push_str(": ");
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
        out
    }

    /// An empty comment used purely as a keep-alive ping.
    pub fn encode_keepalive() -> String {
        ":\n\n".to_string()
    }
}

/// Incremental parser for SSE byte streams, e.g. reconnect replay or client decoding.
#[derive(Default)]
pub struct SseParser {
    buffer: String,
    current_id: Option<String>,
    current_event: Option<String>,
    current_data: Vec<String>,
    current_retry: Option<u32>,
}

impl SseParser {
    /// Create an empty parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed newly-received bytes and return any events completed by them.
    pub fn feed(&mut self, data: &[u8]) -> Vec<SseEvent> {
        let Ok(text) = std::str::from_utf8(data) else {
            return Vec::new();
        };
        self.buffer.push_str(text);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line = self.buffer[..pos].to_string();
            self.buffer.drain(..=pos);

            if line.is_empty() {
                if let Some(event) = self.emit() {
                    events.push(event);
                }
            } else if line.starts_with(':') {
                // comment, ignored
            } else if let Some(colon) = line.find(':') {
                let field = &line[..colon];
                let value = line[colon + 1..].trim_start();
                self.apply_field(field, value);
            } else {
                self.apply_field(&line, "");
            }
        }
        events
    }

    fn apply_field(&mut self, field: &str, value: &str) {
        match field {
            "id" => self.current_id = Some(value.to_string()),
            "event" => self.current_event = Some(value.to_string()),
            "data" => self.current_data.push(value.to_string()),
            "retry" => {
                if let Ok(ms) = value.parse() {
                    self.current_retry = Some(ms);
                }
            }
            _ => {}
        }
    }

    fn emit(&mut self) -> Option<SseEvent> {
        if self.current_data.is_empty() {
            self.current_id = None;
            self.current_event = None;
            self.current_retry = None;
            return None;
        }
        let event = SseEvent {
            id: self.current_id.take(),
            event: self.current_event.take(),
            data: self.current_data.join("\n"),
            retry: self.current_retry.take(),
        };
        self.current_data.clear();
        Some(event)
    }

    /// The most recently parsed event id, useful when surfacing `Last-Event-ID`.
    pub fn last_event_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }
}
