//! JSON-RPC 2.0 message framing.
//!
//! A message is decoded as a discriminated union based on its *shape*, not a
//! wire-level type tag: a message with an `id` and a `method` is a
//! [`Request`]; with an `id` and no `method` it is a [`Response`] or
//! [`ErrorResponse`] (distinguished by `result` vs `error`); with a `method`
//! and no `id` it is a [`Notification`]. `id: 0` is a valid request id and
//! must not be confused with a missing id.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{Error, RpcError};

/// JSON-RPC version string, always `"2.0"`.
pub const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC request or response identifier.
///
/// Per spec, any integer (including zero) or any string is a valid id; the
/// id is never null for a request or response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    /// Integer id.
    Number(i64),
    /// String id.
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

/// A JSON-RPC request: expects a matching [`Response`] or [`ErrorResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Method name.
    pub method: String,
    /// Method parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Request id, echoed back on the response.
    pub id: RequestId,
}

impl Request {
    /// Build a new request.
    pub fn new(method: impl Into<String>, params: Option<Value>, id: RequestId) -> Self {
        Self {
            method: method.into(),
            params,
            id,
        }
    }
}

/// A successful JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// The id of the request this responds to.
    pub id: RequestId,
    /// The method result.
    pub result: Value,
}

impl Response {
    /// Build a new success response.
    pub fn new(id: RequestId, result: Value) -> Self {
        Self { id, result }
    }
}

/// An error JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// The id of the request this responds to.
    pub id: RequestId,
    /// The error payload.
    pub error: RpcError,
}

impl ErrorResponse {
    /// Build a new error response.
    pub fn new(id: RequestId, error: RpcError) -> Self {
        Self { id, error }
    }
}

/// A JSON-RPC notification: no `id`, no response expected.
///
/// Unknown top-level fields beyond `jsonrpc`/`method`/`params` are preserved
/// in `extra` so progress/custom payloads round-trip without loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Method name.
    pub method: String,
    /// Method parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Additional top-level fields not otherwise modeled, preserved verbatim.
    #[serde(flatten, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, Value>,
}

impl Notification {
    /// Build a new notification with no extra fields.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            method: method.into(),
            params,
            extra: serde_json::Map::new(),
        }
    }
}

/// The JSON-RPC message tagged union.
#[derive(Debug, Clone)]
pub enum Message {
    /// A request expecting a response.
    Request(Request),
    /// A successful response.
    Response(Response),
    /// An error response.
    ErrorResponse(ErrorResponse),
    /// A one-way notification.
    Notification(Notification),
}

impl Message {
    /// The request id carried by this message, if any (absent for notifications).
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Request(r) => Some(&r.id),
            Self::Response(r) => Some(&r.id),
            Self::ErrorResponse(r) => Some(&r.id),
            Self::Notification(_) => None,
        }
    }

    /// Decode a single JSON-RPC message from a complete JSON text.
    pub fn decode(json: &str) -> crate::error::Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Discriminate and decode a message from an already-parsed [`Value`].
    pub fn from_value(value: Value) -> crate::error::Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::InvalidRequest("message must be a JSON object".into()))?;

        let has_method = obj.contains_key("method");
        let has_id = obj.contains_key("id") && !obj.get("id").is_some_and(Value::is_null);

        if has_method && has_id {
            let request: Request = serde_json::from_value(value)?;
            Ok(Self::Request(request))
        } else if has_method && !has_id {
            let notification: Notification = serde_json::from_value(value)?;
            Ok(Self::Notification(notification))
        } else if has_id && obj.contains_key("error") {
            let error_response: ErrorResponse = serde_json::from_value(value)?;
            Ok(Self::ErrorResponse(error_response))
        } else if has_id && obj.contains_key("result") {
            let response: Response = serde_json::from_value(value)?;
            Ok(Self::Response(response))
        } else {
            Err(Error::InvalidRequest(
                "message has neither a method nor a result/error payload".into(),
            ))
        }
    }

    /// Encode this message to a compact JSON string with `jsonrpc` first.
    pub fn encode(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(&self.to_value())?)
    }

    /// Render this message as a [`Value`] with the `jsonrpc` field injected.
    pub fn to_value(&self) -> Value {
        let mut value = match self {
            Self::Request(r) => serde_json::to_value(r),
            Self::Response(r) => serde_json::to_value(r),
            Self::ErrorResponse(r) => serde_json::to_value(r),
            Self::Notification(n) => serde_json::to_value(n),
        }
        .expect("JSON-RPC message types always serialize");

        if let Value::Object(map) = &mut value {
            let mut ordered = serde_json::Map::new();
            ordered.insert("jsonrpc".into(), Value::String(JSONRPC_VERSION.into()));
            ordered.append(map);
            Value::Object(ordered)
        } else {
            value
        }
    }
}

impl From<Request> for Message {
    fn from(r: Request) -> Self {
        Self::Request(r)
    }
}

impl From<Response> for Message {
    fn from(r: Response) -> Self {
        Self::Response(r)
    }
}

impl From<ErrorResponse> for Message {
    fn from(r: ErrorResponse) -> Self {
        Self::ErrorResponse(r)
    }
}

impl From<Notification> for Message {
    fn from(n: Notification) -> Self {
        Self::Notification(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn discriminates_request_by_shape() {
        let msg = Message::decode(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).unwrap();
        assert!(matches!(msg, Message::Request(_)));
    }

    #[test]
    fn id_zero_is_a_valid_request_id() {
        let msg = Message::decode(r#"{"jsonrpc":"2.0","id":0,"method":"ping"}"#).unwrap();
        match msg {
            Message::Request(r) => assert_eq!(r.id, RequestId::Number(0)),
            _ => panic!("expected request"),
        }
    }

    #[test]
    fn discriminates_notification_by_missing_id() {
        let msg = Message::decode(r#"{"jsonrpc":"2.0","method":"notifications/progress"}"#)
            .unwrap();
        assert!(matches!(msg, Message::Notification(_)));
    }

    #[test]
    fn discriminates_response_vs_error() {
        let ok = Message::decode(r#"{"jsonrpc":"2.0","id":"a","result":{}}"#).unwrap();
        assert!(matches!(ok, Message::Response(_)));

        let err = Message::decode(
            r#"{"jsonrpc":"2.0","id":"a","error":{"code":-32601,"message":"nope"}}"#,
        )
        .unwrap();
        assert!(matches!(err, Message::ErrorResponse(_)));
    }

    #[test]
    fn notification_preserves_unknown_fields() {
        let msg = Message::decode(
            r#"{"jsonrpc":"2.0","method":"notifications/progress","params":{},"progressToken":"t1"}"#,
        )
        .unwrap();
        match msg {
            Message::Notification(n) => {
                assert_eq!(n.extra.get("progressToken"), Some(&json!("t1")));
            }
            _ => panic!("expected notification"),
        }
    }

    #[test]
    fn encode_decode_round_trip() {
        let original = Message::Request(Request::new(
            "tools/call",
            Some(json!({"name": "echo"})),
            RequestId::Number(7),
        ));
        let encoded = original.encode().unwrap();
        let decoded = Message::decode(&encoded).unwrap();
        assert_eq!(decoded.id(), original.id());
    }

    #[test]
    fn encode_puts_jsonrpc_field_first() {
        let msg = Message::Notification(Notification::new("ping", None));
        let encoded = msg.encode().unwrap();
        assert!(encoded.starts_with(r#"{"jsonrpc":"2.0""#));
    }
}
