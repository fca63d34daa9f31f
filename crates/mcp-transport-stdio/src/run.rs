//! The read-decode-route-write loop shared by both `run` entry points.

use std::sync::Arc;

use mcp_core::stdio::{decode_line, encode_line};
use mcp_core::{ErrorResponse, Message, RpcError};
use mcp_protocol::{route_notification, route_request, ProtocolCore};
use mcp_session::{CorrelationId, SessionId};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Run the stdio transport against the process's real stdin/stdout.
pub async fn run(core: Arc<ProtocolCore>) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    run_with_io(core, stdin, stdout).await
}

/// Run the stdio transport loop against arbitrary reader/writer streams.
///
/// A single internal session backs the whole connection; it is created once
/// at startup and torn down when the input stream reaches EOF.
pub async fn run_with_io<R, W>(core: Arc<ProtocolCore>, mut reader: R, writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let session_id: SessionId = create_session(&core).await?;
    let writer = Arc::new(Mutex::new(writer));

    let mut line = String::new();
    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await.map_err(Error::Read)?;
        if bytes_read == 0 {
            break;
        }

        let Some(text) = decode_line(&line) else {
            continue;
        };

        let message = match Message::decode(text) {
            Ok(message) => message,
            Err(err) => {
                write_message(
                    &writer,
                    Message::ErrorResponse(ErrorResponse::new(
                        mcp_core::RequestId::Number(0),
                        RpcError::with_message(mcp_core::JsonRpcErrorCode::ParseError, err.to_string()),
                    )),
                )
                .await?;
                continue;
            }
        };

        match message {
            Message::Request(request) => {
                let response = route_request(&core, &session_id, request).await;
                write_message(&writer, response).await?;
            }
            Message::Notification(notification) => {
                route_notification(&core, &session_id, &notification.method).await;
            }
            Message::Response(response) => {
                deliver_reply(&core, &response.id, response.result);
            }
            Message::ErrorResponse(error_response) => {
                deliver_reply(
                    &core,
                    &error_response.id,
                    serde_json::to_value(&error_response.error).unwrap_or(serde_json::Value::Null),
                );
            }
        }
    }

    core.forget_session(&session_id);
    debug!(target: "mcp_transport_stdio", "input closed, session ended");
    Ok(())
}

async fn create_session(core: &ProtocolCore) -> Result<SessionId> {
    // The protocol core owns session storage; stdio never surfaces this id.
    core.create_session().await.map_err(Error::from)
}

fn deliver_reply(core: &ProtocolCore, id: &mcp_core::RequestId, payload: serde_json::Value) {
    let Some(correlation_id) = CorrelationId::parse(&id.to_string()) else {
        warn!(target: "mcp_transport_stdio", id = %id, "reply id is not a known correlation slot");
        return;
    };
    if let Err(err) = core.deliver_reply(correlation_id, payload) {
        warn!(target: "mcp_transport_stdio", %err, "failed to deliver correlated reply");
    }
}

async fn write_message<W>(writer: &Arc<Mutex<W>>, message: Message) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let encoded = message.encode().map_err(|_| {
        Error::Write(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "failed to encode outgoing message",
        ))
    })?;
    let mut writer = writer.lock().await;
    writer
        .write_all(encode_line(&encoded).as_bytes())
        .await
        .map_err(Error::Write)?;
    writer.flush().await.map_err(Error::Write)?;
    Ok(())
}
