//! Newline-delimited JSON line framing, shared by the stdio transport.
//!
//! This module is pure framing: it has no knowledge of stdin/stdout. The
//! actual read/write loop against real file descriptors lives in
//! `mcp-transport-stdio`, mirroring how the teacher keeps its line-splitting
//! logic independent of the I/O runner.

/// Frame a single JSON-RPC message as one newline-terminated line.
///
/// `text` must not itself contain a newline; JSON-RPC messages produced by
/// [`crate::jsonrpc::Message::encode`] never do, since `serde_json`'s compact
/// writer never emits raw `\n` inside a value.
pub fn encode_line(text: &str) -> String {
    let mut line = String::with_capacity(text.len() + 1);
    line.push_str(text);
    line.push('\n');
    line
}

/// Decode one line of input into the JSON text it frames.
///
/// Blank lines (including lines consisting only of whitespace) are not
/// errors; they decode to `None` so callers can simply skip them, matching
/// how most JSON-RPC stdio peers tolerate stray blank lines between messages.
pub fn decode_line(line: &str) -> Option<&str> {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    if trimmed.trim().is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_appends_single_newline() {
        assert_eq!(encode_line(r#"{"a":1}"#), "{\"a\":1}\n");
    }

    #[test]
    fn decode_strips_trailing_crlf() {
        assert_eq!(decode_line("{\"a\":1}\r\n"), Some("{\"a\":1}"));
    }

    #[test]
    fn decode_blank_line_is_none() {
        assert_eq!(decode_line(""), None);
        assert_eq!(decode_line("   \n"), None);
    }

    #[test]
    fn round_trip() {
        let framed = encode_line(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#);
        let mut lines = framed.split_inclusive('\n');
        let decoded = decode_line(lines.next().unwrap());
        assert_eq!(decoded, Some(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#));
    }
}
