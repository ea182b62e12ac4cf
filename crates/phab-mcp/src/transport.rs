//! Transport layer for MCP JSON-RPC communication.
//!
//! MCP uses newline-delimited JSON over stdin/stdout; logging goes to
//! stderr so stdout stays clean for the protocol.

use std::io::{self, BufRead, Write};

use crate::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};

/// Message received from the client.
#[derive(Debug)]
pub enum IncomingMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
}

/// Reads and writes newline-delimited JSON-RPC messages.
pub struct StdioTransport {
    reader: Box<dyn BufRead + Send>,
    writer: Box<dyn Write + Send>,
}

impl StdioTransport {
    /// Create a transport over stdin/stdout.
    pub fn stdio() -> Self {
        Self {
            reader: Box::new(io::BufReader::new(io::stdin())),
            writer: Box::new(io::stdout()),
        }
    }

    /// Create a transport with custom reader/writer (for testing).
    pub fn new(reader: Box<dyn BufRead + Send>, writer: Box<dyn Write + Send>) -> Self {
        Self { reader, writer }
    }

    /// Read one message. `Ok(None)` signals EOF.
    pub fn read_message(&mut self) -> io::Result<Option<IncomingMessage>> {
        let mut line = String::new();

        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        tracing::debug!(message = line, "received");

        // Requests carry an id; try that shape first
        if let Ok(request) = serde_json::from_str::<JsonRpcRequest>(line) {
            return Ok(Some(IncomingMessage::Request(request)));
        }
        if let Ok(notification) = serde_json::from_str::<JsonRpcNotification>(line) {
            return Ok(Some(IncomingMessage::Notification(notification)));
        }

        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Invalid JSON-RPC message: {}", line),
        ))
    }

    /// Write one response, newline-terminated and flushed.
    pub fn write_response(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        let json = serde_json::to_string(response)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

        tracing::debug!(message = json.as_str(), "sending");

        writeln!(self.writer, "{}", json)?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RequestId;
    use std::io::Cursor;

    fn transport_reading(input: &str) -> StdioTransport {
        StdioTransport::new(
            Box::new(Cursor::new(input.to_string())),
            Box::new(Vec::new()),
        )
    }

    #[test]
    fn test_read_request() {
        let mut transport =
            transport_reading("{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n");

        match transport.read_message().unwrap() {
            Some(IncomingMessage::Request(req)) => {
                assert_eq!(req.method, "ping");
                assert_eq!(req.id, RequestId::Number(1));
            }
            other => panic!("expected request, got {other:?}"),
        }
    }

    #[test]
    fn test_read_notification() {
        let mut transport =
            transport_reading("{\"jsonrpc\":\"2.0\",\"method\":\"initialized\"}\n");

        match transport.read_message().unwrap() {
            Some(IncomingMessage::Notification(notif)) => {
                assert_eq!(notif.method, "initialized");
            }
            other => panic!("expected notification, got {other:?}"),
        }
    }

    #[test]
    fn test_read_eof() {
        let mut transport = transport_reading("");
        assert!(transport.read_message().unwrap().is_none());
    }

    #[test]
    fn test_read_garbage_errors() {
        let mut transport = transport_reading("not json\n");
        assert!(transport.read_message().is_err());
    }

    #[test]
    fn test_write_response() {
        use std::sync::{Arc, Mutex};

        struct SharedWriter(Arc<Mutex<Vec<u8>>>);
        impl Write for SharedWriter {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let buffer = Arc::new(Mutex::new(Vec::new()));
        let mut transport = StdioTransport::new(
            Box::new(Cursor::new(Vec::new())),
            Box::new(SharedWriter(buffer.clone())),
        );

        let response =
            JsonRpcResponse::success(RequestId::Number(1), serde_json::json!({"ok": true}));
        transport.write_response(&response).unwrap();

        let output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(output.contains("\"jsonrpc\":\"2.0\""));
        assert!(output.ends_with('\n'));
    }
}
