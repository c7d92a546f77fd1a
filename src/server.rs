use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::adapters::Registry;
use crate::handlers;
use crate::protocol::{JsonRpcRequest, JsonRpcResponse};

/// Maximum bytes per JSON-RPC message (1 MiB).
const MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// MCP server that communicates over stdio using newline-delimited JSON-RPC 2.0.
///
/// Requests are handled strictly one at a time; a tool call (and its remote
/// command) finishes before the next line is read.
pub struct McpServer {
    registry: Registry,
}

impl McpServer {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub async fn run(&self) -> std::io::Result<()> {
        let reader = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        self.serve(reader, &mut stdout).await
    }

    /// Read requests from `reader` until end of input, writing one response
    /// line per answered request to `writer`.
    ///
    /// Lines that are not JSON objects are logged and skipped without a
    /// response. Any object is a request, whatever its `jsonrpc` or
    /// `method` fields hold. Only I/O failures on the streams themselves end the loop early.
    pub async fn serve<R, W>(&self, mut reader: R, writer: &mut W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut raw = Vec::new();

        loop {
            raw.clear();
            let n = reader.read_until(b'\n', &mut raw).await?;
            if n == 0 {
                debug!("end of input");
                break;
            }

            if n > MAX_MESSAGE_BYTES {
                warn!("skipping message of {n} bytes (limit {MAX_MESSAGE_BYTES})");
                continue;
            }

            let Some(req) = parse_line(&raw) else {
                continue;
            };

            if let Some(resp) = handlers::dispatch(&req, &self.registry).await {
                write_response(writer, &resp).await?;
            }
        }

        Ok(())
    }
}

/// Decode one input line. `None` for blank, malformed or non-object input.
fn parse_line(raw: &[u8]) -> Option<JsonRpcRequest> {
    let text = match std::str::from_utf8(raw) {
        Ok(s) => s.trim(),
        Err(e) => {
            warn!("skipping non-UTF-8 line: {e}");
            return None;
        }
    };

    if text.is_empty() {
        return None;
    }

    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!("parse error: {e}");
            return None;
        }
    };

    if !value.is_object() {
        warn!("skipping non-object message");
        return None;
    }

    match serde_json::from_value(value) {
        Ok(req) => Some(req),
        Err(e) => {
            warn!("invalid request envelope: {e}");
            None
        }
    }
}

async fn write_response<W>(writer: &mut W, resp: &JsonRpcResponse) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let out = serde_json::to_string(resp)?;
    writer.write_all(out.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
