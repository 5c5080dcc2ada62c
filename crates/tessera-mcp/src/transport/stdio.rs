//! Newline-delimited JSON transport
//!
//! Each message is one line of JSON. The transport is generic over the
//! reader and writer so the serve loop can run against in-memory pipes.

use std::io;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::trace;

pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
}

/// Transport over the process's stdin and stdout
pub type StdioTransport = LineTransport<BufReader<tokio::io::Stdin>, tokio::io::Stdout>;

impl StdioTransport {
    pub fn stdio() -> Self {
        LineTransport::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Next non-blank line, or `None` at end of input
    pub async fn read_message(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line).await? == 0 {
                return Ok(None);
            }

            let trimmed = line.trim();
            if !trimmed.is_empty() {
                trace!(len = trimmed.len(), "Received message");
                return Ok(Some(trimmed.to_string()));
            }
        }
    }

    pub async fn write_message(&mut self, message: &str) -> io::Result<()> {
        trace!(len = message.len(), "Sending message");
        self.writer.write_all(message.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    /// Serialize and write one message
    pub async fn write_json<T: Serialize>(&mut self, message: &T) -> io::Result<()> {
        let json = serde_json::to_string(message)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.write_message(&json).await
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_skips_blank_lines() {
        let input: &[u8] = b"\n  \n{\"a\":1}\n\n{\"b\":2}";
        let mut transport = LineTransport::new(input, Vec::new());

        assert_eq!(transport.read_message().await.unwrap().as_deref(), Some("{\"a\":1}"));
        assert_eq!(transport.read_message().await.unwrap().as_deref(), Some("{\"b\":2}"));
        assert_eq!(transport.read_message().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_writes_one_line_per_message() {
        let mut transport = LineTransport::new(&b""[..], Vec::new());
        transport.write_json(&json!({ "id": 1 })).await.unwrap();
        transport.write_message("{}").await.unwrap();

        let (_, written) = transport.into_inner();
        assert_eq!(String::from_utf8(written).unwrap(), "{\"id\":1}\n{}\n");
    }
}
