use futures::{Stream, StreamExt};
use std::pin::Pin;

use super::buffering::PendingBuffer;
use super::decoder::Utf8Decoder;
use crate::error::{ChatError, Result};

pub const FRAME_MARKER: &str = "data:";

pub type PayloadStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Extract the payload of one complete line, if the line is a data frame.
///
/// Blank lines, other SSE fields and empty (keep-alive) frames yield `None`.
pub fn parse_frame_line(line: &str) -> Option<String> {
    let data = line.trim().strip_prefix(FRAME_MARKER)?.trim();
    if data.is_empty() {
        return None;
    }
    Some(decode_payload(data))
}

/// Unescape a JSON string literal payload, falling back to the raw text.
pub fn decode_payload(raw: &str) -> String {
    if !raw.starts_with('"') {
        return raw.to_string();
    }

    match serde_json::from_str::<String>(raw) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::debug!(error = %e, "Quoted payload is not valid JSON, keeping raw text");
            raw.to_string()
        }
    }
}

/// Turn a body byte stream into a stream of payloads.
///
/// One chunk is read at a time and all of its frames are yielded before the
/// next read. A read error is yielded once and ends the stream; the byte
/// source is dropped with the generator on every exit path.
pub fn parse_payload_stream<S, B, E>(bytes: S) -> PayloadStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(bytes);
        let mut decoder = Utf8Decoder::new();
        let mut buffer = PendingBuffer::new();

        while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(chunk) => {
                    let text = decoder.decode(chunk.as_ref());
                    for payload in buffer.feed(&text) {
                        yield Ok(payload);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Response stream failed mid-read");
                    yield Err(ChatError::Read(e.to_string()));
                    return;
                }
            }
        }

        let tail = decoder.finish();
        for payload in buffer.feed(&tail) {
            yield Ok(payload);
        }
        for payload in buffer.finish() {
            yield Ok(payload);
        }
    })
}
