use super::sse_parser::parse_frame_line;

/// Split `buffer + incoming` into complete lines and a new pending tail.
///
/// The last segment after the final `\n` is always returned as the new buffer,
/// even when empty; it is never parsed as a frame here.
pub fn extract_frames(buffer: &str, incoming: &str) -> (Vec<String>, String) {
    if incoming.is_empty() {
        return (Vec::new(), buffer.to_string());
    }

    let mut combined = String::with_capacity(buffer.len() + incoming.len());
    combined.push_str(buffer);
    combined.push_str(incoming);

    let mut lines: Vec<&str> = combined.split('\n').collect();
    let pending = lines.pop().unwrap_or_default().to_string();

    let payloads = lines.into_iter().filter_map(parse_frame_line).collect();

    (payloads, pending)
}

/// Decoded text that has not yet been resolved into complete lines
///
/// Invariant: never holds a `\n`; every complete line has been extracted.
#[derive(Debug, Default, Clone)]
pub struct PendingBuffer {
    pending: String,
}

impl PendingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append decoded text and return payloads of every line it completes
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        if chunk.is_empty() {
            return Vec::new();
        }

        let (payloads, pending) = extract_frames(&self.pending, chunk);
        self.pending = pending;
        payloads
    }

    /// Flush the unterminated tail as a final frame, once, at stream close
    pub fn finish(&mut self) -> Vec<String> {
        let tail = std::mem::take(&mut self.pending);
        parse_frame_line(&tail).into_iter().collect()
    }

    pub fn as_str(&self) -> &str {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_line_held_back() {
        let mut buffer = PendingBuffer::new();

        assert_eq!(buffer.feed("data: hello\ndata: wor"), vec!["hello"]);
        assert_eq!(buffer.as_str(), "data: wor");

        assert_eq!(buffer.feed("ld\n"), vec!["world"]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_blank_separator_lines_ignored() {
        let (payloads, pending) = extract_frames("", "data: a\n\ndata: b\n");
        assert_eq!(payloads, vec!["a", "b"]);
        assert_eq!(pending, "");
    }

    #[test]
    fn test_empty_chunk_is_idempotent() {
        for state in ["", "data: partial", "  ", "event: x"] {
            let (payloads, pending) = extract_frames(state, "");
            assert!(payloads.is_empty());
            assert_eq!(pending, state);
        }

        let mut buffer = PendingBuffer::new();
        buffer.feed("data: half");
        assert!(buffer.feed("").is_empty());
        assert_eq!(buffer.as_str(), "data: half");
    }

    #[test]
    fn test_chunk_ending_on_newline_leaves_empty_buffer() {
        let (payloads, pending) = extract_frames("", "data: x\n");
        assert_eq!(payloads, vec!["x"]);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_non_frame_lines_produce_nothing() {
        let (payloads, _) = extract_frames("", "event: message\nid: 4\n: comment\nretry: 10\n");
        assert!(payloads.is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let (payloads, pending) = extract_frames("", "data: a\r\n\r\ndata: b\r\n");
        assert_eq!(payloads, vec!["a", "b"]);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_finish_flushes_unterminated_frame_once() {
        let mut buffer = PendingBuffer::new();
        assert!(buffer.feed("data: last").is_empty());

        assert_eq!(buffer.finish(), vec!["last"]);
        assert!(buffer.finish().is_empty());
    }

    #[test]
    fn test_finish_ignores_non_frame_tail() {
        let mut buffer = PendingBuffer::new();
        buffer.feed("data: a\nnoise");
        assert!(buffer.finish().is_empty());
    }

    #[test]
    fn test_order_preserved_without_coalescing() {
        let mut buffer = PendingBuffer::new();
        let mut all = Vec::new();
        for chunk in ["data: 1\nda", "ta: 2\ndata: 2\n", "data: 3"] {
            all.extend(buffer.feed(chunk));
        }
        all.extend(buffer.finish());

        assert_eq!(all, vec!["1", "2", "2", "3"]);
    }

    #[test]
    fn test_every_split_point_yields_same_payloads() {
        let stream = "data: \"a\\nb\"\n\ndata: plain\ndata:   \ndata: \"bad\nignored\ndata: end\n";
        let expected = vec!["a\nb", "plain", "\"bad", "end"];

        for split in 0..=stream.len() {
            let mut buffer = PendingBuffer::new();
            let mut got = buffer.feed(&stream[..split]);
            got.extend(buffer.feed(&stream[split..]));
            got.extend(buffer.finish());
            assert_eq!(got, expected, "split at {}", split);
        }
    }
}
