/// Incremental UTF-8 decoder for chunked byte streams
///
/// A multi-byte character split across chunks is held back until the rest of
/// its bytes arrive. Invalid sequences decode to U+FFFD instead of failing.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    incomplete: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `bytes` (after any carried-over prefix) as possible
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.incomplete.extend_from_slice(bytes);

        let mut out = String::with_capacity(self.incomplete.len());
        let mut consumed = 0;

        while consumed < self.incomplete.len() {
            match std::str::from_utf8(&self.incomplete[consumed..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    consumed = self.incomplete.len();
                }
                Err(e) => {
                    let valid_end = consumed + e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.incomplete[consumed..valid_end]));

                    match e.error_len() {
                        Some(invalid_len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            consumed = valid_end + invalid_len;
                        }
                        // truncated sequence at the end: wait for more bytes
                        None => {
                            consumed = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.incomplete.drain(..consumed);
        out
    }

    /// Flush bytes still held at end of stream
    pub fn finish(&mut self) -> String {
        if self.incomplete.is_empty() {
            return String::new();
        }
        let tail = std::mem::take(&mut self.incomplete);
        String::from_utf8_lossy(&tail).into_owned()
    }

    pub fn has_pending(&self) -> bool {
        !self.incomplete.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"data: hi\n"), "data: hi\n");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn test_split_character_carried_over() {
        let bytes = "é€😀".as_bytes();
        let mut decoder = Utf8Decoder::new();
        let mut out = String::new();

        for byte in bytes {
            out.push_str(&decoder.decode(std::slice::from_ref(byte)));
        }
        out.push_str(&decoder.finish());

        assert_eq!(out, "é€😀");
    }

    #[test]
    fn test_invalid_byte_replaced() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_truncated_tail_flushed_as_replacement() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&[b'x', 0xE4, 0xBD]), "x");
        assert!(decoder.has_pending());
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.finish(), "");
    }
}
