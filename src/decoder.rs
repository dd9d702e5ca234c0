//! Incremental decoding of a streamed job log into lines.
//!
//! The trigger endpoint streams UTF-8 text in arbitrarily sized chunks.
//! A chunk boundary may fall inside a multi-byte character or in the middle
//! of a line, so [`LineDecoder`] carries two pieces of state between pulls:
//!
//! - `pending`: bytes of a not-yet-complete UTF-8 sequence
//! - `partial`: decoded text after the last line break
//!
//! Lines are split on `\n` and `\r`; empty and whitespace-only entries are
//! dropped. Invalid byte sequences decode to U+FFFD.

#[derive(Debug, Default)]
pub struct LineDecoder {
    pending: Vec<u8>,
    partial: String,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every line it completed, in order.
    ///
    /// # Arguments
    ///
    /// * `chunk` - Raw bytes as delivered by the transport; may end inside a
    ///   character or a line
    ///
    /// # Returns
    ///
    /// The non-blank lines terminated by this chunk, without their line
    /// breaks. Text after the last break is held for the next call.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let text = self.decode_pending(false);
        self.partial.push_str(&text);
        self.take_complete_lines()
    }

    /// Flush at end of stream: a dangling partial sequence becomes U+FFFD and
    /// an unterminated last line is emitted.
    ///
    /// Also called when the stream breaks off, so text that was received
    /// before the failure is not lost.
    ///
    /// # Returns
    ///
    /// Whatever lines remained buffered; empty when the stream ended on a
    /// line break.
    pub fn finish(&mut self) -> Vec<String> {
        let text = self.decode_pending(true);
        self.partial.push_str(&text);

        let mut lines = self.take_complete_lines();
        let rest = std::mem::take(&mut self.partial);
        if !is_blank(&rest) {
            lines.push(rest);
        }
        lines
    }

    fn decode_pending(&mut self, flush: bool) -> String {
        let mut out = String::new();
        let mut consumed = 0;

        loop {
            let rest = &self.pending[consumed..];
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    consumed = self.pending.len();
                    break;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    if let Ok(valid) = std::str::from_utf8(&rest[..valid_up_to]) {
                        out.push_str(valid);
                    }
                    consumed += valid_up_to;

                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            consumed += bad;
                        }
                        // Incomplete sequence at the tail: wait for more bytes.
                        None => {
                            if flush {
                                out.push(char::REPLACEMENT_CHARACTER);
                                consumed = self.pending.len();
                            }
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..consumed);
        out
    }

    fn take_complete_lines(&mut self) -> Vec<String> {
        let Some(split_at) = self.partial.rfind(is_line_break) else {
            return Vec::new();
        };
        // Line breaks are single-byte, so `split_at + 1` is a char boundary.
        let complete: String = self.partial.drain(..split_at + 1).collect();

        complete
            .split(is_line_break)
            .filter(|line| !is_blank(line))
            .map(str::to_owned)
            .collect()
    }
}

fn is_line_break(c: char) -> bool {
    c == '\n' || c == '\r'
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(chunks: &[&[u8]]) -> Vec<String> {
        let mut decoder = LineDecoder::new();
        let mut lines = Vec::new();
        for chunk in chunks {
            lines.extend(decoder.push_chunk(chunk));
        }
        lines.extend(decoder.finish());
        lines
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push_chunk(b"Found 5 ite").is_empty());
        assert_eq!(decoder.push_chunk(b"ms\n"), vec!["Found 5 items"]);
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_blank_segments_dropped() {
        assert_eq!(decode_all(&[b"a\n\n\nb\n"]), vec!["a", "b"]);
        assert_eq!(decode_all(&[b"   \n\t\nc\n  \n"]), vec!["c"]);
    }

    #[test]
    fn test_crlf_breaks() {
        assert_eq!(
            decode_all(&[b"Saved post A\r", b"\nSaved post B\r\n"]),
            vec!["Saved post A", "Saved post B"]
        );
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        let text = "Café ✓ done 🚀\n";
        let bytes = text.as_bytes();
        // Split in the middle of the four-byte rocket.
        let cut = bytes.len() - 3;
        assert_eq!(
            decode_all(&[&bytes[..cut], &bytes[cut..]]),
            vec!["Café ✓ done 🚀"]
        );
    }

    #[test]
    fn test_every_split_point_gives_same_lines() {
        let text = "Found 3 items\nSaved «Première»\n\n  \nError: 東京 timeout\nlast";
        let expected = vec![
            "Found 3 items",
            "Saved «Première»",
            "Error: 東京 timeout",
            "last",
        ];
        let bytes = text.as_bytes();
        for a in 0..=bytes.len() {
            for b in a..=bytes.len() {
                let lines = decode_all(&[&bytes[..a], &bytes[a..b], &bytes[b..]]);
                assert_eq!(lines, expected, "split at {a}/{b}");
            }
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let text = "ünïcödé\nline two\n";
        let chunks: Vec<&[u8]> = text.as_bytes().chunks(1).collect();
        assert_eq!(decode_all(&chunks), vec!["ünïcödé", "line two"]);
    }

    #[test]
    fn test_invalid_bytes_replaced() {
        assert_eq!(decode_all(&[b"bad \xff byte\n"]), vec!["bad \u{FFFD} byte"]);
    }

    #[test]
    fn test_truncated_sequence_flushed_as_replacement() {
        // First two bytes of a three-byte sequence, then end of stream.
        assert_eq!(decode_all(&[b"tail \xe2\x9c"]), vec!["tail \u{FFFD}"]);
    }

    #[test]
    fn test_unterminated_last_line_emitted_on_finish() {
        let mut decoder = LineDecoder::new();
        assert_eq!(decoder.push_chunk(b"one\ntwo"), vec!["one"]);
        assert_eq!(decoder.finish(), vec!["two"]);
    }

    #[test]
    fn test_lines_kept_verbatim() {
        assert_eq!(decode_all(&[b"  indented\t\n"]), vec!["  indented\t"]);
    }
}
