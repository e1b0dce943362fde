use thiserror::Error;

/// Line delimiter of the sensor wire format.
pub const DELIMITER: u8 = b'\n';

/// Longest line (delimiter excluded) accepted before the assembler gives up on it.
pub const DEFAULT_MAX_LINE_LEN: usize = 256;

/// A complete line that could not be turned into text.
///
/// Both variants are non-fatal: the offending line is dropped and the
/// assembler carries on with the next one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("line is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },

    #[error("line longer than {limit} bytes; skipped to the next delimiter")]
    TooLong { limit: usize },
}

/// Reassembles newline-delimited text from arbitrarily split byte chunks.
///
/// Bytes are buffered raw and only decoded once a whole line is available,
/// so a UTF-8 sequence split across two chunks decodes the same as an
/// unsplit one. The output of a run of [`feed`](Self::feed) calls depends
/// only on the concatenated input, never on where the chunks were cut.
#[derive(Debug, Clone)]
pub struct LineAssembler {
    /// Bytes received after the last delimiter.
    pending: Vec<u8>,
    max_line_len: usize,
    /// Set after an over-long line; input is dropped up to the next delimiter.
    skipping: bool,
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LEN)
    }
}

impl LineAssembler {
    pub fn new(max_line_len: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_line_len: max_line_len.max(1),
            skipping: false,
        }
    }

    /// Append `chunk` and return every line it completed, in arrival order.
    ///
    /// Delimiters are stripped. A trailing fragment without a delimiter is
    /// kept for the next call and never returned on its own.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<String, DecodeError>> {
        let mut lines = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|&b| b == DELIMITER) {
            let head = &rest[..pos];
            rest = &rest[pos + 1..];

            if self.skipping {
                // The over-long line was already reported when it overflowed.
                self.skipping = false;
                continue;
            }

            if self.pending.len() + head.len() > self.max_line_len {
                self.pending.clear();
                lines.push(Err(DecodeError::TooLong { limit: self.max_line_len }));
                continue;
            }

            self.pending.extend_from_slice(head);
            lines.push(decode(std::mem::take(&mut self.pending)));
        }

        if !self.skipping && !rest.is_empty() {
            self.pending.extend_from_slice(rest);
            if self.pending.len() > self.max_line_len {
                self.pending.clear();
                self.skipping = true;
                lines.push(Err(DecodeError::TooLong { limit: self.max_line_len }));
            }
        }

        lines
    }

    /// Number of buffered bytes still waiting for a delimiter.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop any partial line.  Returns how many bytes were discarded.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        self.skipping = false;
        dropped
    }
}

fn decode(bytes: Vec<u8>) -> Result<String, DecodeError> {
    String::from_utf8(bytes).map_err(|e| DecodeError::InvalidUtf8 {
        valid_up_to: e.utf8_error().valid_up_to(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_lines(results: Vec<Result<String, DecodeError>>) -> Vec<String> {
        results.into_iter().map(Result::unwrap).collect()
    }

    #[test]
    fn splits_complete_lines() {
        let mut asm = LineAssembler::default();
        let lines = ok_lines(asm.feed(b"FR:1\nFR:2\n"));
        assert_eq!(lines, vec!["FR:1", "FR:2"]);
        assert_eq!(asm.pending_len(), 0);
    }

    #[test]
    fn buffers_partial_line_until_delimiter() {
        let mut asm = LineAssembler::default();
        assert!(asm.feed(b"FR:1").is_empty());
        assert!(asm.feed(b"2.").is_empty());
        assert_eq!(asm.pending_len(), 6);
        assert_eq!(ok_lines(asm.feed(b"5\nFR")), vec!["FR:12.5"]);
        assert_eq!(asm.pending_len(), 2);
    }

    #[test]
    fn empty_lines_are_emitted() {
        let mut asm = LineAssembler::default();
        assert_eq!(ok_lines(asm.feed(b"\n\n")), vec!["", ""]);
    }

    #[test]
    fn empty_chunk_is_a_no_op() {
        let mut asm = LineAssembler::default();
        asm.feed(b"FR");
        assert!(asm.feed(b"").is_empty());
        assert_eq!(asm.pending_len(), 2);
    }

    #[test]
    fn multibyte_char_split_across_chunks() {
        let text = "µ:1\n".as_bytes();
        let mut asm = LineAssembler::default();
        assert!(asm.feed(&text[..1]).is_empty());
        assert_eq!(ok_lines(asm.feed(&text[1..])), vec!["µ:1"]);
    }

    #[test]
    fn invalid_utf8_line_is_dropped_alone() {
        let mut asm = LineAssembler::default();
        let out = asm.feed(b"FR:1\nFR:\xff2\nFR:3\n");
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].as_deref(), Ok("FR:1"));
        assert_eq!(out[1], Err(DecodeError::InvalidUtf8 { valid_up_to: 3 }));
        assert_eq!(out[2].as_deref(), Ok("FR:3"));
    }

    #[test]
    fn overlong_partial_is_dropped_and_resyncs() {
        let mut asm = LineAssembler::new(8);
        let out = asm.feed(b"0123456789");
        assert_eq!(out, vec![Err(DecodeError::TooLong { limit: 8 })]);
        assert_eq!(asm.pending_len(), 0);
        // Tail of the long line is swallowed, the next line comes through.
        assert_eq!(ok_lines(asm.feed(b"abc\nFR:1\n")), vec!["FR:1"]);
    }

    #[test]
    fn overlong_complete_line_reports_once() {
        let mut asm = LineAssembler::new(4);
        let out = asm.feed(b"FR:123456\nFR:1\n");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], Err(DecodeError::TooLong { limit: 4 }));
        assert_eq!(out[1].as_deref(), Ok("FR:1"));
    }

    #[test]
    fn line_at_exact_limit_is_accepted() {
        let mut asm = LineAssembler::new(4);
        assert_eq!(ok_lines(asm.feed(b"FR:1\n")), vec!["FR:1"]);
    }

    #[test]
    fn clear_discards_partial() {
        let mut asm = LineAssembler::default();
        asm.feed(b"FR:9");
        assert_eq!(asm.clear(), 4);
        assert_eq!(ok_lines(asm.feed(b"\nFR:1\n")), vec!["", "FR:1"]);
    }
}
