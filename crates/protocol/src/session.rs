use crate::assembler::LineAssembler;
use crate::sample::{LineCounters, SampleStream};
use cfm_core::{MeterError, Result, Sample};
use cfm_stats::StatsWindow;
use tracing::{debug, warn};

/// Per-connection parsing state.
///
/// A session owns its [`LineAssembler`] and [`SampleStream`]; the
/// [`StatsWindow`] is borrowed on every call because it outlives sessions.
/// Once [`end`](Self::end) has run, the partial line is gone and further
/// [`feed`](Self::feed) calls are rejected.
#[derive(Debug)]
pub struct Session {
    label:     String,
    assembler: LineAssembler,
    stream:    SampleStream,
    decode_errors: u64,
    ended:     bool,
}

impl Session {
    /// Start a session for the peer described by `label`.
    pub fn new(label: impl Into<String>, max_line_len: usize) -> Self {
        Self {
            label:     label.into(),
            assembler: LineAssembler::new(max_line_len),
            stream:    SampleStream::new(),
            decode_errors: 0,
            ended:     false,
        }
    }

    /// Run one transport chunk through the assembler and parser.
    ///
    /// Returns the samples it produced (already pushed into `window`), in
    /// arrival order.  Undecodable lines are logged and skipped.
    pub fn feed(&mut self, chunk: &[u8], window: &mut StatsWindow) -> Result<Vec<Sample>> {
        if self.ended {
            return Err(MeterError::SessionClosed);
        }

        let mut samples = Vec::new();
        for line in self.assembler.feed(chunk) {
            match line {
                Ok(line) => samples.extend(self.stream.ingest(&line, window)),
                Err(e) => {
                    self.decode_errors += 1;
                    warn!(session = %self.label, "dropping line: {e}");
                }
            }
        }
        Ok(samples)
    }

    /// Close the session, discarding any unterminated line.
    ///
    /// Returns the number of bytes thrown away.  Calling it again is a no-op.
    pub fn end(&mut self) -> usize {
        if self.ended {
            return 0;
        }
        self.ended = true;

        let dropped = self.assembler.clear();
        let c = self.stream.counters();
        debug!(
            session = %self.label,
            accepted = c.accepted,
            unrecognized = c.unrecognized,
            malformed = c.malformed,
            decode_errors = self.decode_errors,
            dropped_bytes = dropped,
            "session ended"
        );
        dropped
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn counters(&self) -> LineCounters {
        self.stream.counters()
    }

    /// Lines dropped because they were not valid UTF-8 or too long.
    pub fn decode_errors(&self) -> u64 {
        self.decode_errors
    }
}
