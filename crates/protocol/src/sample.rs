use cfm_core::Sample;
use cfm_stats::StatsWindow;

/// Tag that starts every flow-rate line, e.g. `FR:12.5`.
pub const PREFIX: &str = "FR:";

/// Why a line did not produce a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The line does not start with [`PREFIX`].
    Unrecognized,
    /// Right prefix, but the value is not a finite decimal number.
    Malformed,
}

/// Parse a raw line (delimiter already stripped) into a [`Sample`].
///
/// The prefix must match exactly.  Surrounding ASCII whitespace after it is
/// ignored so `\r\n`-terminated devices parse cleanly.
pub fn parse_sample(line: &str) -> Result<Sample, Rejection> {
    let Some(value) = line.strip_prefix(PREFIX) else {
        return Err(Rejection::Unrecognized);
    };

    value
        .trim_matches(|c: char| c.is_ascii_whitespace())
        .parse::<f64>()
        .ok()
        .and_then(Sample::new)
        .ok_or(Rejection::Malformed)
}

/// Tallies of what [`SampleStream`] did with the lines it saw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineCounters {
    pub accepted:     u64,
    pub unrecognized: u64,
    pub malformed:    u64,
}

/// Turns assembled lines into samples and pushes them into a [`StatsWindow`].
///
/// Unrecognized and malformed lines are dropped without touching the window.
#[derive(Debug, Clone, Default)]
pub struct SampleStream {
    counters: LineCounters,
}

impl SampleStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `line`; on success push the sample into `window` and return it.
    pub fn ingest(&mut self, line: &str, window: &mut StatsWindow) -> Option<Sample> {
        match parse_sample(line) {
            Ok(sample) => {
                self.counters.accepted += 1;
                window.push(sample);
                Some(sample)
            }
            Err(Rejection::Unrecognized) => {
                self.counters.unrecognized += 1;
                tracing::trace!(line, "ignoring unrecognized line");
                None
            }
            Err(Rejection::Malformed) => {
                self.counters.malformed += 1;
                tracing::trace!(line, "ignoring malformed line");
                None
            }
        }
    }

    pub fn counters(&self) -> LineCounters {
        self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_value() {
        assert_eq!(parse_sample("FR:12.5").map(Sample::value), Ok(12.5));
        assert_eq!(parse_sample("FR:-0.75").map(Sample::value), Ok(-0.75));
        assert_eq!(parse_sample("FR:3e2").map(Sample::value), Ok(300.0));
    }

    #[test]
    fn tolerates_carriage_return() {
        assert_eq!(parse_sample("FR:7.25\r").map(Sample::value), Ok(7.25));
        assert_eq!(parse_sample("FR: 7").map(Sample::value), Ok(7.0));
    }

    #[test]
    fn rejects_other_prefixes() {
        assert_eq!(parse_sample("XX:12.5"), Err(Rejection::Unrecognized));
        assert_eq!(parse_sample("fr:12.5"), Err(Rejection::Unrecognized));
        assert_eq!(parse_sample(" FR:12.5"), Err(Rejection::Unrecognized));
        assert_eq!(parse_sample(""), Err(Rejection::Unrecognized));
        assert_eq!(parse_sample("FR"), Err(Rejection::Unrecognized));
    }

    #[test]
    fn rejects_non_numeric_values() {
        assert_eq!(parse_sample("FR:abc"), Err(Rejection::Malformed));
        assert_eq!(parse_sample("FR:"), Err(Rejection::Malformed));
        assert_eq!(parse_sample("FR:12.5abc"), Err(Rejection::Malformed));
        assert_eq!(parse_sample("FR:1,5"), Err(Rejection::Malformed));
    }

    #[test]
    fn rejects_non_finite_values() {
        for text in ["FR:NaN", "FR:nan", "FR:inf", "FR:Infinity", "FR:-inf", "FR:1e999"] {
            assert_eq!(parse_sample(text), Err(Rejection::Malformed), "{text}");
        }
    }

    #[test]
    fn ingest_pushes_only_valid_samples() {
        let mut stream = SampleStream::new();
        let mut window = StatsWindow::default();

        assert_eq!(stream.ingest("FR:12.5", &mut window).map(Sample::value), Some(12.5));
        assert!(stream.ingest("FR:abc", &mut window).is_none());
        assert!(stream.ingest("XX:12.5", &mut window).is_none());
        assert!(stream.ingest("", &mut window).is_none());

        assert_eq!(window.history(), vec![12.5]);
        assert_eq!(
            stream.counters(),
            LineCounters { accepted: 1, unrecognized: 2, malformed: 1 }
        );
    }

    #[test]
    fn rejected_line_leaves_window_untouched() {
        let mut stream = SampleStream::new();
        let mut window = StatsWindow::default();
        stream.ingest("FR:4", &mut window);
        stream.ingest("FR:NaN", &mut window);
        assert_eq!(window.current(), 4.0);
        assert_eq!(window.average(), 4.0);
        assert_eq!(window.len(), 1);
    }
}
