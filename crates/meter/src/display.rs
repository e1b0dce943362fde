use cfm_config::{DisplayConfig, DisplayMode};
use cfm_core::StatsSnapshot;

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Renders statistics snapshots as single output lines.
#[derive(Debug, Clone)]
pub struct Display {
    config: DisplayConfig,
}

impl Display {
    pub fn new(config: DisplayConfig) -> Self {
        Self { config }
    }

    pub fn set_config(&mut self, config: DisplayConfig) {
        self.config = config;
    }

    /// One line for `snap`, without a trailing newline.
    pub fn render(&self, snap: &StatsSnapshot) -> serde_json::Result<String> {
        match self.config.mode {
            DisplayMode::Json => serde_json::to_string(snap),
            DisplayMode::Text => Ok(self.render_text(snap)),
        }
    }

    fn render_text(&self, snap: &StatsSnapshot) -> String {
        let p = self.config.precision;
        let mut line = format!(
            "{:>8.p$} CFM  avg {:.p$}  min {:.p$}  max {:.p$}  [n={}]",
            snap.current,
            snap.average,
            snap.minimum,
            snap.maximum,
            snap.history.len(),
        );
        if self.config.sparkline && !snap.history.is_empty() {
            line.push_str("  ");
            line.push_str(&sparkline(snap, self.config.sparkline_width));
        }
        line
    }
}

/// Block-glyph sparkline of the newest `width` samples, scaled to the
/// window's min/max.
pub fn sparkline(snap: &StatsSnapshot, width: usize) -> String {
    let skip = snap.history.len().saturating_sub(width);
    snap.history[skip..]
        .iter()
        .map(|&v| {
            let idx = (snap.normalized(v) * (BARS.len() - 1) as f64).round() as usize;
            BARS[idx.min(BARS.len() - 1)]
        })
        .collect()
}
