use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A single validated flow reading, in CFM.
///
/// Only finite values can be constructed, so anything holding a `Sample`
/// can aggregate it without re-checking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Sample(f64);

impl Sample {
    /// Wrap `value`, rejecting NaN and ±infinity.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        value.is_finite().then_some(Self(value))
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<Sample> for f64 {
    fn from(sample: Sample) -> Self {
        sample.0
    }
}

/// A point-in-time copy of the statistics window — everything the display
/// layer needs to render one frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Most recent reading (survives a statistics reset).
    pub current: f64,
    /// Mean of `history` (0 when empty).
    pub average: f64,
    /// Smallest value in `history` (0 when empty).
    pub minimum: f64,
    /// Largest value in `history` (0 when empty).
    pub maximum: f64,
    /// Windowed samples, oldest first.
    pub history: Vec<f64>,
    /// Samples pushed since the last reset, evicted ones included.
    pub count: u64,
    /// When the snapshot was taken.
    pub taken_at: DateTime<Local>,
}

impl StatsSnapshot {
    /// Position of `value` between the window minimum and maximum, in `[0, 1]`.
    ///
    /// A flat (or empty) window maps everything to `0.5`.
    #[must_use]
    pub fn normalized(&self, value: f64) -> f64 {
        let span = self.maximum - self.minimum;
        if span <= f64::EPSILON {
            return 0.5;
        }
        ((value - self.minimum) / span).clamp(0.0, 1.0)
    }
}
