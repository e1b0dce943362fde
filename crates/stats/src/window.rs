use cfm_core::{MeterError, Result, Sample, StatsSnapshot};
use chrono::Local;
use std::collections::VecDeque;

/// Default number of samples kept for aggregates and the sparkline.
pub const DEFAULT_CAPACITY: usize = 50;

/// Rolling window of flow samples with eagerly maintained aggregates.
///
/// `history` is a FIFO ring: once `capacity` samples are held, every push
/// evicts the oldest one. `average`, `minimum` and `maximum` are recomputed
/// inside [`push`](Self::push), so reading them right after a push always
/// reflects the exact window contents.
///
/// Extremes are tracked with monotonic deques keyed by sequence number: the
/// front of `max_candidates` is always the largest value still in the
/// window, and it is dropped the moment its sample is evicted.
#[derive(Debug, Clone)]
pub struct StatsWindow {
    history:  VecDeque<f64>,
    capacity: usize,
    /// Sequence number the next pushed sample receives.
    next_seq: u64,
    max_candidates: VecDeque<(u64, f64)>,
    min_candidates: VecDeque<(u64, f64)>,
    current: f64,
    average: f64,
    total:   u64,
}

impl Default for StatsWindow {
    fn default() -> Self {
        Self::with_capacity_unchecked(DEFAULT_CAPACITY)
    }
}

impl StatsWindow {
    /// Create an empty window holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(MeterError::Config("stats window capacity must be at least 1".into()));
        }
        Ok(Self::with_capacity_unchecked(capacity))
    }

    fn with_capacity_unchecked(capacity: usize) -> Self {
        Self {
            history:  VecDeque::with_capacity(capacity),
            capacity,
            next_seq: 0,
            max_candidates: VecDeque::new(),
            min_candidates: VecDeque::new(),
            current: 0.0,
            average: 0.0,
            total:   0,
        }
    }

    /// Push a new sample, evicting the oldest if at capacity.
    pub fn push(&mut self, sample: Sample) {
        let value = sample.value();

        if self.history.len() == self.capacity {
            self.evict_oldest();
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.history.push_back(value);

        while self.max_candidates.back().is_some_and(|&(_, v)| v <= value) {
            self.max_candidates.pop_back();
        }
        self.max_candidates.push_back((seq, value));

        while self.min_candidates.back().is_some_and(|&(_, v)| v >= value) {
            self.min_candidates.pop_back();
        }
        self.min_candidates.push_back((seq, value));

        self.current = value;
        self.total += 1;
        self.recompute_average();
    }

    /// Clear the window.  The live reading in [`current`](Self::current) is kept.
    pub fn reset(&mut self) {
        self.history.clear();
        self.max_candidates.clear();
        self.min_candidates.clear();
        self.average = 0.0;
        self.total = 0;
        tracing::debug!("statistics window cleared");
    }

    /// Resize the window, evicting the oldest samples when shrinking.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        if capacity == 0 {
            return Err(MeterError::Config("stats window capacity must be at least 1".into()));
        }
        if capacity == self.capacity {
            return Ok(());
        }

        let evicted = self.history.len().saturating_sub(capacity);
        for _ in 0..evicted {
            self.evict_oldest();
        }
        self.capacity = capacity;
        self.recompute_average();

        tracing::debug!(capacity, evicted, "statistics window resized");
        Ok(())
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    /// Most recently pushed value, or 0 before the first push.
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Arithmetic mean of the window (0 when empty).
    pub fn average(&self) -> f64 {
        self.average
    }

    /// Largest value in the window (0 when empty).
    pub fn maximum(&self) -> f64 {
        self.max_candidates.front().map_or(0.0, |&(_, v)| v)
    }

    /// Smallest value in the window (0 when empty).
    pub fn minimum(&self) -> f64 {
        self.min_candidates.front().map_or(0.0, |&(_, v)| v)
    }

    /// Windowed samples, oldest first.
    pub fn history(&self) -> Vec<f64> {
        self.history.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples pushed since the last reset, including evicted ones.
    pub fn total_pushed(&self) -> u64 {
        self.total
    }

    /// Copy the current state out for rendering.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            current:  self.current,
            average:  self.average,
            minimum:  self.minimum(),
            maximum:  self.maximum(),
            history:  self.history(),
            count:    self.total,
            taken_at: Local::now(),
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn evict_oldest(&mut self) {
        if self.history.pop_front().is_none() {
            return;
        }
        // Sequence number of the sample that just left the window.
        let evicted = self.next_seq - self.history.len() as u64 - 1;
        if self.max_candidates.front().is_some_and(|&(s, _)| s == evicted) {
            self.max_candidates.pop_front();
        }
        if self.min_candidates.front().is_some_and(|&(s, _)| s == evicted) {
            self.min_candidates.pop_front();
        }
    }

    /// Summed from scratch so float error never accumulates across evictions.
    fn recompute_average(&mut self) {
        self.average = if self.history.is_empty() {
            0.0
        } else {
            self.history.iter().sum::<f64>() / self.history.len() as f64
        };
    }
}
