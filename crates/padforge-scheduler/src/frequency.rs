//! Moving-average frequency measurement.

use std::time::Duration;

/// Number of periods in the averaging window.
const WINDOW: usize = 1_000;

/// Ring buffer of recent cycle periods with an incrementally maintained
/// sum, so recording is O(1) in the pipeline hot path.
#[derive(Debug, Clone)]
pub struct FrequencyMeter {
    periods_ns: Vec<u64>,
    next_index: usize,
    filled: usize,
    sum_ns: u64,
}

impl Default for FrequencyMeter {
    fn default() -> Self {
        Self {
            periods_ns: vec![0; WINDOW],
            next_index: 0,
            filled: 0,
            sum_ns: 0,
        }
    }
}

impl FrequencyMeter {
    /// An empty meter over the default ~1000-cycle window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observed period.
    pub fn record(&mut self, period: Duration) {
        let ns = period.as_nanos().min(u128::from(u64::MAX)) as u64;
        self.sum_ns = self.sum_ns - self.periods_ns[self.next_index] + ns;
        self.periods_ns[self.next_index] = ns;
        self.next_index = (self.next_index + 1) % WINDOW;
        self.filled = (self.filled + 1).min(WINDOW);
    }

    /// Average frequency over the window, `None` until at least a few
    /// samples have landed.
    pub fn measured_hz(&self) -> Option<f64> {
        if self.filled < 2 || self.sum_ns == 0 {
            return None;
        }
        Some(self.filled as f64 * 1e9 / self.sum_ns as f64)
    }

    /// Number of samples currently in the window.
    pub fn samples(&self) -> usize {
        self.filled
    }
}
