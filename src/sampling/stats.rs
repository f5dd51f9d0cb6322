// Window statistics for voltage readings
//
// RunningStats accumulates readings with Welford's update so a window of
// any length is summarised in constant memory. VoltageStats is the finished
// summary reported for a window.

use serde::{Deserialize, Serialize};

/// Summary of one sampling window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoltageStats {
    /// Number of voltage readings in the window
    pub count: usize,
    /// Arithmetic mean (V)
    pub mean: f64,
    /// Sample standard deviation (V); 0 for a single reading
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl VoltageStats {
    /// Summarise a slice of readings; `None` when the slice is empty
    pub fn from_readings(readings: &[f64]) -> Option<Self> {
        let mut stats = RunningStats::new();
        readings.iter().for_each(|&v| stats.push(v));
        stats.summary()
    }
}

/// Streaming mean / variance accumulator
#[derive(Debug, Clone)]
pub struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Sample (n - 1) standard deviation; 0 for one reading
    pub fn std_dev(&self) -> Option<f64> {
        match self.count {
            0 => None,
            1 => Some(0.0),
            n => Some((self.m2.max(0.0) / (n - 1) as f64).sqrt()),
        }
    }

    pub fn summary(&self) -> Option<VoltageStats> {
        Some(VoltageStats {
            count: self.count,
            mean: self.mean()?,
            std_dev: self.std_dev()?,
            min: self.min,
            max: self.max,
        })
    }
}

impl Default for RunningStats {
    fn default() -> Self {
        Self::new()
    }
}
