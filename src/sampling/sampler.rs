// Sampler - fixed-window voltage averaging
//
// A window always contains at least one reading: the first conversion is
// taken before the deadline is checked. Each reading may itself be the mean
// of several raw conversions (oversampling).

use std::time::Duration;

use crate::clock::Clock;
use crate::config::SamplingConfig;
use crate::error::{log_sensor_error, SensorError};
use crate::sampling::stats::{RunningStats, VoltageStats};
use crate::sampling::VoltageSource;

/// Validated sampling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPlan {
    pub window: Duration,
    pub interval: Duration,
    pub oversample: u16,
    pub oversample_delay: Duration,
}

/// Longest accepted averaging window
pub const MAX_WINDOW: Duration = Duration::from_secs(24 * 3600);

impl SamplingPlan {
    pub fn from_config(config: &SamplingConfig) -> Result<Self, SensorError> {
        if config.oversample == 0 {
            return Err(SensorError::InvalidSampling {
                reason: "oversample must be at least 1".to_string(),
            });
        }
        if config.window() > MAX_WINDOW {
            return Err(SensorError::InvalidSampling {
                reason: format!(
                    "window of {} ms exceeds the {} s limit",
                    config.window_ms,
                    MAX_WINDOW.as_secs()
                ),
            });
        }
        Ok(Self {
            window: config.window(),
            interval: config.interval(),
            oversample: config.oversample,
            oversample_delay: config.oversample_delay(),
        })
    }
}

/// Collects readings from a [`VoltageSource`] over a [`SamplingPlan`]
pub struct Sampler<'a, C: Clock + ?Sized> {
    clock: &'a C,
    plan: SamplingPlan,
}

impl<'a, C: Clock + ?Sized> Sampler<'a, C> {
    pub fn new(clock: &'a C, plan: SamplingPlan) -> Self {
        Self { clock, plan }
    }

    pub fn plan(&self) -> &SamplingPlan {
        &self.plan
    }

    /// One voltage reading: the mean of `oversample` raw conversions
    pub fn read_averaged<S: VoltageSource + ?Sized>(
        &self,
        source: &mut S,
    ) -> Result<f64, SensorError> {
        let mut total = 0.0;
        for _ in 0..self.plan.oversample {
            let volts = source.read_voltage()?;
            if !volts.is_finite() {
                return Err(SensorError::InvalidData {
                    details: format!("{} returned {}", source.describe(), volts),
                });
            }
            total += volts;
            self.clock.sleep(self.plan.oversample_delay);
        }
        Ok(total / self.plan.oversample as f64)
    }

    /// Sample for the whole window and summarise
    ///
    /// # Errors
    /// The first failed conversion aborts the window.
    pub fn sample_window<S: VoltageSource + ?Sized>(
        &self,
        source: &mut S,
    ) -> Result<VoltageStats, SensorError> {
        let deadline = self
            .clock
            .now()
            .checked_add(self.plan.window)
            .ok_or_else(|| SensorError::InvalidSampling {
                reason: format!("window {:?} overflows the clock", self.plan.window),
            })?;
        let mut stats = RunningStats::new();

        loop {
            let reading = self.read_averaged(source).inspect_err(|err| {
                log_sensor_error(err, "sample_window");
            })?;
            stats.push(reading);

            let now = self.clock.now();
            if now >= deadline {
                break;
            }
            self.clock.sleep(self.plan.interval.min(deadline - now));
            if self.clock.now() >= deadline {
                break;
            }
        }

        let summary = stats.summary().ok_or_else(|| SensorError::InvalidData {
            details: "sampling window produced no readings".to_string(),
        })?;

        tracing::debug!(
            "[Sampler] {} readings from {}: mean {:.4} V, std dev {:.2} mV",
            summary.count,
            source.describe(),
            summary.mean,
            summary.std_dev * 1000.0
        );

        Ok(summary)
    }
}
