// Sampling module - probe voltage acquisition and noise-reduction averaging
//
// This module provides three layers:
// 1. VoltageSource: one blocking voltage conversion from some ADC backend
// 2. Sampler: repeated conversions over a fixed window
// 3. RunningStats / VoltageStats: mean and standard deviation of a window
//
// Backends: Linux IIO sysfs channels, embedded-hal one-shot ADCs, and a
// simulated probe for bench runs.

pub mod iio;
pub mod one_shot;
pub mod sampler;
pub mod simulated;
pub mod stats;

pub use iio::IioVoltageSource;
pub use one_shot::OneShotVoltageSource;
pub use sampler::{Sampler, SamplingPlan};
pub use simulated::SimulatedVoltageSource;
pub use stats::{RunningStats, VoltageStats};

use crate::error::SensorError;

/// Port for reading the probe voltage
///
/// Implementations perform a single blocking conversion and return volts.
/// A failed conversion must be reported as an error, never replaced by a
/// default value.
pub trait VoltageSource {
    fn read_voltage(&mut self) -> Result<f64, SensorError>;

    /// Short description for log lines
    fn describe(&self) -> String {
        "voltage source".to_string()
    }
}

impl<T: VoltageSource + ?Sized> VoltageSource for Box<T> {
    fn read_voltage(&mut self) -> Result<f64, SensorError> {
        (**self).read_voltage()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<T: VoltageSource + ?Sized> VoltageSource for &mut T {
    fn read_voltage(&mut self) -> Result<f64, SensorError> {
        (**self).read_voltage()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Conversion from raw ADC counts to volts
///
/// `volts = raw * reference_voltage / (2^bits - 1)`, so full scale maps
/// exactly to the reference voltage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdcScale {
    reference_voltage: f64,
    resolution_bits: u8,
}

impl AdcScale {
    pub fn new(reference_voltage: f64, resolution_bits: u8) -> Result<Self, SensorError> {
        if !(1..=32).contains(&resolution_bits) {
            return Err(SensorError::InvalidData {
                details: format!("resolution of {} bits is not supported", resolution_bits),
            });
        }
        if !reference_voltage.is_finite() || reference_voltage <= 0.0 {
            return Err(SensorError::InvalidData {
                details: format!("reference voltage {} V must be positive", reference_voltage),
            });
        }
        Ok(Self {
            reference_voltage,
            resolution_bits,
        })
    }

    pub fn reference_voltage(&self) -> f64 {
        self.reference_voltage
    }

    pub fn max_count(&self) -> u64 {
        (1u64 << self.resolution_bits) - 1
    }

    pub fn to_volts(&self, raw: u32) -> f64 {
        raw as f64 * self.reference_voltage / self.max_count() as f64
    }
}
