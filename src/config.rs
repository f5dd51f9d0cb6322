//! Configuration management for the calibration and monitoring tools
//!
//! This module provides runtime configuration loading from JSON files so the
//! ADC channel, sampling windows and fallback calibration can be adjusted on
//! the device without recompilation. Every field has a default, and a missing
//! or malformed file falls back to the defaults with a warning.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Slope used when no calibration file can be loaded (pH per volt).
///
/// Typical value for a Gravity analog pH board powered from 3.3 V.
pub const MANUAL_SLOPE: f64 = -5.6548;

/// Intercept used when no calibration file can be loaded (pH).
pub const MANUAL_INTERCEPT: f64 = 15.509;

/// Default location of the persisted calibration record
pub const DEFAULT_CALIBRATION_FILE: &str = "ph_calibration.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sensor: SensorConfig,
    pub monitor: MonitorConfig,
    pub calibration: CalibrationConfig,
}

/// Which backend supplies probe voltages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Linux industrial-I/O sysfs channel
    Iio,
    /// Fixed voltage plus noise, for bench runs without a probe
    Simulated,
}

/// ADC channel parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub source: SourceKind,
    /// IIO device directory, e.g. /sys/bus/iio/devices/iio:device0
    pub iio_device: PathBuf,
    /// Analog input channel the probe board is wired to
    pub channel: u8,
    /// Voltage corresponding to full scale (V)
    pub reference_voltage: f64,
    /// ADC resolution in bits
    pub resolution_bits: u8,
    /// Centre voltage of the simulated probe (V)
    pub simulated_voltage: f64,
    /// Peak noise added to each simulated reading (V)
    pub simulated_noise: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Iio,
            iio_device: PathBuf::from("/sys/bus/iio/devices/iio:device0"),
            channel: 0,
            reference_voltage: 3.3,
            resolution_bits: 12,
            simulated_voltage: 2.5,
            simulated_noise: 0.002,
        }
    }
}

/// One averaging window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Length of the averaging window in milliseconds
    pub window_ms: u64,
    /// Pause between voltage readings in milliseconds
    pub interval_ms: u64,
    /// Raw conversions averaged into each voltage reading
    pub oversample: u16,
    /// Pause between raw conversions in milliseconds
    pub oversample_delay_ms: u64,
}

impl SamplingConfig {
    /// 10 s window, five readings per second
    pub const fn monitoring() -> Self {
        Self {
            window_ms: 10_000,
            interval_ms: 200,
            oversample: 1,
            oversample_delay_ms: 0,
        }
    }

    /// 15 s window, each reading the mean of 20 conversions 50 ms apart
    pub const fn calibration() -> Self {
        Self {
            window_ms: 15_000,
            interval_ms: 0,
            oversample: 20,
            oversample_delay_ms: 50,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn oversample_delay(&self) -> Duration {
        Duration::from_millis(self.oversample_delay_ms)
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self::monitoring()
    }
}

/// Monitoring loop parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub sampling: SamplingConfig,
    /// Time between the start of consecutive cycles in seconds
    pub cadence_secs: u64,
}

impl MonitorConfig {
    pub fn cadence(&self) -> Duration {
        Duration::from_secs(self.cadence_secs)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::monitoring(),
            cadence_secs: 3600,
        }
    }
}

/// Calibration procedure and fallback parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Persisted calibration record
    pub file: PathBuf,
    /// Fallback slope; `null` disables the fallback
    pub manual_slope: Option<f64>,
    /// Fallback intercept; `null` disables the fallback
    pub manual_intercept: Option<f64>,
    pub sampling: SamplingConfig,
    /// Minimum voltage spread (V) for points to count as distinct
    pub min_voltage_spread: f64,
    pub min_buffers: usize,
    pub max_buffers: usize,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_CALIBRATION_FILE),
            manual_slope: Some(MANUAL_SLOPE),
            manual_intercept: Some(MANUAL_INTERCEPT),
            sampling: SamplingConfig::calibration(),
            min_voltage_spread: 1e-6,
            min_buffers: 2,
            max_buffers: 3,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or the defaults if the file doesn't exist
    /// or the JSON is invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    tracing::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                tracing::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load from `path` when one was given, otherwise use the defaults
    pub fn load(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::default(),
        }
    }

    /// Manual fallback pair, if both halves are configured
    pub fn manual_calibration(&self) -> Option<(f64, f64)> {
        match (
            self.calibration.manual_slope,
            self.calibration.manual_intercept,
        ) {
            (Some(slope), Some(intercept)) => Some((slope, intercept)),
            _ => None,
        }
    }
}
