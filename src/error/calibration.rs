// Calibration error types and constants

use crate::error::{ErrorCode, SensorError};
use log::error;
use std::fmt;

/// Calibration error code constants
///
/// Error code range: 2001-2006
pub struct CalibrationErrorCodes {}

impl CalibrationErrorCodes {
    /// Fewer calibration points than the fit requires
    pub const INSUFFICIENT_POINTS: i32 = 2001;

    /// All calibration voltages were (numerically) identical
    pub const IDENTICAL_VOLTAGES: i32 = 2002;

    /// A calibration point carried a NaN or infinite value
    pub const NON_FINITE_POINT: i32 = 2003;

    /// Buffer count outside the supported range
    pub const INVALID_BUFFER_COUNT: i32 = 2004;

    /// The operator aborted the guided procedure
    pub const ABORTED: i32 = 2005;

    /// A buffer measurement failed at the ADC
    pub const SAMPLING_FAILED: i32 = 2006;
}

/// Log a calibration error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_calibration_error(err: &CalibrationError, context: &str) {
    error!(
        "Calibration error in {}: code={}, component=CalibrationFit, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Calibration-related errors
///
/// These errors cover validation of calibration points and the guided
/// buffer procedure. All of them are fatal for a calibration run: a line
/// that cannot be fitted must never be replaced by a default.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Fewer calibration points than required for a defined slope
    InsufficientPoints { required: usize, supplied: usize },

    /// Voltage spread across all points is below the distinctness tolerance
    IdenticalVoltages { spread: f64 },

    /// A point contained a NaN or infinite value
    NonFinitePoint { index: usize },

    /// Buffer count outside [min, max]
    InvalidBufferCount { count: usize, min: usize, max: usize },

    /// The operator input stream closed before the procedure finished
    Aborted { reason: String },

    /// Sampling a buffer failed
    SamplingFailed { reason: String },
}

impl ErrorCode for CalibrationError {
    fn code(&self) -> i32 {
        match self {
            CalibrationError::InsufficientPoints { .. } => {
                CalibrationErrorCodes::INSUFFICIENT_POINTS
            }
            CalibrationError::IdenticalVoltages { .. } => CalibrationErrorCodes::IDENTICAL_VOLTAGES,
            CalibrationError::NonFinitePoint { .. } => CalibrationErrorCodes::NON_FINITE_POINT,
            CalibrationError::InvalidBufferCount { .. } => {
                CalibrationErrorCodes::INVALID_BUFFER_COUNT
            }
            CalibrationError::Aborted { .. } => CalibrationErrorCodes::ABORTED,
            CalibrationError::SamplingFailed { .. } => CalibrationErrorCodes::SAMPLING_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            CalibrationError::InsufficientPoints { required, supplied } => {
                format!(
                    "Insufficient calibration points: need {}, got {}",
                    required, supplied
                )
            }
            CalibrationError::IdenticalVoltages { spread } => {
                format!(
                    "Voltage readings for the buffers were identical (spread {:.3e} V)",
                    spread
                )
            }
            CalibrationError::NonFinitePoint { index } => {
                format!("Calibration point {} is not a finite number", index)
            }
            CalibrationError::InvalidBufferCount { count, min, max } => {
                format!(
                    "Calibration requires between {} and {} buffers (got {})",
                    min, max, count
                )
            }
            CalibrationError::Aborted { reason } => {
                format!("Calibration aborted: {}", reason)
            }
            CalibrationError::SamplingFailed { reason } => {
                format!("Buffer measurement failed: {}", reason)
            }
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message(), self.code())
    }
}

impl std::error::Error for CalibrationError {}

/// Convert from SensorError to CalibrationError
impl From<SensorError> for CalibrationError {
    fn from(err: SensorError) -> Self {
        CalibrationError::SamplingFailed {
            reason: err.message(),
        }
    }
}
