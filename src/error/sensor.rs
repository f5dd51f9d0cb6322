// Sensor error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Sensor error code constants
///
/// Error code range: 1001-1004
pub struct SensorErrorCodes {}

impl SensorErrorCodes {
    /// The ADC channel could not be opened or is not configured
    pub const NOT_CONFIGURED: i32 = 1001;

    /// A conversion failed
    pub const READ_FAILED: i32 = 1002;

    /// The ADC returned data that could not be interpreted
    pub const INVALID_DATA: i32 = 1003;

    /// Sampling parameters are unusable
    pub const INVALID_SAMPLING: i32 = 1004;
}

/// Log a sensor error with structured context
pub fn log_sensor_error(err: &SensorError, context: &str) {
    error!(
        "Sensor error in {}: code={}, component=VoltageSource, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while reading the probe voltage
///
/// Any of these aborts the current sampling window; the sampler never
/// substitutes a default reading.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorError {
    /// No ADC channel available
    NotConfigured { details: String },

    /// The ADC conversion failed
    ReadFailed { reason: String },

    /// Raw data could not be parsed or converted
    InvalidData { details: String },

    /// Sampling window/interval/oversample settings are unusable
    InvalidSampling { reason: String },
}

impl ErrorCode for SensorError {
    fn code(&self) -> i32 {
        match self {
            SensorError::NotConfigured { .. } => SensorErrorCodes::NOT_CONFIGURED,
            SensorError::ReadFailed { .. } => SensorErrorCodes::READ_FAILED,
            SensorError::InvalidData { .. } => SensorErrorCodes::INVALID_DATA,
            SensorError::InvalidSampling { .. } => SensorErrorCodes::INVALID_SAMPLING,
        }
    }

    fn message(&self) -> String {
        match self {
            SensorError::NotConfigured { details } => {
                format!("ADC channel is not configured: {}", details)
            }
            SensorError::ReadFailed { reason } => format!("ADC read failed: {}", reason),
            SensorError::InvalidData { details } => format!("Invalid ADC data: {}", details),
            SensorError::InvalidSampling { reason } => {
                format!("Invalid sampling configuration: {}", reason)
            }
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message(), self.code())
    }
}

impl std::error::Error for SensorError {}

/// Convert from std::io::Error to SensorError
impl From<std::io::Error> for SensorError {
    fn from(err: std::io::Error) -> Self {
        SensorError::ReadFailed {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_error_codes() {
        assert_eq!(
            SensorError::NotConfigured {
                details: "x".to_string()
            }
            .code(),
            1001
        );
        assert_eq!(
            SensorError::ReadFailed {
                reason: "x".to_string()
            }
            .code(),
            1002
        );
        assert_eq!(
            SensorError::InvalidData {
                details: "x".to_string()
            }
            .code(),
            1003
        );
        assert_eq!(
            SensorError::InvalidSampling {
                reason: "x".to_string()
            }
            .code(),
            1004
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test error");
        let sensor_err: SensorError = io_err.into();

        match sensor_err {
            SensorError::ReadFailed { reason } => {
                assert!(reason.contains("test error"));
            }
            _ => panic!("Expected ReadFailed variant"),
        }
    }
}
