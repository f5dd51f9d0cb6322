// Monitoring loop error types and constants

use crate::error::{ErrorCode, SensorError};
use log::error;
use std::fmt;

/// Monitor error code constants
///
/// Error code range: 4001-4002
pub struct MonitorErrorCodes {}

impl MonitorErrorCodes {
    /// The sampling window of a cycle failed
    pub const SAMPLING_FAILED: i32 = 4001;

    /// The reading could not be written to the output
    pub const OUTPUT_FAILED: i32 = 4002;
}

/// Log a monitor error with structured context
pub fn log_monitor_error(err: &MonitorError, context: &str) {
    error!(
        "Monitor error in {}: code={}, component=Monitor, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors that stop the monitoring loop
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorError {
    /// ADC failure inside a cycle's window
    SamplingFailed { cycle: u64, source: SensorError },

    /// Writing the report line failed
    OutputFailed { reason: String },
}

impl ErrorCode for MonitorError {
    fn code(&self) -> i32 {
        match self {
            MonitorError::SamplingFailed { .. } => MonitorErrorCodes::SAMPLING_FAILED,
            MonitorError::OutputFailed { .. } => MonitorErrorCodes::OUTPUT_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            MonitorError::SamplingFailed { cycle, source } => {
                format!("Sampling failed in cycle {}: {}", cycle, source.message())
            }
            MonitorError::OutputFailed { reason } => {
                format!("Unable to write reading: {}", reason)
            }
        }
    }
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message(), self.code())
    }
}

impl std::error::Error for MonitorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MonitorError::SamplingFailed { source, .. } => Some(source),
            MonitorError::OutputFailed { .. } => None,
        }
    }
}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        MonitorError::OutputFailed {
            reason: err.to_string(),
        }
    }
}
