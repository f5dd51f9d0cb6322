// Error types for the pH probe tools
//
// This module defines one error enum per area (sensor, calibration fit,
// calibration file, monitoring loop). Each carries a numeric code so the
// binaries can report failures consistently.

mod calibration;
mod monitor;
mod sensor;
mod storage;

pub use calibration::{log_calibration_error, CalibrationError, CalibrationErrorCodes};
pub use monitor::{log_monitor_error, MonitorError, MonitorErrorCodes};
pub use sensor::{log_sensor_error, SensorError, SensorErrorCodes};
pub use storage::{log_storage_error, StorageError, StorageErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the library and the command-line tools.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
