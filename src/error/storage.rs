// Calibration file error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Storage error code constants
///
/// Error code range: 3001-3005
pub struct StorageErrorCodes {}

impl StorageErrorCodes {
    /// No calibration file at the configured path
    pub const NOT_FOUND: i32 = 3001;

    /// File exists but is not a valid calibration record
    pub const MALFORMED: i32 = 3002;

    /// Record parsed but its values are unusable
    pub const INVALID: i32 = 3003;

    /// Reading or writing the file failed
    pub const IO: i32 = 3004;

    /// Neither the file nor the manual constants can provide a calibration
    pub const NO_CALIBRATION: i32 = 3005;
}

/// Log a storage error with structured context
pub fn log_storage_error(err: &StorageError, context: &str) {
    error!(
        "Storage error in {}: code={}, component=CalibrationStore, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while loading or saving the calibration record
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// No file at the path
    NotFound { path: String },

    /// JSON error or a required field is missing
    Malformed { path: String, reason: String },

    /// Slope or intercept is not a finite number
    Invalid { path: String, reason: String },

    /// Any other filesystem failure
    Io { path: String, reason: String },

    /// File unusable and manual fallback disabled
    NoCalibration { path: String, reason: String },
}

impl ErrorCode for StorageError {
    fn code(&self) -> i32 {
        match self {
            StorageError::NotFound { .. } => StorageErrorCodes::NOT_FOUND,
            StorageError::Malformed { .. } => StorageErrorCodes::MALFORMED,
            StorageError::Invalid { .. } => StorageErrorCodes::INVALID,
            StorageError::Io { .. } => StorageErrorCodes::IO,
            StorageError::NoCalibration { .. } => StorageErrorCodes::NO_CALIBRATION,
        }
    }

    fn message(&self) -> String {
        match self {
            StorageError::NotFound { path } => format!("Calibration file {} not found", path),
            StorageError::Malformed { path, reason } => {
                format!("Calibration file {} is malformed: {}", path, reason)
            }
            StorageError::Invalid { path, reason } => {
                format!("Calibration file {} is invalid: {}", path, reason)
            }
            StorageError::Io { path, reason } => {
                format!("Unable to access calibration file {}: {}", path, reason)
            }
            StorageError::NoCalibration { path, reason } => {
                format!(
                    "No calibration available: {} ({}) and no manual slope/intercept configured",
                    path, reason
                )
            }
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message(), self.code())
    }
}

impl std::error::Error for StorageError {}
