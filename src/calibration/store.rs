// Calibration persistence
//
// The record is written as pretty JSON next to its final location and then
// renamed over it, so a power cut leaves either the old or the new file,
// never a truncated one. Readers that only need the line parameters parse
// slope and intercept and ignore everything else in the file.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::calibration::fit::LinearFit;
use crate::calibration::model::{CalibrationModel, CalibrationPoint, ModelSource};
use crate::error::{log_storage_error, ErrorCode, StorageError};

/// Persisted calibration record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationRecord {
    pub slope: f64,
    pub intercept: f64,
    pub points: Vec<CalibrationPoint>,
    #[serde(default)]
    pub r_squared: Option<f64>,
    /// Buffer solution temperature entered by the operator
    #[serde(default)]
    pub temperature_c: Option<f64>,
    /// Unix seconds when the calibration was taken
    #[serde(default)]
    pub created_at: Option<u64>,
}

impl CalibrationRecord {
    pub fn new(
        fit: &LinearFit,
        points: Vec<CalibrationPoint>,
        temperature_c: Option<f64>,
        created_at: u64,
    ) -> Self {
        Self {
            slope: fit.model.slope,
            intercept: fit.model.intercept,
            points,
            r_squared: Some(fit.r_squared),
            temperature_c,
            created_at: Some(created_at),
        }
    }

    pub fn model(&self) -> CalibrationModel {
        CalibrationModel::new(self.slope, self.intercept)
    }
}

/// The two fields the monitor depends on
#[derive(Deserialize)]
struct StoredLine {
    slope: f64,
    intercept: f64,
}

/// Model chosen at monitor startup
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCalibration {
    pub model: CalibrationModel,
    pub source: ModelSource,
    /// Why the file was not used, when the manual constants were taken
    pub fallback_reason: Option<StorageError>,
}

/// Write `record` to `path`, replacing any previous file atomically
pub fn save_calibration(path: &Path, record: &CalibrationRecord) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(record).map_err(|err| StorageError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;

    let tmp_path = temp_path_for(path);
    write_synced(&tmp_path, json.as_bytes())
        .and_then(|_| fs::rename(&tmp_path, path))
        .map_err(|err| {
            let _ = fs::remove_file(&tmp_path);
            let err = io_error(path, err);
            log_storage_error(&err, "save_calibration");
            err
        })?;

    // Persist the rename itself; not every platform can open a directory
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if let Ok(handle) = File::open(dir) {
            let _ = handle.sync_all();
        }
    }

    tracing::info!("[CalibrationStore] Saved calibration to {}", path.display());
    Ok(())
}

/// Load the full record, e.g. for display or re-fitting
pub fn load_calibration_record(path: &Path) -> Result<CalibrationRecord, StorageError> {
    let contents = read_file(path)?;
    let record: CalibrationRecord =
        serde_json::from_str(&contents).map_err(|err| malformed(path, err))?;
    validate_line(path, record.slope, record.intercept)?;
    Ok(record)
}

/// Load only slope and intercept; unknown fields are ignored
pub fn load_calibration_model(path: &Path) -> Result<CalibrationModel, StorageError> {
    let contents = read_file(path)?;
    let line: StoredLine = serde_json::from_str(&contents).map_err(|err| malformed(path, err))?;
    validate_line(path, line.slope, line.intercept)?;
    Ok(CalibrationModel::new(line.slope, line.intercept))
}

/// Pick the model for monitoring: the file if usable, else the manual pair
///
/// # Errors
/// `NoCalibration` when the file is unusable and `manual` is `None`.
pub fn resolve_calibration(
    path: &Path,
    manual: Option<(f64, f64)>,
) -> Result<LoadedCalibration, StorageError> {
    match load_calibration_model(path) {
        Ok(model) => {
            tracing::info!(
                "[CalibrationStore] Using calibration from {}: slope={:.6}, intercept={:.6}",
                path.display(),
                model.slope,
                model.intercept
            );
            Ok(LoadedCalibration {
                model,
                source: ModelSource::File(path.display().to_string()),
                fallback_reason: None,
            })
        }
        Err(reason) => match manual {
            Some((slope, intercept)) if slope.is_finite() && intercept.is_finite() => {
                tracing::warn!(
                    "[CalibrationStore] {}. Falling back to manual slope={:.6}, intercept={:.6}",
                    reason.message(),
                    slope,
                    intercept
                );
                Ok(LoadedCalibration {
                    model: CalibrationModel::new(slope, intercept),
                    source: ModelSource::Manual,
                    fallback_reason: Some(reason),
                })
            }
            _ => {
                let err = StorageError::NoCalibration {
                    path: path.display().to_string(),
                    reason: reason.message(),
                };
                log_storage_error(&err, "resolve_calibration");
                Err(err)
            }
        },
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "calibration".into());
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn read_file(path: &Path) -> Result<String, StorageError> {
    fs::read_to_string(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => StorageError::NotFound {
            path: path.display().to_string(),
        },
        _ => io_error(path, err),
    })
}

fn validate_line(path: &Path, slope: f64, intercept: f64) -> Result<(), StorageError> {
    if slope.is_finite() && intercept.is_finite() {
        Ok(())
    } else {
        Err(StorageError::Invalid {
            path: path.display().to_string(),
            reason: format!("slope={} intercept={}", slope, intercept),
        })
    }
}

fn malformed(path: &Path, err: serde_json::Error) -> StorageError {
    StorageError::Malformed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

fn io_error(path: &Path, err: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
