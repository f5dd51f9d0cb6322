// CalibrationModel - linear voltage-to-pH conversion
//
// A model is either fitted from buffer measurements or taken from the
// manual fallback constants. Once built it is read-only.

use serde::{Deserialize, Serialize};

/// One buffer measurement: certified pH and the averaged probe voltage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationPoint {
    pub reference_ph: f64,
    pub measured_voltage: f64,
}

impl CalibrationPoint {
    pub fn new(reference_ph: f64, measured_voltage: f64) -> Self {
        Self {
            reference_ph,
            measured_voltage,
        }
    }
}

/// Where the active model came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    /// Fitted in this process
    Fitted,
    /// Loaded from the persisted calibration file
    File(String),
    /// Manual fallback constants
    Manual,
}

/// `pH = slope * voltage + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationModel {
    pub slope: f64,
    pub intercept: f64,
}

impl CalibrationModel {
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    /// Convert a probe voltage to pH
    pub fn to_ph(&self, voltage: f64) -> f64 {
        self.slope * voltage + self.intercept
    }

    pub fn is_finite(&self) -> bool {
        self.slope.is_finite() && self.intercept.is_finite()
    }
}
