// Calibration module - buffer fit, persistence and the guided procedure
//
// This module provides the following components:
// 1. CalibrationModel: the linear voltage-to-pH line
// 2. fit_linear: least-squares fit over 2-3 buffer points
// 3. CalibrationProcedure: the buffer collection workflow
// 4. store: JSON record on disk and the manual fallback
//
// The calibration workflow:
// 1. Create CalibrationProcedure from the calibration config
// 2. Record one averaged voltage per reference buffer
// 3. Finalize to fit the line, then save the CalibrationRecord

pub mod fit;
pub mod model;
pub mod operator;
pub mod procedure;
pub mod store;

pub use fit::{fit_linear, LinearFit, MIN_FIT_POINTS};
pub use model::{CalibrationModel, CalibrationPoint, ModelSource};
pub use operator::{ConsoleOperator, Operator};
pub use procedure::{describe_fit, run_guided, CalibrationProcedure, CalibrationProgress};
pub use store::{
    load_calibration_model, load_calibration_record, resolve_calibration, save_calibration,
    CalibrationRecord, LoadedCalibration,
};
