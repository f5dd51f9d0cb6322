// Least-squares line fit through calibration points
//
// pH = m * V + b, with
//   m = Sxy / Sxx, b = mean(pH) - m * mean(V)
// which is the closed form
//   m = (N*sum(V*pH) - sum(V)*sum(pH)) / (N*sum(V^2) - sum(V)^2)
// computed around the means for numerical stability.

use crate::calibration::model::{CalibrationModel, CalibrationPoint};
use crate::error::CalibrationError;

/// Minimum number of points for a defined slope
pub const MIN_FIT_POINTS: usize = 2;

/// Result of a calibration fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub model: CalibrationModel,
    /// Coefficient of determination (1.0 for an exact fit)
    pub r_squared: f64,
}

impl LinearFit {
    /// Sum of squared pH residuals of this fit over `points`
    pub fn residual_sum_of_squares(&self, points: &[CalibrationPoint]) -> f64 {
        residual_sum_of_squares(&self.model, points)
    }
}

pub fn residual_sum_of_squares(model: &CalibrationModel, points: &[CalibrationPoint]) -> f64 {
    points
        .iter()
        .map(|p| (p.reference_ph - model.to_ph(p.measured_voltage)).powi(2))
        .sum()
}

/// Fit `pH = slope * V + intercept` through `points`
///
/// # Arguments
/// * `points` - Buffer measurements, at least two
/// * `min_voltage_spread` - Points whose voltages span less than this (V)
///   count as identical
///
/// # Returns
/// * `Ok(LinearFit)` - Exact line for two points, least-squares line for more
/// * `Err(CalibrationError)` - Too few points, non-finite values, or no
///   voltage variation
pub fn fit_linear(
    points: &[CalibrationPoint],
    min_voltage_spread: f64,
) -> Result<LinearFit, CalibrationError> {
    if points.len() < MIN_FIT_POINTS {
        return Err(CalibrationError::InsufficientPoints {
            required: MIN_FIT_POINTS,
            supplied: points.len(),
        });
    }

    if let Some(index) = points
        .iter()
        .position(|p| !p.reference_ph.is_finite() || !p.measured_voltage.is_finite())
    {
        return Err(CalibrationError::NonFinitePoint { index });
    }

    let (min_v, max_v) = points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |acc, p| {
        (acc.0.min(p.measured_voltage), acc.1.max(p.measured_voltage))
    });
    let spread = max_v - min_v;
    if spread == 0.0 || spread < min_voltage_spread {
        return Err(CalibrationError::IdenticalVoltages { spread });
    }

    let n = points.len() as f64;
    let mean_v = points.iter().map(|p| p.measured_voltage).sum::<f64>() / n;
    let mean_ph = points.iter().map(|p| p.reference_ph).sum::<f64>() / n;

    let (sxx, sxy) = points.iter().fold((0.0, 0.0), |(sxx, sxy), p| {
        let dv = p.measured_voltage - mean_v;
        (sxx + dv * dv, sxy + dv * (p.reference_ph - mean_ph))
    });
    if sxx <= 0.0 {
        return Err(CalibrationError::IdenticalVoltages { spread });
    }

    let slope = sxy / sxx;
    let model = CalibrationModel::new(slope, mean_ph - slope * mean_v);

    let r_squared = if points.len() == MIN_FIT_POINTS {
        1.0
    } else {
        let ss_tot: f64 = points
            .iter()
            .map(|p| (p.reference_ph - mean_ph).powi(2))
            .sum();
        if ss_tot == 0.0 {
            1.0
        } else {
            1.0 - residual_sum_of_squares(&model, points) / ss_tot
        }
    };

    Ok(LinearFit { model, r_squared })
}
