// CalibrationProcedure - buffer collection workflow
//
// The procedure collects one averaged voltage per reference buffer:
// 1. Choose how many buffers (2 or 3)
// 2. For each buffer: certified pH, immerse probe, sample the window
// 3. Optional solution temperature
// 4. Fit the line and build the record to persist
//
// `CalibrationProcedure` holds the state; `run_guided` drives it through an
// `Operator` and a measurement callback.

use crate::calibration::fit::{fit_linear, LinearFit};
use crate::calibration::model::CalibrationPoint;
use crate::calibration::operator::Operator;
use crate::calibration::store::CalibrationRecord;
use crate::config::CalibrationConfig;
use crate::error::{CalibrationError, ErrorCode, SensorError};
use crate::sampling::VoltageStats;

/// Valid range for a certified buffer pH
const PH_RANGE: std::ops::RangeInclusive<f64> = 0.0..=14.0;

/// Progress through the buffer sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationProgress {
    /// Buffers measured so far
    pub buffers_recorded: usize,
    /// Buffers the operator chose to measure
    pub buffers_needed: usize,
}

impl CalibrationProgress {
    pub fn is_complete(&self) -> bool {
        self.buffers_recorded >= self.buffers_needed
    }
}

/// CalibrationProcedure collects buffer points and produces the fit
pub struct CalibrationProcedure {
    points: Vec<CalibrationPoint>,
    readings: Vec<VoltageStats>,
    buffer_count: Option<usize>,
    temperature_c: Option<f64>,
    min_buffers: usize,
    max_buffers: usize,
    min_voltage_spread: f64,
}

impl CalibrationProcedure {
    pub fn new(config: &CalibrationConfig) -> Self {
        Self {
            points: Vec::new(),
            readings: Vec::new(),
            buffer_count: None,
            temperature_c: None,
            min_buffers: config.min_buffers,
            max_buffers: config.max_buffers,
            min_voltage_spread: config.min_voltage_spread,
        }
    }

    /// Choose how many buffers will be measured
    ///
    /// # Returns
    /// * `Ok(())` - Count accepted
    /// * `Err(CalibrationError::InvalidBufferCount)` - Outside [min, max]
    pub fn set_buffer_count(&mut self, count: usize) -> Result<(), CalibrationError> {
        if count < self.min_buffers || count > self.max_buffers {
            return Err(CalibrationError::InvalidBufferCount {
                count,
                min: self.min_buffers,
                max: self.max_buffers,
            });
        }
        self.buffer_count = Some(count);
        Ok(())
    }

    pub fn buffer_count(&self) -> Option<usize> {
        self.buffer_count
    }

    /// Record the averaged window for the buffer of `reference_ph`
    pub fn record_point(
        &mut self,
        reference_ph: f64,
        stats: &VoltageStats,
    ) -> Result<CalibrationPoint, CalibrationError> {
        let point = self.record_measurement(CalibrationPoint::new(reference_ph, stats.mean))?;
        self.readings.push(*stats);
        Ok(point)
    }

    /// Record a point measured elsewhere (e.g. supplied on the command line)
    pub fn record_measurement(
        &mut self,
        point: CalibrationPoint,
    ) -> Result<CalibrationPoint, CalibrationError> {
        let limit = self.buffer_count.unwrap_or(self.max_buffers);
        if self.points.len() >= limit {
            return Err(CalibrationError::InvalidBufferCount {
                count: self.points.len() + 1,
                min: self.min_buffers,
                max: limit,
            });
        }
        if !point.reference_ph.is_finite() || !point.measured_voltage.is_finite() {
            return Err(CalibrationError::NonFinitePoint {
                index: self.points.len(),
            });
        }

        tracing::debug!(
            "[CalibrationProcedure] Buffer #{}: pH {:.2} at {:.4} V",
            self.points.len() + 1,
            point.reference_ph,
            point.measured_voltage
        );
        self.points.push(point);
        Ok(point)
    }

    pub fn set_temperature(&mut self, temperature_c: Option<f64>) {
        self.temperature_c = temperature_c.filter(|t| t.is_finite());
    }

    pub fn temperature(&self) -> Option<f64> {
        self.temperature_c
    }

    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    /// Window statistics of the buffers sampled through `record_point`
    pub fn readings(&self) -> &[VoltageStats] {
        &self.readings
    }

    pub fn progress(&self) -> CalibrationProgress {
        CalibrationProgress {
            buffers_recorded: self.points.len(),
            buffers_needed: self.buffer_count.unwrap_or(self.min_buffers),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.progress().is_complete()
    }

    /// Fit the recorded points and build the record to persist
    ///
    /// # Arguments
    /// * `created_at` - Unix seconds stored with the record
    ///
    /// # Returns
    /// * `Ok((LinearFit, CalibrationRecord))` - Fit succeeded
    /// * `Err(CalibrationError)` - Too few points or no voltage variation
    pub fn finalize(
        &self,
        created_at: u64,
    ) -> Result<(LinearFit, CalibrationRecord), CalibrationError> {
        let progress = self.progress();
        if !progress.is_complete() {
            return Err(CalibrationError::InsufficientPoints {
                required: progress.buffers_needed,
                supplied: progress.buffers_recorded,
            });
        }

        let fit = fit_linear(&self.points, self.min_voltage_spread)?;
        tracing::info!(
            "[CalibrationProcedure] Fitted {} points: slope={:.4}, intercept={:.4}, r2={:.5}",
            self.points.len(),
            fit.model.slope,
            fit.model.intercept,
            fit.r_squared
        );

        let record =
            CalibrationRecord::new(&fit, self.points.clone(), self.temperature_c, created_at);
        Ok((fit, record))
    }

    /// Discard all recorded buffers and start over
    pub fn reset(&mut self) {
        self.points.clear();
        self.readings.clear();
        self.buffer_count = None;
        self.temperature_c = None;
    }
}

/// Summary lines shown after a successful fit
pub fn describe_fit(fit: &LinearFit) -> Vec<String> {
    vec![
        "Calibration complete!".to_string(),
        format!("    slope     = {:.6}", fit.model.slope),
        format!("    intercept = {:.6}", fit.model.intercept),
        format!("    r^2       = {:.4}", fit.r_squared),
    ]
}

fn ask_or_abort<O: Operator + ?Sized>(
    operator: &mut O,
    prompt: &str,
    step: &str,
) -> Result<String, CalibrationError> {
    operator.ask(prompt).ok_or_else(|| CalibrationError::Aborted {
        reason: format!("input closed while {}", step),
    })
}

fn ask_buffer_count<O: Operator + ?Sized>(
    procedure: &mut CalibrationProcedure,
    operator: &mut O,
) -> Result<usize, CalibrationError> {
    let prompt = format!(
        "How many calibration buffers will you use ({}-{})? ",
        procedure.min_buffers, procedure.max_buffers
    );
    loop {
        let answer = ask_or_abort(operator, &prompt, "choosing the buffer count")?;
        match answer.trim().parse::<usize>() {
            Ok(count) => match procedure.set_buffer_count(count) {
                Ok(()) => return Ok(count),
                Err(err) => operator.tell(&err.message()),
            },
            Err(_) => operator.tell(&format!(
                "Please enter a whole number between {} and {}.",
                procedure.min_buffers, procedure.max_buffers
            )),
        }
    }
}

fn ask_buffer_ph<O: Operator + ?Sized>(
    operator: &mut O,
    buffer: usize,
) -> Result<f64, CalibrationError> {
    let prompt = format!("Enter the certified pH of buffer #{}: ", buffer);
    loop {
        let answer = ask_or_abort(operator, &prompt, "entering a buffer pH")?;
        match answer.trim().parse::<f64>() {
            Ok(ph) if PH_RANGE.contains(&ph) => return Ok(ph),
            _ => operator.tell("Please enter a pH between 0 and 14."),
        }
    }
}

fn ask_temperature<O: Operator + ?Sized>(operator: &mut O) -> Option<f64> {
    let answer = operator.ask("Solution temperature in C (press Enter to skip): ")?;
    let answer = answer.trim();
    if answer.is_empty() {
        return None;
    }
    match answer.parse::<f64>() {
        Ok(t) if t.is_finite() => Some(t),
        _ => {
            operator.tell("Temperature entry ignored (not a number).");
            None
        }
    }
}

/// Run the interactive buffer sequence
///
/// `measure` samples the probe for the buffer whose certified pH is passed
/// in and returns the window statistics.
///
/// # Returns
/// * `Ok((LinearFit, CalibrationRecord))` - Ready to persist
/// * `Err(CalibrationError)` - Input closed, sampling failed, or the points
///   cannot be fitted
pub fn run_guided<O, F>(
    procedure: &mut CalibrationProcedure,
    operator: &mut O,
    mut measure: F,
    created_at: u64,
) -> Result<(LinearFit, CalibrationRecord), CalibrationError>
where
    O: Operator + ?Sized,
    F: FnMut(f64) -> Result<VoltageStats, SensorError>,
{
    procedure.reset();
    let count = ask_buffer_count(procedure, operator)?;
    tracing::info!("[CalibrationProcedure] Starting {}-buffer calibration", count);

    for buffer in 1..=count {
        let ph = ask_buffer_ph(operator, buffer)?;
        ask_or_abort(
            operator,
            &format!(
                "Place the probe in the pH {:.2} buffer and press Enter once the reading is stable...",
                ph
            ),
            "waiting for the probe",
        )?;

        operator.tell(&format!("Collecting samples for pH {:.2}...", ph));
        let stats = measure(ph)?;
        operator.tell(&format!(
            "  -> {} readings captured. Average: {:.4} V, Std Dev: {:.2} mV",
            stats.count,
            stats.mean,
            stats.std_dev * 1000.0
        ));
        procedure.record_point(ph, &stats)?;
    }

    procedure.set_temperature(ask_temperature(operator));

    let (fit, record) = procedure.finalize(created_at)?;
    for line in describe_fit(&fit) {
        operator.tell(&line);
    }
    Ok((fit, record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct ScriptedOperator {
        answers: VecDeque<String>,
        prompts: Vec<String>,
        told: Vec<String>,
    }

    impl ScriptedOperator {
        fn new(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.to_string()).collect(),
                prompts: Vec::new(),
                told: Vec::new(),
            }
        }

        fn was_told(&self, needle: &str) -> bool {
            self.told.iter().any(|line| line.contains(needle))
        }
    }

    impl Operator for ScriptedOperator {
        fn ask(&mut self, prompt: &str) -> Option<String> {
            self.prompts.push(prompt.to_string());
            self.answers.pop_front()
        }

        fn tell(&mut self, message: &str) {
            self.told.push(message.to_string());
        }
    }

    fn stats(volts: f64) -> VoltageStats {
        VoltageStats::from_readings(&[volts]).unwrap()
    }

    /// Probe response of the reference scenario: pH 4 at 3.2 V, pH 7 at 2.8 V
    fn reference_probe(ph: f64) -> Result<VoltageStats, SensorError> {
        Ok(stats((28.0 - ph) / 7.5))
    }

    fn procedure() -> CalibrationProcedure {
        CalibrationProcedure::new(&CalibrationConfig::default())
    }

    #[test]
    fn test_guided_two_buffer_scenario() {
        let mut procedure = procedure();
        let mut operator = ScriptedOperator::new(&["2", "4.00", "", "7.00", "", "25"]);

        let (fit, record) =
            run_guided(&mut procedure, &mut operator, reference_probe, 1_700_000_000).unwrap();

        assert!((fit.model.slope + 7.5).abs() < 1e-9);
        assert!((fit.model.intercept - 28.0).abs() < 1e-9);
        assert!((fit.model.to_ph(3.0) - 5.5).abs() < 1e-9);
        assert_eq!(record.points.len(), 2);
        assert_eq!(record.temperature_c, Some(25.0));
        assert_eq!(record.created_at, Some(1_700_000_000));
        assert!(operator.was_told("Calibration complete!"));
        assert!(operator.was_told("Collecting samples for pH 4.00..."));
    }

    #[test]
    fn test_guided_three_buffers() {
        let mut procedure = procedure();
        let mut operator = ScriptedOperator::new(&["3", "4", "", "7", "", "10", "", ""]);

        let (fit, record) = run_guided(&mut procedure, &mut operator, reference_probe, 0).unwrap();

        assert_eq!(record.points.len(), 3);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert_eq!(record.temperature_c, None);
    }

    #[test]
    fn test_invalid_buffer_count_reprompts() {
        let mut procedure = procedure();
        let mut operator = ScriptedOperator::new(&["5", "two", "1", "2", "4", "", "7", "", ""]);

        run_guided(&mut procedure, &mut operator, reference_probe, 0).unwrap();

        let count_prompts = operator
            .prompts
            .iter()
            .filter(|p| p.starts_with("How many"))
            .count();
        assert_eq!(count_prompts, 4);
        assert!(operator.was_told("between 2 and 3"));
        assert!(operator.was_told("whole number"));
    }

    #[test]
    fn test_invalid_ph_reprompts() {
        let mut procedure = procedure();
        let mut operator =
            ScriptedOperator::new(&["2", "acid", "15", "4", "", "-1", "7", "", ""]);

        let (_, record) = run_guided(&mut procedure, &mut operator, reference_probe, 0).unwrap();

        assert_eq!(record.points[0].reference_ph, 4.0);
        assert_eq!(record.points[1].reference_ph, 7.0);
        let rejections = operator
            .told
            .iter()
            .filter(|line| line.contains("between 0 and 14"))
            .count();
        assert_eq!(rejections, 3);
    }

    #[test]
    fn test_non_numeric_temperature_is_ignored() {
        let mut procedure = procedure();
        let mut operator = ScriptedOperator::new(&["2", "4", "", "7", "", "warm"]);

        let (_, record) = run_guided(&mut procedure, &mut operator, reference_probe, 0).unwrap();

        assert_eq!(record.temperature_c, None);
        assert!(operator.was_told("Temperature entry ignored"));
    }

    #[test]
    fn test_closed_input_aborts() {
        let mut procedure = procedure();
        let mut operator = ScriptedOperator::new(&["2", "4"]);

        let result = run_guided(&mut procedure, &mut operator, reference_probe, 0);
        assert!(matches!(result, Err(CalibrationError::Aborted { .. })));
    }

    #[test]
    fn test_closed_input_at_temperature_still_fits() {
        let mut procedure = procedure();
        let mut operator = ScriptedOperator::new(&["2", "4", "", "7", ""]);

        let (_, record) = run_guided(&mut procedure, &mut operator, reference_probe, 0).unwrap();
        assert_eq!(record.temperature_c, None);
    }

    #[test]
    fn test_sampling_failure_is_fatal() {
        let mut procedure = procedure();
        let mut operator = ScriptedOperator::new(&["2", "4", "", "7", "", ""]);

        let result = run_guided(
            &mut procedure,
            &mut operator,
            |_| {
                Err(SensorError::ReadFailed {
                    reason: "bus error".to_string(),
                })
            },
            0,
        );

        match result {
            Err(err @ CalibrationError::SamplingFailed { .. }) => {
                assert!(err.message().contains("bus error"));
            }
            other => panic!("expected SamplingFailed, got {:?}", other),
        }
        assert_eq!(procedure.points().len(), 0);
    }

    #[test]
    fn test_identical_voltages_are_fatal() {
        let mut procedure = procedure();
        let mut operator = ScriptedOperator::new(&["2", "4", "", "7", "", ""]);

        let result = run_guided(&mut procedure, &mut operator, |_| Ok(stats(2.5)), 0);
        assert!(matches!(
            result,
            Err(CalibrationError::IdenticalVoltages { .. })
        ));
        assert!(!operator.was_told("Calibration complete!"));
    }

    #[test]
    fn test_buffer_count_bounds() {
        let mut procedure = procedure();
        assert!(procedure.set_buffer_count(1).is_err());
        assert!(procedure.set_buffer_count(4).is_err());
        assert!(procedure.set_buffer_count(2).is_ok());
        assert_eq!(procedure.buffer_count(), Some(2));
    }

    #[test]
    fn test_progress_and_extra_points() {
        let mut procedure = procedure();
        procedure.set_buffer_count(2).unwrap();
        assert_eq!(
            procedure.progress(),
            CalibrationProgress {
                buffers_recorded: 0,
                buffers_needed: 2
            }
        );

        procedure.record_point(4.0, &stats(3.2)).unwrap();
        assert!(!procedure.is_complete());
        procedure.record_point(7.0, &stats(2.8)).unwrap();
        assert!(procedure.is_complete());
        assert_eq!(procedure.readings().len(), 2);

        let err = procedure.record_point(10.0, &stats(2.4)).unwrap_err();
        assert_eq!(err.code(), 2004);
    }

    #[test]
    fn test_finalize_requires_all_buffers() {
        let mut procedure = procedure();
        procedure.set_buffer_count(3).unwrap();
        procedure.record_point(4.0, &stats(3.2)).unwrap();
        procedure.record_point(7.0, &stats(2.8)).unwrap();

        assert_eq!(
            procedure.finalize(0).unwrap_err(),
            CalibrationError::InsufficientPoints {
                required: 3,
                supplied: 2
            }
        );
    }

    #[test]
    fn test_non_finite_measurement_rejected() {
        let mut procedure = procedure();
        let err = procedure
            .record_measurement(CalibrationPoint::new(7.0, f64::NAN))
            .unwrap_err();
        assert_eq!(err, CalibrationError::NonFinitePoint { index: 0 });
        assert!(procedure.points().is_empty());
    }

    #[test]
    fn test_reset_clears_state() {
        let mut procedure = procedure();
        procedure.set_buffer_count(2).unwrap();
        procedure.record_point(4.0, &stats(3.2)).unwrap();
        procedure.set_temperature(Some(21.5));

        procedure.reset();

        assert!(procedure.points().is_empty());
        assert_eq!(procedure.buffer_count(), None);
        assert_eq!(procedure.temperature(), None);
    }
}
