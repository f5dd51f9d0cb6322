// Monitor - periodic pH measurement loop
//
// Each cycle runs Sampling -> Converting -> Reporting, then sleeps for the
// rest of the cadence. A cycle that overruns the cadence starts the next one
// immediately. There is no in-band cancellation; an unbounded run ends only
// with the process or a fatal error.

pub mod report;

pub use report::{OutputFormat, Reading, ReadingSink, WriterSink};

use std::time::{Duration, Instant};

use crate::calibration::CalibrationModel;
use crate::clock::Clock;
use crate::error::{log_monitor_error, MonitorError};
use crate::sampling::{Sampler, SamplingPlan, VoltageSource};

/// Monitoring loop states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Sampling,
    Converting,
    Reporting,
    Sleeping,
}

/// Time to sleep after a cycle that took `elapsed`, floored at zero
pub fn remaining_sleep(cadence: Duration, elapsed: Duration) -> Duration {
    cadence.saturating_sub(elapsed)
}

/// Drives the sample/convert/report cycle against a clock
pub struct Monitor<'a, C: Clock + ?Sized> {
    clock: &'a C,
    plan: SamplingPlan,
    cadence: Duration,
    model: CalibrationModel,
    state: MonitorState,
    sequence: u64,
    started: Option<Instant>,
}

impl<'a, C: Clock + ?Sized> Monitor<'a, C> {
    pub fn new(
        clock: &'a C,
        plan: SamplingPlan,
        cadence: Duration,
        model: CalibrationModel,
    ) -> Self {
        Self {
            clock,
            plan,
            cadence,
            model,
            state: MonitorState::Idle,
            sequence: 0,
            started: None,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn model(&self) -> &CalibrationModel {
        &self.model
    }

    /// Cycles completed so far
    pub fn cycles(&self) -> u64 {
        self.sequence
    }

    fn enter(&mut self, state: MonitorState) {
        tracing::debug!("[Monitor] {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Run one Sampling -> Converting -> Reporting pass
    ///
    /// # Errors
    /// An ADC failure or an output failure stops the cycle; the monitor
    /// returns to `Idle`.
    pub fn run_cycle<S, K>(&mut self, source: &mut S, sink: &mut K) -> Result<Reading, MonitorError>
    where
        S: VoltageSource + ?Sized,
        K: ReadingSink + ?Sized,
    {
        let cycle_start = self.clock.now();
        let started = *self.started.get_or_insert(cycle_start);
        let sequence = self.sequence + 1;

        self.enter(MonitorState::Sampling);
        let stats = Sampler::new(self.clock, self.plan)
            .sample_window(source)
            .map_err(|source| MonitorError::SamplingFailed {
                cycle: sequence,
                source,
            })
            .inspect_err(|err| {
                log_monitor_error(err, "run_cycle");
                self.state = MonitorState::Idle;
            })?;

        self.enter(MonitorState::Converting);
        let elapsed = cycle_start.saturating_duration_since(started);
        let reading = Reading::new(
            sequence,
            elapsed.as_secs(),
            self.clock.unix_time(),
            &stats,
            &self.model,
        );

        self.enter(MonitorState::Reporting);
        sink.emit(&reading)
            .map_err(MonitorError::from)
            .inspect_err(|err| {
                log_monitor_error(err, "run_cycle");
                self.state = MonitorState::Idle;
            })?;

        self.sequence = sequence;
        tracing::info!(
            "[Monitor] Cycle {}: {:.4} V -> pH {:.2}",
            sequence,
            reading.mean_voltage,
            reading.ph
        );
        Ok(reading)
    }

    /// Run cycles until `max_cycles` have completed (forever for `None`)
    ///
    /// Cycles start `cadence` apart. No sleep follows the final cycle of a
    /// bounded run.
    ///
    /// # Returns
    /// Number of cycles completed
    pub fn run<S, K>(
        &mut self,
        source: &mut S,
        sink: &mut K,
        max_cycles: Option<u64>,
    ) -> Result<u64, MonitorError>
    where
        S: VoltageSource + ?Sized,
        K: ReadingSink + ?Sized,
    {
        tracing::info!(
            "[Monitor] Starting: window={:?}, cadence={:?}, slope={:.6}, intercept={:.6}",
            self.plan.window,
            self.cadence,
            self.model.slope,
            self.model.intercept
        );

        let mut completed = 0;
        loop {
            if max_cycles.is_some_and(|max| completed >= max) {
                self.enter(MonitorState::Idle);
                return Ok(completed);
            }

            let cycle_start = self.clock.now();
            self.run_cycle(source, sink)?;
            completed += 1;

            if max_cycles.is_some_and(|max| completed >= max) {
                self.enter(MonitorState::Idle);
                return Ok(completed);
            }

            self.enter(MonitorState::Sleeping);
            let elapsed = self.clock.now().saturating_duration_since(cycle_start);
            self.clock.sleep(remaining_sleep(self.cadence, elapsed));
        }
    }
}
