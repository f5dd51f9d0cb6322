//! Per-cycle readings and where they are written.

use std::io::Write;

use serde::Serialize;

use crate::calibration::CalibrationModel;
use crate::sampling::VoltageStats;

/// One monitoring cycle's result
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// 1-based cycle number
    pub sequence: u64,
    /// Seconds since the first cycle started
    pub elapsed_secs: u64,
    /// Unix seconds when the window closed
    pub timestamp: u64,
    pub mean_voltage: f64,
    pub std_dev_voltage: f64,
    pub sample_count: usize,
    pub ph: f64,
}

impl Reading {
    pub fn new(
        sequence: u64,
        elapsed_secs: u64,
        timestamp: u64,
        stats: &VoltageStats,
        model: &CalibrationModel,
    ) -> Self {
        Self {
            sequence,
            elapsed_secs,
            timestamp,
            mean_voltage: stats.mean,
            std_dev_voltage: stats.std_dev,
            sample_count: stats.count,
            ph: model.to_ph(stats.mean),
        }
    }

    /// Human-readable report line
    pub fn to_line(&self) -> String {
        format!(
            "#{} t+{}s V_avg={:.4} V V_std={:.2} mV (n={}) pH={:.2}",
            self.sequence,
            self.elapsed_secs,
            self.mean_voltage,
            self.std_dev_voltage * 1000.0,
            self.sample_count,
            self.ph
        )
    }
}

/// Line format of the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Destination of the per-cycle readings
pub trait ReadingSink {
    fn emit(&mut self, reading: &Reading) -> std::io::Result<()>;
}

/// Writes one line per reading to any `Write`
pub struct WriterSink<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReadingSink for WriterSink<W> {
    fn emit(&mut self, reading: &Reading) -> std::io::Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(self.writer, "{}", reading.to_line())?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.writer, reading)?;
                writeln!(self.writer)?;
            }
        }
        self.writer.flush()
    }
}

impl ReadingSink for Vec<Reading> {
    fn emit(&mut self, reading: &Reading) -> std::io::Result<()> {
        self.push(*reading);
        Ok(())
    }
}
