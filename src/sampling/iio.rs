//! Linux industrial-I/O (sysfs) voltage source.
//!
//! Reads `in_voltageN_raw` from an IIO device directory. When the driver
//! exposes a scale (`in_voltageN_scale` or the shared `in_voltage_scale`,
//! in millivolts per count) it is used; otherwise raw counts are converted
//! with the configured [`AdcScale`].

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SensorError;
use crate::sampling::{AdcScale, VoltageSource};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Conversion {
    /// Driver-provided millivolts per count
    Millivolts { scale: f64, offset: f64 },
    Counts(AdcScale),
}

#[derive(Debug)]
pub struct IioVoltageSource {
    raw_path: PathBuf,
    conversion: Conversion,
}

impl IioVoltageSource {
    /// Open `channel` on the IIO device at `device`
    ///
    /// # Errors
    /// `NotConfigured` if the raw attribute does not exist.
    pub fn open(device: &Path, channel: u8, fallback: AdcScale) -> Result<Self, SensorError> {
        let raw_path = device.join(format!("in_voltage{}_raw", channel));
        if !raw_path.exists() {
            return Err(SensorError::NotConfigured {
                details: format!("{} does not exist", raw_path.display()),
            });
        }

        let scale = read_attribute(&device.join(format!("in_voltage{}_scale", channel)))
            .or_else(|| read_attribute(&device.join("in_voltage_scale")));
        let offset = read_attribute(&device.join(format!("in_voltage{}_offset", channel)))
            .unwrap_or(0.0);

        let conversion = match scale {
            Some(scale) if scale > 0.0 => Conversion::Millivolts { scale, offset },
            _ => Conversion::Counts(fallback),
        };

        tracing::info!(
            "[IioVoltageSource] Opened {} ({:?})",
            raw_path.display(),
            conversion
        );

        Ok(Self {
            raw_path,
            conversion,
        })
    }

    pub fn raw_path(&self) -> &Path {
        &self.raw_path
    }

    fn convert(&self, raw: i64) -> Result<f64, SensorError> {
        match self.conversion {
            Conversion::Millivolts { scale, offset } => Ok((raw as f64 + offset) * scale / 1000.0),
            Conversion::Counts(adc) => {
                let counts = u32::try_from(raw).map_err(|_| SensorError::InvalidData {
                    details: format!("raw count {} out of range", raw),
                })?;
                Ok(adc.to_volts(counts))
            }
        }
    }
}

impl VoltageSource for IioVoltageSource {
    fn read_voltage(&mut self) -> Result<f64, SensorError> {
        let contents = fs::read_to_string(&self.raw_path)?;
        let raw: i64 = contents
            .trim()
            .parse()
            .map_err(|err| SensorError::InvalidData {
                details: format!("{}: {:?} ({})", self.raw_path.display(), contents.trim(), err),
            })?;
        self.convert(raw)
    }

    fn describe(&self) -> String {
        format!("IIO channel {}", self.raw_path.display())
    }
}

fn read_attribute(path: &Path) -> Option<f64> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}
