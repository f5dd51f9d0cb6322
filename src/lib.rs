// pH Probe Core - calibration fit and hourly monitoring
// Voltage sampling, least-squares buffer calibration and persisted calibration records

// Module declarations
pub mod calibration;
pub mod clock;
pub mod config;
pub mod error;
pub mod monitor;
pub mod sampling;

use tracing_subscriber::EnvFilter;

use crate::config::{SensorConfig, SourceKind};
use crate::error::SensorError;
use crate::sampling::{AdcScale, IioVoltageSource, SimulatedVoltageSource, VoltageSource};

/// Initialize logging to stderr
///
/// Honors `RUST_LOG`; defaults to `info`. Safe to call more than once.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Open the voltage source selected by the sensor config
pub fn build_voltage_source(
    config: &SensorConfig,
) -> Result<Box<dyn VoltageSource>, SensorError> {
    match config.source {
        SourceKind::Iio => {
            let scale = AdcScale::new(config.reference_voltage, config.resolution_bits)?;
            let source = IioVoltageSource::open(&config.iio_device, config.channel, scale)?;
            Ok(Box::new(source))
        }
        SourceKind::Simulated => {
            tracing::warn!(
                "[Sensor] Using simulated probe at {:.3} V (noise +/-{:.3} V)",
                config.simulated_voltage,
                config.simulated_noise
            );
            Ok(Box::new(SimulatedVoltageSource::new(
                config.simulated_voltage,
                config.simulated_noise,
            )))
        }
    }
}
