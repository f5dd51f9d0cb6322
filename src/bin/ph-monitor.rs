use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use ph_probe::calibration::resolve_calibration;
use ph_probe::clock::SystemClock;
use ph_probe::config::{AppConfig, SourceKind};
use ph_probe::error::ErrorCode;
use ph_probe::monitor::{Monitor, OutputFormat, WriterSink};
use ph_probe::sampling::SamplingPlan;

#[derive(Parser, Debug)]
#[command(
    name = "ph-monitor",
    about = "Hourly pH readings from an analog probe using the stored calibration"
)]
struct Cli {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Calibration file to load (defaults to the configured file)
    #[arg(long)]
    calibration_file: Option<PathBuf>,
    /// Fallback slope used when the calibration file is unusable
    #[arg(long, allow_hyphen_values = true)]
    manual_slope: Option<f64>,
    /// Fallback intercept used when the calibration file is unusable
    #[arg(long, allow_hyphen_values = true)]
    manual_intercept: Option<f64>,
    /// Fail instead of falling back to the manual constants
    #[arg(long)]
    no_fallback: bool,
    /// Read a simulated probe instead of the ADC
    #[arg(long)]
    simulate: bool,
    /// Simulated probe voltage (implies --simulate)
    #[arg(long)]
    simulate_voltage: Option<f64>,
    /// Peak noise of the simulated probe in volts
    #[arg(long)]
    simulate_noise: Option<f64>,
    /// Stop after this many cycles (runs forever by default)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    cycles: Option<u64>,
    /// Emit one JSON object per reading
    #[arg(long)]
    json: bool,
    /// Averaging window in milliseconds
    #[arg(long)]
    window_ms: Option<u64>,
    /// Pause between readings in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,
    /// Seconds between cycle starts
    #[arg(long)]
    cadence_secs: Option<u64>,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration
    fn apply(&self, config: &mut AppConfig) {
        if let Some(file) = &self.calibration_file {
            config.calibration.file = file.clone();
        }
        if let Some(slope) = self.manual_slope {
            config.calibration.manual_slope = Some(slope);
        }
        if let Some(intercept) = self.manual_intercept {
            config.calibration.manual_intercept = Some(intercept);
        }
        if self.no_fallback {
            config.calibration.manual_slope = None;
            config.calibration.manual_intercept = None;
        }
        if self.simulate || self.simulate_voltage.is_some() {
            config.sensor.source = SourceKind::Simulated;
        }
        if let Some(volts) = self.simulate_voltage {
            config.sensor.simulated_voltage = volts;
        }
        if let Some(noise) = self.simulate_noise {
            config.sensor.simulated_noise = noise;
        }
        if let Some(window_ms) = self.window_ms {
            config.monitor.sampling.window_ms = window_ms;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.monitor.sampling.interval_ms = interval_ms;
        }
        if let Some(cadence_secs) = self.cadence_secs {
            config.monitor.cadence_secs = cadence_secs;
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    ph_probe::init_logging();

    let mut config = AppConfig::load(cli.config.as_deref());
    cli.apply(&mut config);

    let loaded = resolve_calibration(&config.calibration.file, config.manual_calibration())
        .context("Unable to start monitoring")?;
    if let Some(reason) = &loaded.fallback_reason {
        eprintln!(
            "WARNING: {}. Using manual calibration (slope={:.4}, intercept={:.4}).",
            reason.message(),
            loaded.model.slope,
            loaded.model.intercept
        );
    }

    let plan = SamplingPlan::from_config(&config.monitor.sampling)
        .context("invalid monitoring sampling settings")?;
    let mut source =
        ph_probe::build_voltage_source(&config.sensor).context("opening the probe ADC")?;

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let mut sink = WriterSink::new(io::stdout(), format);

    let clock = SystemClock::default();
    let mut monitor = Monitor::new(&clock, plan, config.monitor.cadence(), loaded.model);
    monitor
        .run(&mut source, &mut sink, cli.cycles)
        .context("Monitoring stopped")?;

    Ok(ExitCode::SUCCESS)
}
