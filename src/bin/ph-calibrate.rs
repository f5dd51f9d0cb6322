use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use ph_probe::calibration::{
    describe_fit, load_calibration_record, run_guided, save_calibration, CalibrationModel,
    CalibrationPoint, CalibrationProcedure, CalibrationRecord, ConsoleOperator, LinearFit,
};
use ph_probe::clock::{Clock, SystemClock};
use ph_probe::config::{AppConfig, MANUAL_INTERCEPT, MANUAL_SLOPE};
use ph_probe::error::{log_calibration_error, CalibrationError, SensorError};
use ph_probe::sampling::{
    Sampler, SamplingPlan, SimulatedVoltageSource, VoltageSource, VoltageStats,
};

#[derive(Parser, Debug)]
#[command(
    name = "ph-calibrate",
    about = "Guided 2-3 buffer calibration for an analog pH probe"
)]
struct Cli {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Calibration file to write (defaults to the configured file)
    #[arg(long)]
    file: Option<PathBuf>,
    /// Buffer measurement as PH=VOLTS; repeat per buffer to fit without sampling
    #[arg(long = "point", value_parser = parse_point)]
    points: Vec<CalibrationPoint>,
    /// Sample a simulated probe that follows the manual calibration line
    #[arg(long)]
    simulate: bool,
    /// Print the stored calibration and exit
    #[arg(long)]
    show: bool,
    /// Fit and print the result without saving it
    #[arg(long)]
    dry_run: bool,
}

fn parse_point(value: &str) -> Result<CalibrationPoint, String> {
    let (ph, volts) = value
        .split_once('=')
        .ok_or_else(|| format!("expected PH=VOLTS, got '{}'", value))?;
    let ph: f64 = ph
        .trim()
        .parse()
        .map_err(|_| format!("invalid pH '{}'", ph))?;
    let volts: f64 = volts
        .trim()
        .parse()
        .map_err(|_| format!("invalid voltage '{}'", volts))?;
    Ok(CalibrationPoint::new(ph, volts))
}

/// Probe the buffers are sampled from
enum Probe {
    Hardware(Box<dyn VoltageSource>),
    /// Simulated probe whose voltage follows `line` inverted
    Simulated {
        source: SimulatedVoltageSource,
        line: CalibrationModel,
    },
}

impl Probe {
    fn measure<C: Clock>(
        &mut self,
        sampler: &Sampler<'_, C>,
        ph: f64,
    ) -> Result<VoltageStats, SensorError> {
        match self {
            Probe::Hardware(source) => sampler.sample_window(source),
            Probe::Simulated { source, line } => {
                source.set_centre((ph - line.intercept) / line.slope);
                sampler.sample_window(source)
            }
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

    let config = AppConfig::load(cli.config.as_deref());
    let path = cli
        .file
        .clone()
        .unwrap_or_else(|| config.calibration.file.clone());

    if cli.show {
        let record = load_calibration_record(&path)
            .with_context(|| format!("reading calibration from {}", path.display()))?;
        print_record(&record);
        return Ok(ExitCode::SUCCESS);
    }

    let clock = SystemClock::default();
    let mut procedure = CalibrationProcedure::new(&config.calibration);

    let record = if cli.points.is_empty() {
        run_interactive(&cli, &config, &clock, &mut procedure)?
    } else {
        fit_supplied_points(&cli.points, &clock, &mut procedure)?
    };

    if cli.dry_run {
        println!("Dry run: calibration not saved.");
        return Ok(ExitCode::SUCCESS);
    }

    save_calibration(&path, &record)
        .with_context(|| format!("saving calibration to {}", path.display()))?;
    println!("Calibration saved to {}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn fit_supplied_points(
    points: &[CalibrationPoint],
    clock: &SystemClock,
    procedure: &mut CalibrationProcedure,
) -> Result<CalibrationRecord> {
    let (fit, record) = record_points(points, clock.unix_time(), procedure)
        .map_err(report)
        .context("Calibration failed")?;
    for line in describe_fit(&fit) {
        println!("{}", line);
    }
    Ok(record)
}

fn record_points(
    points: &[CalibrationPoint],
    created_at: u64,
    procedure: &mut CalibrationProcedure,
) -> Result<(LinearFit, CalibrationRecord), CalibrationError> {
    procedure.set_buffer_count(points.len())?;
    for point in points {
        procedure.record_measurement(*point)?;
    }
    procedure.finalize(created_at)
}

fn run_interactive(
    cli: &Cli,
    config: &AppConfig,
    clock: &SystemClock,
    procedure: &mut CalibrationProcedure,
) -> Result<CalibrationRecord> {
    let plan = SamplingPlan::from_config(&config.calibration.sampling)
        .context("invalid calibration sampling settings")?;
    let sampler = Sampler::new(clock, plan);

    let mut probe = if cli.simulate {
        let (slope, intercept) = config
            .manual_calibration()
            .unwrap_or((MANUAL_SLOPE, MANUAL_INTERCEPT));
        Probe::Simulated {
            source: SimulatedVoltageSource::new(
                config.sensor.simulated_voltage,
                config.sensor.simulated_noise,
            ),
            line: CalibrationModel::new(slope, intercept),
        }
    } else {
        Probe::Hardware(
            ph_probe::build_voltage_source(&config.sensor).context("opening the probe ADC")?,
        )
    };

    println!();
    println!("pH Probe Calibration");
    println!("--------------------");
    println!(
        "Power the probe board for at least 15 minutes before calibrating. Rinse the probe \
         with distilled water and blot it dry between buffers."
    );

    let stdin = io::stdin();
    let mut operator = ConsoleOperator::new(stdin.lock(), io::stdout());
    let (_, record) = run_guided(
        procedure,
        &mut operator,
        |ph| probe.measure(&sampler, ph),
        clock.unix_time(),
    )
    .map_err(report)
    .context("Calibration failed")?;
    Ok(record)
}

fn report(err: CalibrationError) -> CalibrationError {
    log_calibration_error(&err, "ph-calibrate");
    err
}

fn print_record(record: &CalibrationRecord) {
    println!("slope     = {:.6}", record.slope);
    println!("intercept = {:.6}", record.intercept);
    if let Some(r_squared) = record.r_squared {
        println!("r^2       = {:.4}", r_squared);
    }
    if let Some(temperature) = record.temperature_c {
        println!("temperature = {:.1} C", temperature);
    }
    if let Some(created_at) = record.created_at {
        println!("created_at  = {}", created_at);
    }
    for (index, point) in record.points.iter().enumerate() {
        println!(
            "buffer #{}: pH {:.2} at {:.4} V",
            index + 1,
            point.reference_ph,
            point.measured_voltage
        );
    }
}
