//! Integration tests for the monitoring workflow
//!
//! These tests cover model selection at startup and the hourly loop driven
//! by a manual clock.

use std::path::PathBuf;
use std::time::Duration;

use ph_probe::calibration::{resolve_calibration, ModelSource};
use ph_probe::clock::ManualClock;
use ph_probe::config::{AppConfig, MANUAL_INTERCEPT, MANUAL_SLOPE};
use ph_probe::error::{ErrorCode, StorageError};
use ph_probe::monitor::{Monitor, OutputFormat, WriterSink};
use ph_probe::sampling::{SamplingPlan, SimulatedVoltageSource};

fn temp_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("ph-probe-monitor-{}-{}.json", name, std::process::id()))
}

#[test]
fn test_missing_file_falls_back_to_manual_constants() {
    let config = AppConfig::default();
    let path = temp_file("missing");
    let _ = std::fs::remove_file(&path);

    let loaded = resolve_calibration(&path, config.manual_calibration()).unwrap();

    assert_eq!(loaded.source, ModelSource::Manual);
    assert_eq!(loaded.model.slope, MANUAL_SLOPE);
    assert_eq!(loaded.model.intercept, MANUAL_INTERCEPT);
    assert!(matches!(
        loaded.fallback_reason,
        Some(StorageError::NotFound { .. })
    ));

    let clock = ManualClock::new();
    let plan = SamplingPlan::from_config(&config.monitor.sampling).unwrap();
    let mut monitor = Monitor::new(&clock, plan, config.monitor.cadence(), loaded.model);
    let mut source = SimulatedVoltageSource::constant(2.0);
    let mut sink = WriterSink::new(Vec::new(), OutputFormat::Text);

    monitor.run(&mut source, &mut sink, Some(1)).unwrap();

    let out = String::from_utf8(sink.into_inner()).unwrap();
    let expected = MANUAL_SLOPE * 2.0 + MANUAL_INTERCEPT;
    assert!(out.contains(&format!("pH={:.2}", expected)), "{}", out);
}

#[test]
fn test_malformed_file_falls_back() {
    let path = temp_file("malformed");
    std::fs::write(&path, "{\"slope\": \"steep\"}").unwrap();

    let loaded = resolve_calibration(&path, Some((-6.0, 21.0))).unwrap();
    assert_eq!(loaded.source, ModelSource::Manual);
    assert_eq!(loaded.fallback_reason.map(|err| err.code()), Some(3002));

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_no_file_and_no_manual_constants_is_fatal() {
    let path = temp_file("absent");
    let _ = std::fs::remove_file(&path);

    let err = resolve_calibration(&path, None).unwrap_err();
    assert_eq!(err.code(), 3005);
}

#[test]
fn test_hourly_json_readings() {
    let clock = ManualClock::new();
    let config = AppConfig::default();
    let plan = SamplingPlan::from_config(&config.monitor.sampling).unwrap();
    let model = ph_probe::calibration::CalibrationModel::new(-7.5, 28.0);
    let mut monitor = Monitor::new(&clock, plan, config.monitor.cadence(), model);
    let mut source = SimulatedVoltageSource::sequence(vec![2.99, 3.01]);
    let mut sink = WriterSink::new(Vec::new(), OutputFormat::Json);

    monitor.run(&mut source, &mut sink, Some(2)).unwrap();

    let out = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<serde_json::Value> = out
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["elapsedSecs"], 0);
    assert_eq!(lines[1]["elapsedSecs"], 3600);
    for line in &lines {
        assert_eq!(line["sampleCount"], 50);
        assert!((line["meanVoltage"].as_f64().unwrap() - 3.0).abs() < 1e-9);
        assert!((line["ph"].as_f64().unwrap() - 5.5).abs() < 1e-6);
        assert!(line["stdDevVoltage"].as_f64().unwrap() > 0.0);
    }
    assert_eq!(clock.elapsed(), Duration::from_secs(3610));
}
