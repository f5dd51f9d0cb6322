use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde_json::Value;

fn calibrate() -> Command {
    Command::new(env!("CARGO_BIN_EXE_ph-calibrate"))
}

fn monitor() -> Command {
    Command::new(env!("CARGO_BIN_EXE_ph-monitor"))
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("ph-probe-cli-{}-{}.json", name, std::process::id()))
}

fn path_arg(path: &PathBuf) -> &str {
    path.to_str().expect("temp path is UTF-8")
}

#[test]
fn calibrate_from_points_writes_record() {
    let file = temp_path("points");
    let output = calibrate()
        .args([
            "--file",
            path_arg(&file),
            "--point",
            "4.00=3.20",
            "--point",
            "7.00=2.80",
        ])
        .output()
        .expect("run ph-calibrate");

    assert!(
        output.status.success(),
        "ph-calibrate exited with {:?}",
        output.status.code()
    );
    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    assert!(stdout.contains("slope     = -7.500000"), "got {stdout}");
    assert!(stdout.contains("intercept = 28.000000"), "got {stdout}");

    let json: Value =
        serde_json::from_str(&std::fs::read_to_string(&file).expect("calibration written"))
            .expect("valid JSON record");
    assert!((json["slope"].as_f64().unwrap() + 7.5).abs() < 1e-9);
    assert_eq!(json["points"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["points"][0]["referencePh"], 4.0);

    let shown = calibrate()
        .args(["--show", "--file", path_arg(&file)])
        .output()
        .expect("run ph-calibrate --show");
    assert!(shown.status.success());
    let stdout = String::from_utf8(shown.stdout).expect("stdout UTF-8");
    assert!(stdout.contains("buffer #2: pH 7.00 at 2.8000 V"), "got {stdout}");

    std::fs::remove_file(&file).unwrap();
}

#[test]
fn calibrate_rejects_identical_voltages() {
    let file = temp_path("identical");
    let output = calibrate()
        .args([
            "--file",
            path_arg(&file),
            "--point",
            "4=2.5",
            "--point",
            "7=2.5",
        ])
        .output()
        .expect("run ph-calibrate");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("identical"), "got {stderr}");
    assert!(!file.exists());
}

#[test]
fn calibrate_rejects_single_point() {
    let output = calibrate()
        .args(["--dry-run", "--point", "7=2.5"])
        .output()
        .expect("run ph-calibrate");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("between 2 and 3"), "got {stderr}");
}

#[test]
fn guided_calibration_with_simulated_probe() {
    let file = temp_path("guided");
    let config = temp_path("guided-config");
    std::fs::write(
        &config,
        r#"{
            "sensor": { "simulated_noise": 0.0 },
            "calibration": {
                "sampling": { "window_ms": 0, "interval_ms": 0, "oversample": 1, "oversample_delay_ms": 0 }
            }
        }"#,
    )
    .unwrap();

    let mut child = calibrate()
        .args(["--simulate", "--config", path_arg(&config), "--file", path_arg(&file)])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn ph-calibrate");
    child
        .stdin
        .take()
        .expect("stdin piped")
        .write_all(b"2\n4.00\n\n7.00\n\n25\n")
        .unwrap();
    let output = child.wait_with_output().expect("wait for ph-calibrate");

    assert!(
        output.status.success(),
        "ph-calibrate exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    assert!(stdout.contains("Collecting samples for pH 4.00..."), "got {stdout}");
    assert!(stdout.contains("Calibration complete!"), "got {stdout}");

    let json: Value =
        serde_json::from_str(&std::fs::read_to_string(&file).expect("calibration written"))
            .expect("valid JSON record");
    assert!((json["slope"].as_f64().unwrap() + 5.6548).abs() < 1e-6);
    assert_eq!(json["temperatureC"], 25.0);

    std::fs::remove_file(&file).unwrap();
    std::fs::remove_file(&config).unwrap();
}

#[test]
fn monitor_uses_calibration_file() {
    let file = temp_path("monitor-cal");
    std::fs::write(&file, r#"{"slope": -7.5, "intercept": 28.0, "points": []}"#).unwrap();

    let output = monitor()
        .args([
            "--calibration-file",
            path_arg(&file),
            "--simulate-voltage",
            "3.0",
            "--simulate-noise",
            "0",
            "--window-ms",
            "0",
            "--cadence-secs",
            "0",
            "--cycles",
            "2",
        ])
        .output()
        .expect("run ph-monitor");

    assert!(output.status.success(), "ph-monitor exited with {:?}", output.status.code());
    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "got {stdout}");
    assert!(lines.iter().all(|line| line.ends_with("pH=5.50")), "got {stdout}");
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(!stderr.contains("WARNING"), "got {stderr}");

    std::fs::remove_file(&file).unwrap();
}

#[test]
fn monitor_warns_and_falls_back_without_file() {
    let file = temp_path("monitor-missing");
    let _ = std::fs::remove_file(&file);

    let output = monitor()
        .args([
            "--calibration-file",
            path_arg(&file),
            "--simulate-voltage",
            "2.0",
            "--simulate-noise",
            "0",
            "--window-ms",
            "0",
            "--cycles",
            "1",
            "--json",
        ])
        .output()
        .expect("run ph-monitor");

    assert!(output.status.success(), "ph-monitor exited with {:?}", output.status.code());
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("WARNING"), "got {stderr}");

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let reading: Value = serde_json::from_str(stdout.trim()).expect("JSON reading");
    let expected = -5.6548 * 2.0 + 15.509;
    assert!((reading["ph"].as_f64().unwrap() - expected).abs() < 1e-9);
    assert_eq!(reading["sequence"], 1);
}

#[test]
fn monitor_rejects_zero_cycles() {
    let output = monitor()
        .args(["--simulate", "--cycles", "0"])
        .output()
        .expect("run ph-monitor");

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("--cycles"), "got {stderr}");
}

#[test]
fn monitor_without_any_calibration_fails() {
    let file = temp_path("monitor-none");
    let _ = std::fs::remove_file(&file);

    let output = monitor()
        .args([
            "--calibration-file",
            path_arg(&file),
            "--no-fallback",
            "--simulate",
            "--cycles",
            "1",
        ])
        .output()
        .expect("run ph-monitor");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("No calibration available"), "got {stderr}");
}
