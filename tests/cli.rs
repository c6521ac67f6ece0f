use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::File;
use std::io::Write;

fn rocket_design() -> Command {
    Command::cargo_bin("rocket-design").expect("rocket-design bin")
}

#[test]
fn cli_prints_text_report_with_defaults() {
    rocket_design()
        .assert()
        .success()
        .stdout(predicate::str::contains("--- Trajectory ---"))
        .stdout(predicate::str::contains("Throat Diameter"))
        .stdout(predicate::str::contains("Core Diameter"))
        .stdout(predicate::str::contains("Peak Pressure"));
}

#[test]
fn cli_reads_toml_config_and_emits_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("motor.toml");
    let mut file = File::create(&config_path).expect("config create");
    writeln!(
        file,
        r#"target_altitude = 400.0

[chamber]
diameter_mm = 54.0
liner_thickness_mm = 1.5
"#
    )
    .unwrap();

    let output = rocket_design()
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "--format",
            "json",
            "--include-trace",
        ])
        .output()
        .expect("run rocket-design");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["trajectory"]["target_apogee"], 400.0);
    let apogee = report["trajectory"]["apogee"].as_f64().unwrap();
    assert!((apogee - 400.0).abs() < 1.0);
    assert!((report["grain"]["outer_diameter"].as_f64().unwrap() - 0.051).abs() < 1e-9);
    assert!(report["trace"]["samples"].as_array().unwrap().len() > 10);
    assert_eq!(report["trace"]["termination"]["kind"], "ground_impact");
}

#[test]
fn cli_rejects_liner_that_fills_the_chamber() {
    rocket_design()
        .args(["--liner-thickness", "27"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Infeasible geometry"));
}

#[test]
fn cli_rejects_invalid_config_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("bad.toml");
    std::fs::write(&config_path, "[nozzle]\nefficiency = 0.0\n").expect("config write");

    rocket_design()
        .args(["--config", config_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nozzle.efficiency"));
}

#[test]
fn cli_reports_missing_config_file() {
    rocket_design()
        .args(["--config", "does/not/exist.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading design input"));
}
