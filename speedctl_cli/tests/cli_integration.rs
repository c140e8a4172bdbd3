use assert_cmd::Command;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

// Minimal valid TOML config pointing the store into the temp dir
fn write_valid_config(dir: &Path) -> PathBuf {
    let store = dir.join("params.json");
    let toml = format!(
        r#"
[pwm]
channel = 0
clock_divider = 64
range = 1024

[store]
path = "{}"
"#,
        store.display().to_string().replace('\\', "/")
    );
    let path = dir.join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn speedctl(cfg: &Path) -> Command {
    let mut cmd = Command::cargo_bin("speedctl").unwrap();
    cmd.arg("--config").arg(cfg);
    cmd
}

fn responses(stdout: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["self-check"], 0, "OK", "stdout")]
#[case(&["show"], 0, "not yet persisted", "stdout")]
#[case(&["reset"], 0, "to defaults", "stdout")]
#[case(&["frobnicate"], 2, "unrecognized subcommand", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(dir.path());

    let mut cmd = speedctl(&cfg);
    for a in args {
        cmd.arg(a);
    }
    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn console_round_trip_persists_calibration() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(dir.path());
    let input = [
        r#"{"op":"increase","stepSize":25,"calib":false}"#,
        r#"{"op":"increase","stepSize":0}"#,
        r#"{"op":"increase","stepSize":25,"calib":true}"#,
        r#"{"op":"calibrateMax","maxSpeedUnit":1500}"#,
        r#"{"op":"status"}"#,
        "this is not json",
    ]
    .join("\n");

    let out = speedctl(&cfg)
        .arg("console")
        .write_stdin(input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let r = responses(&out);
    assert_eq!(r.len(), 6);
    assert_eq!(r[0]["status"], 200);
    assert_eq!(r[0]["currentDuty"], 114);
    assert_eq!(r[1]["status"], 400);
    assert_eq!(r[1]["reason"], "InvalidInput");
    assert_eq!(r[2]["currentDuty"], 128);
    assert_eq!(r[3]["status"], 200);
    assert_eq!(r[3]["currentDuty"], 128);
    assert_eq!(r[3]["currentStep"], 0);
    assert_eq!(r[4]["config"]["maxSpeedUnit"], 1500);
    assert_eq!(r[4]["config"]["maxDuty"], 128);
    assert_eq!(r[5]["status"], 400);

    let stored = fs::read_to_string(dir.path().join("params.json")).unwrap();
    let v: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(v["maxSpeedUnit"], 1500);
    assert_eq!(v["maxDuty"], 128);
}

#[test]
fn console_program_mode_sweeps_until_eof() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(dir.path());
    let input = [
        r#"{"op":"saveConfig","config":{"intervalMillis":5}}"#,
        r#"{"op":"programStart"}"#,
        r#"{"op":"programStart"}"#,
        r#"{"op":"programStop"}"#,
    ]
    .join("\n");
    let out = speedctl(&cfg)
        .arg("console")
        .write_stdin(input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let r = responses(&out);
    assert_eq!(r[0]["config"]["intervalMillis"], 5);
    assert_eq!(r[1]["program"], "sweeping");
    assert_eq!(r[2]["program"], "sweeping");
    assert_eq!(r[3]["program"], "idle");
}

#[test]
fn show_reads_legacy_params() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(dir.path());
    fs::write(
        dir.path().join("params.json"),
        r#"{"maxRevs":1800,"minRevs":800,"stepSize":50,"minStep":2,"maxStep":6,
            "intervalMs":500,"servoMinPWM":100,"servoMaxPWM":700}"#,
    )
    .unwrap();

    let out = speedctl(&cfg)
        .arg("--json")
        .arg("show")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["persisted"], true);
    assert_eq!(v["totalSteps"], 21);
    assert_eq!(v["config"]["maxSpeedUnit"], 1800);
    assert_eq!(v["steps"][1]["speed"], 800);
    assert_eq!(v["steps"][2]["speed"], 850);
    assert_eq!(v["steps"][21]["duty"], 700);
}

#[test]
fn corrupt_store_exits_with_io_code() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(dir.path());
    fs::write(dir.path().join("params.json"), "{ broken").unwrap();
    speedctl(&cfg)
        .arg("self-check")
        .assert()
        .code(5)
        .stderr(predicate::str::contains("record store could not be opened"));
}

#[test]
fn invalid_stored_record_exits_with_config_code() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(dir.path());
    fs::write(
        dir.path().join("params.json"),
        r#"{"minSpeedUnit":800,"maxSpeedUnit":2000,"stepSize":25,"minOscStep":10,
            "maxOscStep":20,"intervalMillis":1000,"minDuty":750,"maxDuty":100}"#,
    )
    .unwrap();
    speedctl(&cfg)
        .arg("--json")
        .arg("self-check")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("\"reason\":\"InvalidConfig\""));
}

#[test]
fn invalid_toml_is_rejected() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(&cfg, "[pwm]\nchannel = 7\n").unwrap();
    speedctl(&cfg)
        .arg("self-check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration is invalid"));
}

#[test]
fn missing_config_file_is_explained() {
    let dir = tempdir().unwrap();
    speedctl(&dir.path().join("nope.toml"))
        .arg("show")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--config"));
}

#[test]
fn reset_overwrites_store_with_configured_defaults() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(dir.path());
    let mut text = fs::read_to_string(&cfg).unwrap();
    text.push_str("\n[defaults]\nmaxSpeedUnit = 1600\n");
    fs::write(&cfg, text).unwrap();

    speedctl(&cfg).arg("reset").assert().success();
    let stored = fs::read_to_string(dir.path().join("params.json")).unwrap();
    let v: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(v["maxSpeedUnit"], 1600);
    assert_eq!(v["minSpeedUnit"], 800);
}
