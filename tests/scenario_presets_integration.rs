use std::process::Command;

#[derive(Debug)]
struct Summary {
    peak_load_mw: f64,
    resilience: f64,
    alerts: f64,
}

#[test]
fn scenario_files_run_via_cli_and_produce_distinct_outcomes() {
    let baseline = run_and_parse(&["--scenario", "scenarios/baseline.toml"]);
    let storm = run_and_parse(&["--scenario", "scenarios/storm_stress.toml"]);
    let hardened = run_and_parse(&["--scenario", "scenarios/hardened_core.toml"]);

    assert_eq!(baseline.resilience, 64.0);
    assert_eq!(storm.resilience, 43.0);
    assert!(
        hardened.resilience > storm.resilience,
        "expected hardening to raise resilience: storm={}, hardened={}",
        storm.resilience,
        hardened.resilience
    );
    assert!(
        storm.peak_load_mw > baseline.peak_load_mw,
        "expected storm peak above baseline: baseline={:.1}, storm={:.1}",
        baseline.peak_load_mw,
        storm.peak_load_mw
    );
    assert_eq!(baseline.alerts, 0.0);
    assert!(storm.alerts > hardened.alerts);
}

#[test]
fn presets_match_their_scenario_files() {
    let from_preset = run_and_parse(&["--preset", "storm_stress"]);
    let from_file = run_and_parse(&["--scenario", "scenarios/storm_stress.toml"]);
    assert_eq!(from_preset.resilience, from_file.resilience);
    assert_eq!(from_preset.peak_load_mw, from_file.peak_load_mw);
}

#[test]
fn pinned_preset_is_the_comparison_label() {
    let stdout = run_ok(&["--preset", "green_upgrade", "--pin", "storm_stress", "--hour", "18"]);
    assert!(stdout.contains("--- Compare vs Storm Stress (Pinned) ---"), "{stdout}");
    assert!(stdout.contains("--- Risk Feed (T+18h) ---"));
    assert!(stdout.contains("1. "));
}

#[test]
fn unknown_preset_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_citygrid-twin"))
        .args(["--preset", "tornado"])
        .output()
        .expect("citygrid-twin process should run");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown preset"));
}

#[test]
fn csv_exports_are_written() {
    let dir = std::env::temp_dir().join(format!("citygrid-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    let city = dir.join("city.csv");
    let districts = dir.join("districts.csv");

    run_ok(&[
        "--preset",
        "heatwave_ev_surge",
        "--telemetry-out",
        city.to_str().expect("utf-8 path"),
        "--districts-out",
        districts.to_str().expect("utf-8 path"),
    ]);

    let city_csv = std::fs::read_to_string(&city).expect("city csv should exist");
    let district_csv = std::fs::read_to_string(&districts).expect("district csv should exist");
    assert_eq!(city_csv.lines().count(), 74);
    assert_eq!(district_csv.lines().count(), 1 + 73 * 8);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unusable_seed_keeps_synthetic_curves() {
    let dir = std::env::temp_dir().join(format!("citygrid-seed-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    let empty = dir.join("empty.json");
    let usable = dir.join("seed.json");
    std::fs::write(&empty, "{}").expect("seed file should be writable");
    std::fs::write(
        &usable,
        r#"{"timestampISO": "2026-07-14T12:00:00Z", "systemDemandMW": 60000, "windMW": 15000, "solarMW": 5000}"#,
    )
    .expect("seed file should be writable");

    let output = Command::new(env!("CARGO_BIN_EXE_citygrid-twin"))
        .args(["--live-seed", empty.to_str().expect("utf-8 path")])
        .output()
        .expect("citygrid-twin process should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Live curves:           false"), "{stdout}");
    assert_eq!(parse_metric(&stdout, "Resilience score:", ""), 64.0);
    assert!(String::from_utf8_lossy(&output.stderr).contains("staying synthetic"));

    let stdout = run_ok(&["--live-seed", usable.to_str().expect("utf-8 path")]);
    assert!(stdout.contains("Live curves:           true"), "{stdout}");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn bare_rust_log_level_enables_debug_output() {
    let output = Command::new(env!("CARGO_BIN_EXE_citygrid-twin"))
        .env("RUST_LOG", "debug")
        .output()
        .expect("citygrid-twin process should run");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("DEBUG"));

    let quiet = Command::new(env!("CARGO_BIN_EXE_citygrid-twin"))
        .env_remove("RUST_LOG")
        .output()
        .expect("citygrid-twin process should run");
    assert!(!String::from_utf8_lossy(&quiet.stderr).contains("DEBUG"));
}

fn run_ok(args: &[&str]) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_citygrid-twin"))
        .args(args)
        .output()
        .expect("citygrid-twin process should run");

    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={} ",
        String::from_utf8_lossy(&output.stderr)
    );

    String::from_utf8(output.stdout).expect("stdout should be valid UTF-8")
}

fn run_and_parse(args: &[&str]) -> Summary {
    let stdout = run_ok(args);
    Summary {
        peak_load_mw: parse_metric(&stdout, "Peak load:", "MW"),
        resilience: parse_metric(&stdout, "Resilience score:", ""),
        alerts: parse_metric(&stdout, "Alerts:", ""),
    }
}

fn parse_metric(stdout: &str, label: &str, unit: &str) -> f64 {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing summary line `{label}` in output: {stdout}"));

    let raw = line
        .split_once(':')
        .map(|(_, right)| right.trim())
        .unwrap_or_else(|| panic!("invalid summary format for line `{line}`"));

    let numeric = raw.strip_suffix(unit).unwrap_or(raw).trim();
    numeric
        .parse::<f64>()
        .unwrap_or_else(|_| panic!("failed parsing `{numeric}` from summary line `{line}`"))
}
