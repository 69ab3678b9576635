use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::tempdir;

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("workspace root")
        .to_path_buf()
}

fn sample(name: &str) -> PathBuf {
    let path = workspace_root().join("tests").join("data").join(name);
    assert!(path.exists(), "sample CSV missing at {}", path.display());
    path
}

fn run_cli(args: &[&str]) -> Output {
    let mut cmd = if let Some(bin) = option_env!("CARGO_BIN_EXE_breakout_cli") {
        Command::new(bin)
    } else {
        let mut cmd = Command::new("cargo");
        cmd.args(["run", "-q", "-p", "breakout_cli", "--"]);
        cmd
    };
    cmd.args(args)
        .env("RUST_LOG", "warn")
        .current_dir(workspace_root())
        .output()
        .expect("failed to spawn breakout_cli")
}

#[test]
fn cli_reports_the_breakout_sample_as_passing() {
    let csv = sample("breakout_sample.csv");
    let output = run_cli(&[csv.to_str().expect("sample path")]);
    assert!(output.status.success(), "breakout_cli exited with {:?}", output.status);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Data read from CSV file:"));
    assert!(stdout.contains("Filtered DataFrame:"));
    assert!(stdout.contains("2023-08-20"), "breakout row missing:\n{stdout}");
    assert!(
        stdout.contains(&format!("Stocks that pass all filters: {}", csv.display())),
        "unexpected verdict:\n{stdout}"
    );
}

#[test]
fn cli_reports_none_for_short_history() {
    let csv = sample("short_history.csv");
    let temp_dir = tempdir().expect("temp log dir");
    let log_path = temp_dir.path().join("logs").join("breakout.log");
    let output = run_cli(&[
        csv.to_str().expect("sample path"),
        "--quiet",
        "--log-file",
        log_path.to_str().expect("log path"),
    ]);
    assert!(output.status.success(), "breakout_cli exited with {:?}", output.status);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "Stocks that pass all filters: None");
    assert!(log_path.exists(), "expected log file at {}", log_path.display());
}

#[test]
fn cli_fails_on_missing_volume_column() {
    let temp_dir = tempdir().expect("temp dir");
    let csv = temp_dir.path().join("no_volume.csv");
    std::fs::write(
        &csv,
        "Date,Open,High,Low,Close\n02-Jan-24,1,1,1,1\n03-Jan-24,1,1,1,1\n",
    )
    .expect("write csv");
    let output = run_cli(&[csv.to_str().expect("csv path")]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Column 'volume' not found in data"),
        "unexpected stderr:\n{stderr}"
    );

    // The loaded rows are still previewed before the screen fails.
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Data read from CSV file:"), "stdout:\n{stdout}");
    assert!(stdout.contains("2024-01-02"), "stdout:\n{stdout}");
    assert!(!stdout.contains("Stocks that pass all filters"));
}
