// CLI integration tests for the datablock, plot, hist, and palette flows.
use std::io::Write;
use std::process::{Command, Output, Stdio};

use serde_json::Value;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_plotpipe");
    Command::new(exe)
}

fn run_with_stdin(args: &[&str], stdin_data: &str) -> Output {
    let mut child = cmd()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn");
    child
        .stdin
        .as_mut()
        .expect("stdin")
        .write_all(stdin_data.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait")
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn datablock_matches_the_serializer_contract() {
    let output = run_with_stdin(&["datablock"], "1 4\n2 5\n3 6\n");
    assert!(output.status.success());
    assert_eq!(stdout_text(&output), " 1 4\n 2 5\n 3 6\n");
}

#[test]
fn datablock_quotes_text_columns() {
    let output = run_with_stdin(&["datablock"], "1 1 One\n2 2 Two\n3 3 Three\n");
    assert!(output.status.success());
    assert_eq!(
        stdout_text(&output),
        " 1 1 \"One\"\n 2 2 \"Two\"\n 3 3 \"Three\"\n"
    );
}

#[test]
fn datablock_reads_files_too() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("points.dat");
    std::fs::write(&path, "# comment\n1, 4\n2, 5\n").expect("write");

    let output = cmd()
        .args(["datablock", path.to_str().unwrap()])
        .output()
        .expect("run");
    assert!(output.status.success());
    assert_eq!(stdout_text(&output), " 1 4\n 2 5\n");
}

#[test]
fn missing_input_file_maps_to_not_found() {
    let output = cmd()
        .args(["datablock", "/definitely/not/here.dat"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn shape_mismatch_exits_with_json_diagnostics() {
    let output = run_with_stdin(&["datablock"], "1 2\n3\n");
    assert_eq!(output.status.code(), Some(3));

    let stderr = String::from_utf8_lossy(&output.stderr);
    let value: Value = serde_json::from_str(stderr.lines().next().expect("line")).expect("json");
    let error = value.get("error").expect("error envelope");
    assert_eq!(error.get("kind").and_then(Value::as_str), Some("ShapeMismatch"));
    assert!(error.get("message").and_then(Value::as_str).unwrap_or_default().contains("line 2"));
    assert!(error.get("time").is_some());
}

#[test]
fn plot_dry_run_prints_the_exact_script() {
    let output = run_with_stdin(
        &["plot", "--dry-run", "--title", "demo", "--with", "lines"],
        "1 4\n2 5\n",
    );
    assert!(output.status.success());
    assert_eq!(
        stdout_text(&output),
        "set title \"demo\"\n$data << EOD\n 1 4\n 2 5\nEOD\nplot $data with lines\n"
    );
}

#[test]
fn plot_dry_run_carries_palette_and_extra_settings() {
    let output = run_with_stdin(
        &[
            "plot",
            "--dry-run",
            "--palette",
            "grays",
            "--set",
            "grid",
            "--set",
            "xlabel=\"t\"",
        ],
        "1 4\n",
    );
    assert!(output.status.success());
    let text = stdout_text(&output);
    assert!(text.contains("set palette defined (0 '#000000'"));
    assert!(text.contains("set grid\n"));
    assert!(text.contains("set xlabel \"t\"\n"));
}

#[test]
fn hist_prints_the_binned_data_block() {
    let output = run_with_stdin(&["hist", "--bins", "2"], "1\n2\n2\n3\n");
    assert!(output.status.success());
    assert_eq!(stdout_text(&output), " 1.5   1\n 2.5   3\n");
}

#[test]
fn stream_dry_run_keeps_the_window() {
    let output = run_with_stdin(
        &["stream", "--dry-run", "--every", "2", "--window", "2"],
        "1 4\n2 5\n3 6\n",
    );
    assert!(output.status.success());
    assert_eq!(
        stdout_text(&output),
        "$data << EOD\n 2 5\n 3 6\nEOD\nplot $data with lines\n"
    );
}

#[test]
fn palettes_json_lists_names() {
    let output = cmd().args(["palettes", "--json"]).output().expect("run");
    assert!(output.status.success());
    let value: Value = serde_json::from_str(stdout_text(&output).trim()).expect("json");
    let names = value
        .get("palettes")
        .and_then(Value::as_array)
        .expect("palettes array");
    assert!(names.iter().any(|name| name == "viridis"));
}

#[test]
fn palettes_prints_the_template_command() {
    let output = cmd().args(["palettes", "viridis"]).output().expect("run");
    assert!(output.status.success());
    assert!(stdout_text(&output).starts_with("set palette defined (0 '#440154'"));
}

#[test]
fn linetypes_prints_the_scheme_commands() {
    let output = cmd().args(["linetypes", "dark2"]).output().expect("run");
    assert!(output.status.success());
    let text = stdout_text(&output);
    assert_eq!(text.lines().count(), 9);
    assert_eq!(text.lines().last(), Some("set linetype cycle 8"));
}

#[test]
fn unknown_palette_exit_code() {
    let output = cmd().args(["palettes", "sunburst"]).output().expect("run");
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn bad_plot_style_is_a_usage_error() {
    let output = run_with_stdin(&["plot", "--dry-run", "--with", "sparkles"], "1 2\n");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    let output = cmd().args(["frobnicate"]).output().expect("run");
    assert_eq!(output.status.code(), Some(2));
}
