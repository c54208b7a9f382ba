// Session plumbing tests using `cat` as a stand-in engine: whatever the CLI
// writes down the pipe comes straight back on stdout.
#![cfg(unix)]

use std::io::Write;
use std::process::{Command, Output, Stdio};

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

#[test]
fn script_round_trips_through_the_engine() {
    let output = run_with_stdin(
        &["--program", "cat", "script"],
        "set grid\nplot sin(x)\n",
    );
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "set grid\nplot sin(x)\nquit\n"
    );
}

#[test]
fn plot_writes_blocks_and_commands_down_the_pipe() {
    let output = run_with_stdin(
        &["--program", "cat", "plot", "--title", "demo"],
        "1 4\n2 5\n",
    );
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "set title \"demo\"\n$data << EOD\n 1 4\n 2 5\nEOD\nplot $data with lines\nquit\n"
    );
}

#[test]
fn spawn_failure_reports_the_program() {
    let output = run_with_stdin(
        &["--program", "plotpipe-no-such-engine", "plot"],
        "1 4\n",
    );
    assert_eq!(output.status.code(), Some(6));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("plotpipe-no-such-engine"));
}
