#![allow(dead_code)]

use std::io::Write;
use std::process::{Command, Output, Stdio};

pub fn shell_command() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_pipesh"));
    command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .env_remove("PIPESH_LOG")
        .env_remove("RUST_LOG");
    command
}

/// Feed `lines` to a fresh interpreter (followed by `exit`) and collect its output.
pub fn run_with(mut command: Command, lines: &[&str]) -> Output {
    let mut child = command.spawn().expect("spawn pipesh");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        for line in lines {
            writeln!(stdin, "{line}").expect("write line");
        }
        writeln!(stdin, "exit").expect("write exit");
    }

    child.wait_with_output().expect("wait output")
}

pub fn run_shell(lines: &[&str]) -> Output {
    run_with(shell_command(), lines)
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
