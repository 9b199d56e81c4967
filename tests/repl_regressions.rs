mod common;

use common::{run_shell, run_with, shell_command, stderr_of, stdout_of};

#[test]
fn quoted_arguments_reach_builtins_intact() {
    let output = run_shell(&[r#"echo a "b   c" 'd e'"#]);
    let stdout = stdout_of(&output);
    assert!(stdout.contains("a b   c d e\n"), "stdout was: {stdout}");
}

#[test]
fn and_does_not_start_second_command_after_failure() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker");
    let line = format!("false && touch {}", marker.display());

    let output = run_shell(&[line.as_str(), "echo NEXT"]);
    assert!(!marker.exists());
    assert!(stdout_of(&output).contains("NEXT"));
}

#[test]
fn or_does_not_start_second_command_after_success() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker");
    let line = format!("true || touch {}", marker.display());

    run_shell(&[line.as_str()]);
    assert!(!marker.exists());
}

#[test]
fn failure_is_reported_and_fallback_runs() {
    let output = run_shell(&["sh -c 'exit 9' || echo FALLBACK"]);
    let stdout = stdout_of(&output);
    let stderr = stderr_of(&output);
    assert!(stdout.contains("FALLBACK"), "stdout was: {stdout}");
    assert!(stderr.contains("exited with code 9"), "stderr was: {stderr}");
}

#[test]
fn redirection_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let f = dir.path().join("f");
    let write = format!("echo hi > {}", f.display());
    let append = format!("echo bye >> {}", f.display());

    run_shell(&[write.as_str()]);
    assert_eq!(std::fs::read_to_string(&f).unwrap(), "hi\n");

    run_shell(&[append.as_str()]);
    assert_eq!(std::fs::read_to_string(&f).unwrap(), "hi\nbye\n");
}

#[test]
fn external_command_redirects_both_ways() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    let out = dir.path().join("out");
    std::fs::write(&input, "3\n1\n2\n").unwrap();
    let line = format!("sort < {} > {}", input.display(), out.display());

    run_shell(&[line.as_str()]);
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "1\n2\n3\n");
}

#[test]
fn environment_variables_expand() {
    let mut command = shell_command();
    command.env("PIPESH_IT_GREETING", "howdy");
    let output = run_with(command, &["echo $PIPESH_IT_GREETING partner-$PIPESH_IT_GREETING"]);
    let stdout = stdout_of(&output);
    assert!(stdout.contains("howdy partner-howdy"), "stdout was: {stdout}");
}

#[test]
fn cd_changes_directory_for_later_commands() {
    let dir = tempfile::tempdir().unwrap();
    let canonical = dir.path().canonicalize().unwrap();
    let line = format!("cd {} && pwd", dir.path().display());

    let output = run_shell(&[line.as_str()]);
    let stdout = stdout_of(&output);
    assert!(
        stdout.contains(&canonical.display().to_string()),
        "stdout was: {stdout}"
    );
}

#[test]
fn cd_without_home_is_argument_error() {
    let mut command = shell_command();
    command.env_remove("HOME");
    let output = run_with(command, &["cd || echo NOHOME"]);
    assert!(stdout_of(&output).contains("NOHOME"));
    assert!(stderr_of(&output).contains("cd: missing argument"));
}

#[test]
fn kill_without_pid_does_not_end_session() {
    let output = run_shell(&["kill", "echo STILL_HERE"]);
    assert!(stderr_of(&output).contains("kill: missing argument"));
    assert!(stdout_of(&output).contains("STILL_HERE"));
}

#[test]
fn unknown_command_reports_and_continues() {
    let output = run_shell(&["pipesh-no-such-command-xyz", "echo AFTER"]);
    assert!(stderr_of(&output).contains("pipesh-no-such-command-xyz"));
    assert!(stdout_of(&output).contains("AFTER"));
}

#[test]
fn exit_ends_session_with_success_and_skips_rest() {
    let output = run_shell(&["exit && echo NEVER", "echo NEVER_EITHER"]);
    let stdout = stdout_of(&output);
    assert!(output.status.success());
    assert!(!stdout.contains("NEVER"), "stdout was: {stdout}");
}

#[test]
fn end_of_input_exits_cleanly() {
    let mut child = shell_command().spawn().expect("spawn pipesh");
    drop(child.stdin.take());
    let output = child.wait_with_output().expect("wait output");
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("exit"));
}

#[test]
fn prompt_is_configurable() {
    let mut command = shell_command();
    command.env("PIPESH_PROMPT", "pipesh$ ");
    let output = run_with(command, &["echo x"]);
    assert!(stdout_of(&output).starts_with("pipesh$ "));
}

#[test]
fn kill_refuses_to_signal_own_group() {
    let output = run_shell(&[
        "kill 0 || echo REFUSED_ZERO",
        "kill -1 || echo REFUSED_ALL",
        "echo ALIVE",
    ]);
    let stdout = stdout_of(&output);
    let stderr = stderr_of(&output);
    assert!(stdout.contains("REFUSED_ZERO"), "stdout was: {stdout}");
    assert!(stdout.contains("REFUSED_ALL"), "stdout was: {stdout}");
    assert!(stdout.contains("ALIVE"), "stdout was: {stdout}");
    assert!(stderr.contains("kill: invalid pid: 0"), "stderr was: {stderr}");
    assert!(output.status.success());
}

#[test]
fn ps_streams_to_stdout_and_ignores_redirection() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("f");
    let line = format!("ps > {} && echo PS_OK", target.display());

    let output = run_shell(&[line.as_str()]);
    let stdout = stdout_of(&output);
    assert!(stdout.contains("PID"), "stdout was: {stdout}");
    assert!(stdout.contains("PS_OK"), "stdout was: {stdout}");
    assert!(!target.exists());
}
