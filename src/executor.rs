use std::os::unix::process::CommandExt;
use std::process::{Child, Command, ExitStatus, Stdio};

use tracing::debug;

use crate::ast::RedirectionSpec;
use crate::error::{Result, ShellError};
use crate::job_control::{self, ForegroundTerminalGuard};
use crate::redirect::OpenedRedirections;
use crate::registry::{ProcessHandle, ProcessRegistry, Registration};
use crate::status;

/// Build a command for `argv` that starts as the leader of a new process
/// group, with stderr inherited.
pub(crate) fn command_for(program: &str, args: &[String]) -> Command {
    let mut command = Command::new(program);
    command
        .args(args)
        .process_group(0)
        .stderr(Stdio::inherit());
    command
}

/// Start `command`, mapping failure to [`ShellError::Spawn`].
pub(crate) fn spawn(command: &mut Command, program: &str) -> Result<Child> {
    command.spawn().map_err(|source| ShellError::Spawn {
        program: program.to_string(),
        source,
    })
}

/// Wait for `child` to exit, then deregister and reap it.
///
/// Deregistration happens while the exited child is still a zombie, so the
/// interrupt forwarder never sees a pid the kernel may already have reused.
pub(crate) fn reap(
    mut child: Child,
    registration: Registration<'_>,
    terminal: Option<&ForegroundTerminalGuard>,
) -> Result<ExitStatus> {
    job_control::wait_until_exited(child.id() as libc::pid_t, terminal)
        .map_err(ShellError::Wait)?;
    drop(registration);
    child.wait().map_err(ShellError::Wait)
}

/// Run one external program to completion.
///
/// Redirection targets are opened before anything is spawned. The child is
/// registered as soon as it has started and deregistered once it has
/// exited. It holds the terminal, if the interpreter has one, until then.
pub fn run_external(
    argv: &[String],
    redirection: &RedirectionSpec,
    registry: &ProcessRegistry,
) -> Result<()> {
    let Some((program, args)) = argv.split_first() else {
        return Ok(());
    };

    let files = OpenedRedirections::open(redirection)?;

    let mut command = command_for(program, args);
    command.stdin(files.stdin.map_or_else(Stdio::inherit, Stdio::from));
    command.stdout(files.stdout.map_or_else(Stdio::inherit, Stdio::from));

    let child = spawn(&mut command, program)?;
    // The child has its own copies of the redirection files now.
    drop(command);

    let pid = child.id();
    let registration = registry.register(ProcessHandle::leader(pid));
    debug!(program, pid, "started");

    let terminal = ForegroundTerminalGuard::acquire(pid as libc::pid_t);
    let exit = reap(child, registration, Some(&terminal))?;
    drop(terminal);
    debug!(program, pid, ?exit, "reaped");
    status::check(exit)
}
