use std::fs::File;
use std::process::{Child, Stdio};

use os_pipe::{PipeReader, PipeWriter};
use tracing::{debug, warn};

use crate::ast::RedirectionSpec;
use crate::error::{Result, ShellError};
use crate::executor::{command_for, reap, spawn};
use crate::expander::expand;
use crate::job_control::{self, ForegroundTerminalGuard};
use crate::parser::tokenize;
use crate::redirect::{extract_redirections, open_input, open_output};
use crate::registry::{ProcessHandle, ProcessRegistry, Registration};
use crate::status;

/// Where a stage reads from. Owns the descriptor until the stage is spawned.
#[derive(Debug)]
enum StageInput {
    Inherit,
    File(File),
    Pipe(PipeReader),
}

/// Where a stage writes to. Owns the descriptor until the stage is spawned.
#[derive(Debug)]
enum StageOutput {
    Inherit,
    File(File),
    Pipe(PipeWriter),
}

impl From<StageInput> for Stdio {
    fn from(input: StageInput) -> Self {
        match input {
            StageInput::Inherit => Stdio::inherit(),
            StageInput::File(file) => file.into(),
            StageInput::Pipe(reader) => reader.into(),
        }
    }
}

impl From<StageOutput> for Stdio {
    fn from(output: StageOutput) -> Self {
        match output {
            StageOutput::Inherit => Stdio::inherit(),
            StageOutput::File(file) => file.into(),
            StageOutput::Pipe(writer) => writer.into(),
        }
    }
}

/// One fully wired, not yet started stage.
///
/// Each pipe end and redirection file belongs to exactly one stage. It is
/// handed to the child when that stage is spawned and closed in the parent
/// right after; stages that never start close theirs when dropped.
#[derive(Debug)]
struct Stage {
    argv: Vec<String>,
    stdin: StageInput,
    stdout: StageOutput,
}

/// A started stage. Dropping it deregisters the process.
struct RunningStage<'r> {
    program: String,
    child: Child,
    registration: Registration<'r>,
}

/// Run `text` as a `|`-separated pipeline of external programs.
///
/// The split on `|` is purely textual; quotes do not protect a `|`. Every
/// stage is tokenized, expanded and stripped of redirections on its own,
/// but only the first stage's `<` and the last stage's `>`/`>>` apply.
///
/// If a stage fails to start, the stages already running are killed and
/// reaped before the error is returned. Otherwise every stage is waited
/// on in order and the last failure, if any, is returned.
///
/// On a terminal, the foreground goes to the first stage when it reads the
/// inherited stdin, otherwise to the last stage.
pub fn run_pipeline(text: &str, registry: &ProcessRegistry) -> Result<()> {
    let parsed = parse_stages(text)?;
    let stages = wire(parsed)?;
    let foreground = match stages.first() {
        Some(Stage {
            stdin: StageInput::Inherit,
            ..
        }) => 0,
        _ => stages.len().saturating_sub(1),
    };
    let running = start(stages, registry)?;

    let terminal = running
        .get(foreground)
        .map(|stage| ForegroundTerminalGuard::acquire(stage.child.id() as libc::pid_t));
    wait_all(running, terminal.as_ref())
}

fn parse_stages(text: &str) -> Result<Vec<(Vec<String>, RedirectionSpec)>> {
    text.split('|')
        .map(|part| {
            let (argv, redirection) = extract_redirections(expand(tokenize(part)));
            if argv.is_empty() {
                return Err(ShellError::EmptyStage);
            }
            Ok((argv, redirection))
        })
        .collect()
}

/// Allocate the pipes and open the redirection files, producing one
/// [`Stage`] per command. On error, everything opened so far is closed.
fn wire(parsed: Vec<(Vec<String>, RedirectionSpec)>) -> Result<Vec<Stage>> {
    let last = parsed.len().saturating_sub(1);
    let mut stages = Vec::with_capacity(parsed.len());
    let mut upstream: Option<PipeReader> = None;

    for (i, (argv, redirection)) in parsed.into_iter().enumerate() {
        let stdin = match upstream.take() {
            Some(reader) => StageInput::Pipe(reader),
            None => match redirection.stdin_path.as_deref() {
                Some(path) => StageInput::File(open_input(path)?),
                None => StageInput::Inherit,
            },
        };

        let stdout = if i == last {
            match redirection.stdout_path.as_deref() {
                Some(path) => StageOutput::File(open_output(path, redirection.append)?),
                None => StageOutput::Inherit,
            }
        } else {
            let (reader, writer) = os_pipe::pipe().map_err(ShellError::Pipe)?;
            upstream = Some(reader);
            StageOutput::Pipe(writer)
        };

        let ignored_stdin = i != 0 && redirection.stdin_path.is_some();
        let ignored_stdout = i != last && redirection.stdout_path.is_some();
        if ignored_stdin || ignored_stdout {
            debug!(stage = i, "redirection inside pipeline ignored");
        }

        stages.push(Stage {
            argv,
            stdin,
            stdout,
        });
    }

    Ok(stages)
}

/// Spawn every stage in order, registering each as soon as it starts.
fn start(stages: Vec<Stage>, registry: &ProcessRegistry) -> Result<Vec<RunningStage<'_>>> {
    let mut running: Vec<RunningStage<'_>> = Vec::with_capacity(stages.len());

    for stage in stages {
        let Some((program, args)) = stage.argv.split_first() else {
            continue;
        };

        let mut command = command_for(program, args);
        command.stdin(stage.stdin).stdout(stage.stdout);

        let child = match spawn(&mut command, program) {
            Ok(child) => child,
            Err(e) => {
                rollback(running);
                return Err(e);
            }
        };
        // Close the parent's copies of this stage's pipe ends and files.
        drop(command);

        let registration = registry.register(ProcessHandle::leader(child.id()));
        debug!(program, pid = child.id(), "stage started");
        running.push(RunningStage {
            program: program.clone(),
            child,
            registration,
        });
    }

    Ok(running)
}

/// Kill and reap stages that were started before a sibling failed to start.
fn rollback(running: Vec<RunningStage<'_>>) {
    for stage in running {
        let pid = stage.child.id();
        warn!(program = %stage.program, pid, "killing stage after pipeline start failure");
        if let Err(e) = job_control::send_signal_to_group(pid as libc::pid_t, libc::SIGKILL) {
            debug!(pid, "kill failed: {e}");
        }
        if let Err(e) = reap(stage.child, stage.registration, None) {
            debug!(pid, "reap failed: {e}");
        }
    }
}

/// Wait on every stage in start order.
///
/// With the terminal handed over, Ctrl-C only reaches the foreground stage's
/// group. When a stage dies of SIGINT the later stages are interrupted too.
fn wait_all(
    running: Vec<RunningStage<'_>>,
    terminal: Option<&ForegroundTerminalGuard>,
) -> Result<()> {
    let pids: Vec<u32> = running.iter().map(|stage| stage.child.id()).collect();
    let forward_interrupts = terminal.is_some_and(ForegroundTerminalGuard::is_active);
    let mut last_error = None;

    for (i, stage) in running.into_iter().enumerate() {
        let program = stage.program;
        let outcome = reap(stage.child, stage.registration, terminal).and_then(status::check);

        let interrupted =
            matches!(outcome, Err(ShellError::Signaled { signal }) if signal == libc::SIGINT);
        if interrupted && forward_interrupts {
            for &pid in &pids[i + 1..] {
                if let Err(e) = job_control::interrupt_group(pid as libc::pid_t) {
                    debug!(pid, "interrupt failed: {e}");
                }
            }
        }

        if let Err(e) = outcome {
            debug!(program = %program, "stage failed: {e}");
            last_error = Some(e);
        }
    }

    match last_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
