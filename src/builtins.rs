use std::io::{self, Write};

use tracing::debug;

use crate::ast::RedirectionSpec;
use crate::error::{Result, ShellError};
use crate::executor;
use crate::job_control;
use crate::redirect::open_output;
use crate::registry::ProcessRegistry;

/// The list of all builtin command names.
const BUILTINS: &[&str] = &["cd", "pwd", "echo", "help", "kill", "ps", "exit"];

const HELP: &str = "Builtins: cd <path>, pwd, echo <args>, kill <pid>, ps, exit, help";

#[derive(Debug, PartialEq, Eq)]
pub enum BuiltinAction {
    Continue,
    /// Registered process groups have been sent SIGTERM; the interpreter
    /// should now exit with status 0.
    Exit,
}

/// Returns true if the command name is a shell builtin.
pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

/// Execute a builtin, writing any text it produces to `stdout` unless
/// `redirection` names an output file.
///
/// Input redirection is accepted and ignored. `ps` always streams straight
/// to the inherited standard output.
pub fn execute(
    argv: &[String],
    redirection: &RedirectionSpec,
    registry: &ProcessRegistry,
    stdout: &mut dyn Write,
) -> Result<BuiltinAction> {
    let Some((name, args)) = argv.split_first() else {
        return Ok(BuiltinAction::Continue);
    };
    debug!(builtin = %name, "running builtin");

    let output = match name.as_str() {
        "cd" => builtin_cd(args)?,
        "pwd" => builtin_pwd()?,
        "echo" => builtin_echo(args),
        "help" => Some(HELP.to_string()),
        "kill" => {
            builtin_kill(args)?;
            return Ok(BuiltinAction::Continue);
        }
        "ps" => {
            builtin_ps(registry)?;
            return Ok(BuiltinAction::Continue);
        }
        "exit" => {
            let signalled = registry.signal_all(libc::SIGTERM);
            debug!(signalled, "exit requested");
            return Ok(BuiltinAction::Exit);
        }
        other => return Err(ShellError::Argument(format!("unknown builtin: {other}"))),
    };

    write_output(output.as_deref(), redirection, stdout)?;
    Ok(BuiltinAction::Continue)
}

fn write_output(
    output: Option<&str>,
    redirection: &RedirectionSpec,
    stdout: &mut dyn Write,
) -> Result<()> {
    match redirection.stdout_path.as_deref() {
        Some(path) => {
            // The file is created or truncated even when there is nothing to write.
            let mut file = open_output(path, redirection.append)?;
            if let Some(text) = output {
                writeln!(file, "{text}")?;
            }
        }
        None => {
            if let Some(text) = output {
                writeln!(stdout, "{text}")?;
                stdout.flush()?;
            }
        }
    }
    Ok(())
}

fn builtin_cd(args: &[String]) -> Result<Option<String>> {
    let target = match args.first() {
        Some(dir) => dir.clone(),
        None => std::env::var("HOME")
            .ok()
            .filter(|home| !home.is_empty())
            .ok_or_else(|| ShellError::Argument("cd: missing argument".into()))?,
    };

    std::env::set_current_dir(&target).map_err(|source| ShellError::Builtin {
        name: "cd",
        source: io::Error::new(source.kind(), format!("{target}: {source}")),
    })?;
    Ok(None)
}

fn builtin_pwd() -> Result<Option<String>> {
    let cwd = std::env::current_dir().map_err(|source| ShellError::Builtin {
        name: "pwd",
        source,
    })?;
    Ok(Some(cwd.display().to_string()))
}

fn builtin_echo(args: &[String]) -> Option<String> {
    if args.is_empty() {
        None
    } else {
        Some(args.join(" "))
    }
}

fn builtin_kill(args: &[String]) -> Result<()> {
    let arg = args
        .first()
        .ok_or_else(|| ShellError::Argument("kill: missing argument".into()))?;
    // 0 and negative values address whole groups, the interpreter's included.
    let pid = arg
        .parse::<libc::pid_t>()
        .ok()
        .filter(|pid| *pid > 0)
        .ok_or_else(|| ShellError::Argument(format!("kill: invalid pid: {arg}")))?;

    job_control::send_signal(pid, libc::SIGTERM)
        .map_err(|source| ShellError::Signal { pid, source })
}

fn builtin_ps(registry: &ProcessRegistry) -> Result<()> {
    let argv = ["ps".to_string(), "aux".to_string()];
    executor::run_external(&argv, &RedirectionSpec::default(), registry)
}
