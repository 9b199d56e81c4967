use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while running one conditional segment.
///
/// None of these terminate the interpreter; they only decide whether the
/// segment counts as a failure for `&&` / `||` short-circuiting.
#[derive(Debug, Error)]
pub enum ShellError {
    /// A builtin got a missing or malformed argument.
    #[error("{0}")]
    Argument(String),

    /// A builtin's own system call failed (`cd` into a missing directory).
    #[error("{name}: {source}")]
    Builtin {
        name: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{}: {source}", path.display())]
    Redirection {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("pipe error: {0}")]
    Pipe(#[source] io::Error),

    #[error("empty command in pipeline")]
    EmptyStage,

    #[error("process exited with code {code}")]
    ExitStatus { code: i32 },

    #[error("process terminated by signal {signal}")]
    Signaled { signal: i32 },

    /// `kill(2)` refused to deliver a signal.
    #[error("kill {pid}: {source}")]
    Signal {
        pid: i32,
        #[source]
        source: io::Error,
    },

    #[error("wait failed: {0}")]
    Wait(#[source] io::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ShellError {
    /// Shell-style status for this error: the child's own code for a
    /// non-zero exit, `128 + N` for signal N, and 1 for everything else.
    pub fn status_code(&self) -> i32 {
        match self {
            ShellError::ExitStatus { code } => *code,
            ShellError::Signaled { signal } => 128 + signal,
            ShellError::Spawn { source, .. } if source.kind() == io::ErrorKind::NotFound => 127,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_status_message_keeps_code() {
        let err = ShellError::ExitStatus { code: 3 };
        assert_eq!(err.to_string(), "process exited with code 3");
        assert_eq!(err.status_code(), 3);
    }

    #[test]
    fn signal_termination_is_reported_distinctly() {
        let err = ShellError::Signaled { signal: libc::SIGINT };
        assert_eq!(err.status_code(), 130);
        assert!(err.to_string().contains("signal"));
    }

    #[test]
    fn missing_program_maps_to_127() {
        let err = ShellError::Spawn {
            program: "nope".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(err.status_code(), 127);
        assert!(err.to_string().starts_with("nope: "));
    }
}
