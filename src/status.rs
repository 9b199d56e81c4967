use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use crate::error::{Result, ShellError};

/// Turn a reaped child's status into success or the matching error.
///
/// A non-zero exit keeps its code; termination by signal is reported as
/// [`ShellError::Signaled`] rather than folded into an exit code.
pub fn check(status: ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    if let Some(code) = status.code() {
        return Err(ShellError::ExitStatus { code });
    }
    if let Some(signal) = status.signal() {
        return Err(ShellError::Signaled { signal });
    }
    Err(ShellError::ExitStatus { code: 1 })
}
