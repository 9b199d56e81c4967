use std::io;

use tracing::{debug, warn};

/// Send `signal` to a single process.
pub(crate) fn send_signal(pid: libc::pid_t, signal: libc::c_int) -> io::Result<()> {
    retry_kill(pid, signal)
}

/// Send `signal` to every process in the group led by `pgid`.
pub(crate) fn send_signal_to_group(pgid: libc::pid_t, signal: libc::c_int) -> io::Result<()> {
    if pgid <= 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "invalid process group id",
        ));
    }
    retry_kill(-pgid, signal)
}

/// SIGINT followed by SIGCONT, so a stopped group still sees the interrupt.
pub(crate) fn interrupt_group(pgid: libc::pid_t) -> io::Result<()> {
    send_signal_to_group(pgid, libc::SIGINT)?;
    send_signal_to_group(pgid, libc::SIGCONT)
}

fn retry_kill(target: libc::pid_t, signal: libc::c_int) -> io::Result<()> {
    loop {
        let rc = unsafe { libc::kill(target, signal) };
        if rc == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EINTR) {
            continue;
        }
        return Err(err);
    }
}

/// Hands the controlling terminal to a child's process group and gives it
/// back to the interpreter when dropped.
///
/// Inert unless stdin is a terminal whose foreground group is ours; children
/// in a background group would otherwise stop on their first terminal read.
pub(crate) struct ForegroundTerminalGuard {
    tty_fd: Option<libc::c_int>,
    shell_pgid: libc::pid_t,
}

impl ForegroundTerminalGuard {
    pub(crate) fn acquire(target_pgid: libc::pid_t) -> Self {
        let shell_pgid = unsafe { libc::getpgrp() };
        let fd = libc::STDIN_FILENO;
        let owns_terminal =
            unsafe { libc::isatty(fd) } == 1 && unsafe { libc::tcgetpgrp(fd) } == shell_pgid;
        if !owns_terminal {
            return Self {
                tty_fd: None,
                shell_pgid,
            };
        }

        match set_terminal_foreground(fd, target_pgid) {
            Ok(()) => Self {
                tty_fd: Some(fd),
                shell_pgid,
            },
            Err(e) => {
                debug!(pgid = target_pgid, "cannot hand over terminal: {e}");
                Self {
                    tty_fd: None,
                    shell_pgid,
                }
            }
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.tty_fd.is_some()
    }

    /// Move the terminal to another child group while the guard is held.
    pub(crate) fn hand_to(&self, pgid: libc::pid_t) {
        if let Some(fd) = self.tty_fd {
            if let Err(e) = set_terminal_foreground(fd, pgid) {
                debug!(pgid, "cannot hand over terminal: {e}");
            }
        }
    }
}

impl Drop for ForegroundTerminalGuard {
    fn drop(&mut self) {
        if let Some(fd) = self.tty_fd {
            if let Err(e) = set_terminal_foreground(fd, self.shell_pgid) {
                warn!("cannot reclaim terminal: {e}");
            }
        }
    }
}

/// Block until `pid` has exited, without reaping it.
///
/// The pid stays reserved as a zombie until the caller reaps it, so it can
/// be deregistered first. Job control is not supported: a child that stops
/// (terminal access from the background, Ctrl-Z, SIGSTOP) is given the
/// terminal and continued.
pub(crate) fn wait_until_exited(
    pid: libc::pid_t,
    terminal: Option<&ForegroundTerminalGuard>,
) -> io::Result<()> {
    loop {
        let mut info: libc::siginfo_t = unsafe { std::mem::zeroed() };
        let rc = unsafe {
            libc::waitid(
                libc::P_PID,
                pid as libc::id_t,
                &mut info,
                libc::WEXITED | libc::WSTOPPED | libc::WNOWAIT,
            )
        };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EINTR) {
                continue;
            }
            return Err(err);
        }

        if info.si_code != libc::CLD_STOPPED {
            return Ok(());
        }

        debug!(pid, "child stopped; resuming");
        if let Some(terminal) = terminal {
            terminal.hand_to(pid);
        }
        send_signal_to_group(pid, libc::SIGCONT)?;
    }
}

struct SignalIgnoreGuard {
    signal: libc::c_int,
    previous: libc::sighandler_t,
}

impl SignalIgnoreGuard {
    fn ignore(signal: libc::c_int) -> io::Result<Self> {
        let previous = unsafe { libc::signal(signal, libc::SIG_IGN) };
        if previous == libc::SIG_ERR {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { signal, previous })
    }
}

impl Drop for SignalIgnoreGuard {
    fn drop(&mut self) {
        unsafe {
            libc::signal(self.signal, self.previous);
        }
    }
}

fn set_terminal_foreground(fd: libc::c_int, pgid: libc::pid_t) -> io::Result<()> {
    if pgid <= 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "invalid process group id",
        ));
    }

    // A background group calling tcsetpgrp gets SIGTTOU.
    let _sigttou = SignalIgnoreGuard::ignore(libc::SIGTTOU)?;
    loop {
        let rc = unsafe { libc::tcsetpgrp(fd, pgid) };
        if rc == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EINTR) {
            continue;
        }
        return Err(err);
    }
}
