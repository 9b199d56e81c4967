use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use tracing::debug;

use crate::editor::EDITOR_ACTIVE;
use crate::registry::ProcessRegistry;

/// Install the SIGINT forwarder for the rest of the process lifetime.
///
/// `ctrlc` runs the handler on its own thread, so the interpreter itself no
/// longer dies on SIGINT; instead every registered process group receives
/// the signal.
pub fn install(registry: Arc<ProcessRegistry>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        forward_interrupt(&registry);
    })
}

/// Send SIGINT to every registered process group and print a notice.
/// Returns the number of groups signalled.
///
/// SIGCONT follows, so a group stopped on terminal access still dies.
pub fn forward_interrupt(registry: &ProcessRegistry) -> usize {
    let signalled = registry.signal_all(libc::SIGINT);
    registry.signal_all(libc::SIGCONT);
    debug!(signalled, "forwarded interrupt");

    // While the editor owns the terminal the notice would garble the line.
    if !EDITOR_ACTIVE.load(Ordering::Relaxed) {
        let mut stdout = io::stdout();
        let _ = writeln!(stdout, "\n[Ctrl+C] interrupted");
        let _ = stdout.flush();
    }

    signalled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProcessHandle;
    use std::os::unix::process::{CommandExt, ExitStatusExt};
    use std::process::Command;

    #[test]
    fn interrupts_every_registered_group() {
        let registry = ProcessRegistry::new();
        let mut children: Vec<_> = (0..2)
            .map(|_| Command::new("sleep").arg("30").process_group(0).spawn().unwrap())
            .collect();
        for child in &children {
            registry.add(ProcessHandle::leader(child.id()));
        }

        assert_eq!(forward_interrupt(&registry), 2);
        for child in &mut children {
            assert_eq!(child.wait().unwrap().signal(), Some(libc::SIGINT));
        }
    }

    #[test]
    fn stopped_group_still_dies() {
        let registry = ProcessRegistry::new();
        let mut child = Command::new("sleep").arg("30").process_group(0).spawn().unwrap();
        let pid = child.id();
        let _guard = registry.register(ProcessHandle::leader(pid));

        unsafe { libc::kill(pid as libc::pid_t, libc::SIGSTOP) };
        assert_eq!(forward_interrupt(&registry), 1);
        assert_eq!(child.wait().unwrap().signal(), Some(libc::SIGINT));
    }

    #[test]
    fn empty_registry_signals_nothing() {
        assert_eq!(forward_interrupt(&ProcessRegistry::new()), 0);
    }
}
