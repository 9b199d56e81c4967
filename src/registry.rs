use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::job_control;

/// A started external process. Every child is its own group leader, so
/// `pgid == pid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessHandle {
    pub pid: u32,
    pub pgid: u32,
}

impl ProcessHandle {
    pub fn leader(pid: u32) -> Self {
        Self { pid, pgid: pid }
    }
}

/// The set of external processes that are running right now.
///
/// Shared between the REPL (which adds and removes handles around every
/// spawn and reap) and the interrupt forwarder (which snapshots it). All
/// access goes through one mutex.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    live: Mutex<Vec<ProcessHandle>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ProcessHandle>> {
        // The list stays consistent even if a holder panicked.
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Track a process that has just started. Adding a pid twice is a no-op.
    pub fn add(&self, handle: ProcessHandle) {
        let mut live = self.lock();
        if !live.iter().any(|h| h.pid == handle.pid) {
            debug!(pid = handle.pid, pgid = handle.pgid, "registered");
            live.push(handle);
        }
    }

    /// Stop tracking a process after it has been reaped or killed.
    pub fn remove(&self, pid: u32) {
        let mut live = self.lock();
        let before = live.len();
        live.retain(|h| h.pid != pid);
        if live.len() != before {
            debug!(pid, "deregistered");
        }
    }

    /// Add `handle` and return a guard that removes it again when dropped.
    pub fn register(&self, handle: ProcessHandle) -> Registration<'_> {
        self.add(handle);
        Registration {
            registry: self,
            pid: handle.pid,
        }
    }

    /// Consistent copy of the current handles.
    pub fn snapshot(&self) -> Vec<ProcessHandle> {
        self.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Send `signal` to every registered process group.
    ///
    /// The list is snapshotted under the lock and signalled outside it.
    /// Returns how many groups accepted the signal.
    pub fn signal_all(&self, signal: libc::c_int) -> usize {
        let mut delivered = 0;
        for handle in self.snapshot() {
            match job_control::send_signal_to_group(handle.pgid as libc::pid_t, signal) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(pgid = handle.pgid, signal, "signal failed: {e}"),
            }
        }
        delivered
    }
}

/// Keeps a handle registered for as long as it lives.
#[derive(Debug)]
pub struct Registration<'a> {
    registry: &'a ProcessRegistry,
    pid: u32,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.registry.remove(self.pid);
    }
}
