// Process-tree termination capability
//
// The runner never signals processes directly. It asks a terminator, chosen once
// at startup, so a tool's own children die with it and tests can substitute a fake.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use sysinfo::{Pid, Signal, System};
use tracing::{debug, warn};

/// Terminates a child and every process it spawned
pub trait ProcessTerminator: Send + Sync {
    /// Ask the tree rooted at `pid` to exit gracefully
    fn request_exit(&self, pid: u32) -> io::Result<()>;

    /// Kill whatever is left of the tree rooted at `pid`
    fn force_kill(&self, pid: u32) -> io::Result<()>;

    fn name(&self) -> &'static str;
}

/// Platform default: process groups on Unix, process-table walk elsewhere
pub fn default_terminator() -> Arc<dyn ProcessTerminator> {
    #[cfg(unix)]
    {
        Arc::new(ProcessGroupTerminator)
    }
    #[cfg(not(unix))]
    {
        Arc::new(ProcessTreeTerminator::new())
    }
}

/// Signals the whole process group led by the child.
///
/// Relies on the runner spawning the child with `process_group(0)`, so the
/// group id equals the child pid and survives the leader's exit.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessGroupTerminator;

#[cfg(unix)]
impl ProcessGroupTerminator {
    fn signal_group(pid: u32, signal: libc::c_int) -> io::Result<()> {
        let pgid = libc::pid_t::try_from(pid)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
        // SAFETY: killpg has no memory-safety preconditions.
        let rc = unsafe { libc::killpg(pgid, signal) };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            debug!(pid, "process group already gone");
            return Ok(());
        }
        Err(err)
    }
}

#[cfg(unix)]
impl ProcessTerminator for ProcessGroupTerminator {
    fn request_exit(&self, pid: u32) -> io::Result<()> {
        Self::signal_group(pid, libc::SIGTERM)
    }

    fn force_kill(&self, pid: u32) -> io::Result<()> {
        Self::signal_group(pid, libc::SIGKILL)
    }

    fn name(&self) -> &'static str {
        "process-group"
    }
}

/// Walks the process table and kills descendants children-first.
///
/// Descendants seen at `request_exit` are remembered, because once the root
/// exits its children are re-parented and no longer reachable by walking.
#[derive(Debug, Default)]
pub struct ProcessTreeTerminator {
    snapshots: Mutex<HashMap<u32, Vec<Pid>>>,
}

impl ProcessTreeTerminator {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect_tree(sys: &System, root: Pid) -> Vec<Pid> {
        let mut children: HashMap<Pid, Vec<Pid>> = HashMap::new();
        for (pid, process) in sys.processes() {
            if let Some(parent) = process.parent() {
                children.entry(parent).or_default().push(*pid);
            }
        }

        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(pid) = stack.pop() {
            out.push(pid);
            if let Some(kids) = children.get(&pid) {
                stack.extend(kids.iter().copied());
            }
        }
        out
    }

    fn signal_all(sys: &System, pids: &[Pid], signal: Signal) {
        // Deepest first so parents cannot respawn killed children
        for pid in pids.iter().rev() {
            if let Some(process) = sys.process(*pid) {
                let delivered = process.kill_with(signal);
                if needs_hard_kill(signal, delivered) {
                    if !process.kill() {
                        warn!(pid = pid.as_u32(), "failed to kill process");
                    }
                } else if delivered != Some(true) {
                    debug!(pid = pid.as_u32(), ?signal, "signal not delivered, left to force kill");
                }
            }
        }
    }
}

/// Only the forced step falls back to a hard kill; a graceful request never does
fn needs_hard_kill(signal: Signal, delivered: Option<bool>) -> bool {
    signal == Signal::Kill && delivered != Some(true)
}

impl ProcessTerminator for ProcessTreeTerminator {
    fn request_exit(&self, pid: u32) -> io::Result<()> {
        let mut sys = System::new();
        sys.refresh_processes();
        let tree = Self::collect_tree(&sys, Pid::from_u32(pid));
        debug!(pid, tree_size = tree.len(), "requesting tree exit");

        Self::signal_all(&sys, &tree, Signal::Term);
        self.snapshots
            .lock()
            .map_err(|_| io::Error::other("snapshot lock poisoned"))?
            .insert(pid, tree);
        Ok(())
    }

    fn force_kill(&self, pid: u32) -> io::Result<()> {
        let mut sys = System::new();
        sys.refresh_processes();

        let mut tree = self
            .snapshots
            .lock()
            .map_err(|_| io::Error::other("snapshot lock poisoned"))?
            .remove(&pid)
            .unwrap_or_default();
        for live in Self::collect_tree(&sys, Pid::from_u32(pid)) {
            if !tree.contains(&live) {
                tree.push(live);
            }
        }

        debug!(pid, tree_size = tree.len(), "force killing tree");
        Self::signal_all(&sys, &tree, Signal::Kill);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "process-tree"
    }
}
