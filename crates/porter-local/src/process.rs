//! Shell snippets for PID-based process control.
//!
//! The same snippets run locally through `sh -c` and remotely as the
//! command of an ssh invocation.

/// Exits 0 iff a process with `pid` exists.
pub fn liveness_script(pid: u32) -> String {
    format!("kill -0 {}", pid)
}

/// Terminates `pid` and its direct children.
pub fn kill_tree_script(pid: u32) -> String {
    format!("pkill -TERM -P {pid}; kill -TERM {pid}")
}
