// src/server/process.rs
use crate::config::ServerConfig;
use crate::error::{Error, Result};
use async_process::{Child, Command, Stdio};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one spawned process.
///
/// Every successful `start` produces a fresh id, so a restarted server can be
/// told apart from its predecessor even when the OS reuses the pid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ProcessId(Uuid);

impl ProcessId {
    // Private constructor, only usable within our crate
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a server entry
///
/// `Unknown` is only ever the initial value. Leaving `Running` requires an
/// exit event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    /// Never started since it was loaded
    #[default]
    Unknown,
    /// A process is (optimistically) running
    Running,
    /// The process exited after a stop request
    Stopped,
    /// Spawn failed or the process exited on its own
    Error,
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServerStatus::Unknown => "unknown",
            ServerStatus::Running => "running",
            ServerStatus::Stopped => "stopped",
            ServerStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// Termination request sent to a process's watcher task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Termination {
    /// SIGTERM on unix; immediate kill elsewhere.
    Graceful,
    /// SIGKILL.
    Forceful,
}

/// Spawn the configured command with piped stdio.
///
/// The parent environment is inherited and `config.env` is layered on top.
pub(crate) fn spawn(config: &ServerConfig) -> Result<Child> {
    let mut command = Command::new(&config.command);
    command.args(&config.args);

    // Set environment variables
    for (key, value) in &config.env {
        command.env(key, value);
    }

    // Configure stdio
    command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    command
        .spawn()
        .map_err(|e| Error::Process(format!("Failed to start process '{}': {}", config.command, e)))
}

/// Deliver a termination request to a live child.
pub(crate) fn terminate(child: &mut Child, request: Termination) -> Result<()> {
    match request {
        Termination::Graceful => send_sigterm(child),
        Termination::Forceful => child
            .kill()
            .map_err(|e| Error::Process(format!("Failed to kill process: {}", e))),
    }
}

#[cfg(unix)]
fn send_sigterm(child: &mut Child) -> Result<()> {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let pid = i32::try_from(child.id())
        .map_err(|_| Error::Process(format!("Pid {} out of range", child.id())))?;

    match signal::kill(Pid::from_raw(pid), Signal::SIGTERM) {
        Ok(()) => Ok(()),
        // Already exited; the watcher will observe the exit
        Err(nix::errno::Errno::ESRCH) => Ok(()),
        Err(e) => Err(Error::Process(format!("Failed to send SIGTERM: {}", e))),
    }
}

#[cfg(not(unix))]
fn send_sigterm(child: &mut Child) -> Result<()> {
    // No SIGTERM equivalent - terminate immediately
    child
        .kill()
        .map_err(|e| Error::Process(format!("Failed to kill process: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_ids_are_unique() {
        assert_ne!(ProcessId::new(), ProcessId::new());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ServerStatus::default().to_string(), "unknown");
        assert_eq!(ServerStatus::Error.to_string(), "error");
    }

    #[test]
    fn test_spawn_missing_executable_fails() {
        let config = ServerConfig {
            command: "definitely-not-a-real-binary-4f1c".to_string(),
            ..ServerConfig::default()
        };
        assert!(matches!(spawn(&config), Err(Error::Process(_))));
    }
}
