/// Server process management module for MCP Registry.
///
/// This module handles the lifecycle of server processes: spawning, output
/// capture, exit attribution and termination with escalation.
/// Lifecycle operations are instrumented with `tracing` spans.
///
/// # Components
///
/// * `lifecycle` - Per-entry runtime state and status transition history
/// * `logs` - Bounded capture of process output
/// * `process` - Process identity, status and spawn/signal primitives
/// * `supervisor` - The start/stop/restart/stop-all state machine
///
/// # Examples
///
/// ```no_run
/// use mcp_registry::config::{Scope, ServerConfig};
/// use mcp_registry::registry::ServerEntry;
/// use mcp_registry::server::{ProcessSupervisor, ServerStatus, SupervisorSettings};
/// use mcp_registry::Notifier;
///
/// # async fn demo() -> mcp_registry::Result<()> {
/// let supervisor = ProcessSupervisor::new(SupervisorSettings::default(), Notifier::new());
/// let entry = ServerEntry::new(
///     Scope::Local,
///     "fetch",
///     ServerConfig { command: "uvx".to_string(), args: vec!["mcp-server-fetch".to_string()], ..ServerConfig::default() },
/// );
///
/// supervisor.start(&entry).await?;
/// assert_eq!(entry.status(), ServerStatus::Running);
/// supervisor.stop(&entry).await?;
/// assert_eq!(entry.status(), ServerStatus::Stopped);
/// # Ok(())
/// # }
/// ```
pub mod lifecycle;
pub mod logs;
mod process;
mod supervisor;

pub use lifecycle::{LifecycleEvent, ServerRuntime};
pub use logs::{LogBuffer, LogLine, LogStream};
pub use process::{ProcessId, ServerStatus};
pub use supervisor::{ProcessSupervisor, StopAllReport, StopOutcome, SupervisorSettings};
