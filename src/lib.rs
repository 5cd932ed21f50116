/*!
 # MCP Registry

 A Rust library for discovering MCP server definitions and supervising the
 processes they describe.

 ## Overview

 MCP Registry provides functionality to:
 - Read server definitions from a user-wide (global) and a per-project
   (local) configuration file
 - Merge both scopes into one addressable registry, local shadowing global
   on name lookup
 - Start, stop, restart and bulk-stop the server processes
 - Capture each server's output and track its status
 - Notify a presentation layer whenever anything changed

 ## Basic Usage

 ```no_run
 use mcp_registry::{McpManager, Result, ScopeFilter};

 #[tokio::main]
 async fn main() -> Result<()> {
     // Local scope is read from <workspace>/.vscode/mcp.json
     let mut manager = McpManager::new(Some(std::env::current_dir().unwrap()));
     manager.load().await;

     for entry in manager.entries(ScopeFilter::Both) {
         println!("{} [{}]", entry.display_name(), entry.status());
     }

     // Local definition wins when both scopes define "fetch"
     manager.start_server("fetch").await?;

     // Always stop everything before dropping the manager
     let report = manager.shutdown().await;
     if let Some(summary) = report.summary() {
         eprintln!("{}", summary);
     }

     Ok(())
 }
 ```

 ## Features

 - **Two-scope configuration**: Deterministic precedence, fail-open loading
 - **Process supervision**: Graceful termination with forced-kill escalation
 - **Crash attribution**: Deliberate stops end `stopped`, anything else `error`
 - **Change notification**: Payload-free invalidation for re-rendering
 - **Async Support**: Full async/await support on tokio

 ## License

 This project is licensed under the terms in the LICENSE file.
*/

pub mod config;
pub mod error;
pub mod notifier;
pub mod registry;
pub mod server;

pub use config::{ConfigFile, ConfigPaths, Scope, ServerConfig};
pub use error::{Error, Result};
pub use notifier::{ChangeListener, Notifier};
pub use registry::{Registry, ScopeFilter, ServerEntry, ServerKey};
pub use server::{
    ProcessId, ProcessSupervisor, ServerStatus, StopAllReport, StopOutcome, SupervisorSettings,
};

use std::path::PathBuf;

/// Registry, supervisor and notifier wired together.
///
/// This struct is the main entry point for a presentation layer. By-name
/// operations resolve through [`Registry::find_by_name`], so they act on the
/// local definition when both scopes define the same name; use
/// [`McpManager::supervisor`] with an explicit entry to reach the other one.
///
/// Call [`McpManager::shutdown`] before dropping it: dropping only kills
/// processes without recording their exit.
/// Loading, the by-name operations and `shutdown` are instrumented with
/// `tracing` spans; the accessors are not.
pub struct McpManager {
    registry: Registry,
    supervisor: ProcessSupervisor,
    notifier: Notifier,
}

impl McpManager {
    /// Create a manager for an optional workspace with default settings
    #[tracing::instrument(skip(workspace_root), fields(workspace = ?workspace_root))]
    pub fn new(workspace_root: Option<PathBuf>) -> Self {
        Self::with_settings(ConfigPaths::new(workspace_root), SupervisorSettings::default())
    }

    /// Create a manager with explicit paths and supervisor settings
    pub fn with_settings(paths: ConfigPaths, settings: SupervisorSettings) -> Self {
        tracing::info!("Creating new McpManager");
        let notifier = Notifier::new();
        Self {
            registry: Registry::new(paths, notifier.clone()),
            supervisor: ProcessSupervisor::new(settings, notifier.clone()),
            notifier,
        }
    }

    /// Create a manager around an existing registry
    pub fn from_registry(registry: Registry, settings: SupervisorSettings) -> Self {
        let notifier = registry.notifier().clone();
        Self {
            supervisor: ProcessSupervisor::new(settings, notifier.clone()),
            registry,
            notifier,
        }
    }

    /// Re-read both configuration scopes
    #[tracing::instrument(skip(self))]
    pub async fn load(&mut self) {
        self.registry.load().await;
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn supervisor(&self) -> &ProcessSupervisor {
        &self.supervisor
    }

    pub fn subscribe(&self) -> ChangeListener {
        self.notifier.subscribe()
    }

    pub fn entries(&self, filter: ScopeFilter) -> Vec<ServerEntry> {
        self.registry.entries(filter)
    }

    /// Look up a server by name (local first)
    #[tracing::instrument(skip(self), fields(server_name = %name))]
    pub fn find(&self, name: &str) -> Result<ServerEntry> {
        self.registry.find_by_name(name).cloned().ok_or_else(|| {
            tracing::warn!("Server requested for unknown name");
            Error::ServerNotFound(name.to_string())
        })
    }

    /// Start a server by name
    #[tracing::instrument(skip(self), fields(server_name = %name))]
    pub async fn start_server(&self, name: &str) -> Result<ProcessId> {
        let entry = self.find(name)?;
        self.supervisor.start(&entry).await
    }

    /// Stop a server by name
    #[tracing::instrument(skip(self), fields(server_name = %name))]
    pub async fn stop_server(&self, name: &str) -> Result<StopOutcome> {
        let entry = self.find(name)?;
        self.supervisor.stop(&entry).await
    }

    /// Restart a server by name
    #[tracing::instrument(skip(self), fields(server_name = %name))]
    pub async fn restart_server(&self, name: &str) -> Result<ProcessId> {
        let entry = self.find(name)?;
        self.supervisor.restart(&entry).await
    }

    /// Start every enabled entry under the registry's filter that is not
    /// already running, collecting failures instead of stopping at the first.
    #[tracing::instrument(skip(self))]
    pub async fn start_enabled(&self) -> Vec<(ServerKey, Result<ProcessId>)> {
        let mut results = Vec::new();
        for entry in self.registry.visible_entries() {
            if entry.config().is_disabled() || self.supervisor.is_running(&entry) {
                continue;
            }
            let result = self.supervisor.start(&entry).await;
            if let Err(e) = &result {
                tracing::error!(server = %entry.key(), error = %e, "Failed to start server");
            }
            results.push((entry.key().clone(), result));
        }
        results
    }

    /// Stop every running server; the teardown step
    #[tracing::instrument(skip(self))]
    pub async fn shutdown(&self) -> StopAllReport {
        self.supervisor.stop_all().await
    }
}
