use crate::config::{Scope, ServerConfig};
use crate::server::lifecycle::{self, LifecycleEvent, ServerRuntime};
use crate::server::{LogLine, ProcessId, ServerStatus};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Composite identity of an entry.
///
/// Names are unique within a scope but may repeat across scopes, so every
/// internal map is keyed by `(scope, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ServerKey {
    pub scope: Scope,
    pub name: String,
}

impl ServerKey {
    pub fn new(scope: Scope, name: impl Into<String>) -> Self {
        Self {
            scope,
            name: name.into(),
        }
    }
}

impl fmt::Display for ServerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope, self.name)
    }
}

/// One named server definition plus its live runtime projection.
///
/// Cloning is cheap and clones observe the same runtime state. The config
/// is an immutable snapshot of what was loaded; after a reload, look the
/// entry up again to see an updated definition.
#[derive(Debug, Clone)]
pub struct ServerEntry {
    key: ServerKey,
    config: Arc<ServerConfig>,
    runtime: Arc<Mutex<ServerRuntime>>,
}

impl ServerEntry {
    pub fn new(scope: Scope, name: impl Into<String>, config: ServerConfig) -> Self {
        Self::with_runtime(
            ServerKey::new(scope, name),
            config,
            Arc::new(Mutex::new(ServerRuntime::new())),
        )
    }

    pub(crate) fn with_runtime(
        key: ServerKey,
        config: ServerConfig,
        runtime: Arc<Mutex<ServerRuntime>>,
    ) -> Self {
        Self {
            key,
            config: Arc::new(config),
            runtime,
        }
    }

    pub fn key(&self) -> &ServerKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn scope(&self) -> Scope {
        self.key.scope
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Label for presentation, disambiguating cross-scope duplicates.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.key.name, self.key.scope)
    }

    pub fn status(&self) -> ServerStatus {
        lifecycle::lock(&self.runtime).status()
    }

    /// Id of the process currently attributed to this entry.
    pub fn process_id(&self) -> Option<ProcessId> {
        lifecycle::lock(&self.runtime).process()
    }

    /// Captured output, oldest first.
    pub fn logs(&self) -> Vec<LogLine> {
        lifecycle::lock(&self.runtime).logs().lines()
    }

    /// Recorded status transitions, oldest first.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        lifecycle::lock(&self.runtime).events().cloned().collect()
    }

    /// Status sequence of the recorded transitions.
    pub fn status_history(&self) -> Vec<ServerStatus> {
        lifecycle::lock(&self.runtime)
            .events()
            .map(|event| event.status)
            .collect()
    }

    pub fn tool_count(&self) -> Option<usize> {
        lifecycle::lock(&self.runtime).tool_count()
    }

    /// Stores a tool count obtained by a caller that talks to the server.
    pub fn record_tool_count(&self, count: usize) {
        lifecycle::lock(&self.runtime).set_tool_count(Some(count));
    }

    /// Command line and version, when there is anything to show.
    pub fn description(&self) -> Option<String> {
        let mut parts = Vec::new();
        let line = self.config.command_line();
        if !line.is_empty() {
            parts.push(line);
        }
        if let Some(version) = &self.config.version {
            parts.push(format!("v{}", version));
        }
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    pub(crate) fn runtime(&self) -> &Arc<Mutex<ServerRuntime>> {
        &self.runtime
    }
}
