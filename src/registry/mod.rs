//! Merged, addressable view of both configuration scopes.
//!
//! The registry reads the global and the local file, turns each `servers`
//! mapping into a sequence of [`ServerEntry`] values tagged with their scope,
//! and publishes one change notification per `load()`.
//!
//! Entries are *not* deduplicated across scopes: a name defined in both files
//! yields two entries. Only [`Registry::find_by_name`] picks one, preferring
//! the local scope.
//!
//! ```no_run
//! use mcp_registry::registry::{Registry, ScopeFilter};
//! use mcp_registry::config::ConfigPaths;
//! use mcp_registry::Notifier;
//!
//! # async fn demo() {
//! let mut registry = Registry::new(ConfigPaths::new(Some(".".into())), Notifier::new());
//! registry.load().await;
//! for entry in registry.entries(ScopeFilter::Both) {
//!     println!("{} -> {}", entry.display_name(), entry.status());
//! }
//! # }
//! ```
mod entry;

pub use entry::{ServerEntry, ServerKey};

use crate::config::{
    CommandDefinition, ConfigFile, ConfigPaths, ConfigReader, FsConfigStore, InputDefinition,
    Scope, validate_server_config,
};
use crate::notifier::{ChangeListener, Notifier};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Which scopes a view includes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeFilter {
    #[default]
    Both,
    Global,
    Local,
}

impl ScopeFilter {
    pub fn includes(&self, scope: Scope) -> bool {
        match self {
            ScopeFilter::Both => true,
            ScopeFilter::Global => scope == Scope::Global,
            ScopeFilter::Local => scope == Scope::Local,
        }
    }
}

/// Server entries from both scopes.
pub struct Registry {
    reader: Arc<dyn ConfigReader>,
    paths: ConfigPaths,
    global: Vec<ServerEntry>,
    local: Vec<ServerEntry>,
    global_file: Option<ConfigFile>,
    local_file: Option<ConfigFile>,
    filter: ScopeFilter,
    notifier: Notifier,
}

impl Registry {
    /// A registry reading from the filesystem.
    pub fn new(paths: ConfigPaths, notifier: Notifier) -> Self {
        Self::with_reader(Arc::new(FsConfigStore::new()), paths, notifier)
    }

    /// A registry reading through `reader`.
    pub fn with_reader(
        reader: Arc<dyn ConfigReader>,
        paths: ConfigPaths,
        notifier: Notifier,
    ) -> Self {
        Self {
            reader,
            paths,
            global: Vec::new(),
            local: Vec::new(),
            global_file: None,
            local_file: None,
            filter: ScopeFilter::default(),
            notifier,
        }
    }

    /// Re-read both scopes and replace the entry sequences.
    ///
    /// The two reads run concurrently and fail open independently. Entries
    /// whose `(scope, name)` survives the reload keep their runtime state, so
    /// a running server stays attached to its status and logs. Exactly one
    /// change notification is published, after both scopes resolved.
    #[tracing::instrument(skip(self))]
    pub async fn load(&mut self) {
        let reader = Arc::clone(&self.reader);
        let global_path = self.paths.resolve(Scope::Global);
        let local_path = self.paths.resolve(Scope::Local);

        let (global_file, local_file) = tokio::join!(
            read_scope(reader.as_ref(), Scope::Global, global_path.as_deref()),
            read_scope(reader.as_ref(), Scope::Local, local_path.as_deref()),
        );

        self.global = rebuild(Scope::Global, global_file.as_ref(), &self.global);
        self.local = rebuild(Scope::Local, local_file.as_ref(), &self.local);
        self.global_file = global_file;
        self.local_file = local_file;

        tracing::info!(
            num_global = self.global.len(),
            num_local = self.local.len(),
            "Loaded server definitions"
        );
        self.notifier.notify();
    }

    /// Stores the view filter; loading is unaffected.
    pub fn set_filter(&mut self, filter: ScopeFilter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> ScopeFilter {
        self.filter
    }

    /// Overrides the file read for `scope` on the next `load()`.
    pub fn set_custom_path(&mut self, scope: Scope, path: impl Into<PathBuf>) {
        self.paths.set_custom_path(scope, Some(path.into()));
    }

    /// Reverts `scope` to its default path on the next `load()`.
    pub fn clear_custom_path(&mut self, scope: Scope) {
        self.paths.set_custom_path(scope, None);
    }

    /// The file `load()` will read for `scope`.
    pub fn config_path(&self, scope: Scope) -> Option<PathBuf> {
        self.paths.resolve(scope)
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Lookup by name; local shadows global.
    pub fn find_by_name(&self, name: &str) -> Option<&ServerEntry> {
        self.local
            .iter()
            .chain(self.global.iter())
            .find(|entry| entry.name() == name)
    }

    /// Exact lookup by `(scope, name)`.
    pub fn get(&self, key: &ServerKey) -> Option<&ServerEntry> {
        self.scope_entries(key.scope)
            .iter()
            .find(|entry| entry.key() == key)
    }

    /// Entries of the selected scopes, global first, each sorted by name.
    pub fn entries(&self, filter: ScopeFilter) -> Vec<ServerEntry> {
        Scope::ALL
            .into_iter()
            .filter(|scope| filter.includes(*scope))
            .flat_map(|scope| self.scope_entries(scope).iter().cloned())
            .collect()
    }

    /// Entries under the stored filter.
    pub fn visible_entries(&self) -> Vec<ServerEntry> {
        self.entries(self.filter)
    }

    /// `inputs` declared by each loaded file.
    pub fn inputs(&self) -> Vec<(Scope, InputDefinition)> {
        self.scoped_files()
            .flat_map(|(scope, file)| file.inputs.iter().cloned().map(move |input| (scope, input)))
            .collect()
    }

    /// `commands` declared by each loaded file.
    pub fn commands(&self) -> Vec<(Scope, CommandDefinition)> {
        self.scoped_files()
            .flat_map(|(scope, file)| {
                file.commands
                    .iter()
                    .cloned()
                    .map(move |command| (scope, command))
            })
            .collect()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn subscribe(&self) -> ChangeListener {
        self.notifier.subscribe()
    }

    fn scope_entries(&self, scope: Scope) -> &[ServerEntry] {
        match scope {
            Scope::Global => &self.global,
            Scope::Local => &self.local,
        }
    }

    fn scoped_files(&self) -> impl Iterator<Item = (Scope, &ConfigFile)> {
        [
            (Scope::Global, self.global_file.as_ref()),
            (Scope::Local, self.local_file.as_ref()),
        ]
        .into_iter()
        .filter_map(|(scope, file)| file.map(|file| (scope, file)))
    }
}

async fn read_scope(
    reader: &dyn ConfigReader,
    scope: Scope,
    path: Option<&Path>,
) -> Option<ConfigFile> {
    match path {
        Some(path) => reader.read(path).await,
        None => {
            tracing::debug!(%scope, "No config path for scope");
            None
        }
    }
}

fn rebuild(scope: Scope, file: Option<&ConfigFile>, previous: &[ServerEntry]) -> Vec<ServerEntry> {
    let Some(file) = file else {
        return Vec::new();
    };

    file.servers
        .iter()
        .filter_map(|(name, config)| {
            if let Err(e) = validate_server_config(name, config) {
                tracing::warn!(%scope, server = %name, error = %e, "Skipping invalid server definition");
                return None;
            }

            let key = ServerKey::new(scope, name.clone());
            let runtime = previous
                .iter()
                .find(|entry| entry.key() == &key)
                .map(|entry| Arc::clone(entry.runtime()))
                .unwrap_or_default();
            Some(ServerEntry::with_runtime(key, config.clone(), runtime))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;

    fn file(names: &[&str]) -> ConfigFile {
        let mut file = ConfigFile::default();
        for name in names {
            file.servers.insert(
                name.to_string(),
                ServerConfig {
                    command: "echo".to_string(),
                    ..ServerConfig::default()
                },
            );
        }
        file
    }

    #[test]
    fn test_filter_includes() {
        assert!(ScopeFilter::Both.includes(Scope::Global));
        assert!(ScopeFilter::Both.includes(Scope::Local));
        assert!(!ScopeFilter::Global.includes(Scope::Local));
        assert!(!ScopeFilter::Local.includes(Scope::Global));
    }

    #[test]
    fn test_rebuild_keeps_runtime_of_surviving_names() {
        let first = rebuild(Scope::Local, Some(&file(&["a", "b"])), &[]);
        first[0].record_tool_count(7);

        let second = rebuild(Scope::Local, Some(&file(&["a", "c"])), &first);
        assert_eq!(second.len(), 2);
        assert!(Arc::ptr_eq(second[0].runtime(), first[0].runtime()));
        assert_eq!(second[0].tool_count(), Some(7));
        assert_eq!(second[1].name(), "c");
        assert_eq!(second[1].tool_count(), None);
    }

    #[test]
    fn test_rebuild_skips_invalid_entries() {
        let mut bad = file(&["good"]);
        bad.servers.insert("broken".to_string(), ServerConfig::default());

        let entries = rebuild(Scope::Global, Some(&bad), &[]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name(), "good");
    }

    #[test]
    fn test_rebuild_absent_file_is_empty() {
        assert!(rebuild(Scope::Global, None, &[]).is_empty());
    }
}
