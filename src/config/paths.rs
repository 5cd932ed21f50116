//! Default locations of the two configuration scopes.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the default global config file.
pub const GLOBAL_CONFIG_ENV_KEY: &str = "MCP_REGISTRY_GLOBAL_CONFIG";

/// File name shared by both scopes.
pub const CONFIG_FILE_NAME: &str = "mcp.json";

/// Directory under the workspace root holding the local config file.
pub const LOCAL_CONFIG_DIR: &str = ".vscode";

/// Path segments under the OS config directory holding the global file.
const GLOBAL_CONFIG_SEGMENTS: [&str; 2] = ["Code", "User"];

/// Origin of a server definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// User-wide configuration.
    Global,
    /// Project configuration; shadows global on name lookup.
    Local,
}

impl Scope {
    pub const ALL: [Scope; 2] = [Scope::Global, Scope::Local];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::Local => "local",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves the effective config file path for each scope.
///
/// An explicit override always wins; otherwise the platform default is used.
/// A scope with neither (no workspace open, no config directory) resolves to
/// `None` and loads as empty.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    workspace_root: Option<PathBuf>,
    global_override: Option<PathBuf>,
    local_override: Option<PathBuf>,
}

impl ConfigPaths {
    pub fn new(workspace_root: Option<PathBuf>) -> Self {
        Self {
            workspace_root,
            ..Self::default()
        }
    }

    pub fn workspace_root(&self) -> Option<&Path> {
        self.workspace_root.as_deref()
    }

    /// Sets or clears the override for `scope`.
    pub fn set_custom_path(&mut self, scope: Scope, path: Option<PathBuf>) {
        match scope {
            Scope::Global => self.global_override = path,
            Scope::Local => self.local_override = path,
        }
    }

    pub fn custom_path(&self, scope: Scope) -> Option<&Path> {
        match scope {
            Scope::Global => self.global_override.as_deref(),
            Scope::Local => self.local_override.as_deref(),
        }
    }

    /// The path `load()` reads for `scope`.
    pub fn resolve(&self, scope: Scope) -> Option<PathBuf> {
        self.custom_path(scope)
            .map(Path::to_path_buf)
            .or_else(|| self.default_path(scope))
    }

    pub fn default_path(&self, scope: Scope) -> Option<PathBuf> {
        match scope {
            Scope::Global => default_global_path(),
            Scope::Local => self
                .workspace_root
                .as_deref()
                .map(default_local_path),
        }
    }
}

/// `$MCP_REGISTRY_GLOBAL_CONFIG` if set, else `<config dir>/Code/User/mcp.json`.
pub fn default_global_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(GLOBAL_CONFIG_ENV_KEY).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir().map(|base| {
        GLOBAL_CONFIG_SEGMENTS
            .iter()
            .fold(base, |dir, segment| dir.join(segment))
            .join(CONFIG_FILE_NAME)
    })
}

/// `<workspace>/.vscode/mcp.json`
pub fn default_local_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(LOCAL_CONFIG_DIR).join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_default_under_workspace() {
        let paths = ConfigPaths::new(Some(PathBuf::from("/work/project")));
        assert_eq!(
            paths.resolve(Scope::Local),
            Some(PathBuf::from("/work/project/.vscode/mcp.json"))
        );
    }

    #[test]
    fn test_no_workspace_means_no_local_path() {
        let paths = ConfigPaths::new(None);
        assert_eq!(paths.resolve(Scope::Local), None);
    }

    #[test]
    fn test_override_wins_and_can_be_cleared() {
        let mut paths = ConfigPaths::new(Some(PathBuf::from("/work")));
        paths.set_custom_path(Scope::Local, Some(PathBuf::from("/elsewhere/servers.json")));
        assert_eq!(
            paths.resolve(Scope::Local),
            Some(PathBuf::from("/elsewhere/servers.json"))
        );

        paths.set_custom_path(Scope::Local, None);
        assert_eq!(
            paths.resolve(Scope::Local),
            Some(PathBuf::from("/work/.vscode/mcp.json"))
        );
    }

    #[test]
    fn test_global_override_independent_of_local() {
        let mut paths = ConfigPaths::new(None);
        paths.set_custom_path(Scope::Global, Some(PathBuf::from("/etc/mcp.json")));
        assert_eq!(paths.resolve(Scope::Global), Some(PathBuf::from("/etc/mcp.json")));
        assert_eq!(paths.custom_path(Scope::Local), None);
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(Scope::Global.to_string(), "global");
        assert_eq!(Scope::Local.to_string(), "local");
    }
}
