use crate::config::ConfigFile;
use async_trait::async_trait;
use std::path::Path;

/// Reads one scope's configuration file.
///
/// Implementations are fail-open: a missing, unreadable or malformed file is
/// logged and reported as `None`, never as an error, so one broken scope
/// cannot keep the other from loading.
#[async_trait]
pub trait ConfigReader: Send + Sync {
    async fn read(&self, path: &Path) -> Option<ConfigFile>;
}

/// Filesystem-backed [`ConfigReader`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FsConfigStore;

impl FsConfigStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConfigReader for FsConfigStore {
    #[tracing::instrument(skip(self), fields(config_path = %path.display()))]
    async fn read(&self, path: &Path) -> Option<ConfigFile> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Config file not found");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read config file");
                return None;
            }
        };

        match ConfigFile::parse_from_str(&content) {
            Ok(file) => {
                tracing::debug!(num_servers = file.servers.len(), "Parsed config file");
                Some(file)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed config file");
                None
            }
        }
    }
}
