use crate::config::{ServerConfig, TransportKind};
use crate::error::{Error, Result};

/// Validates a server definition as loaded from a scope file.
///
/// A `stdio` server must name a command; `socket` and `ipc` servers may
/// leave it empty (they are then listed but cannot be started). Transport
/// kinds this crate does not know are rejected.
pub fn validate_server_config(name: &str, config: &ServerConfig) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::ConfigInvalid("Server with empty name".to_string()));
    }

    if config.transport == TransportKind::Unsupported {
        return Err(Error::ConfigInvalid(format!(
            "Server '{}' uses an unsupported transport type",
            name
        )));
    }

    if config.transport == TransportKind::Stdio && config.command.trim().is_empty() {
        return Err(Error::ConfigInvalid(format!(
            "Server '{}' uses stdio but has empty command",
            name
        )));
    }

    Ok(())
}

/// Validates that a definition can be spawned.
pub fn validate_launchable(name: &str, config: &ServerConfig) -> Result<()> {
    validate_server_config(name, config)?;

    if config.command.trim().is_empty() {
        return Err(Error::ConfigInvalid(format!(
            "Server '{}' has no command to launch",
            name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(transport: TransportKind, command: &str) -> ServerConfig {
        ServerConfig {
            transport,
            command: command.to_string(),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_stdio_requires_command() {
        assert!(validate_server_config("fs", &config(TransportKind::Stdio, "npx")).is_ok());
        assert!(validate_server_config("fs", &config(TransportKind::Stdio, "  ")).is_err());
        assert!(validate_server_config("", &config(TransportKind::Stdio, "npx")).is_err());
    }

    #[test]
    fn test_unsupported_transport_rejected() {
        let http = config(TransportKind::Unsupported, "");
        assert!(matches!(
            validate_server_config("remote", &http),
            Err(Error::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_socket_without_command_is_listed_not_launchable() {
        let socket = config(TransportKind::Socket, "");
        assert!(validate_server_config("remote", &socket).is_ok());
        assert!(matches!(
            validate_launchable("remote", &socket),
            Err(Error::ConfigInvalid(_))
        ));
    }
}
