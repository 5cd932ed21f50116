/// Error handling module for MCP Registry.
///
/// This module defines the error types used throughout the library.
/// Lifecycle errors carry the server key (`scope:name`) so a caller can
/// surface exactly one message per failed operation.
///
/// # Example
///
/// ```
/// use mcp_registry::error::{Error, Result};
///
/// fn handle_error(result: Result<()>) {
///     match result {
///         Ok(_) => println!("Operation succeeded"),
///         Err(Error::ServerNotFound(name)) => println!("Server '{}' not found in configuration", name),
///         Err(Error::AlreadyRunning(key)) => println!("Server '{}' is already running", key),
///         Err(Error::Timeout(msg)) => println!("Operation timed out: {}", msg),
///         Err(e) => println!("Other error: {}", e),
///     }
/// }
/// ```
use thiserror::Error;

/// Errors that can occur in the mcp-registry library.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or parse a configuration file.
    ///
    /// This error occurs when:
    /// - The file cannot be read
    /// - The configuration JSON is malformed
    /// - Field types are incorrect
    ///
    /// The registry never propagates it out of `load()`; it is only
    /// returned by the explicit parsing entry points.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration is valid JSON but a server definition is unusable.
    ///
    /// This error occurs when:
    /// - A `stdio` server has an empty command
    /// - A server of any transport is started without a command
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Error when spawning or signalling a server process.
    ///
    /// This error occurs when:
    /// - The executable is missing or not executable
    /// - A termination signal cannot be delivered
    #[error("Server process error: {0}")]
    Process(String),

    /// Requested server was not found in the registry.
    #[error("Server not found: {0}")]
    ServerNotFound(String),

    /// A process is already tracked for this server.
    #[error("Server '{0}' is already running")]
    AlreadyRunning(String),

    /// No process is tracked for this server.
    #[error("Server '{0}' is not running")]
    NotRunning(String),

    /// The server definition is marked `disabled`.
    #[error("Server '{0}' is disabled")]
    Disabled(String),

    /// Operation timed out.
    ///
    /// This error occurs when:
    /// - A process ignores termination past the grace period
    /// - A forced kill is not confirmed by an exit event
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Any other error not covered by the above categories.
    #[error("Other error: {0}")]
    Other(String),
}

/// Result type for mcp-registry operations.
pub type Result<T> = std::result::Result<T, Error>;
