//! Configuration module for MCP Registry.
//!
//! This module handles parsing, validation and discovery of the two
//! configuration scopes: a user-wide (global) file and a per-project (local)
//! file. Both share the same JSON schema.
//!
//! # Examples
//!
//! Parsing a scope file:
//!
//! ```
//! use mcp_registry::config::ConfigFile;
//!
//! let file = ConfigFile::parse_from_str(
//!     r#"{ "servers": { "fs": { "type": "stdio", "command": "echo", "args": ["hi"] } } }"#,
//! ).unwrap();
//! assert_eq!(file.servers["fs"].args, vec!["hi"]);
//! ```
//!
//! Reading with the fail-open store:
//!
//! ```no_run
//! use mcp_registry::config::{ConfigReader, FsConfigStore};
//! use std::path::Path;
//!
//! # async fn demo() {
//! let store = FsConfigStore::new();
//! match store.read(Path::new(".vscode/mcp.json")).await {
//!     Some(file) => println!("{} servers", file.servers.len()),
//!     None => println!("no local servers"),
//! }
//! # }
//! ```
mod parser;
pub mod paths;
mod store;
pub mod validator;

pub use parser::{CommandDefinition, ConfigFile, InputDefinition, ServerConfig, TransportKind};
pub use paths::{ConfigPaths, Scope};
pub use store::{ConfigReader, FsConfigStore};
pub use validator::validate_server_config;
