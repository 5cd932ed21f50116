use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// How a client talks to a server once its process is up.
///
/// The registry does not speak any of these protocols; the kind is carried
/// for display and for validation (`stdio` servers must name a command).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Standard input/output of the spawned process.
    #[default]
    Stdio,
    /// A network socket exposed by the process.
    Socket,
    /// A local IPC channel (named pipe or unix socket).
    Ipc,
    /// Any other kind (`http`, `sse`, ...); listed as invalid and skipped.
    #[serde(other)]
    Unsupported,
}

/// Configuration for a single MCP server definition.
///
/// This structure defines how to start a specific MCP server process.
/// It includes the command to execute, any arguments to pass, and optional
/// environment variables that are layered over the parent environment.
///
/// # Examples
///
/// ```
/// use mcp_registry::config::{ServerConfig, TransportKind};
/// use std::collections::HashMap;
///
/// let mut env = HashMap::new();
/// env.insert("ROOT".to_string(), "/tmp".to_string());
///
/// let server_config = ServerConfig {
///     transport: TransportKind::Stdio,
///     command: "npx".to_string(),
///     args: vec!["-y".to_string(), "@modelcontextprotocol/server-filesystem".to_string()],
///     env,
///     ..ServerConfig::default()
/// };
/// assert!(!server_config.is_disabled());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Transport kind, `stdio` when omitted.
    #[serde(rename = "type", default)]
    pub transport: TransportKind,

    /// Command to execute when starting the MCP server.
    /// This can be an absolute path or a command available in the PATH.
    #[serde(default)]
    pub command: String,

    /// Command-line arguments to pass to the server.
    #[serde(default)]
    pub args: Vec<String>,

    /// Environment variables to set when launching the server.
    /// Numeric and boolean values in the file are kept as their JSON text.
    #[serde(default, deserialize_with = "deserialize_env")]
    pub env: HashMap<String, String>,

    /// Optional version string, display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// A disabled server is listed but never started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,

    /// Tool names exempt from permission prompts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub always_allow: Option<BTreeSet<String>>,
}

impl ServerConfig {
    /// Whether the definition is marked `disabled: true`.
    pub fn is_disabled(&self) -> bool {
        self.disabled.unwrap_or(false)
    }

    /// The command line as a single display string.
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A prompt-for-value declaration from the `inputs` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDefinition {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// A named command from the `commands` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDefinition {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One scope's configuration file.
///
/// # JSON Schema
///
/// ```json
/// {
///   "servers": {
///     "fs": {
///       "type": "stdio",
///       "command": "npx",
///       "args": ["-y", "@modelcontextprotocol/server-filesystem"],
///       "env": { "ROOT": "/tmp", "DEPTH": 3 },
///       "alwaysAllow": ["read_file"]
///     }
///   },
///   "inputs": [{ "id": "token", "type": "promptString", "description": "API token" }],
///   "commands": [{ "name": "refresh", "args": ["--all"] }]
/// }
/// ```
///
/// Unknown fields are ignored. Servers are kept sorted by name so that the
/// entry sequences built from a file are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Map of server names to their configurations.
    #[serde(default)]
    pub servers: BTreeMap<String, ServerConfig>,

    #[serde(default)]
    pub inputs: Vec<InputDefinition>,

    #[serde(default)]
    pub commands: Vec<CommandDefinition>,
}

impl ConfigFile {
    /// Parses a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The string is not valid JSON
    /// * The JSON does not conform to the expected schema
    pub fn parse_from_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::ConfigParse(format!("Failed to parse JSON config: {}", e)))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EnvValue {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

impl EnvValue {
    fn into_string(self) -> String {
        match self {
            EnvValue::Text(text) => text,
            EnvValue::Number(number) => number.to_string(),
            EnvValue::Flag(flag) => flag.to_string(),
        }
    }
}

fn deserialize_env<'de, D>(deserializer: D) -> std::result::Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<HashMap<String, EnvValue>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, value.into_string()))
        .collect())
}
