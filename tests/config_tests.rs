use mcp_registry::config::{
    ConfigFile, ConfigReader, FsConfigStore, ServerConfig, TransportKind, validate_server_config,
};
use mcp_registry::error::Result;
use std::collections::HashMap;

const SAMPLE: &str = r#"{
    "servers": {
        "filesystem": {
            "type": "stdio",
            "command": "npx",
            "args": ["-y", "@modelcontextprotocol/server-filesystem", "/path/to/files"]
        },
        "github": {
            "type": "stdio",
            "command": "npx",
            "args": ["-y", "@modelcontextprotocol/server-github"],
            "env": {
                "GITHUB_TOKEN": "your_token_here",
                "GITHUB_PAGE_SIZE": 50
            },
            "alwaysAllow": ["search_repositories"]
        },
        "bridge": {
            "type": "ipc",
            "command": "mcp-bridge",
            "disabled": true
        }
    },
    "inputs": [
        { "id": "github-token", "type": "promptString", "description": "GitHub token", "default": "" }
    ]
}"#;

#[test]
fn test_parse_config() -> Result<()> {
    let config = ConfigFile::parse_from_str(SAMPLE)?;

    assert_eq!(config.servers.len(), 3);
    assert!(config.servers.contains_key("filesystem"));
    assert!(config.servers.contains_key("github"));

    let fs_config = &config.servers["filesystem"];
    assert_eq!(fs_config.command, "npx");
    assert_eq!(
        fs_config.args,
        vec![
            "-y",
            "@modelcontextprotocol/server-filesystem",
            "/path/to/files"
        ]
    );
    assert!(fs_config.env.is_empty());

    let gh_config = &config.servers["github"];
    assert_eq!(
        gh_config.env.get("GITHUB_TOKEN"),
        Some(&"your_token_here".to_string())
    );
    assert_eq!(gh_config.env.get("GITHUB_PAGE_SIZE"), Some(&"50".to_string()));

    let bridge = &config.servers["bridge"];
    assert_eq!(bridge.transport, TransportKind::Ipc);
    assert!(bridge.is_disabled());

    assert_eq!(config.inputs.len(), 1);
    assert_eq!(config.inputs[0].default.as_deref(), Some(""));

    Ok(())
}

#[test]
fn test_parsing_is_idempotent() -> Result<()> {
    let first = ConfigFile::parse_from_str(SAMPLE)?;
    let second = ConfigFile::parse_from_str(SAMPLE)?;
    assert_eq!(first, second);

    // Re-serialising and parsing again yields the same structure
    let round = ConfigFile::parse_from_str(&serde_json::to_string(&first).unwrap())?;
    assert_eq!(first, round);

    Ok(())
}

#[test]
fn test_validate_config() -> Result<()> {
    let fs_config = ServerConfig {
        transport: TransportKind::Stdio,
        command: "npx".to_string(),
        args: vec!["-y".to_string(), "@modelcontextprotocol/server-filesystem".to_string()],
        env: HashMap::new(),
        ..ServerConfig::default()
    };
    validate_server_config("filesystem", &fs_config)?;

    // Empty stdio command is invalid
    let invalid = ServerConfig {
        command: "".to_string(),
        ..ServerConfig::default()
    };
    assert!(validate_server_config("invalid", &invalid).is_err());

    // A socket server may omit its command
    let socket = ServerConfig {
        transport: TransportKind::Socket,
        ..ServerConfig::default()
    };
    validate_server_config("socket", &socket)?;

    Ok(())
}

#[tokio::test]
async fn test_store_fails_open() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsConfigStore::new();

    let missing = dir.path().join("missing.json");
    assert!(store.read(&missing).await.is_none());

    let malformed = dir.path().join("malformed.json");
    std::fs::write(&malformed, "{ \"servers\": { \"x\": ").unwrap();
    assert!(store.read(&malformed).await.is_none());

    let mismatched = dir.path().join("mismatched.json");
    std::fs::write(&mismatched, r#"{ "servers": ["x"] }"#).unwrap();
    assert!(store.read(&mismatched).await.is_none());

    let valid = dir.path().join("valid.json");
    std::fs::write(&valid, SAMPLE).unwrap();
    assert_eq!(store.read(&valid).await.unwrap().servers.len(), 3);
}
