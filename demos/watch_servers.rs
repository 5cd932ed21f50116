use mcp_registry::{McpManager, Scope, ScopeFilter};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controls verbosity, e.g. RUST_LOG=mcp_registry=debug
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .init();

    tracing::info!("Starting watch_servers demo");

    // Local scope comes from ./.vscode/mcp.json
    let mut manager = McpManager::new(Some(std::env::current_dir()?));
    manager.load().await;

    for scope in Scope::ALL {
        if let Some(path) = manager.registry().config_path(scope) {
            println!("{} config: {}", scope, path.display());
        }
    }

    // Entries share live state with the registry, so a snapshot keeps
    // reflecting status changes.
    let entries = manager.entries(ScopeFilter::Both);
    if entries.is_empty() {
        println!("No servers defined");
        return Ok(());
    }

    let mut listener = manager.subscribe();
    let printer = tokio::spawn(async move {
        while listener.changed().await {
            println!("--- change #{} ---", listener.generation());
            for entry in &entries {
                println!(
                    "{:<30} {:<8} {}",
                    entry.display_name(),
                    entry.status().to_string(),
                    entry.description().unwrap_or_default()
                );
            }
        }
    });

    for (key, result) in manager.start_enabled().await {
        match result {
            Ok(id) => println!("Started {} as {}", key, id),
            Err(e) => println!("Could not start {}: {}", key, e),
        }
    }

    println!("Press Ctrl+C to stop all servers");
    tokio::signal::ctrl_c().await?;

    let report = manager.shutdown().await;
    match report.summary() {
        Some(summary) => eprintln!("{}", summary),
        None => println!("Stopped {} server(s)", report.stopped.len()),
    }

    for entry in manager.entries(ScopeFilter::Both) {
        if let Some(line) = entry.logs().last() {
            println!("{}: {}", entry.display_name(), line);
        }
    }

    printer.abort();
    Ok(())
}
