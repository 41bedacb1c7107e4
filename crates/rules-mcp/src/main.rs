mod config;
mod error;
mod search;
mod server;

use rmcp::{ServiceExt, transport::stdio};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use server::{AppState, RulesServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout is reserved for MCP JSON-RPC
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting rules MCP server");

    let config = Config::from_env()?;
    info!(
        rules_dir = %config.rules_dir.display(),
        taxonomy = ?config.taxonomy_path,
        "configuration loaded"
    );

    let taxonomy = config.load_taxonomy()?;
    let state = AppState::load(&config.rules_dir, &taxonomy)?;
    info!(
        rules = state.rules.len(),
        fingerprint = %state.fingerprint,
        "loaded rules"
    );

    let server = RulesServer::new(state, taxonomy, config.rules_dir);

    info!("MCP server ready, serving on stdio");
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!(error = %e, "MCP server error");
    })?;

    service.waiting().await?;
    info!("MCP server shut down");
    Ok(())
}
