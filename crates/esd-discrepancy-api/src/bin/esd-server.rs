//! ESD discrepancy server
//!
//! ```bash
//! esd-server --config server.toml
//! ESD_BIND_ADDR=127.0.0.1:9000 ESD_COMPLETION_BASE_URL=http://llm:8000/v1 esd-server
//! ```

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use esd_discrepancy_api::{create_router, AppState, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "esd-server", version, about = "ESD discrepancy chat gateway and registry service")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "ESD_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address (overrides configuration)
    #[arg(short, long)]
    bind: Option<String>,
}

fn init_tracing(config: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    init_tracing(&config);

    let state = AppState::from_config(&config)?;
    tracing::info!(
        records = state.registry.read().await.len(),
        tools = state.tools.len(),
        model = %config.completion.model,
        "Discrepancy registry loaded"
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "Listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}
