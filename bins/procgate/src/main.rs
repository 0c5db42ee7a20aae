use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use procgate_exec::SystemExecutor;
use procgate_manager::Pm2Client;
use procgate_server::{AppState, GatewayConfig, GatewayServer};

/// procgate - HTTP control surface over a pm2-managed process fleet
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (YAML); defaults apply when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    initialize_logging(args.debug)?;

    let mut config = match args.config {
        Some(ref path) => GatewayConfig::load_from_file(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }

    info!("Starting procgate ({})", config.describe());

    let executor = Arc::new(SystemExecutor::new(config.command_timeout));
    let manager = Arc::new(Pm2Client::new(config.pm2_bin.clone(), executor.clone()));

    let state = AppState {
        manager,
        executor,
        settings: Arc::new(config),
    };

    GatewayServer::new(state)
        .run(setup_signal_handlers())
        .await
        .map_err(|e| anyhow::anyhow!("Server failed: {}", e))?;

    info!("procgate shut down");
    Ok(())
}

fn initialize_logging(debug: bool) -> Result<()> {
    let level = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .init();

    Ok(())
}

async fn setup_signal_handlers() {
    use tokio::signal;

    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to create SIGTERM handler");
        let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
            .expect("Failed to create SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM signal");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT signal");
            }
        }
    }

    #[cfg(windows)]
    {
        let _ = signal::ctrl_c().await;
        info!("Received Ctrl+C signal");
    }
}
