//! API dispatcher.
//!
//! # Architecture Overview
//!
//! ```text
//!   serve:  TCP ──▶ axum Router ──────────────┐
//!                                             ▼
//!   lambda: invocation ──▶ ServerlessAdapter ──▶ Dispatcher
//!                          (baseline CORS,       ├─ log + CORS + request id
//!                           OPTIONS, 500 guard)  ├─ body normalization
//!                                                ├─ GET /health
//!                                                └─ RouteRegistry ──▶ HandlerGroup
//!                                                     (/api/auth, /api/coins, ...)
//! ```

use std::path::PathBuf;

use api_dispatcher::config::{load_config, DispatcherConfig, ObservabilityConfig};
use api_dispatcher::observability::logging;
use api_dispatcher::serverless::{self, ServerlessAdapter};
use api_dispatcher::{Dispatcher, HttpServer};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "api-dispatcher")]
#[command(about = "HTTP dispatcher in front of the API route groups", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, env = "DISPATCHER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run as a persistent HTTP server (default)
    Serve,
    /// Run inside a serverless function runtime
    Lambda,
    /// Load and validate the config, report route groups, then exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let config = load_config(cli.config.as_deref())?;
            init_logging(&config.observability);
            serve(config).await?;
        }
        Commands::Lambda => {
            let loaded = load_config(cli.config.as_deref());
            let observability = loaded
                .as_ref()
                .map(|c| c.observability.clone())
                .unwrap_or_default();
            init_logging(&observability);

            let adapter = ServerlessAdapter::bootstrap(|| loaded.map(|c| Dispatcher::from_config(&c)));
            serverless::lambda::run(adapter).await?;
        }
        Commands::CheckConfig => {
            let config = load_config(cli.config.as_deref())?;
            init_logging(&config.observability);
            let dispatcher = Dispatcher::from_config(&config);
            for entry in dispatcher.registry().entries() {
                match entry.failure() {
                    None => println!("{:<16} {:<24} loaded", entry.name(), entry.prefix()),
                    Some(reason) => {
                        println!("{:<16} {:<24} FAILED: {}", entry.name(), entry.prefix(), reason)
                    }
                }
            }
        }
    }

    Ok(())
}

fn init_logging(config: &ObservabilityConfig) {
    if let Err(e) = logging::init(config) {
        eprintln!("logging already initialized: {e}");
    }
}

async fn serve(config: DispatcherConfig) -> Result<(), std::io::Error> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        environment = config.environment.as_str(),
        "api-dispatcher starting"
    );

    let dispatcher = Dispatcher::from_config(&config);
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    HttpServer::new(dispatcher).run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
