//! crud-server: serves the sample blog application.
//!
//! ```text
//! crud-server [--config PATH] [serve|routes]
//! ```
//!
//! Startup order: config → logging → store → application bootstrap (+ seed)
//! → metrics → listener. Any bootstrap fault aborts before a port is bound.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use crud_dispatch::config::{load_config, AppConfig};
use crud_dispatch::lifecycle::signals::wait_for_signal;
use crud_dispatch::lifecycle::{Application, ApplicationBuilder, Shutdown};
use crud_dispatch::observability::{logging, metrics};
use crud_dispatch::persistence::{seed::load_seed_file, InMemoryStore};
use crud_dispatch::{blog, HttpServer};

#[derive(Parser)]
#[command(name = "crud-server")]
#[command(about = "Declarative CRUD dispatch server", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Serve HTTP (default)
    Serve,
    /// Print the registered route table and exit
    Routes,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "crud-server starting");

    let store = InMemoryStore::new();
    let app = bootstrap(&config, &store)?;

    if cli.command.unwrap_or(Command::Serve) == Command::Routes {
        print_routes(&app);
        return Ok(());
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        resolution = ?config.dispatch.resolution,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let signalled = shutdown.signalled();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            let signal = wait_for_signal().await;
            tracing::info!(signal, "Shutdown signal received");
            shutdown.trigger();
        }
    });

    HttpServer::new(app, &config).run(listener, signalled).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn bootstrap(config: &AppConfig, store: &InMemoryStore) -> Result<Application, Box<dyn std::error::Error>> {
    let builder = ApplicationBuilder::new()
        .store(Arc::new(store.clone()))
        .resolution(config.dispatch.resolution);

    let app = blog::install(builder).build().map_err(|e| {
        tracing::error!(error = %e, "Application bootstrap failed");
        e
    })?;

    if let Some(path) = &config.persistence.seed_path {
        load_seed_file(path, app.catalog(), store)?;
    }
    Ok(app)
}

fn print_routes(app: &Application) {
    for route in app.table().routes() {
        let params: Vec<String> = route.params.iter().map(|p| p.describe()).collect();
        println!(
            "{:<7} {:<32} {:<30} [{}]",
            route.verb,
            route.pattern.to_string(),
            route.name,
            params.join(", ")
        );
    }
}
