//! Bindilla - a Stencila host that launches environments on Binder.
//!
//! Serves the host API (manifest, environ launch, proxy) over HTTP and
//! forwards the heavy lifting to Binder.

mod handlers;
mod routes;
mod server;

use anyhow::{Context, Result};
use bindilla_core::{BinderConfig, EnvironCatalog, Host, HostConfig, ServerConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "bindilla")]
#[command(about = "Launch Stencila environments on Binder", version)]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, env = "BINDILLA_PORT", default_value_t = ServerConfig::DEFAULT_PORT)]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "BINDILLA_HOST", default_value = ServerConfig::DEFAULT_HOST)]
    host: String,

    /// Base URL of the Binder build API
    #[arg(long, env = "BINDILLA_BINDER_URL", default_value = BinderConfig::DEFAULT_BINDER_URL)]
    binder_url: String,

    /// Base URL of the hub serving launched Binders
    #[arg(long, env = "BINDILLA_HUB_URL", default_value = BinderConfig::DEFAULT_HUB_URL)]
    hub_url: String,

    /// JSON file listing the environs that can be launched
    #[arg(long, env = "BINDILLA_ENVIRONS")]
    environs: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting Bindilla");

    let catalog = match &args.environs {
        Some(path) => EnvironCatalog::load(path)
            .with_context(|| format!("Failed to load environs from {}", path.display()))?,
        None => EnvironCatalog::default(),
    };
    info!("{} environs available", catalog.len());

    let config = HostConfig::new()
        .with_binder_url(args.binder_url)
        .with_hub_url(args.hub_url)
        .with_catalog(catalog);
    info!("Using Binder at {}", config.binder_url);

    let host = Host::new(config)?;
    let addr = server::start_server(host, &args.host, args.port).await?;

    // Machine readable, so callers binding port 0 can find us.
    println!("BINDILLA_PORT={}", addr.port());

    info!("Bindilla running on {}", addr);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
