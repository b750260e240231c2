//! HTTP server for the Civic Recs recommendation service.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use data_source::{Catalog, InMemoryDataSource};
use server::{build_state, router, AppConfig};

#[derive(Parser, Debug)]
#[command(name = "civic-recs-server")]
#[command(about = "Serve politician and content recommendations over HTTP", long_about = None)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "CIVIC_RECS_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides the config file)
    #[arg(short, long, env = "CIVIC_RECS_BIND")]
    bind: Option<String>,

    /// Catalog dataset (overrides the config file)
    #[arg(short, long, env = "CIVIC_RECS_DATASET")]
    dataset: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,server=debug,search=debug,pipeline=debug")),
        )
        .init();

    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(dataset) = args.dataset {
        config.data.dataset = dataset;
    }

    info!("Loading catalog from {}...", config.data.dataset.display());
    let catalog = Catalog::load_from_file(&config.data.dataset)
        .with_context(|| format!("Failed to load catalog {}", config.data.dataset.display()))?;
    let data_source = Arc::new(InMemoryDataSource::new(Arc::new(catalog)));

    let app = router(build_state(data_source, &config));

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    info!("Listening on {}", config.server.bind);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
