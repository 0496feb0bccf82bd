// ABOUTME: HTTP server binary exposing the search engine at /search
// ABOUTME: Loads metadata once at startup and serves until interrupted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

//! Campscout server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use campscout::cache::{DiskStore, Store};
use campscout::server::{router, AppState};

/// Serve campsite search over HTTP.
#[derive(Debug, Parser)]
#[command(name = "campscout-server", version, about)]
struct Args {
    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Search origin latitude.
    #[arg(long, default_value_t = 37.4092297)]
    lat: f64,

    /// Search origin longitude.
    #[arg(long, default_value_t = -122.0723705)]
    lon: f64,

    /// Comma-separated provider tags to search.
    #[arg(long, value_delimiter = ',', default_value = "ramerica,rcalifornia,scc,smc")]
    providers: Vec<String>,

    /// Metadata YAML files to load.
    #[arg(long)]
    metadata: Vec<PathBuf>,

    /// Cache directory (defaults to the platform cache dir).
    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let cache_dir = match args.cache_dir {
        Some(dir) => dir,
        None => DiskStore::default_path().context("cache directory")?,
    };
    let store: Arc<dyn Store> = Arc::new(DiskStore::new(cache_dir));

    let (sources, props) = campscout::metadata::load_all(&args.metadata).context("metadata")?;
    info!(
        sources = sources.len(),
        properties = props.len(),
        "metadata loaded"
    );

    let state = Arc::new(AppState {
        store,
        sources,
        props,
        providers: args.providers,
        lat: args.lat,
        lon: args.lon,
        started: Utc::now(),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;

    Ok(())
}

async fn shutdown_signal() {
    // Swallow errors: if the signal handler cannot install, run until killed.
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
