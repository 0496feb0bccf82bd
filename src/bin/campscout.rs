// ABOUTME: Command-line search across every configured reservation backend
// ABOUTME: Prints an aligned results table, then soft errors, and exits zero either way
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

//! Campscout CLI.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use campscout::cache::{self, DiskStore, Store};
use campscout::models::Query;

/// Search campsite availability across reservation providers.
#[derive(Debug, Parser)]
#[command(name = "campscout", version, about)]
struct Args {
    /// Comma-separated arrival dates to check (YYYY-MM-DD).
    #[arg(long, value_delimiter = ',', required = true)]
    dates: Vec<String>,

    /// Length of stay in nights.
    #[arg(long, default_value_t = 2)]
    nights: u32,

    /// Maximum distance in miles (0 for unlimited).
    #[arg(long, default_value_t = 100.0)]
    max_distance: f64,

    /// Minimum editorial rating.
    #[arg(long, default_value_t = 0.0)]
    min_rating: f64,

    /// Comma-separated keywords; results must mention at least one.
    #[arg(long, value_delimiter = ',')]
    keywords: Vec<String>,

    /// Search origin latitude.
    #[arg(long, default_value_t = 37.4092297)]
    lat: f64,

    /// Search origin longitude.
    #[arg(long, default_value_t = -122.0723705)]
    lon: f64,

    /// Comma-separated provider tags to search.
    #[arg(long, value_delimiter = ',', default_value = "ramerica,rcalifornia,scc,smc")]
    providers: Vec<String>,

    /// Maximum age of cached search pages, in seconds.
    #[arg(long, default_value_t = 4 * 60 * 60)]
    max_cache_age: u64,

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
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut dates = Vec::new();
    for raw in &args.dates {
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("unable to parse date {raw:?}"))?;
        dates.push(date);
    }
    if dates.is_empty() {
        bail!("at least one --dates value is required");
    }

    for tag in &args.providers {
        if !campscout::providers::is_provider_supported(tag) {
            bail!(
                "unknown provider {tag:?}; supported: {}",
                campscout::providers::supported_providers().join(", ")
            );
        }
    }

    cache::set_default_max_age(Duration::from_secs(args.max_cache_age));

    let cache_dir = match args.cache_dir {
        Some(dir) => dir,
        None => DiskStore::default_path().context("cache directory")?,
    };
    let store: Arc<dyn Store> = Arc::new(DiskStore::new(cache_dir));

    let (_, props) = campscout::metadata::load_all(&args.metadata).context("metadata")?;

    let query = Query {
        lat: args.lat,
        lon: args.lon,
        dates,
        stay_length: args.nights,
        max_distance: args.max_distance,
        min_rating: args.min_rating,
        keywords: args.keywords,
        ..Query::default()
    };

    let (results, errors) = campscout::search::run(&args.providers, &query, store, &props).await;

    if results.is_empty() {
        println!("No availability found.");
    }
    for r in &results {
        let kinds = r
            .availability
            .iter()
            .map(|a| a.kind.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "{:>4.1}  {:<40}  {:>6.1} mi  {:<12}  {}",
            r.rating,
            r.name,
            r.distance,
            kinds,
            if r.locale.is_empty() { &r.desc } else { &r.locale },
        );
        for a in &r.availability {
            println!("        {} {}  {}", a.date, a.kind, a.url);
        }
    }

    if !errors.is_empty() {
        eprintln!();
        for e in &errors {
            eprintln!("warning: {e}");
        }
    }

    Ok(())
}
