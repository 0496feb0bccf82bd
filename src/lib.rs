// ABOUTME: Main library entry point for the campscout federated campsite search engine
// ABOUTME: Wires the cache, provider, resolver, and search orchestration modules together
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

#![deny(unsafe_code)]

//! # Campscout
//!
//! A federated search and entity-resolution engine for campsite availability.
//! For a single query, campscout fans out to multiple unrelated reservation
//! backends, coalesces and deduplicates their raw results across requested
//! dates, resolves each record to a curated campground so editorial ratings
//! and descriptions can be attached, and filters and ranks what remains.
//!
//! ## Architecture
//!
//! - **Cache**: a persistent request/response cache that is the sole egress
//!   for provider traffic
//! - **Providers**: one implementation per reservation backend, each owning
//!   its wire format, pagination, and session handling
//! - **Resolver**: fuzzy name matching from raw results to curated
//!   properties and campgrounds
//! - **Search**: the orchestrator that runs providers concurrently and
//!   annotates, filters, and ranks the merged results
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! use campscout::cache::store::MemoryStore;
//! use campscout::models::Query;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = Arc::new(MemoryStore::new());
//! let query = Query::default();
//! let props = BTreeMap::new();
//! let (results, errors) =
//!     campscout::search::run(&["empty".to_owned()], &query, store, &props).await;
//! println!("{} results, {} soft errors", results.len(), errors.len());
//! # }
//! ```

/// Persistent HTTP request/response cache and its backing stores
pub mod cache;

/// Unified error handling with soft per-provider error semantics
pub mod errors;

/// Great-circle distance primitive
pub mod geo;

/// Name normalization helpers and the shared site-kind classifier
pub mod mangle;

/// Curated editorial metadata: sources, properties, campgrounds, refs
pub mod metadata;

/// Vendor-neutral query and result data model
pub mod models;

/// Reservation backend implementations and the provider registry
pub mod providers;

/// Search orchestration: fan-out, resolve, filter, rank
pub mod search;

/// HTTP front-end: `/search` and `/healthz`
pub mod server;
