// ABOUTME: Provider capability, string-tag factory, and the per-provider date merger
// ABOUTME: Each backend owns its wire format, pagination, and session handling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

//! # Reservation backend providers
//!
//! A [`Provider`] turns one [`Query`] into raw [`SearchResult`]s from one
//! backend. New backends are added by implementing the trait and registering
//! a tag in [`create_provider`].
//!
//! Providers share a common shape inside `list`: optionally warm up a
//! session page to collect cookies, issue per-date search requests through
//! the cache, parse each page, then merge the per-date results with
//! [`merge_dates`]. After any uncached fetch the provider sleeps
//! [`UNCACHED_DELAY`] before the next uncached fetch to the same backend.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::Store;
use crate::errors::{AppError, AppResult};
use crate::models::{Query, SearchResult};

pub mod empty;
pub mod ramerica;
pub mod rcalifornia;
pub mod rcalifornia_adv;
pub mod san_mateo;
pub mod santa_clara;

pub use empty::Empty;
pub use ramerica::ReserveAmerica;
pub use rcalifornia::ReserveCalifornia;
pub use rcalifornia_adv::ReserveCaliforniaAdv;
pub use san_mateo::SanMateoCounty;
pub use santa_clara::SantaClaraCounty;

/// Pause after an uncached fetch before the next uncached fetch to the same
/// backend.
pub const UNCACHED_DELAY: Duration = Duration::from_millis(600);

/// Hard cap on search result pages fetched per date.
pub const MAX_PAGES: usize = 15;

/// A reservation backend capable of listing open campsites.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable backend name, used in error wrapping and logs.
    fn name(&self) -> &'static str;

    /// List open campsites matching the query.
    ///
    /// Results come back merged per provider-scoped identifier with
    /// availability unioned across the query's dates, and every result has
    /// nonempty availability.
    ///
    /// # Errors
    ///
    /// Any HTTP, parse, or decode failure, wrapped with the provider name.
    /// The orchestrator treats these as soft errors.
    async fn list(&self, query: &Query) -> AppResult<Vec<SearchResult>>;
}

/// Registered provider tags, in default execution order.
#[must_use]
pub fn supported_providers() -> &'static [&'static str] {
    &["ramerica", "rcalifornia", "rcadv", "scc", "smc", "empty"]
}

/// Whether `tag` names a registered provider.
#[must_use]
pub fn is_provider_supported(tag: &str) -> bool {
    supported_providers().contains(&tag)
}

/// Build a provider for `tag` over the shared cache store.
///
/// Each construction creates a fresh cookie jar, so jars are never shared
/// between providers or across queries.
///
/// # Errors
///
/// Returns a `Config` error for an unknown tag.
pub fn create_provider(tag: &str, store: Arc<dyn Store>) -> AppResult<Box<dyn Provider>> {
    match tag {
        "ramerica" => Ok(Box::new(ReserveAmerica::new(store))),
        "rcalifornia" => Ok(Box::new(ReserveCalifornia::new(store))),
        "rcadv" => Ok(Box::new(ReserveCaliforniaAdv::new(store))),
        "scc" => Ok(Box::new(SantaClaraCounty::new(store))),
        "smc" => Ok(Box::new(SanMateoCounty::new(store))),
        "empty" => Ok(Box::new(Empty::new())),
        other => Err(AppError::config(format!("unknown provider type {other:?}"))),
    }
}

/// Sleep the politeness interval when the previous fetch was uncached.
pub(crate) async fn pace(cached: bool) {
    if !cached {
        debug!(target: "campscout::providers", "previous request was uncached, sleeping");
        tokio::time::sleep(UNCACHED_DELAY).await;
    }
}

/// Collapse per-date results into one result per provider-scoped identifier.
///
/// Availability lists are unioned in input order; all other fields keep the
/// first-seen value, which is stable within a provider. Output is sorted by
/// identifier so downstream order is deterministic.
#[must_use]
pub fn merge_dates(results: Vec<SearchResult>) -> Vec<SearchResult> {
    debug!(target: "campscout::providers", count = results.len(), "merging results");

    let mut merged: BTreeMap<String, SearchResult> = BTreeMap::new();
    for r in results {
        match merged.entry(r.site_key()) {
            Entry::Occupied(mut seen) => {
                seen.get_mut().availability.extend(r.availability);
            }
            Entry::Vacant(slot) => {
                slot.insert(r);
            }
        }
    }

    merged.into_values().collect()
}
