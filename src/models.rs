// ABOUTME: Vendor-neutral data model shared by providers, resolver, and front-ends
// ABOUTME: Defines Query, SearchResult, Availability, and the closed SiteKind enumeration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

//! Common data structures for campsite search.
//!
//! A [`Query`] is immutable for the lifetime of one search. [`SearchResult`]
//! and [`Availability`] values are per-query and owned by the orchestrator.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::metadata::Campground;

/// Physical lodging type of one reservable spot.
///
/// This is a closed enumeration: new kinds are added only together with new
/// classifier rules in [`crate::mangle::site_kind`]. The `Display` glyphs are
/// for rendering and must never be parsed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum SiteKind {
    /// Standard tent site.
    #[default]
    Tent,
    /// Accessible tent site.
    TentAda,
    /// RV or hook-up site.
    Rv,
    /// Accessible RV site.
    RvAda,
    /// Cabin, yurt, or other roofed lodging.
    Lodging,
    /// Group site.
    Group,
    /// Day-use or picnic area.
    Day,
    /// Equestrian site.
    Equestrian,
    /// Boat-in site.
    Boat,
    /// Walk-in or hike-in site.
    Walk,
}

impl fmt::Display for SiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let glyph = match self {
            Self::Tent => "\u{26fa}",
            Self::TentAda => "\u{267f}\u{26fa}",
            Self::Rv => "\u{1f699}",
            Self::RvAda => "\u{267f}\u{1f699}",
            Self::Lodging => "\u{1f6cf}\u{fe0f}",
            Self::Group => "\u{1f9d1}\u{200d}\u{1f91d}\u{200d}\u{1f9d1}",
            Self::Day => "\u{1f96a}",
            Self::Equestrian => "\u{1f3c7}",
            Self::Boat => "\u{26f5}",
            Self::Walk => "\u{1f97e}",
        };
        f.write_str(glyph)
    }
}

/// One search request: where, when, and what to filter on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Latitude of the search origin.
    pub lat: f64,
    /// Longitude of the search origin.
    pub lon: f64,
    /// Arrival dates to check, in the caller's requested order.
    pub dates: Vec<NaiveDate>,
    /// Length of stay in nights.
    pub stay_length: u32,
    /// Maximum straight-line distance in miles. Zero means unlimited.
    pub max_distance: f64,
    /// Minimum editorial rating. Unresolved results rate as zero.
    pub min_rating: f64,
    /// Keywords: a result must mention at least one, case-insensitively.
    pub keywords: Vec<String>,
    /// Optional site-kind filter: a result must offer at least one of these.
    pub site_kinds: Vec<SiteKind>,
}

/// One open slot at a campground on one date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    /// Classified lodging kind.
    pub kind: SiteKind,
    /// Backend's own sub-kind phrase, when it offers one.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind_detail: String,
    /// Spot name, for backends that report individual spots.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub spot: String,
    /// Number of open spots. At least one.
    pub count: u32,
    /// The date this slot is open. Always one of the query's dates.
    pub date: NaiveDate,
    /// Deep link into the backend's booking flow.
    pub url: String,
}

/// Vendor-neutral record for one campground on one or more dates.
///
/// Identity for merging is the provider-scoped pair `res_url` + `res_id`.
/// A result emerging from a provider always has nonempty availability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Base URL of the reservation backend this record came from.
    pub res_url: String,
    /// Backend-scoped record identifier.
    pub res_id: String,
    /// Display name as reported by the backend.
    pub name: String,
    /// Straight-line miles from the query origin.
    pub distance: f64,
    /// Editorial rating, filled in by the resolver. Zero when unresolved.
    pub rating: f64,
    /// Free-text description, from the backend or the resolver.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub desc: String,
    /// Outbound URL for the campground itself.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// Image URL, when the backend offers one.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_url: String,
    /// Open slots, unioned across the query's dates by the merger.
    pub availability: Vec<Availability>,
    /// Feature tags as reported by the backend.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    /// Locale phrase, from the resolver when the backend has none.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub locale: String,
    /// Resolved curated campground, when the resolver found one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campground: Option<Campground>,
}

impl SearchResult {
    /// Merge identity: the provider-scoped identifier.
    #[must_use]
    pub fn site_key(&self) -> String {
        format!("{}{}", self.res_url, self.res_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_key_is_provider_scoped() {
        let a = SearchResult {
            res_url: "https://www.reserveamerica.com/".to_owned(),
            res_id: "STAN_1040013".to_owned(),
            ..SearchResult::default()
        };
        let b = SearchResult {
            res_url: "https://www.reservecalifornia.com/".to_owned(),
            res_id: "STAN_1040013".to_owned(),
            ..SearchResult::default()
        };
        assert_ne!(a.site_key(), b.site_key());
    }

    #[test]
    fn site_kind_glyphs_are_distinct() {
        let kinds = [
            SiteKind::Tent,
            SiteKind::TentAda,
            SiteKind::Rv,
            SiteKind::RvAda,
            SiteKind::Lodging,
            SiteKind::Group,
            SiteKind::Day,
            SiteKind::Equestrian,
            SiteKind::Boat,
            SiteKind::Walk,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a.to_string(), b.to_string());
            }
        }
    }
}
