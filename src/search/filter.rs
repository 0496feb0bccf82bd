// ABOUTME: Post-fetch predicates and ranking for annotated search results
// ABOUTME: Distance, rating, keyword, and site-kind filters; stable sort by rating descending
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

//! Filtering and ranking.
//!
//! All predicates must pass for a result to survive. Keyword matching is a
//! case-insensitive substring search over the result's own text plus every
//! editorial ref attached by the resolver, so a query for "redwoods" finds
//! campgrounds whose backend name never mentions them.

use std::cmp::Ordering;

use tracing::debug;

use crate::models::{Query, SearchResult};

/// Apply the query's predicates to annotated results.
#[must_use]
pub fn filter(query: &Query, results: Vec<SearchResult>) -> Vec<SearchResult> {
    debug!(target: "campscout::search", count = results.len(), "filtering results");

    results
        .into_iter()
        .filter(|r| {
            if query.max_distance > 0.0 && r.distance > query.max_distance {
                debug!(target: "campscout::search", name = %r.name, miles = r.distance, "too far");
                return false;
            }
            if r.rating < query.min_rating {
                debug!(target: "campscout::search", name = %r.name, rating = r.rating, "rated too low");
                return false;
            }
            if !query.site_kinds.is_empty()
                && !r
                    .availability
                    .iter()
                    .any(|a| query.site_kinds.contains(&a.kind))
            {
                debug!(target: "campscout::search", name = %r.name, "no matching site kind");
                return false;
            }
            if !query.keywords.is_empty() && !matches_keywords(query, r) {
                debug!(target: "campscout::search", name = %r.name, "no keyword match");
                return false;
            }
            true
        })
        .collect()
}

/// Whether any query keyword appears in the result's searchable text.
fn matches_keywords(query: &Query, result: &SearchResult) -> bool {
    let mut fields: Vec<&str> = vec![&result.desc, &result.name];
    fields.extend(result.features.iter().map(String::as_str));
    if let Some(cg) = &result.campground {
        for r in cg.refs.values() {
            fields.extend([
                r.name.as_str(),
                r.locale.as_str(),
                r.desc.as_str(),
                r.contact.as_str(),
            ]);
        }
    }

    query.keywords.iter().any(|keyword| {
        let keyword = keyword.to_lowercase();
        fields
            .iter()
            .any(|f| f.to_lowercase().contains(&keyword))
    })
}

/// Stable sort by rating descending; equal ratings keep their input order.
pub fn rank(results: &mut [SearchResult]) {
    results.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Campground, Ref};
    use crate::models::{Availability, SiteKind};

    fn result(name: &str, distance: f64, rating: f64) -> SearchResult {
        SearchResult {
            name: name.to_owned(),
            distance,
            rating,
            availability: vec![Availability::default()],
            ..SearchResult::default()
        }
    }

    #[test]
    fn distance_and_rating_predicates() {
        let inputs = vec![result("near", 30.45, 7.0), result("far", 90.45, 2.0)];

        let q = Query {
            max_distance: 35.0,
            ..Query::default()
        };
        let out = filter(&q, inputs.clone());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "near");

        let q = Query {
            max_distance: 35.0,
            min_rating: 5.0,
            ..Query::default()
        };
        let out = filter(&q, inputs);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "near");
    }

    #[test]
    fn zero_max_distance_means_unlimited() {
        let q = Query::default();
        let out = filter(&q, vec![result("anywhere", 5000.0, 0.0)]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn tightening_never_adds_results() {
        let inputs = vec![
            result("a", 10.0, 8.0),
            result("b", 40.0, 6.0),
            result("c", 70.0, 4.0),
        ];

        let loose = filter(&Query::default(), inputs.clone()).len();
        let tighter = filter(
            &Query {
                max_distance: 50.0,
                ..Query::default()
            },
            inputs.clone(),
        )
        .len();
        let tightest = filter(
            &Query {
                max_distance: 50.0,
                min_rating: 7.0,
                keywords: vec!["a".to_owned()],
                ..Query::default()
            },
            inputs,
        )
        .len();

        assert!(loose >= tighter);
        assert!(tighter >= tightest);
    }

    #[test]
    fn keywords_search_refs_too() {
        let mut r = result("Backend Name", 10.0, 5.0);
        let mut cg = Campground {
            id: "main".to_owned(),
            name: "Curated Name".to_owned(),
            ..Campground::default()
        };
        cg.refs.insert(
            "cc".to_owned(),
            Ref {
                desc: "Towering redwoods shade every site.".to_owned(),
                ..Ref::default()
            },
        );
        r.campground = Some(cg);

        let q = Query {
            keywords: vec!["REDWOODS".to_owned()],
            ..Query::default()
        };
        let out = filter(&q, vec![r.clone()]);
        assert_eq!(out.len(), 1);

        let q = Query {
            keywords: vec!["waterfall".to_owned()],
            ..Query::default()
        };
        assert!(filter(&q, vec![r]).is_empty());
    }

    #[test]
    fn site_kind_filter_requires_an_offering() {
        let mut r = result("rv place", 10.0, 5.0);
        r.availability[0].kind = SiteKind::Rv;

        let q = Query {
            site_kinds: vec![SiteKind::Rv],
            ..Query::default()
        };
        assert_eq!(filter(&q, vec![r.clone()]).len(), 1);

        let q = Query {
            site_kinds: vec![SiteKind::Lodging],
            ..Query::default()
        };
        assert!(filter(&q, vec![r]).is_empty());
    }

    #[test]
    fn rank_sorts_by_rating_descending_stably() {
        let mut results = vec![
            result("low", 1.0, 2.0),
            result("tied-first", 2.0, 5.0),
            result("high", 3.0, 9.0),
            result("tied-second", 4.0, 5.0),
        ];
        rank(&mut results);

        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["high", "tied-first", "tied-second", "low"]);
    }
}
