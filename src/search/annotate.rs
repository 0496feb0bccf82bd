// ABOUTME: Resolver matching raw results to curated campgrounds via a cascaded score ladder
// ABOUTME: Annotates matched results with ratings, locales, and editorial descriptions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

//! Entity resolution.
//!
//! Names for the same campground differ across reservation backends and
//! editorial sources, so matching cascades from exact name equality down
//! through progressively mangled spellings, with property-level matches
//! ranking below campground-level ones. The best match across all properties
//! and campgrounds wins; ties break on first encounter over the sorted
//! property table.
//!
//! A result that matches nothing is a warning, never an error: it passes
//! through unannotated with a zero rating.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::mangle::{ellipsis, normalize, variations};
use crate::metadata::{maybe_decompress, Campground, Property};
use crate::models::SearchResult;

/// Number of words an annotated description is trimmed to.
const DESC_WORD_MAX: usize = 65;

/// Levenshtein distance at or under which mangled names count as approximate
/// matches.
const APPROX_DISTANCE: usize = 2;

/// Match quality, ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Score {
    /// No relationship found.
    NoMatch,
    /// Mangled result contained in or containing a mangled property name.
    BiMangledPropSubMatch,
    /// Mangled result equals a mangled property name.
    BiMangledPropMatch,
    /// Mangled result contained in or containing the property name.
    MangledPropSubMatch,
    /// Mangled result within edit distance of a mangled property name.
    ApproxPropMatch,
    /// Mangled result equals the property name.
    MangledPropMatch,
    /// Result name equals the property name.
    PropMatch,
    /// Mangled result contained in or containing a mangled campground name.
    BiMangledSubMatch,
    /// Mangled result contained in or containing the campground name.
    MangledSubMatch,
    /// Result name contained in or containing the campground name.
    SubMatch,
    /// Result name equals the name of a single-campground property.
    SinglePropMatch,
    /// Mangled result within edit distance of a mangled campground name.
    ApproxMatch,
    /// Mangled result equals a mangled campground name.
    BiMangledMatch,
    /// Mangled result equals the campground name.
    MangledMatch,
    /// Result name equals the campground name.
    NameMatch,
    /// Provider record id equals the campground's reservation id.
    SiteId,
}

/// One candidate pairing of a result with a curated campground.
#[derive(Debug, Clone)]
pub struct Match<'a> {
    /// Match quality.
    pub score: Score,
    /// Human-readable reason, for logs.
    pub detail: String,
    /// Owning property id.
    pub property_id: &'a str,
    /// The matched campground.
    pub campground: &'a Campground,
}

/// Resolver over the curated property table.
pub struct Resolver<'a> {
    props: &'a BTreeMap<String, Property>,
    variation_cache: RefCell<HashMap<String, Vec<String>>>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver. Properties must already be keyed by id.
    #[must_use]
    pub fn new(props: &'a BTreeMap<String, Property>) -> Self {
        Self {
            props,
            variation_cache: RefCell::new(HashMap::new()),
        }
    }

    /// Memoized [`variations`] lookup.
    fn vars(&self, name: &str) -> Vec<String> {
        if let Some(cached) = self.variation_cache.borrow().get(name) {
            return cached.clone();
        }
        let computed = variations(name);
        self.variation_cache
            .borrow_mut()
            .insert(name.to_owned(), computed.clone());
        computed
    }

    /// Annotate a result with the best-matching curated campground.
    pub fn annotate(&self, result: &mut SearchResult) {
        let Some(best) = self.best_match(result) else {
            warn!(
                target: "campscout::resolver",
                name = %result.name,
                res_id = %result.res_id,
                "no campground match"
            );
            return;
        };

        debug!(
            target: "campscout::resolver",
            name = %result.name,
            property = best.property_id,
            campground = %best.campground.id,
            score = ?best.score,
            detail = %best.detail,
            "matched"
        );

        let campground = best.campground;

        let rated: Vec<f64> = campground
            .refs
            .values()
            .filter(|r| r.rating > 0.0)
            .map(|r| r.rating)
            .collect();
        if !rated.is_empty() {
            result.rating = rated.iter().sum::<f64>() / rated.len() as f64;
        }

        for r in campground.refs.values() {
            if result.locale.is_empty() && !r.locale.is_empty() {
                result.locale.clone_from(&r.locale);
            }
            if result.desc.is_empty() && !r.desc.is_empty() {
                result.desc = ellipsis(&maybe_decompress(&r.desc), DESC_WORD_MAX);
            }
        }

        result.campground = Some(campground.clone());
    }

    /// The best match for a result across every property and campground.
    #[must_use]
    pub fn best_match(&self, result: &SearchResult) -> Option<Match<'a>> {
        let res_name = normalize(&result.name);
        if res_name.is_empty() {
            return None;
        }
        let res_vars = self.vars(&result.name);

        let mut best: Option<Match<'a>> = None;
        for (prop_id, prop) in self.props {
            let single = prop.campgrounds.len() == 1;

            // Property-tier hits apply to every campground in the property;
            // each rule hit demotes independently.
            let prop_hit = self
                .name_ladder(&res_name, &res_vars, &prop.name)
                .into_iter()
                .filter_map(|(s, d)| {
                    let (demoted, label) = demote_to_property(s, single);
                    (demoted > Score::NoMatch).then(|| (demoted, format!("{label}: {d}")))
                })
                .fold(None::<(Score, String)>, keep_best);

            for campground in &prop.campgrounds {
                let hit = if !result.res_id.is_empty()
                    && campground.res_id == result.res_id
                    && campground.res_url == result.res_url
                {
                    Some((Score::SiteId, format!("site id {}", result.res_id)))
                } else {
                    self.name_ladder(&res_name, &res_vars, &campground.name)
                        .into_iter()
                        .chain(prop_hit.clone())
                        .fold(None, keep_best)
                };

                let Some((score, detail)) = hit else {
                    continue;
                };

                // Strictly-greater keeps the first encounter on ties.
                if best.as_ref().map_or(true, |b| score > b.score) {
                    best = Some(Match {
                        score,
                        detail,
                        property_id: prop_id,
                        campground,
                    });
                }
            }
        }

        best
    }

    /// Ladder comparing a result name to one known name, returning every
    /// rule that fired.
    fn name_ladder(
        &self,
        res_name: &str,
        res_vars: &[String],
        known: &str,
    ) -> Vec<(Score, String)> {
        let known_name = normalize(known);
        if known_name.is_empty() {
            return Vec::new();
        }

        if res_name == known_name {
            return vec![(
                Score::NameMatch,
                format!("result {res_name:?} = known {known_name:?}"),
            )];
        }

        let mut hits = Vec::new();

        if res_name.contains(&known_name) || known_name.contains(res_name) {
            hits.push((
                Score::SubMatch,
                format!("{known_name:?} within {res_name:?}"),
            ));
        }

        let known_vars = self.vars(known);
        for rv in res_vars {
            if *rv == known_name {
                hits.push((Score::MangledMatch, format!("{rv:?} = {known_name:?}")));
            } else if known_name.contains(rv.as_str()) || rv.contains(&known_name) {
                hits.push((
                    Score::MangledSubMatch,
                    format!("{rv:?} within {known_name:?}"),
                ));
            }

            for kv in &known_vars {
                if rv == kv {
                    hits.push((Score::BiMangledMatch, format!("{rv:?} = {kv:?}")));
                } else if kv.contains(rv.as_str()) || rv.contains(kv.as_str()) {
                    hits.push((Score::BiMangledSubMatch, format!("{rv:?} within {kv:?}")));
                } else if strsim::levenshtein(rv, kv) <= APPROX_DISTANCE {
                    hits.push((Score::ApproxMatch, format!("{rv:?} ~= {kv:?}")));
                }
            }
        }

        hits
    }
}

/// Keep the strictly better of two scored hits; ties keep the earlier.
fn keep_best(
    best: Option<(Score, String)>,
    next: (Score, String),
) -> Option<(Score, String)> {
    match best {
        Some(cur) if cur.0 >= next.0 => Some(cur),
        _ => Some(next),
    }
}

/// Map a campground-tier score onto the property tier.
///
/// An exact name match against a single-campground property outranks a plain
/// property match and points at the sole campground.
fn demote_to_property(score: Score, single: bool) -> (Score, &'static str) {
    match score {
        Score::NameMatch if single => (Score::SinglePropMatch, "single-campground property"),
        Score::NameMatch => (Score::PropMatch, "property name"),
        Score::SubMatch | Score::MangledSubMatch => {
            (Score::MangledPropSubMatch, "property name fragment")
        }
        Score::MangledMatch => (Score::MangledPropMatch, "mangled property name"),
        Score::BiMangledMatch => (Score::BiMangledPropMatch, "mangled property name"),
        Score::BiMangledSubMatch => {
            (Score::BiMangledPropSubMatch, "mangled property fragment")
        }
        Score::ApproxMatch => (Score::ApproxPropMatch, "approximate property name"),
        _ => (Score::NoMatch, ""),
    }
}
