// ABOUTME: Text manipulation for fuzzy campground name matching
// ABOUTME: Acronym expansion, filler-word removal, Unicode normalization, and name variations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

//! Name-normalization vocabulary shared by the resolver.
//!
//! Campground names are wildly inconsistent across reservation backends and
//! editorial sources: abbreviations ("SP" vs "State Park"), filler words
//! ("Campground", "Regional"), punctuation, and diacritics all vary. The
//! helpers here produce progressively more aggressive spellings of a name so
//! the resolver can cascade from exact to fuzzy matching.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub mod site_kind;

pub use site_kind::site_kind;

/// Uppercased acronyms and their expansions.
const ACRONYMS: &[(&str, &str)] = &[
    ("MT.", "MOUNT"),
    ("SB", "STATE BEACH"),
    ("SRA", "STATE RECREATION AREA"),
    ("SP", "STATE PARK"),
    ("CP", "COUNTY PARK"),
    ("NP", "NATIONAL PARK"),
];

/// Generic filler words that can be dropped when matching names.
const EXTRA_WORDS: &[&str] = &[
    "&",
    "(CA)",
    "AND",
    "AREA",
    "CAMP",
    "CAMPGROUND",
    "COUNTY",
    "DAY",
    "FOREST",
    "FS",
    "MONUMENT",
    "NATIONAL",
    "NATL",
    "PARK",
    "RECREATION",
    "REGIONAL",
    "STATE",
    "USE",
];

fn non_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Safe: pattern is a compile-time constant
    RE.get_or_init(|| Regex::new(r"\W+").expect("valid regex"))
}

/// Replace known acronyms with their expansions, word by word.
#[must_use]
pub fn expand(s: &str) -> String {
    s.split(' ')
        .map(|w| {
            let upper = w.to_uppercase();
            ACRONYMS
                .iter()
                .find(|(acro, _)| *acro == upper)
                .map_or(w, |(_, full)| *full)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// One-pass shortening: remove the first filler word found, if any.
///
/// Returns the shortened string and whether anything was removed. Acronyms
/// are expanded before scanning so that, for example, "SP" is seen as
/// "STATE PARK"; when no filler word is found the input comes back
/// untouched, expansion and all.
#[must_use]
pub fn shorten(s: &str) -> (String, bool) {
    let expanded = expand(s);
    let mut words: Vec<&str> = expanded.split(' ').collect();
    let filler = words.iter().position(|w| {
        let upper = w.to_uppercase();
        EXTRA_WORDS.contains(&upper.as_str())
    });
    if let Some(i) = filler {
        words.remove(i);
        return (words.join(" "), true);
    }
    (s.to_owned(), false)
}

/// Iterate [`shorten`] to a fixed point: the shortest possible name.
#[must_use]
pub fn shortest(s: &str) -> String {
    let mut cur = s.to_owned();
    loop {
        let (next, shortened) = shorten(&cur);
        cur = next;
        if !shortened {
            return cur;
        }
    }
}

/// Canonical lowercase form of a name.
///
/// NFD-decomposes, strips combining marks, lowercases, strips apostrophes,
/// collapses non-word runs to single spaces, and trims.
#[must_use]
pub fn normalize(s: &str) -> String {
    let stripped: String = s
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .chars()
        .filter(|c| *c != '\'' && *c != '\u{2019}')
        .collect();
    non_word_re()
        .replace_all(&stripped, " ")
        .trim()
        .to_owned()
}

/// The set of normalized spellings of a name used for fuzzy matching.
///
/// In order: the fully mangled form with spaces removed, the shortest form,
/// the expanded form, and the shortest expanded form, all lowercased and
/// deduplicated while preserving order.
#[must_use]
pub fn variations(s: &str) -> Vec<String> {
    let expanded = expand(s);
    let shortest_expanded = shortest(&expanded);

    let candidates = [
        shortest_expanded.replace(' ', ""),
        shortest(s),
        expanded,
        shortest_expanded,
    ];

    let mut out: Vec<String> = Vec::with_capacity(candidates.len());
    for c in candidates {
        let lower = c.to_lowercase();
        if !lower.is_empty() && !out.contains(&lower) {
            out.push(lower);
        }
    }
    out
}

/// Truncate to at most `max_words` words, appending an ellipsis when cut.
#[must_use]
pub fn ellipsis(s: &str, max_words: usize) -> String {
    let words: Vec<&str> = s.split(' ').collect();
    if words.len() < max_words {
        return s.to_owned();
    }
    format!("{} ...", words[..max_words].join(" "))
}
