// ABOUTME: Shared site-kind classifier mapping backend phrases to the SiteKind enumeration
// ABOUTME: Scans spot-id, kind-phrase, and title tokens against a fixed precedence table
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

//! Site-kind classification.
//!
//! Backends describe lodging types with free text ("Tent/Non-Electric",
//! "RV w/ Hookups", "Yurt"). This classifier is deterministic and
//! order-sensitive: the spot-id is consulted before the kind-phrase, which is
//! consulted before the title, and the first matching token wins.

use crate::models::SiteKind;

/// Classify a spot into a [`SiteKind`] from up to three backend strings.
///
/// `spot_id` takes precedence over `kind`, which takes precedence over
/// `title`. A literal `RV` in the spot-id short-circuits to [`SiteKind::Rv`];
/// a literal `Picnic` in the title falls back to [`SiteKind::Day`]. The
/// default is [`SiteKind::Tent`].
#[must_use]
pub fn site_kind(spot_id: &str, kind: &str, title: &str) -> SiteKind {
    if spot_id.contains("RV") {
        return SiteKind::Rv;
    }

    for input in [spot_id, kind, title] {
        let spaced: String = input
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();
        for word in spaced.to_lowercase().split_whitespace() {
            match word {
                "tent" => return SiteKind::Tent,
                "ada" | "accessible" | "handicapped" => {
                    if kind.contains("RV") {
                        return SiteKind::RvAda;
                    }
                    return SiteKind::TentAda;
                }
                "horse" | "equestrian" => return SiteKind::Equestrian,
                "rv" | "hook" | "hookup" | "electric" => return SiteKind::Rv,
                "cabin" | "yurt" | "lodge" | "hotel" | "hostel" | "motel" | "lodging" => {
                    return SiteKind::Lodging
                }
                "boat" | "kayak" | "canoe" => return SiteKind::Boat,
                "day" | "picnic" => return SiteKind::Day,
                "group" => return SiteKind::Group,
                "walk" | "hike" => return SiteKind::Walk,
                _ => {}
            }
        }
    }

    if title.contains("Picnic") {
        return SiteKind::Day;
    }

    SiteKind::Tent
}
