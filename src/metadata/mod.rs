// ABOUTME: Curated editorial metadata model and YAML loader
// ABOUTME: Sources own rating scales; properties own campgrounds which own per-source refs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

//! Editorial metadata.
//!
//! Loaded once at startup and treated as immutable afterwards. A [`Property`]
//! is a park or reservation-managed area; a [`Campground`] is a specific
//! reservable unit inside it; a [`Ref`] is one editorial source's opinion of
//! a campground. Source ids keyed in `Campground::refs` must exist in the
//! source table.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};

pub mod compress;

pub use compress::{compress, decompress, maybe_decompress};

/// A rating provider: the publisher of a set of refs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Display name, e.g. a guidebook title.
    #[serde(default)]
    pub name: String,
    /// Website for the source.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// What the rating measures, e.g. "Scenery".
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rating_desc: String,
    /// Maximum rating value on this source's scale.
    #[serde(default)]
    pub rating_max: f64,
}

/// Membership in an editorial list, e.g. "Best Planet Retreats, #8".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefList {
    /// List URL.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// List title.
    #[serde(default)]
    pub title: String,
    /// Position within the list.
    #[serde(default)]
    pub place: u32,
}

/// One editorial source's opinion of a campground.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ref {
    /// Campground name as this source knows it.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Description; may be gzip+base64 with a literal `z` prefix byte.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub desc: String,
    /// Contact information published by the source.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub contact: String,
    /// Latitude, when the source publishes coordinates.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub lat: f64,
    /// Longitude, when the source publishes coordinates.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub lon: f64,
    /// Rating on the owning source's scale. Zero means unrated.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub rating: f64,
    /// Feature tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    /// Locale phrase, e.g. "on the coast in Big Sur".
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub locale: String,
    /// Editorial list memberships.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lists: Vec<RefList>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

/// A specific reservable unit inside a property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Campground {
    /// Identifier, unique within the owning property.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Campground website.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// Reservation backend base URL: the hook back to provider records.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub res_url: String,
    /// Reservation backend record id.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub res_id: String,
    /// Editorial opinions, keyed by source id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub refs: BTreeMap<String, Ref>,
}

/// A park or reservation-managed area holding one or more campgrounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Globally unique id of the form `/region/locality[/name]`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Property website.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// Managing organization.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub managed_by: String,
    /// Campgrounds within the property. Always at least one.
    #[serde(default)]
    pub campgrounds: Vec<Campground>,
}

/// Top-level shape of one metadata YAML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MetadataFile {
    #[serde(default)]
    sources: BTreeMap<String, Source>,
    #[serde(default)]
    properties: Vec<Property>,
}

/// Load and merge metadata from one or more YAML files.
///
/// Properties are indexed by id; later files win on id collisions. Refs that
/// name a source id missing from the merged source table are reported at
/// `warn` but kept.
///
/// # Errors
///
/// Returns a `Config` error when a file cannot be read or parsed.
pub fn load_all(
    paths: &[impl AsRef<Path>],
) -> AppResult<(BTreeMap<String, Source>, BTreeMap<String, Property>)> {
    let mut sources = BTreeMap::new();
    let mut properties = BTreeMap::new();

    for path in paths {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("read {}: {e}", path.display())))?;
        let file: MetadataFile = serde_yaml::from_str(&raw)
            .map_err(|e| AppError::config(format!("parse {}: {e}", path.display())))?;

        debug!(
            target: "campscout::metadata",
            path = %path.display(),
            sources = file.sources.len(),
            properties = file.properties.len(),
            "loaded metadata file"
        );

        sources.extend(file.sources);
        for prop in file.properties {
            properties.insert(prop.id.clone(), prop);
        }
    }

    for prop in properties.values() {
        for cg in &prop.campgrounds {
            for source_id in cg.refs.keys() {
                if !sources.contains_key(source_id) {
                    warn!(
                        target: "campscout::metadata",
                        property = %prop.id,
                        campground = %cg.id,
                        source = %source_id,
                        "ref names an unknown source"
                    );
                }
            }
        }
    }

    Ok((sources, properties))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
sources:
  cc:
    name: Camper's Companion
    rating_desc: Scenery
    rating_max: 10
properties:
  - id: /ca/chico/zlky
    name: Mount Elky State Park
    campgrounds:
      - id: main
        name: Mt. Elky
        res_url: https://www.reserveamerica.com/
        res_id: ELKY_100
        refs:
          cc:
            name: Mt. Elky Campground
            rating: 7
            locale: in the hills above Chico
";

    #[test]
    fn parses_sources_and_properties() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("ca.yaml");
        std::fs::write(&path, SAMPLE)?;

        let (sources, props) = load_all(&[&path])?;
        assert_eq!(sources.len(), 1);
        assert_eq!(sources["cc"].rating_max, 10.0);

        let prop = &props["/ca/chico/zlky"];
        assert_eq!(prop.name, "Mount Elky State Park");
        assert_eq!(prop.campgrounds.len(), 1);
        let cg = &prop.campgrounds[0];
        assert_eq!(cg.refs["cc"].rating, 7.0);
        assert_eq!(cg.res_id, "ELKY_100");
        Ok(())
    }

    #[test]
    fn later_files_win_on_id_collision() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let first = dir.path().join("a.yaml");
        let second = dir.path().join("b.yaml");
        std::fs::write(
            &first,
            "properties:\n  - id: /ca/x\n    name: Old Name\n    campgrounds: []\n",
        )?;
        std::fs::write(
            &second,
            "properties:\n  - id: /ca/x\n    name: New Name\n    campgrounds: []\n",
        )?;

        let (_, props) = load_all(&[&first, &second])?;
        assert_eq!(props["/ca/x"].name, "New Name");
        Ok(())
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = load_all(&["/nonexistent/metadata.yaml"]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
