// ABOUTME: Great-circle distance between two coordinates in statute miles
// ABOUTME: Used by county providers as a coarse proximity gate before searching
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

//! Geographic distance primitive.

/// Mean Earth radius in statute miles.
const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Haversine distance in miles between two latitude/longitude pairs.
#[must_use]
pub fn miles_apart(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_MILES * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_to_self() {
        assert!(miles_apart(37.4092297, -122.0723705, 37.4092297, -122.0723705) < 1e-9);
    }

    #[test]
    fn mountain_view_to_santa_cruz() {
        // Roughly 30 miles as the crow flies.
        let d = miles_apart(37.4092297, -122.0723705, 36.9741, -122.0308);
        assert!((27.0..33.0).contains(&d), "got {d}");
    }

    #[test]
    fn symmetric() {
        let a = miles_apart(37.19, -122.41, 37.41, -122.07);
        let b = miles_apart(37.41, -122.07, 37.19, -122.41);
        assert!((a - b).abs() < 1e-9);
    }
}
