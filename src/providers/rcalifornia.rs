// ABOUTME: Statewide park system backend using a single JSON nearby-search POST per date
// ABOUTME: The backend truncates instead of paginating; feature tags arrive <br>-delimited
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

//! ReserveCalifornia provider.
//!
//! One POST per date with `NearbyOnlyAvailable` set; the backend returns at
//! most `NearbyCountLimit` places sorted by distance, so there is no
//! pagination loop.

use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::cookie::Jar;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{fetch, Request, Store};
use crate::errors::{AppError, AppResult};
use crate::models::{Availability, Query, SearchResult, SiteKind};
use crate::providers::{merge_dates, Provider};

/// ReserveCalifornia backend.
pub struct ReserveCalifornia {
    store: Arc<dyn Store>,
    jar: Arc<Jar>,
}

/// Search request body. Field order matches what the service documents.
#[derive(Debug, Serialize)]
struct PlaceSearchRequest {
    #[serde(rename = "PlaceId")]
    place_id: u32,
    #[serde(rename = "Latitude")]
    latitude: String,
    #[serde(rename = "Longitude")]
    longitude: String,
    #[serde(rename = "HighlightedPlaceId")]
    highlighted_place_id: u32,
    #[serde(rename = "StartDate")]
    start_date: String,
    #[serde(rename = "Nights")]
    nights: String,
    #[serde(rename = "CountNearby")]
    count_nearby: bool,
    #[serde(rename = "NearbyLimit")]
    nearby_limit: u32,
    #[serde(rename = "NearbyOnlyAvailable")]
    nearby_only_available: bool,
    #[serde(rename = "NearbyCountLimit")]
    nearby_count_limit: u32,
    #[serde(rename = "Sort")]
    sort: String,
    #[serde(rename = "CustomerID")]
    customer_id: String,
    #[serde(rename = "RefreshFavourites")]
    refresh_favourites: bool,
    #[serde(rename = "IsADA")]
    is_ada: bool,
    #[serde(rename = "UnitCategoryId")]
    unit_category_id: u32,
    #[serde(rename = "SleepingUnitId")]
    sleeping_unit_id: u32,
    #[serde(rename = "MinVehicleLength")]
    min_vehicle_length: u32,
    #[serde(rename = "UnitTypeGroupIds")]
    unit_type_group_ids: Vec<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct NearbyPlace {
    #[serde(rename = "Allhighlights", default)]
    all_highlights: String,
    #[serde(rename = "Available", default)]
    available: bool,
    #[serde(rename = "Description", default)]
    description: String,
    #[serde(rename = "MilesFromSelected", default)]
    miles_from_selected: f64,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "PlaceId", default)]
    place_id: u32,
    #[serde(rename = "ImageUrl", default)]
    image_url: String,
    #[serde(rename = "Url", default)]
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct PlaceSearchResponse {
    #[serde(rename = "NearbyPlaces", default)]
    nearby_places: Vec<NearbyPlace>,
}

impl ReserveCalifornia {
    /// Create the provider with a fresh session jar.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            jar: Arc::new(Jar::default()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("https://www.reservecalifornia.com{path}")
    }

    /// Search request for one arrival date.
    fn page_request(&self, query: &Query, arrival: NaiveDate) -> AppResult<Request> {
        let body = PlaceSearchRequest {
            place_id: 0,
            latitude: format!("{:.4}", query.lat),
            longitude: format!("{:.4}", query.lon),
            highlighted_place_id: 0,
            start_date: arrival.format("%m-%d-%Y").to_string(),
            nights: query.stay_length.to_string(),
            count_nearby: true,
            nearby_limit: query.max_distance as u32,
            nearby_only_available: true,
            nearby_count_limit: 100,
            sort: "Distance".to_owned(),
            customer_id: "0".to_owned(),
            refresh_favourites: true,
            is_ada: false,
            unit_category_id: 0,
            sleeping_unit_id: 0,
            min_vehicle_length: 0,
            unit_type_group_ids: Vec::new(),
        };

        Ok(Request {
            method: "POST".to_owned(),
            url: "https://calirdr.usedirect.com/rdr/rdr/search/place".to_owned(),
            referrer: self.url("/"),
            content_type: "application/json".to_owned(),
            body: serde_json::to_vec(&body)
                .map_err(|e| AppError::parse(format!("marshal: {e}")))?,
            jar: Some(Arc::clone(&self.jar)),
            ..Request::default()
        })
    }

    fn parse(&self, body: &[u8], date: NaiveDate) -> AppResult<Vec<SearchResult>> {
        debug!(target: "campscout::providers", bytes = body.len(), "parsing place search");
        let page: PlaceSearchResponse = serde_json::from_slice(body)
            .map_err(|e| AppError::parse(format!("place search: {e}")))?;

        let mut results = Vec::new();
        for place in page.nearby_places {
            if !place.available {
                continue;
            }

            let availability = Availability {
                kind: SiteKind::Tent,
                count: 1,
                date,
                url: self.url("/CaliforniaWebHome/Facilities/SearchViewUnitAvailabity.aspx"),
                ..Availability::default()
            };

            results.push(SearchResult {
                res_url: self.url("/"),
                res_id: place.place_id.to_string(),
                name: place.name,
                desc: place.description,
                features: split_highlights(&place.all_highlights),
                distance: place.miles_from_selected,
                availability: vec![availability],
                url: place.url,
                image_url: place.image_url,
                ..SearchResult::default()
            });
        }

        Ok(results)
    }

    async fn avail(&self, query: &Query, date: NaiveDate) -> AppResult<Vec<SearchResult>> {
        let req = self.page_request(query, date)?;
        let resp = fetch(req, self.store.as_ref()).await?;
        let results = self.parse(&resp.body, date)?;

        info!(
            target: "campscout::providers",
            provider = "rcalifornia",
            %date,
            count = results.len(),
            "date searched"
        );
        Ok(results)
    }
}

/// Feature tags arrive as one `<br>`-delimited string.
fn split_highlights(highlights: &str) -> Vec<String> {
    highlights
        .trim_end_matches("<br>")
        .split("<br>")
        .filter(|part| !part.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[async_trait::async_trait]
impl Provider for ReserveCalifornia {
    fn name(&self) -> &'static str {
        "ReserveCalifornia"
    }

    async fn list(&self, query: &Query) -> AppResult<Vec<SearchResult>> {
        let mut results = Vec::new();
        for date in &query.dates {
            let rs = self
                .avail(query, *date)
                .await
                .map_err(|e| e.for_provider(self.name()))?;
            results.extend(rs);
        }

        Ok(merge_dates(results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;

    const SEARCH_FIXTURE: &[u8] = include_bytes!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/testdata/rc_search.json"
    ));

    fn provider() -> ReserveCalifornia {
        ReserveCalifornia::new(Arc::new(MemoryStore::new()))
    }

    fn query() -> Query {
        Query {
            lat: 37.4092297,
            lon: -122.072_370_5,
            stay_length: 4,
            max_distance: 100.0,
            ..Query::default()
        }
    }

    #[test]
    fn request_body_keys_keep_documented_order() {
        let rc = provider();
        let date = NaiveDate::from_ymd_opt(2021, 2, 12).unwrap();
        let req = rc.page_request(&query(), date).unwrap();

        assert_eq!(req.method, "POST");
        assert_eq!(req.url, "https://calirdr.usedirect.com/rdr/rdr/search/place");
        assert_eq!(req.content_type, "application/json");

        let body = String::from_utf8(req.body).unwrap();
        let place = body.find("\"PlaceId\"").unwrap();
        let lat = body.find("\"Latitude\"").unwrap();
        let start = body.find("\"StartDate\"").unwrap();
        let nearby = body.find("\"NearbyOnlyAvailable\"").unwrap();
        assert!(place < lat && lat < start && start < nearby);

        assert!(body.contains("\"StartDate\":\"02-12-2021\""));
        assert!(body.contains("\"Nights\":\"4\""));
        assert!(body.contains("\"NearbyOnlyAvailable\":true"));
        assert!(body.contains("\"Latitude\":\"37.4092\""));
    }

    #[test]
    fn parses_nearby_places() {
        let rc = provider();
        let date = NaiveDate::from_ymd_opt(2021, 2, 12).unwrap();

        let results = rc.parse(SEARCH_FIXTURE, date).unwrap();
        assert_eq!(results.len(), 2);

        assert_eq!(results[0].name, "Mount Tamalpais SP");
        assert!((results[0].distance - 17.0).abs() < 1e-9);
        assert_eq!(
            results[0].features,
            vec!["Campsites", "Hiking Trails", "Beach Access"]
        );
        assert_eq!(results[0].availability.len(), 1);
        assert_eq!(results[0].availability[0].date, date);

        assert_eq!(results[1].name, "Mount Diablo SP");
        assert!((results[1].distance - 26.0).abs() < 1e-9);
    }

    #[test]
    fn unavailable_places_are_dropped() {
        let rc = provider();
        let date = NaiveDate::from_ymd_opt(2021, 2, 12).unwrap();
        let results = rc.parse(SEARCH_FIXTURE, date).unwrap();
        assert!(!results.iter().any(|r| r.name == "Angel Island SP"));
    }

    #[test]
    fn highlights_split_on_br() {
        assert_eq!(
            split_highlights("Campsites<br>Museums<br>"),
            vec!["Campsites", "Museums"]
        );
        assert!(split_highlights("").is_empty());
    }
}
