// ABOUTME: Advanced statewide park endpoint returning per-facility spot counts
// ABOUTME: Classifies each open spot over facility name, spot type, and site id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

//! ReserveCalifornia advanced provider.
//!
//! The advanced search page drives a grid endpoint that reports individual
//! open spots per facility instead of a flat place list. One availability is
//! emitted per spot type, classified over the `(facility name, spot type,
//! site id)` triple.

use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::cookie::Jar;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{fetch, Request, Store};
use crate::errors::{AppError, AppResult};
use crate::mangle::site_kind;
use crate::models::{Availability, Query, SearchResult};
use crate::providers::{merge_dates, Provider};

/// ReserveCalifornia advanced-search backend.
pub struct ReserveCaliforniaAdv {
    store: Arc<dyn Store>,
    jar: Arc<Jar>,
}

#[derive(Debug, Serialize)]
struct AvailabilitySearchParams {
    #[serde(rename = "CategoryId")]
    category_id: u32,
    #[serde(rename = "ChooseActivity")]
    choose_activity: u32,
    #[serde(rename = "NoOfRecords")]
    no_of_records: u32,
    #[serde(rename = "PageIndex")]
    page_index: u32,
    #[serde(rename = "PageSize")]
    page_size: u32,
    #[serde(rename = "ParkCategory")]
    park_category: u32,
    #[serde(rename = "StartDate")]
    start_date: String,
    // The interface wants nights as a string, not an int.
    #[serde(rename = "Nights")]
    nights: String,
}

#[derive(Debug, Serialize)]
struct GooglePlaceSearchParams {
    #[serde(rename = "Latitude")]
    latitude: String,
    #[serde(rename = "Longitude")]
    longitude: String,
    #[serde(rename = "Filter")]
    filter: bool,
    #[serde(rename = "ZoomLevel")]
    zoom_level: u32,
    #[serde(rename = "AvailabilitySearchParams")]
    availability_search_params: AvailabilitySearchParams,
}

#[derive(Debug, Serialize)]
struct GridSearchRequest {
    #[serde(rename = "googlePlaceSearchParameters")]
    google_place_search_parameters: GooglePlaceSearchParams,
    #[serde(rename = "ScreenResolution")]
    screen_resolution: u32,
}

#[derive(Debug, Default, Deserialize)]
struct GridSpot {
    #[serde(rename = "SiteId", default)]
    site_id: String,
    #[serde(rename = "SpotName", default)]
    spot_name: String,
    #[serde(rename = "SpotTypeName", default)]
    spot_type_name: String,
    #[serde(rename = "Count", default)]
    count: u32,
}

#[derive(Debug, Default, Deserialize)]
struct GridFacility {
    #[serde(rename = "FacilityId", default)]
    facility_id: String,
    #[serde(rename = "FacilityName", default)]
    facility_name: String,
    #[serde(rename = "FacilityDescription", default)]
    facility_description: String,
    #[serde(rename = "MilesFromSelected", default)]
    miles_from_selected: f64,
    #[serde(rename = "AvailableSpots", default)]
    available_spots: Vec<GridSpot>,
}

#[derive(Debug, Default, Deserialize)]
struct GridSearchResponse {
    #[serde(rename = "Facilities", default)]
    facilities: Vec<GridFacility>,
}

impl ReserveCaliforniaAdv {
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

    fn page_request(&self, query: &Query, arrival: NaiveDate) -> AppResult<Request> {
        let body = GridSearchRequest {
            google_place_search_parameters: GooglePlaceSearchParams {
                latitude: format!("{:.4}", query.lat),
                longitude: format!("{:.4}", query.lon),
                filter: true,
                zoom_level: 6,
                availability_search_params: AvailabilitySearchParams {
                    category_id: 0,
                    choose_activity: 1,
                    no_of_records: 100,
                    page_index: 0,
                    page_size: 100,
                    park_category: 0,
                    start_date: arrival.format("%m-%d-%Y").to_string(),
                    nights: query.stay_length.to_string(),
                },
            },
            screen_resolution: 1920,
        };

        Ok(Request {
            method: "POST".to_owned(),
            url: "https://calirdr.usedirect.com/rdr/rdr/search/grid".to_owned(),
            referrer: self.url("/"),
            content_type: "application/json".to_owned(),
            body: serde_json::to_vec(&body)
                .map_err(|e| AppError::parse(format!("marshal: {e}")))?,
            jar: Some(Arc::clone(&self.jar)),
            ..Request::default()
        })
    }

    fn parse(
        &self,
        body: &[u8],
        date: NaiveDate,
        query: &Query,
    ) -> AppResult<Vec<SearchResult>> {
        debug!(target: "campscout::providers", bytes = body.len(), "parsing grid search");
        let page: GridSearchResponse = serde_json::from_slice(body)
            .map_err(|e| AppError::parse(format!("grid search: {e}")))?;

        let mut results = Vec::new();
        for facility in page.facilities {
            if facility.available_spots.is_empty() {
                continue;
            }
            if query.max_distance > 0.0 && facility.miles_from_selected > query.max_distance {
                debug!(
                    target: "campscout::providers",
                    name = %facility.facility_name,
                    miles = facility.miles_from_selected,
                    "skipping, too far"
                );
                continue;
            }

            let availability: Vec<Availability> = facility
                .available_spots
                .iter()
                .map(|spot| Availability {
                    kind: site_kind(&spot.site_id, &spot.spot_type_name, &facility.facility_name),
                    kind_detail: spot.spot_type_name.clone(),
                    spot: spot.spot_name.clone(),
                    count: spot.count.max(1),
                    date,
                    url: self.url("/CaliforniaWebHome/Facilities/AdvanceSearch.aspx"),
                })
                .collect();

            results.push(SearchResult {
                res_url: self.url("/"),
                res_id: facility.facility_id,
                name: facility.facility_name,
                desc: facility.facility_description,
                distance: facility.miles_from_selected,
                availability,
                ..SearchResult::default()
            });
        }

        Ok(results)
    }

    async fn avail(&self, query: &Query, date: NaiveDate) -> AppResult<Vec<SearchResult>> {
        let req = self.page_request(query, date)?;
        let resp = fetch(req, self.store.as_ref()).await?;
        let results = self.parse(&resp.body, date, query)?;

        info!(
            target: "campscout::providers",
            provider = "rcadv",
            %date,
            count = results.len(),
            "date searched"
        );
        Ok(results)
    }
}

#[async_trait::async_trait]
impl Provider for ReserveCaliforniaAdv {
    fn name(&self) -> &'static str {
        "ReserveCaliforniaAdv"
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
    use crate::models::SiteKind;

    const GRID_FIXTURE: &[u8] = include_bytes!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/testdata/rcadv_grid.json"
    ));

    fn provider() -> ReserveCaliforniaAdv {
        ReserveCaliforniaAdv::new(Arc::new(MemoryStore::new()))
    }

    fn query() -> Query {
        Query {
            lat: 37.4092297,
            lon: -122.072_370_5,
            stay_length: 2,
            max_distance: 100.0,
            ..Query::default()
        }
    }

    #[test]
    fn parses_per_facility_spot_counts() {
        let adv = provider();
        let date = NaiveDate::from_ymd_opt(2021, 2, 12).unwrap();

        let results = adv.parse(GRID_FIXTURE, date, &query()).unwrap();
        assert_eq!(results.len(), 1);

        let portola = &results[0];
        assert_eq!(portola.name, "Portola Redwoods SP");
        assert_eq!(portola.availability.len(), 3);

        let kinds: Vec<SiteKind> = portola.availability.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![SiteKind::Tent, SiteKind::Rv, SiteKind::Walk]);

        let counts: Vec<u32> = portola.availability.iter().map(|a| a.count).collect();
        assert_eq!(counts, vec![12, 4, 2]);
    }

    #[test]
    fn facilities_without_spots_are_dropped() {
        let adv = provider();
        let date = NaiveDate::from_ymd_opt(2021, 2, 12).unwrap();
        let results = adv.parse(GRID_FIXTURE, date, &query()).unwrap();
        assert!(!results.iter().any(|r| r.name == "Castle Rock SP"));
    }

    #[test]
    fn request_targets_grid_endpoint() {
        let adv = provider();
        let date = NaiveDate::from_ymd_opt(2021, 2, 12).unwrap();
        let req = adv.page_request(&query(), date).unwrap();

        assert_eq!(req.url, "https://calirdr.usedirect.com/rdr/rdr/search/grid");
        let body = String::from_utf8(req.body).unwrap();
        assert!(body.contains("\"StartDate\":\"02-12-2021\""));
        assert!(body.contains("\"Nights\":\"2\""));
        assert!(body.contains("\"googlePlaceSearchParameters\""));
    }
}
