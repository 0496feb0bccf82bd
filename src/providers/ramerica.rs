// ABOUTME: National reservation network backend with paginated JSON nearby search
// ABOUTME: Warm-up page sets session cookies; pages are fetched until the server reports the last
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

//! ReserveAmerica provider.
//!
//! Nearby search keyed on latitude/longitude/arrival/length-of-stay. The
//! backend paginates with `currentPage`/`totalPages` control fields; records
//! missing the available flag or beyond the query's maximum distance are
//! discarded at parse time.

use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::cookie::Jar;
use serde::Deserialize;
use tracing::{debug, info};

use crate::cache::{fetch, Request, Store, LONG_MAX_AGE};
use crate::errors::{AppError, AppResult};
use crate::mangle::site_kind;
use crate::models::{Availability, Query, SearchResult};
use crate::providers::{merge_dates, pace, Provider, MAX_PAGES};

/// ReserveAmerica backend.
pub struct ReserveAmerica {
    store: Arc<dyn Store>,
    jar: Arc<Jar>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct JaxControl {
    current_page: usize,
    #[allow(dead_code)]
    page_size: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct JaxAvailability {
    available: bool,
    reservable_type: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct JaxDetails {
    base_url: String,
    availability: JaxAvailability,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct JaxRecord {
    naming_id: String,
    name: String,
    proximity: f64,
    details: JaxDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct JaxResponse {
    #[allow(dead_code)]
    total_records: usize,
    total_pages: usize,
    control: JaxControl,
    records: Vec<JaxRecord>,
}

impl ReserveAmerica {
    /// Create the provider with a fresh session jar.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            jar: Arc::new(Jar::default()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("https://www.reserveamerica.com{path}")
    }

    /// Warm-up page request: sets the session cookies the search needs.
    fn start_page(&self) -> Request {
        Request {
            url: self.url("/explore/search-results"),
            referrer: self.url("/"),
            jar: Some(Arc::clone(&self.jar)),
            max_age: Some(LONG_MAX_AGE),
            ..Request::default()
        }
    }

    /// Search request for one arrival date and page number.
    fn page_request(&self, query: &Query, arrival: NaiveDate, page: usize) -> Request {
        let form = vec![
            ("rcp".to_owned(), page.to_string()),
            ("stype".to_owned(), "nearby".to_owned()),
            ("lng".to_owned(), format!("{:.3}", query.lon)),
            ("lat".to_owned(), format!("{:.3}", query.lat)),
            ("arv".to_owned(), arrival.format("%Y-%m-%d").to_string()),
            ("lsy".to_owned(), query.stay_length.to_string()),
            // Looking-for code 2003 is tent camping.
            ("pa99999".to_owned(), "2003".to_owned()),
            ("rcs".to_owned(), "100".to_owned()),
            ("interest".to_owned(), "camping".to_owned()),
        ];

        Request {
            url: self.url("/jaxrs-json/search"),
            referrer: self.url("/"),
            form,
            jar: Some(Arc::clone(&self.jar)),
            ..Request::default()
        }
    }

    /// Parse one search page into results plus the server's pagination state.
    fn parse(
        &self,
        body: &[u8],
        date: NaiveDate,
        query: &Query,
    ) -> AppResult<(Vec<SearchResult>, usize, usize)> {
        debug!(target: "campscout::providers", bytes = body.len(), "parsing search page");
        let page: JaxResponse = serde_json::from_slice(body)
            .map_err(|e| AppError::parse(format!("search page: {e}")))?;

        let mut results = Vec::new();
        for record in page.records {
            if query.max_distance > 0.0 && record.proximity > query.max_distance {
                debug!(
                    target: "campscout::providers",
                    name = %record.name,
                    miles = record.proximity,
                    "skipping, too far"
                );
                continue;
            }
            if !record.details.availability.available {
                continue;
            }

            let reservable_type = &record.details.availability.reservable_type;
            let availability = Availability {
                kind: site_kind("", reservable_type, &record.name),
                kind_detail: reservable_type.clone(),
                count: 1,
                date,
                url: self.url(&format!(
                    "{}&arrivalDate={}&lengthOfStay={}",
                    record.details.base_url,
                    date.format("%Y-%m-%d"),
                    query.stay_length
                )),
                ..Availability::default()
            };

            results.push(SearchResult {
                res_url: self.url("/"),
                res_id: record.naming_id,
                name: record.name,
                distance: record.proximity,
                availability: vec![availability],
                ..SearchResult::default()
            });
        }

        Ok((results, page.control.current_page, page.total_pages))
    }

    /// List sites available on a single date, following pagination.
    async fn avail(&self, query: &Query, date: NaiveDate) -> AppResult<Vec<SearchResult>> {
        let mut results = Vec::new();

        for page in 0..MAX_PAGES {
            let req = self.page_request(query, date, page);
            let resp = fetch(req, self.store.as_ref()).await?;

            let (page_results, current_page, total_pages) =
                self.parse(&resp.body, date, query)?;

            if current_page != page {
                return Err(AppError::parse(format!(
                    "got page {current_page}, expected page {page}"
                )));
            }

            results.extend(page_results);

            if current_page >= total_pages.saturating_sub(1) {
                break;
            }

            pace(resp.cached).await;
        }

        info!(
            target: "campscout::providers",
            provider = "ramerica",
            %date,
            count = results.len(),
            "date searched"
        );
        Ok(results)
    }
}

#[async_trait::async_trait]
impl Provider for ReserveAmerica {
    fn name(&self) -> &'static str {
        "ReserveAmerica"
    }

    async fn list(&self, query: &Query) -> AppResult<Vec<SearchResult>> {
        fetch(self.start_page(), self.store.as_ref())
            .await
            .map_err(|e| e.for_provider(self.name()))?;

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
