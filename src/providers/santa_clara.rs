// ABOUTME: County parks backend scraped from an HTML availability table
// ABOUTME: Short-circuits when the county centroid is beyond the query's maximum distance
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

//! Santa Clara County Parks provider.
//!
//! The county site has no search API: a warm-up GET sets cookies, a form GET
//! drives an index page, and results are scraped out of the camping listing
//! table. Every site in the county shares the county centroid coordinate, so
//! distance is the query-to-centroid distance.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use reqwest::cookie::Jar;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use crate::cache::{fetch, Request, Store, LONG_MAX_AGE};
use crate::errors::{AppError, AppResult};
use crate::geo::miles_apart;
use crate::mangle::site_kind;
use crate::models::{Availability, Query, SearchResult};
use crate::providers::{merge_dates, pace, Provider};

/// Center of Santa Clara County, used for approximate location filtering.
const CENTER_LAT: f64 = 37.190_887_3;
const CENTER_LON: f64 = -122.413_039_8;

/// Santa Clara County Parks backend.
pub struct SantaClaraCounty {
    store: Arc<dyn Store>,
    jar: Arc<Jar>,
}

impl SantaClaraCounty {
    /// Create the provider with a fresh session jar.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            jar: Arc::new(Jar::default()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("https://gooutsideandplay.org{path}")
    }

    /// Warm-up page request: sets the session cookies the search needs.
    fn start_page(&self) -> Request {
        Request {
            url: self.url("/index.asp"),
            referrer: self.url("/"),
            jar: Some(Arc::clone(&self.jar)),
            max_age: Some(LONG_MAX_AGE),
            ..Request::default()
        }
    }

    /// Search request for one arrival date.
    fn page_request(&self, query: &Query, arrival: NaiveDate) -> Request {
        let today = Utc::now().date_naive();
        let first_bookable = today + chrono::Duration::days(1);
        let last_bookable = today + chrono::Duration::days(6 * 30);

        let form = vec![
            ("actiontype".to_owned(), "camping".to_owned()),
            ("park_idno".to_owned(), "0".to_owned()),
            (
                "CalendarCurrentDate".to_owned(),
                today.format("%m/%d/%Y").to_string(),
            ),
            (
                "CalendarFirstBookableDate".to_owned(),
                first_bookable.format("%m/%d/%Y").to_string(),
            ),
            (
                "CalendarLastBookableDate".to_owned(),
                last_bookable.format("%m/%d/%Y").to_string(),
            ),
            ("use_type".to_owned(), String::new()),
            ("res_length".to_owned(), query.stay_length.to_string()),
            (
                "arrive_date".to_owned(),
                arrival.format("%m/%d/%Y").to_string(),
            ),
            ("c_park_idno".to_owned(), "0".to_owned()),
            ("d_park_idno".to_owned(), "0".to_owned()),
            ("b_park_idno".to_owned(), "1".to_owned()),
            ("center_idno".to_owned(), "0".to_owned()),
            ("facility_use_type_idno".to_owned(), "0".to_owned()),
        ];

        Request {
            url: self.url("/index.asp"),
            referrer: self.url("/"),
            form,
            jar: Some(Arc::clone(&self.jar)),
            ..Request::default()
        }
    }

    /// Scrape the camping listing table out of the index page.
    fn parse(&self, body: &[u8], date: NaiveDate, query: &Query) -> AppResult<Vec<SearchResult>> {
        let html = String::from_utf8_lossy(body);
        let doc = Html::parse_document(&html);

        let row_sel = selector("#list_camping tr")?;
        let name_sel = selector(".body_gray")?;
        let kind_sel = selector(".body_blue")?;
        let link_sel = selector(".FilterElement a")?;

        let distance = miles_apart(query.lat, query.lon, CENTER_LAT, CENTER_LON);

        let mut seen = BTreeSet::new();
        let mut results = Vec::new();
        for row in doc.select(&row_sel) {
            let name = row
                .select(&name_sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_owned())
                .unwrap_or_default();
            if name.is_empty() {
                warn!(target: "campscout::providers", "row without a site name");
                continue;
            }

            let kind_phrase = row
                .select(&kind_sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_owned())
                .unwrap_or_default();

            debug!(target: "campscout::providers", %name, kind = %kind_phrase, "row");
            if !seen.insert(format!("{name}{kind_phrase}")) {
                continue;
            }

            let href = row
                .select(&link_sel)
                .next()
                .and_then(|el| el.value().attr("href"))
                .unwrap_or_default();

            let availability = Availability {
                kind: site_kind("", &kind_phrase, &name),
                kind_detail: kind_phrase,
                count: 1,
                date,
                url: self.url(href),
                ..Availability::default()
            };

            results.push(SearchResult {
                res_url: self.url("/"),
                res_id: name.to_lowercase().replace(' ', "_"),
                name,
                distance,
                availability: vec![availability],
                ..SearchResult::default()
            });
        }

        Ok(results)
    }

    async fn avail(&self, query: &Query, date: NaiveDate) -> AppResult<Vec<SearchResult>> {
        let req = self.page_request(query, date);
        let resp = fetch(req, self.store.as_ref()).await?;
        let results = self.parse(&resp.body, date, query)?;

        pace(resp.cached).await;

        info!(
            target: "campscout::providers",
            provider = "scc",
            %date,
            count = results.len(),
            "date searched"
        );
        Ok(results)
    }
}

fn selector(css: &str) -> AppResult<Selector> {
    Selector::parse(css).map_err(|e| AppError::parse(format!("selector {css:?}: {e:?}")))
}

#[async_trait::async_trait]
impl Provider for SantaClaraCounty {
    fn name(&self) -> &'static str {
        "Santa Clara County Parks"
    }

    async fn list(&self, query: &Query) -> AppResult<Vec<SearchResult>> {
        let distance = miles_apart(query.lat, query.lon, CENTER_LAT, CENTER_LON);
        if query.max_distance > 0.0 && distance > query.max_distance {
            info!(
                target: "campscout::providers",
                provider = "scc",
                miles = distance,
                "skipping search, county is out of range"
            );
            return Ok(Vec::new());
        }

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::models::SiteKind;

    const INDEX_FIXTURE: &[u8] = include_bytes!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/testdata/scc_index.html"
    ));

    fn provider() -> SantaClaraCounty {
        SantaClaraCounty::new(Arc::new(MemoryStore::new()))
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
    fn scrapes_listing_rows() {
        let scc = provider();
        let date = NaiveDate::from_ymd_opt(2021, 2, 12).unwrap();

        let results = scc.parse(INDEX_FIXTURE, date, &query()).unwrap();
        assert_eq!(results.len(), 3);

        assert_eq!(results[0].name, "Grant Ranch");
        assert_eq!(results[0].res_id, "grant_ranch");
        assert_eq!(results[0].availability[0].kind, SiteKind::Tent);
        assert_eq!(
            results[0].availability[0].url,
            "https://gooutsideandplay.org/reservations/grant_ranch.asp"
        );

        assert_eq!(results[1].name, "Mt. Madonna");
        assert_eq!(results[1].availability[0].kind, SiteKind::Rv);

        assert_eq!(results[2].name, "Sanborn");
        assert_eq!(results[2].availability[0].kind, SiteKind::Walk);

        // Every county site shares the centroid distance.
        for r in &results {
            assert!((r.distance - results[0].distance).abs() < 1e-9);
        }
    }

    #[test]
    fn duplicate_rows_collapse() {
        let scc = provider();
        let date = NaiveDate::from_ymd_opt(2021, 2, 12).unwrap();
        let results = scc.parse(INDEX_FIXTURE, date, &query()).unwrap();
        let grants = results.iter().filter(|r| r.name == "Grant Ranch").count();
        assert_eq!(grants, 1);
    }

    #[test]
    fn empty_page_yields_no_results() {
        let scc = provider();
        let date = NaiveDate::from_ymd_opt(2021, 2, 12).unwrap();
        let results = scc.parse(b"<html><body></body></html>", date, &query()).unwrap();
        assert!(results.is_empty());
    }
}
