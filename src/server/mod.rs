// ABOUTME: HTTP front-end with search and liveness endpoints rendered as plain HTML
// ABOUTME: Searches only when dates are supplied; a bare request renders form defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

//! HTTP surface.
//!
//! `GET /search` accepts `dates`, `nights`, `distance`, `min_rating`, and
//! `keywords` query parameters and renders a results page. Without `dates`
//! no search runs: the page shows the nearest future Friday roughly six
//! weeks out as the date the form would submit. `GET /healthz` reports
//! liveness. The search origin is fixed per deployment; this is a
//! region-scoped service, not a geocoder.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::extract::{Query as UrlQuery, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect};
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::cache::Store;
use crate::errors::AppError;
use crate::mangle::ellipsis;
use crate::metadata::{Property, Source};
use crate::models::{Query, SearchResult};

/// Words a rendered description is trimmed to.
const RENDER_DESC_WORDS: usize = 100;

/// Shared state behind the HTTP handlers.
pub struct AppState {
    /// Cache backing store shared by all providers.
    pub store: Arc<dyn Store>,
    /// Rating sources, for attribution in the rendered page.
    pub sources: BTreeMap<String, Source>,
    /// Curated property table for the resolver.
    pub props: BTreeMap<String, Property>,
    /// Provider tags to search, in execution order.
    pub providers: Vec<String>,
    /// Search origin latitude.
    pub lat: f64,
    /// Search origin longitude.
    pub lon: f64,
    /// Process start time, reported by `/healthz`.
    pub started: DateTime<Utc>,
}

/// Build the router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/search", get(search))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Redirect {
    Redirect::to("/search")
}

async fn healthz(State(state): State<Arc<AppState>>) -> String {
    format!("ok: started at {}", state.started.to_rfc3339())
}

async fn search(
    State(state): State<Arc<AppState>>,
    UrlQuery(params): UrlQuery<HashMap<String, String>>,
) -> axum::response::Response {
    info!(target: "campscout::server", ?params, "incoming search");

    let mut query = Query {
        lat: state.lat,
        lon: state.lon,
        stay_length: get_parsed(&params, "nights", 2),
        max_distance: get_parsed(&params, "distance", 100.0),
        min_rating: get_parsed(&params, "min_rating", 0.0),
        ..Query::default()
    };
    if let Some(keywords) = params.get("keywords") {
        query.keywords = keywords
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(ToOwned::to_owned)
            .collect();
    }

    match parse_dates(params.get("dates").map(String::as_str)) {
        Ok(dates) => query.dates = dates,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    }

    // No dates means no search: the page renders with the default date the
    // form would submit, and no provider traffic happens.
    let select_date = query.dates.last().copied().unwrap_or_else(future_friday);
    let (results, errors) = if query.dates.is_empty() {
        (Vec::new(), Vec::new())
    } else {
        crate::search::run(
            &state.providers,
            &query,
            Arc::clone(&state.store),
            &state.props,
        )
        .await
    };

    Html(render(&query, select_date, &results, &errors, &state.sources)).into_response()
}

fn get_parsed<T: std::str::FromStr>(params: &HashMap<String, String>, key: &str, fallback: T) -> T {
    params
        .get(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

/// Parse the comma-separated `dates` parameter. Absent dates parse to
/// nothing; the handler renders the form defaults instead of searching.
fn parse_dates(raw: Option<&str>) -> Result<Vec<NaiveDate>, AppError> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| {
            NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .map_err(|e| AppError::config(format!("bad date {d:?}: {e}")))
        })
        .collect()
}

/// The Friday nearest to six weeks from today.
fn future_friday() -> NaiveDate {
    let base = Utc::now().date_naive() + chrono::Duration::days(7 * 6);
    let offset = 5 - i64::from(base.weekday().num_days_from_sunday());
    base + chrono::Duration::days(offset)
}

/// Render the results page. Errors render independently of the result count.
/// When the query carries no dates, no search ran: `select_date` shows as
/// the date the form would submit.
fn render(
    query: &Query,
    select_date: NaiveDate,
    results: &[SearchResult],
    errors: &[AppError],
    sources: &BTreeMap<String, Source>,
) -> String {
    use std::fmt::Write as _;

    let mut page = String::from(
        "<!DOCTYPE html><html><head><title>campscout</title></head><body><h1>campscout</h1>",
    );

    if query.dates.is_empty() {
        let _ = write!(
            page,
            "<p>Pick an arrival date to search (the form defaults to {}).</p>",
            select_date.format("%Y-%m-%d")
        );
    } else {
        let dates = query
            .dates
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(
            page,
            "<p>{} night(s) starting {}, within {:.0} miles</p>",
            query.stay_length,
            html_escape::encode_text(&dates),
            query.max_distance
        );
    }

    if !errors.is_empty() {
        page.push_str("<ul class=\"errors\">");
        for e in errors {
            let _ = write!(
                page,
                "<li>{}</li>",
                html_escape::encode_text(&e.to_string())
            );
        }
        page.push_str("</ul>");
    }

    if query.dates.is_empty() {
        // Nothing searched, nothing to report.
    } else if results.is_empty() {
        page.push_str("<p>No availability found.</p>");
    } else {
        page.push_str(
            "<table><tr><th>Rating</th><th>Campground</th><th>Miles</th>\
             <th>Sites</th><th>Description</th></tr>",
        );
        for r in results {
            let kinds = r
                .availability
                .iter()
                .map(|a| a.kind.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            let name = if r.url.is_empty() {
                html_escape::encode_text(&r.name).into_owned()
            } else {
                format!(
                    "<a href=\"{}\">{}</a>",
                    html_escape::encode_double_quoted_attribute(&r.url),
                    html_escape::encode_text(&r.name)
                )
            };
            let locale = if r.locale.is_empty() {
                String::new()
            } else {
                format!(" <em>{}</em>", html_escape::encode_text(&r.locale))
            };
            let _ = write!(
                page,
                "<tr><td>{:.1}</td><td>{name}{locale}</td><td>{:.1}</td><td>{kinds}</td><td>{}</td></tr>",
                r.rating,
                r.distance,
                html_escape::encode_text(&ellipsis(&r.desc, RENDER_DESC_WORDS)),
            );
        }
        page.push_str("</table>");
    }

    if !sources.is_empty() {
        let names = sources
            .values()
            .map(|s| html_escape::encode_text(&s.name).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(page, "<p><small>Ratings: {names}</small></p>");
    }

    page.push_str("</body></html>");
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Availability;

    #[test]
    fn future_friday_is_a_friday() {
        assert_eq!(future_friday().weekday(), chrono::Weekday::Fri);
    }

    #[test]
    fn dates_parse_as_comma_list() {
        let dates = parse_dates(Some("2021-02-12,2021-02-19")).unwrap();
        assert_eq!(dates.len(), 2);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2021, 2, 12).unwrap());
    }

    #[test]
    fn absent_dates_parse_to_nothing() {
        assert!(parse_dates(None).unwrap().is_empty());
        assert!(parse_dates(Some("  ")).unwrap().is_empty());
    }

    #[test]
    fn bad_dates_are_rejected() {
        assert!(parse_dates(Some("02/12/2021")).is_err());
    }

    #[test]
    fn render_shows_errors_and_results_independently() {
        let query = Query {
            dates: vec![NaiveDate::from_ymd_opt(2021, 2, 12).unwrap()],
            stay_length: 2,
            max_distance: 100.0,
            ..Query::default()
        };
        let results = vec![SearchResult {
            name: "Grant <Ranch>".to_owned(),
            rating: 7.5,
            distance: 12.3,
            availability: vec![Availability::default()],
            ..SearchResult::default()
        }];
        let errors = vec![AppError::network("backend down")];
        let mut sources = BTreeMap::new();
        sources.insert(
            "cc".to_owned(),
            Source {
                name: "Camper's Companion".to_owned(),
                ..Source::default()
            },
        );

        let select_date = query.dates[0];
        let page = render(&query, select_date, &results, &errors, &sources);
        assert!(page.contains("Grant &lt;Ranch&gt;"));
        assert!(page.contains("network: backend down"));
        assert!(page.contains("Camper&#x27;s Companion") || page.contains("Camper's Companion"));

        let empty = render(&query, select_date, &[], &errors, &sources);
        assert!(empty.contains("No availability found."));
        assert!(empty.contains("network: backend down"));
    }

    #[test]
    fn dateless_render_shows_form_default_without_searching_language() {
        let query = Query {
            stay_length: 2,
            max_distance: 100.0,
            ..Query::default()
        };
        let select_date = future_friday();

        let page = render(&query, select_date, &[], &[], &BTreeMap::new());
        assert!(page.contains(&select_date.format("%Y-%m-%d").to_string()));
        assert!(!page.contains("No availability found."));
    }
}
