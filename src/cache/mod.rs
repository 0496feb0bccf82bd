// ABOUTME: Persistent HTTP request/response cache with deterministic keys and TTL semantics
// ABOUTME: Sole egress for provider traffic; cookie jars ride along per request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

//! # HTTP cache
//!
//! Every outbound provider request goes through [`fetch`], which consults a
//! persistent [`Store`] before touching the network. Keys are derived
//! deterministically from the request (method, URL, sorted form values,
//! cookies, referrer, body) and are stable across runs.
//!
//! Two concurrent fetches for the same key may both miss and both perform
//! the HTTP call; whichever finishes last wins the persisted copy. Providers
//! that need strict single-flight per URL serialize themselves. Persistence
//! failures never fail a fetch: the fresh response is returned with
//! `cached = false` and the failure is logged.

use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use regex::Regex;
use reqwest::cookie::Jar;
use reqwest::header::{CONTENT_TYPE, COOKIE, REFERER, SET_COOKIE};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{AppError, AppResult};

pub mod store;

pub use store::{DiskStore, MemoryStore, Store};

/// Default freshness window for search pages.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(4 * 60 * 60);

/// Freshness window for near-static lookups such as session warm-up pages.
pub const LONG_MAX_AGE: Duration = Duration::from_secs(90 * 24 * 60 * 60);

/// Browser-like user agent sent on every request.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/48.0.2564.48 Safari/537.36";

/// Hard ceiling on one HTTP round-trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

static DEFAULT_MAX_AGE_OVERRIDE: OnceLock<Duration> = OnceLock::new();

/// Override the process-wide default freshness window.
///
/// Later calls are ignored; the first caller wins. Used by the CLI's
/// `--max_cache_age` flag before any fetch happens.
pub fn set_default_max_age(max_age: Duration) {
    let _ = DEFAULT_MAX_AGE_OVERRIDE.set(max_age);
}

fn default_max_age() -> Duration {
    DEFAULT_MAX_AGE_OVERRIDE
        .get()
        .copied()
        .unwrap_or(DEFAULT_MAX_AGE)
}

fn non_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Safe: pattern is a compile-time constant
    RE.get_or_init(|| Regex::new(r"\W+").expect("valid regex"))
}

/// One cacheable outbound request.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// HTTP method; empty means GET.
    pub method: String,
    /// Target URL without query string.
    pub url: String,
    /// Referrer header, when nonempty.
    pub referrer: String,
    /// Form values: the query string for GET, the body for POST forms.
    pub form: Vec<(String, String)>,
    /// Raw POST body; takes precedence over `form` for POST requests.
    pub body: Vec<u8>,
    /// Content type for raw bodies, e.g. `application/json`.
    pub content_type: String,
    /// Explicit cookies sent with this request, in addition to the jar.
    pub cookies: Vec<(String, String)>,
    /// Cookie jar shared across the fetches of one provider invocation.
    /// A fresh jar is created when none is supplied.
    pub jar: Option<Arc<Jar>>,
    /// Arbitrary extra header overrides.
    pub headers: Vec<(String, String)>,
    /// Freshness window; `None` means the process default.
    pub max_age: Option<Duration>,
}

impl Request {
    /// Deterministic cache key, at most 64 bytes, stable across runs.
    ///
    /// Derived from method, URL, sorted form values, each explicit cookie,
    /// the referrer when nonempty, and the body when nonempty. Non-word
    /// characters collapse to `_`; overlong keys keep their first 32
    /// characters and replace the rest with an MD5 of the full key.
    #[must_use]
    pub fn key(&self) -> String {
        let method = if self.method.is_empty() {
            "GET"
        } else {
            &self.method
        };

        let mut buf = format!("{method} {}?{}", self.url, sorted_form_encode(&self.form));
        for (name, value) in &self.cookies {
            buf.push_str(&format!("+cookie={name}={value}"));
        }
        if !self.referrer.is_empty() {
            buf.push_str(&format!("+ref={}", self.referrer));
        }
        if !self.body.is_empty() {
            buf.push_str(&format!("+body={}", String::from_utf8_lossy(&self.body)));
        }

        let key = non_word_re().replace_all(&buf, "_").into_owned();
        if key.len() > 64 {
            let mut hasher = Md5::new();
            hasher.update(&key);
            let digest = hex::encode(hasher.finalize());
            let head: String = key.chars().take(32).collect();
            return format!("{head}{digest}");
        }
        key
    }
}

/// Form values encoded in sorted order so keys are order-independent.
fn sorted_form_encode(form: &[(String, String)]) -> String {
    let mut pairs: Vec<&(String, String)> = form.iter().collect();
    pairs.sort();

    let mut ser = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        ser.append_pair(k, v);
    }
    ser.finish()
}

/// One cached HTTP response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    /// URL the response came from.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Cookies the server set on this round-trip, as name/value pairs.
    pub cookies: Vec<(String, String)>,
    /// Entire message body.
    pub body: Vec<u8>,
    /// When this value was materialized.
    pub mtime: DateTime<Utc>,
    /// Whether this response was served from cache. Set by the cache only.
    #[serde(skip)]
    pub cached: bool,
}

/// Attempt a cache-only fetch. Any failure, decode error, or stale entry
/// is a miss.
async fn try_cache(req: &Request, store: &dyn Store) -> Option<Response> {
    let key = req.key();
    let raw = match store.read(&key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            debug!(target: "campscout::cache", key = %key, error = %e, "read failed, treating as miss");
            return None;
        }
    };

    let res: Response = match bincode::deserialize(&raw) {
        Ok(res) => res,
        Err(e) => {
            debug!(target: "campscout::cache", key = %key, error = %e, "undecodable entry, treating as miss");
            return None;
        }
    };

    let max_age = req.max_age.unwrap_or_else(default_max_age);
    let age = Utc::now().signed_duration_since(res.mtime);
    if age > chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX) {
        debug!(target: "campscout::cache", key = %key, age_secs = age.num_seconds(), "stale entry, treating as miss");
        return None;
    }

    Some(res)
}

/// Fetch a request through the cache.
///
/// On a hit, returns the stored response with `cached = true`. On a miss,
/// performs the HTTP call with the request's cookie jar, merges server
/// cookies into the jar, persists the response, and returns it with
/// `cached = false`. Persistence failures are logged and masked.
///
/// # Errors
///
/// Returns a `Network` error when the HTTP round-trip fails, or a `Config`
/// error for an unusable method or URL. Cache I/O never fails a fetch.
pub async fn fetch(req: Request, store: &dyn Store) -> AppResult<Response> {
    if let Some(mut res) = try_cache(&req, store).await {
        debug!(target: "campscout::cache", key = %req.key(), url = %req.url, "hit");
        res.cached = true;
        return Ok(res);
    }
    debug!(target: "campscout::cache", key = %req.key(), url = %req.url, "miss");

    let method = if req.method.is_empty() {
        Method::GET
    } else {
        Method::from_bytes(req.method.as_bytes())
            .map_err(|_| AppError::config(format!("bad method {:?}", req.method)))?
    };

    let jar = req.jar.clone().unwrap_or_default();
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .cookie_provider(Arc::clone(&jar))
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| AppError::network(format!("client: {e}")))?;

    let url = if method == Method::GET && !req.form.is_empty() {
        format!("{}?{}", req.url, sorted_form_encode(&req.form))
    } else {
        req.url.clone()
    };

    info!(target: "campscout::cache", %url, method = %method, "fetching");

    let mut builder = client.request(method.clone(), &url);
    if !req.referrer.is_empty() {
        builder = builder.header(REFERER, &req.referrer);
    }
    if !req.cookies.is_empty() {
        let header = req
            .cookies
            .iter()
            .map(|(n, v)| format!("{n}={v}"))
            .collect::<Vec<_>>()
            .join("; ");
        builder = builder.header(COOKIE, header);
    }
    for (name, value) in &req.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if method == Method::POST {
        if req.body.is_empty() {
            builder = builder
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(sorted_form_encode(&req.form));
        } else {
            let content_type = if req.content_type.is_empty() {
                "application/x-www-form-urlencoded"
            } else {
                &req.content_type
            };
            builder = builder
                .header(CONTENT_TYPE, content_type.to_owned())
                .body(req.body.clone());
        }
    }

    let http_res = builder
        .send()
        .await
        .map_err(|e| AppError::network(format!("{url}: {e}")))?;

    let status = http_res.status().as_u16();
    let headers: Vec<(String, String)> = http_res
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_owned(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let cookies: Vec<(String, String)> = http_res
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| {
            let raw = String::from_utf8_lossy(value.as_bytes());
            let pair = raw.split(';').next()?;
            let (name, value) = pair.split_once('=')?;
            Some((name.trim().to_owned(), value.trim().to_owned()))
        })
        .collect();

    let body = http_res
        .bytes()
        .await
        .map_err(|e| AppError::network(format!("{url}: body: {e}")))?
        .to_vec();

    info!(
        target: "campscout::cache",
        url = %req.url,
        status,
        bytes = body.len(),
        "fetched"
    );

    let res = Response {
        url: req.url.clone(),
        status,
        headers,
        cookies,
        body,
        mtime: Utc::now(),
        cached: false,
    };

    match bincode::serialize(&res) {
        Ok(blob) => {
            if let Err(e) = store.write(&req.key(), &blob).await {
                warn!(target: "campscout::cache", key = %req.key(), error = %e, "write failed");
            }
        }
        Err(e) => {
            warn!(target: "campscout::cache", key = %req.key(), error = %e, "encode failed");
        }
    }

    Ok(res)
}
