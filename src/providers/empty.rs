// ABOUTME: Trivial provider that never returns results
// ABOUTME: Used to exercise orchestration and partial-failure paths in tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

use async_trait::async_trait;

use crate::errors::AppResult;
use crate::models::{Query, SearchResult};
use crate::providers::Provider;

/// A provider with no backend behind it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Empty;

impl Empty {
    /// Create the empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Provider for Empty {
    fn name(&self) -> &'static str {
        "Empty"
    }

    async fn list(&self, _query: &Query) -> AppResult<Vec<SearchResult>> {
        Ok(Vec::new())
    }
}
