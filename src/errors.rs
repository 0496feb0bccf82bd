// ABOUTME: Unified error type covering configuration, cache, network, and parse failures
// ABOUTME: Provider errors wrap an inner error with the provider name for soft-error reporting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

//! Error handling for campscout.
//!
//! Only configuration errors are fatal. Cache write failures are logged and
//! masked at the call site; cache read failures degrade to cache misses.
//! Network and parse failures are wrapped with the owning provider's name by
//! the provider itself and collected by the orchestrator as soft errors
//! alongside partial results.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type AppResult<T> = Result<T, AppError>;

/// Unified application error.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad flag, missing required file, unknown provider tag. Fatal.
    #[error("config: {0}")]
    Config(String),

    /// Backing store read/write failure. Never fatal.
    #[error("cache: {0}")]
    CacheIo(String),

    /// HTTP round-trip failure, including deadline expiry.
    #[error("network: {0}")]
    Network(String),

    /// Malformed response body (JSON, XML, or HTML).
    #[error("parse: {0}")]
    Parse(String),

    /// An error that occurred inside a named provider.
    #[error("{provider}: {source}")]
    Provider {
        /// Human-readable provider name.
        provider: &'static str,
        /// The underlying failure.
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a cache I/O error.
    pub fn cache_io(msg: impl Into<String>) -> Self {
        Self::CacheIo(msg.into())
    }

    /// Create a network error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Wrap this error with the name of the provider it occurred in.
    ///
    /// Already-wrapped errors are left alone so nested provider helpers do
    /// not stack prefixes.
    #[must_use]
    pub fn for_provider(self, provider: &'static str) -> Self {
        match self {
            Self::Provider { .. } => self,
            other => Self::Provider {
                provider,
                source: Box::new(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_wrapping_prefixes_name() {
        let err = AppError::parse("unexpected token").for_provider("ReserveAmerica");
        assert_eq!(err.to_string(), "ReserveAmerica: parse: unexpected token");
    }

    #[test]
    fn provider_wrapping_is_idempotent() {
        let err = AppError::network("timed out")
            .for_provider("ReserveAmerica")
            .for_provider("Santa Clara County Parks");
        assert_eq!(err.to_string(), "ReserveAmerica: network: timed out");
    }
}
