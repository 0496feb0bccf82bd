// ABOUTME: Codec for gzip+base64 editorial descriptions inlined in metadata YAML
// ABOUTME: The invariant gzip header prefix is swapped for a single literal z byte
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

//! Editorial description compression.
//!
//! Long descriptions are stored gzip-compressed and base64-encoded in the
//! metadata YAML. Every such blob starts with the same gzip header prefix
//! once encoded, so the importer replaces that prefix with a single `z` byte.
//! Decompression is lazy: the compressed form stays in memory and is only
//! expanded at annotation time.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::errors::{AppError, AppResult};

/// Base64 encoding of the invariant gzip header, replaced by [`COMPRESS_PREFIX`].
const COMPRESS_HEADER: &str = "H4sIAAAAAAAA/";

/// Single-byte stand-in for [`COMPRESS_HEADER`] in stored descriptions.
const COMPRESS_PREFIX: char = 'z';

/// Decompress a `z`-prefixed gzip+base64 description.
///
/// # Errors
///
/// Returns a `Parse` error when the input is not valid base64 or gzip.
pub fn decompress(s: &str) -> AppResult<String> {
    let encoded = format!("{COMPRESS_HEADER}{}", &s[COMPRESS_PREFIX.len_utf8()..]);
    let bytes = STANDARD_NO_PAD
        .decode(encoded)
        .map_err(|e| AppError::parse(format!("description base64: {e}")))?;

    let mut out = String::new();
    GzDecoder::new(&bytes[..])
        .read_to_string(&mut out)
        .map_err(|e| AppError::parse(format!("description gunzip: {e}")))?;
    Ok(out)
}

/// Compress a description into the `z`-prefixed stored form.
///
/// # Errors
///
/// Returns a `Parse` error when gzip encoding fails.
pub fn compress(s: &str) -> AppResult<String> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(s.as_bytes())
        .map_err(|e| AppError::parse(format!("description gzip: {e}")))?;
    let bytes = encoder
        .finish()
        .map_err(|e| AppError::parse(format!("description gzip: {e}")))?;

    let encoded = STANDARD_NO_PAD.encode(bytes);
    Ok(encoded.replacen(COMPRESS_HEADER, &COMPRESS_PREFIX.to_string(), 1))
}

/// Expand a description if it is stored compressed, otherwise return it as-is.
///
/// Plain text that merely starts with `z` fails the decode and passes
/// through unchanged.
#[must_use]
pub fn maybe_decompress(s: &str) -> String {
    if s.starts_with(COMPRESS_PREFIX) {
        if let Ok(expanded) = decompress(s) {
            return expanded;
        }
    }
    s.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() -> AppResult<()> {
        let text = "A broad meadow rimmed by second-growth redwoods, with fog most mornings.";
        let stored = compress(text)?;
        assert!(stored.starts_with('z'));
        assert!(!stored.contains(COMPRESS_HEADER));
        assert_eq!(decompress(&stored)?, text);
        Ok(())
    }

    #[test]
    fn maybe_decompress_passes_plain_text_through() {
        assert_eq!(maybe_decompress("zion-adjacent views"), "zion-adjacent views");
        assert_eq!(maybe_decompress("plain words"), "plain words");
    }

    #[test]
    fn maybe_decompress_expands_stored_form() -> AppResult<()> {
        let stored = compress("short")?;
        assert_eq!(maybe_decompress(&stored), "short");
        Ok(())
    }
}
