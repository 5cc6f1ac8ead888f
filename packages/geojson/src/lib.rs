#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `GeoJSON` ingestion: charset normalization, `FeatureCollection` parsing
//! and geometry building.
//!
//! Every source adapter funnels its raw HTTP body through [`ingest`] (or the
//! individual steps when the payload needs reshaping first):
//!
//! 1. [`encoding::normalize`] transcodes the body to UTF-8 based on the
//!    declared `charset`.
//! 2. [`parser::parse_feature_collection`] walks the `features` array and
//!    builds one [`Feature`](geoint_feature_models::Feature) per supported
//!    geometry via the [`builder`].
//!
//! Malformed features are skipped and logged; only document-level problems
//! surface as [`IngestError`].

pub mod builder;
pub mod encoding;
pub mod parser;

use geoint_feature_models::ParseOptions;
use thiserror::Error;

pub use parser::ParsedCollection;

/// Errors that can occur while turning a response body into features.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The declared charset is not one we can transcode.
    #[error("Unsupported encoding: {charset}")]
    UnsupportedEncoding {
        /// The charset label as declared by the response.
        charset: String,
    },

    /// The body is not parseable JSON.
    #[error("Malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// The top-level JSON value is not an object.
    #[error("JSON document is not an object")]
    NotAnObject,

    /// A geometry was rejected by a strict parse policy.
    #[error("Degenerate geometry: {message}")]
    DegenerateGeometry {
        /// Why the geometry was rejected.
        message: String,
    },
}

/// Normalizes `body` according to the `Content-Type` header and parses it
/// as a `FeatureCollection`.
///
/// # Errors
///
/// Returns [`IngestError`] if the charset is unsupported, the body is not
/// valid JSON, or the document is not an object.
pub fn ingest(
    body: &[u8],
    content_type: Option<&str>,
    options: &ParseOptions,
) -> Result<ParsedCollection, IngestError> {
    let charset = content_type.and_then(encoding::charset_from_content_type);
    let text = encoding::normalize(body, charset)?;
    parser::parse_feature_collection(&text, options)
}
