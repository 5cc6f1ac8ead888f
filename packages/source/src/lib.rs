#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Source adapters, feature layers and the monitor event loop.
//!
//! Each configured source becomes a [`SourceLayer`] that builds a request
//! URL from its filters, fetches it over a [`Transport`], and merges the
//! parsed features into its own store and output buckets. The [`Monitor`]
//! owns every layer and applies completed fetches on a single task, so
//! layer state never needs locking.

pub mod callout;
pub mod fetcher;
pub mod gdelt;
pub mod geojson_url;
pub mod http;
pub mod layer;
pub mod monitor;
pub mod nominatim;
pub mod progress;
pub mod registry;
pub mod retry;
pub mod wikimapia;

#[cfg(test)]
pub(crate) mod testing;

use geoint_geojson::IngestError;

pub use fetcher::SkipReason;
pub use http::{ClientConfig, HttpResponse, ReqwestTransport, Transport};
pub use layer::{ApplyOutcome, QueryCompletion, QueryOutcome, SourceLayer};
pub use monitor::Monitor;

/// Errors that can occur while fetching or decoding a source response.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status}")]
    HttpStatus {
        /// Status code.
        status: u16,
    },

    /// A non-HTTP transport failed.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of what went wrong.
        message: String,
    },

    /// The response body could not be turned into features.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// The remote API reported an error in an otherwise valid response.
    #[error("API error: {message}")]
    Api {
        /// Message reported by the API.
        message: String,
    },

    /// A configured or supplied URL could not be parsed.
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Parser message.
        message: String,
    },

    /// No layer is registered under this identifier.
    #[error("Unknown source: {id}")]
    UnknownSource {
        /// The requested source identifier.
        id: String,
    },

    /// A layer with this identifier is already registered.
    #[error("Duplicate source: {id}")]
    DuplicateSource {
        /// The duplicated source identifier.
        id: String,
    },
}

/// Parses a URL, mapping failures to [`SourceError::InvalidUrl`].
///
/// # Errors
///
/// Returns [`SourceError::InvalidUrl`] if `url` is not an absolute URL.
pub fn parse_url(url: &str) -> Result<reqwest::Url, SourceError> {
    reqwest::Url::parse(url).map_err(|e| SourceError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })
}
