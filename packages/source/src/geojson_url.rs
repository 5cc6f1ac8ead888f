//! Arbitrary `GeoJSON` URL requests.

use reqwest::Url;

use crate::{SourceError, parse_url};

/// Validates a user-supplied `GeoJSON` URL. The URL is requested unchanged.
///
/// # Errors
///
/// Returns [`SourceError::InvalidUrl`] if `url` is not an absolute URL.
pub fn build_url(url: &str) -> Result<Url, SourceError> {
    parse_url(url.trim())
}
