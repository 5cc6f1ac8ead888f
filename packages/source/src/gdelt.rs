//! GDELT GEO 2.0 API requests.
//!
//! The API answers a free-text query with a `GeoJSON` `FeatureCollection`
//! of news event locations.

use reqwest::Url;

use crate::{SourceError, parse_url};

/// Builds a GDELT query URL.
///
/// # Errors
///
/// Returns [`SourceError::InvalidUrl`] if `base_url` is not a valid URL.
pub fn build_url(
    base_url: &str,
    query: &str,
    max_points: Option<u32>,
    timespan: Option<&str>,
) -> Result<Url, SourceError> {
    let mut url = parse_url(base_url)?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("query", query);
        pairs.append_pair("format", "geojson");
        if let Some(max_points) = max_points {
            pairs.append_pair("maxpoints", &max_points.to_string());
        }
        if let Some(timespan) = timespan {
            pairs.append_pair("timespan", timespan);
        }
    }
    Ok(url)
}
