//! `OpenStreetMap` Nominatim place search requests.
//!
//! Results are requested as `GeoJSON` with full polygon outlines, so a
//! search for a city yields its boundary as an area and small places as
//! points.

use geoint_feature_models::BoundingBox;
use reqwest::Url;

use crate::{SourceError, parse_url};

/// Builds a Nominatim search URL.
///
/// A non-empty `viewbox` restricts results to that box (`bounded=1`).
///
/// # Errors
///
/// Returns [`SourceError::InvalidUrl`] if `base_url` is not a valid URL.
pub fn build_url(
    base_url: &str,
    query: &str,
    limit: Option<u32>,
    viewbox: Option<&BoundingBox>,
) -> Result<Url, SourceError> {
    let mut url = parse_url(base_url)?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("q", query);
        pairs.append_pair("format", "geojson");
        pairs.append_pair("polygon_geojson", "1");
        if let Some(limit) = limit {
            pairs.append_pair("limit", &limit.to_string());
        }
        if let Some(bbox) = viewbox.filter(|b| !b.is_empty()) {
            // Nominatim wants left,top,right,bottom.
            let viewbox = format!("{},{},{},{}", bbox.min_x, bbox.max_y, bbox.max_x, bbox.min_y);
            pairs.append_pair("viewbox", &viewbox);
            pairs.append_pair("bounded", "1");
        }
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://nominatim.openstreetmap.org/search";

    fn pairs(url: &Url) -> Vec<(String, String)> {
        url.query_pairs().into_owned().collect()
    }

    #[test]
    fn builds_search_query() {
        let url = build_url(BASE, "Bonn", None, None).unwrap();
        assert_eq!(
            url.as_str(),
            "https://nominatim.openstreetmap.org/search?q=Bonn&format=geojson&polygon_geojson=1"
        );
    }

    #[test]
    fn adds_limit_and_viewbox() {
        let bbox = BoundingBox::new(7.0, 50.6, 7.2, 50.8);
        let url = build_url(BASE, "Museum", Some(10), Some(&bbox)).unwrap();
        let pairs = pairs(&url);

        assert!(pairs.contains(&("limit".to_string(), "10".to_string())));
        assert!(pairs.contains(&("viewbox".to_string(), "7,50.8,7.2,50.6".to_string())));
        assert!(pairs.contains(&("bounded".to_string(), "1".to_string())));
    }

    #[test]
    fn empty_viewbox_is_ignored() {
        let bbox = BoundingBox::new(1.0, 1.0, 1.0, 1.0);
        let url = build_url(BASE, "x", None, Some(&bbox)).unwrap();
        assert!(pairs(&url).iter().all(|(k, _)| k != "viewbox" && k != "bounded"));
    }
}
