//! Dispatch from a [`FetcherConfig`] to the matching request builder and
//! response decoder.

use std::fmt;

use geoint_feature_models::BoundingBox;
use geoint_geojson::{ParsedCollection, encoding, parser};
use geoint_source_models::{FetcherConfig, SourceDefinition};
use reqwest::Url;

use crate::{HttpResponse, SourceError, gdelt, geojson_url, nominatim, wikimapia};

/// Current filter state of a layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestFilters<'a> {
    /// Free-text query.
    pub query: Option<&'a str>,
    /// Spatial filter.
    pub spatial: Option<&'a BoundingBox>,
    /// Runtime URL override.
    pub url: Option<&'a str>,
    /// API key, empty when not configured.
    pub api_key: &'a str,
    /// Box used by the previous issued query.
    pub last_extent: Option<&'a BoundingBox>,
}

/// Why a query was not issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The fetcher needs query text and none (or only whitespace) is set.
    MissingQuery,
    /// The fetcher needs a non-empty spatial filter.
    MissingSpatialFilter,
    /// Neither the definition nor the layer provides a URL.
    MissingUrl,
    /// The spatial filter matches the last queried box within tolerance.
    UnchangedExtent,
    /// The request URL could not be built.
    InvalidUrl {
        /// Parser message.
        message: String,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingQuery => f.write_str("no query text"),
            Self::MissingSpatialFilter => f.write_str("no spatial filter"),
            Self::MissingUrl => f.write_str("no URL"),
            Self::UnchangedExtent => f.write_str("extent unchanged since last query"),
            Self::InvalidUrl { message } => write!(f, "invalid URL: {message}"),
        }
    }
}

/// Builds the request URL for `fetcher`, or explains why there is none.
///
/// # Errors
///
/// Returns the [`SkipReason`] when the filters do not satisfy the
/// fetcher's requirement or the URL cannot be built.
pub fn build_request(fetcher: &FetcherConfig, filters: &RequestFilters<'_>) -> Result<Url, SkipReason> {
    let built = match fetcher {
        FetcherConfig::Gdelt {
            base_url,
            max_points,
            timespan,
        } => {
            let query = non_empty(filters.query).ok_or(SkipReason::MissingQuery)?;
            gdelt::build_url(base_url, query, *max_points, timespan.as_deref())
        }
        FetcherConfig::Nominatim { base_url, limit } => {
            let query = non_empty(filters.query).ok_or(SkipReason::MissingQuery)?;
            nominatim::build_url(base_url, query, *limit, filters.spatial)
        }
        FetcherConfig::Wikimapia {
            base_url,
            language,
            count,
            bbox_tolerance,
            ..
        } => {
            let bbox = filters
                .spatial
                .filter(|b| !b.is_empty())
                .ok_or(SkipReason::MissingSpatialFilter)?;
            if filters
                .last_extent
                .is_some_and(|last| last.equals_with_tolerance(bbox, *bbox_tolerance))
            {
                return Err(SkipReason::UnchangedExtent);
            }
            wikimapia::build_url(base_url, filters.api_key, bbox, language, *count)
        }
        FetcherConfig::GeojsonUrl { url } => {
            let url = non_empty(filters.url)
                .or_else(|| non_empty(url.as_deref()))
                .ok_or(SkipReason::MissingUrl)?;
            geojson_url::build_url(url)
        }
    };

    built.map_err(|e| SkipReason::InvalidUrl {
        message: e.to_string(),
    })
}

/// Turns a raw response into parsed features according to `definition`.
///
/// # Errors
///
/// Returns [`SourceError::HttpStatus`] for non-2xx responses, and
/// [`SourceError::Ingest`] or [`SourceError::Api`] when the body cannot be
/// decoded.
pub fn decode(
    definition: &SourceDefinition,
    response: &HttpResponse,
) -> Result<ParsedCollection, SourceError> {
    if !response.is_success() {
        return Err(SourceError::HttpStatus {
            status: response.status,
        });
    }

    match &definition.fetcher {
        FetcherConfig::Wikimapia { .. } => {
            let charset = response
                .content_type
                .as_deref()
                .and_then(encoding::charset_from_content_type);
            let text = encoding::normalize(&response.body, charset)?;
            let document = parser::parse_json(&text)?;
            let collection = wikimapia::to_feature_collection(&document)?;
            Ok(parser::parse_document(&collection, &definition.parse)?)
        }
        FetcherConfig::Gdelt { .. }
        | FetcherConfig::Nominatim { .. }
        | FetcherConfig::GeojsonUrl { .. } => Ok(geoint_geojson::ingest(
            &response.body,
            response.content_type.as_deref(),
            &definition.parse,
        )?),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
