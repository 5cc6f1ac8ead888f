#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Source definition types.
//!
//! A [`SourceDefinition`] describes one feature layer: where its features
//! come from ([`FetcherConfig`]), how the payload is parsed
//! ([`ParseOptions`]), how repeated sightings are compared
//! ([`ComparePolicy`]) and how features are routed into output buckets
//! ([`BucketRouting`]). Definitions are loaded from TOML.

use geoint_feature_models::{ComparePolicy, ParseOptions};
use geoint_store::BucketRouting;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Default Wikimapia API key environment variable.
pub const DEFAULT_WIKIMAPIA_KEY_ENV: &str = "WIKIMAPIA_KEY";

/// Default tolerance, in degrees, under which two Wikimapia boxes count as
/// the same query.
pub const DEFAULT_BBOX_TOLERANCE: f64 = 0.01;

/// A complete feature layer definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// Unique identifier (e.g., `"gdelt"`).
    pub id: String,
    /// Human-readable name (e.g., `"GDELT news events"`).
    pub name: String,
    /// Short description shown in source listings.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the layer is emptied each time a new query is issued.
    #[serde(default)]
    pub clear_before_query: bool,
    /// How a repeated identifier is compared against the stored feature.
    #[serde(default)]
    pub compare: ComparePolicy,
    /// How features are distributed over output buckets.
    #[serde(default)]
    pub routing: BucketRouting,
    /// Parser options.
    #[serde(default)]
    pub parse: ParseOptions,
    /// How to build requests for this source.
    pub fetcher: FetcherConfig,
}

impl SourceDefinition {
    /// Creates a definition with default policies.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, fetcher: FetcherConfig) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            clear_before_query: false,
            compare: ComparePolicy::default(),
            routing: BucketRouting::default(),
            parse: ParseOptions::default(),
            fetcher,
        }
    }
}

/// Which filter a fetcher needs before it can issue a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum FilterRequirement {
    /// A non-empty free-text query.
    QueryText,
    /// A non-empty bounding box.
    SpatialFilter,
    /// A URL, from the definition or set at runtime.
    Url,
}

/// How to build the HTTP request for a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, AsRefStr)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FetcherConfig {
    /// GDELT GEO 2.0 API.
    Gdelt {
        /// Endpoint URL.
        base_url: String,
        /// `maxpoints` parameter.
        #[serde(default)]
        max_points: Option<u32>,
        /// `timespan` parameter (e.g., `"24h"`).
        #[serde(default)]
        timespan: Option<String>,
    },
    /// `OpenStreetMap` Nominatim search.
    Nominatim {
        /// Endpoint URL.
        base_url: String,
        /// `limit` parameter.
        #[serde(default)]
        limit: Option<u32>,
    },
    /// Wikimapia `box` API.
    Wikimapia {
        /// Endpoint URL.
        base_url: String,
        /// Environment variable holding the API key.
        #[serde(default = "default_wikimapia_key_env")]
        api_key_env: String,
        /// `language` parameter.
        #[serde(default = "default_language")]
        language: String,
        /// `count` parameter.
        #[serde(default = "default_count")]
        count: u32,
        /// Boxes whose edges all lie within this many degrees of the last
        /// queried box are not queried again.
        #[serde(default = "default_bbox_tolerance")]
        bbox_tolerance: f64,
    },
    /// Any URL that answers with a `GeoJSON` `FeatureCollection`.
    GeojsonUrl {
        /// Default URL. Can be overridden per layer at runtime.
        #[serde(default)]
        url: Option<String>,
    },
}

impl FetcherConfig {
    /// The filter this fetcher needs.
    #[must_use]
    pub const fn requirement(&self) -> FilterRequirement {
        match self {
            Self::Gdelt { .. } | Self::Nominatim { .. } => FilterRequirement::QueryText,
            Self::Wikimapia { .. } => FilterRequirement::SpatialFilter,
            Self::GeojsonUrl { .. } => FilterRequirement::Url,
        }
    }
}

fn default_wikimapia_key_env() -> String {
    DEFAULT_WIKIMAPIA_KEY_ENV.to_string()
}

fn default_language() -> String {
    "en".to_string()
}

const fn default_count() -> u32 {
    50
}

const fn default_bbox_tolerance() -> f64 {
    DEFAULT_BBOX_TOLERANCE
}
