#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Feature, geometry and attribute types for the GEOINT ingestion pipeline.
//!
//! Every source adapter (GDELT, Nominatim, Wikimapia, plain `GeoJSON` URLs)
//! produces the same [`Feature`] values. Coordinates are always WGS84
//! longitude/latitude; nothing in this crate reprojects.

pub mod attributes;
pub mod geometry;
pub mod policy;

use std::fmt;

use uuid::Uuid;

pub use attributes::{AttributeBag, AttributeValue};
pub use geometry::{BoundingBox, Coordinate, Geometry, GeometryKind, Polygon};
pub use policy::{ComparePolicy, DegeneratePolicy, InteriorRingPolicy, ParseOptions};

/// Stable identifier of a feature within a layer's store.
///
/// Identifiers either come from the payload itself (a `GeoJSON` `id` member
/// or a configured property such as Nominatim's `place_id`) or are minted at
/// parse time. Minted identifiers never match across fetches, so features
/// without a payload identifier accumulate instead of merging.
///
/// Each polygon of a multi-part geometry gets its own [`Part`](Self::Part)
/// key, which never equals a [`Source`](Self::Source) key even when both
/// print the same. A feature that grows from one part to several keeps its
/// old single-part entry next to the new parts until the layer is cleared.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeatureId {
    /// Identifier supplied by the source payload.
    Source(String),
    /// One polygon of a multi-part payload feature.
    Part {
        /// Payload identifier of the whole feature.
        source: String,
        /// Zero-based part index.
        index: usize,
    },
    /// Random identifier minted because the payload had none.
    Synthesized(Uuid),
}

impl FeatureId {
    /// Mints a fresh random identifier.
    #[must_use]
    pub fn synthesize() -> Self {
        Self::Synthesized(Uuid::new_v4())
    }

    /// Identifier of part `index` of the payload feature `source`.
    #[must_use]
    pub fn part(source: impl Into<String>, index: usize) -> Self {
        Self::Part {
            source: source.into(),
            index,
        }
    }

    /// Whether this identifier was minted rather than read from the payload.
    #[must_use]
    pub const fn is_synthesized(&self) -> bool {
        matches!(self, Self::Synthesized(_))
    }

    /// Every identifier whose [`Display`](fmt::Display) form is `text`,
    /// most specific last.
    ///
    /// The plain source identifier always comes first, so a payload id that
    /// happens to look like a UUID or a part key is still found.
    #[must_use]
    pub fn candidates(text: &str) -> Vec<Self> {
        let mut ids = vec![Self::Source(text.to_string())];
        if let Some((source, digits)) = text.rsplit_once('#')
            && let Ok(index) = digits.parse::<usize>()
            && index.to_string() == digits
        {
            ids.push(Self::part(source, index));
        }
        if let Ok(uuid) = Uuid::parse_str(text)
            && uuid.to_string() == text
        {
            ids.push(Self::Synthesized(uuid));
        }
        ids
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(id) => f.write_str(id),
            Self::Part { source, index } => write!(f, "{source}#{index}"),
            Self::Synthesized(uuid) => write!(f, "{uuid}"),
        }
    }
}

/// A single geometry plus attribute record.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Store key.
    pub id: FeatureId,
    /// WGS84 geometry.
    pub geometry: Geometry,
    /// Flat property bag copied from the payload.
    pub attributes: AttributeBag,
}

impl Feature {
    /// Creates a feature.
    #[must_use]
    pub const fn new(id: FeatureId, geometry: Geometry, attributes: AttributeBag) -> Self {
        Self {
            id,
            geometry,
            attributes,
        }
    }

    /// Returns the attribute named `key`, if present.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Returns the attribute named `key` as text, if it is a string.
    #[must_use]
    pub fn text_attribute(&self, key: &str) -> Option<&str> {
        self.attribute(key).and_then(AttributeValue::as_str)
    }
}
