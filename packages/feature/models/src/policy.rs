//! Parse and merge policies, configurable per source definition.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// What to do with interior rings (holes) of a polygon.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InteriorRingPolicy {
    /// Keep the exterior ring, drop the holes and log a warning.
    #[default]
    Drop,
    /// Skip the whole polygon.
    Reject,
}

/// What to do with polygons too short to bound an area.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Keep zero/one-vertex polygons as degenerate values.
    #[default]
    Allow,
    /// Skip polygons whose closed ring has fewer than four vertices.
    Reject,
}

/// How the feature store decides whether a re-sighted feature changed.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComparePolicy {
    /// Only a geometry change replaces the stored feature.
    #[default]
    GeometryOnly,
    /// A geometry or attribute change replaces the stored feature.
    FullFeature,
}

/// Options for turning a `FeatureCollection` into features.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Interior ring handling.
    pub interior_rings: InteriorRingPolicy,
    /// Degenerate polygon handling.
    pub degenerate: DegeneratePolicy,
    /// Property holding a stable identifier when features carry no
    /// top-level `id` (e.g. Nominatim's `place_id`).
    pub id_property: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_lax_behavior() {
        let options = ParseOptions::default();
        assert_eq!(options.interior_rings, InteriorRingPolicy::Drop);
        assert_eq!(options.degenerate, DegeneratePolicy::Allow);
        assert!(options.id_property.is_none());
        assert_eq!(ComparePolicy::default(), ComparePolicy::GeometryOnly);
    }

    #[test]
    fn policies_parse_from_snake_case() {
        assert_eq!(
            "full_feature".parse::<ComparePolicy>().unwrap(),
            ComparePolicy::FullFeature
        );
        assert_eq!(
            "reject".parse::<InteriorRingPolicy>().unwrap(),
            InteriorRingPolicy::Reject
        );
        assert_eq!(DegeneratePolicy::Allow.to_string(), "allow");
    }
}
