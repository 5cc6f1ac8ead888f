//! `GeoJSON` `FeatureCollection` walker.
//!
//! Supports `Point`, `Polygon` and `MultiPolygon` geometries. Everything
//! else (`LineString`, `GeometryCollection`, missing geometries, short
//! coordinate arrays) is skipped without failing the collection.

use geoint_feature_models::attributes::bag_from_json;
use geoint_feature_models::{
    AttributeBag, Coordinate, DegeneratePolicy, Feature, FeatureId, Geometry,
    InteriorRingPolicy, ParseOptions,
};
use serde_json::{Map, Value};

use crate::{IngestError, builder};

/// Result of one parse pass over one payload.
#[derive(Debug, Clone, Default)]
pub struct ParsedCollection {
    /// Features in payload order. A `MultiPolygon` contributes one feature
    /// per part.
    pub features: Vec<Feature>,
    /// Features (or polygon parts) that were skipped.
    pub skipped: usize,
    /// Interior rings discarded under [`InteriorRingPolicy::Drop`].
    pub dropped_rings: usize,
}

/// Parses UTF-8 JSON text into a generic document.
///
/// # Errors
///
/// Returns [`IngestError::MalformedJson`] if the text is not valid JSON
/// (including invalid UTF-8).
pub fn parse_json(text: &[u8]) -> Result<Value, IngestError> {
    Ok(serde_json::from_slice(text)?)
}

/// Parses UTF-8 JSON text as a `FeatureCollection`.
///
/// # Errors
///
/// Returns [`IngestError::MalformedJson`] if the text is not valid JSON and
/// [`IngestError::NotAnObject`] if the top-level value is not an object.
pub fn parse_feature_collection(
    text: &[u8],
    options: &ParseOptions,
) -> Result<ParsedCollection, IngestError> {
    let document = parse_json(text)?;
    parse_document(&document, options)
}

/// Walks an already-parsed `FeatureCollection` document.
///
/// A missing or non-array `features` member yields zero features.
///
/// # Errors
///
/// Returns [`IngestError::NotAnObject`] if `document` is not an object.
pub fn parse_document(
    document: &Value,
    options: &ParseOptions,
) -> Result<ParsedCollection, IngestError> {
    let object = document.as_object().ok_or(IngestError::NotAnObject)?;
    let mut parsed = ParsedCollection::default();

    let Some(features) = object.get("features").and_then(Value::as_array) else {
        log::debug!("Document has no features array");
        return Ok(parsed);
    };

    for (index, value) in features.iter().enumerate() {
        match value.as_object() {
            Some(feature) => parse_feature(index, feature, options, &mut parsed),
            None => {
                log::debug!("Skipping features[{index}]: not an object");
                parsed.skipped += 1;
            }
        }
    }

    if parsed.skipped > 0 {
        log::debug!(
            "Parsed {} features, skipped {}",
            parsed.features.len(),
            parsed.skipped
        );
    }

    Ok(parsed)
}

fn parse_feature(
    index: usize,
    feature: &Map<String, Value>,
    options: &ParseOptions,
    out: &mut ParsedCollection,
) {
    let geometry = feature.get("geometry").and_then(Value::as_object);
    let geometry_type = geometry
        .and_then(|g| g.get("type"))
        .and_then(Value::as_str);
    let coordinates = geometry
        .and_then(|g| g.get("coordinates"))
        .and_then(Value::as_array);

    let (Some(geometry_type), Some(coordinates)) = (geometry_type, coordinates) else {
        log::debug!("Skipping features[{index}]: missing geometry type or coordinates");
        out.skipped += 1;
        return;
    };

    let attributes = bag_from_json(feature.get("properties"));
    let payload_id = source_id(feature, options);

    match geometry_type {
        "Point" => {
            let Some(location) = coordinate_from(coordinates) else {
                log::debug!("Skipping features[{index}]: point has fewer than two numbers");
                out.skipped += 1;
                return;
            };
            let id = payload_id.map_or_else(FeatureId::synthesize, FeatureId::Source);
            out.features.push(Feature::new(
                id,
                builder::build_point(location.x, location.y),
                attributes,
            ));
        }
        "Polygon" => match polygon_from(coordinates, options, &mut out.dropped_rings) {
            Ok(geometry) => {
                let id = payload_id.map_or_else(FeatureId::synthesize, FeatureId::Source);
                out.features.push(Feature::new(id, geometry, attributes));
            }
            Err(e) => {
                log::warn!("Skipping features[{index}]: {e}");
                out.skipped += 1;
            }
        },
        "MultiPolygon" => {
            push_multi_polygon(index, coordinates, payload_id, &attributes, options, out);
        }
        other => {
            log::debug!("Skipping features[{index}]: unsupported geometry type {other:?}");
            out.skipped += 1;
        }
    }
}

fn push_multi_polygon(
    index: usize,
    coordinates: &[Value],
    payload_id: Option<String>,
    attributes: &AttributeBag,
    options: &ParseOptions,
    out: &mut ParsedCollection,
) {
    let parts: Vec<&Vec<Value>> = coordinates.iter().filter_map(Value::as_array).collect();
    let multi_part = parts.len() > 1;

    for (part, rings) in parts.into_iter().enumerate() {
        match polygon_from(rings, options, &mut out.dropped_rings) {
            Ok(geometry) => {
                let id = match &payload_id {
                    Some(id) if multi_part => FeatureId::part(id.as_str(), part),
                    Some(id) => FeatureId::Source(id.clone()),
                    None => FeatureId::synthesize(),
                };
                out.features
                    .push(Feature::new(id, geometry, attributes.clone()));
            }
            Err(e) => {
                log::warn!("Skipping features[{index}] part {part}: {e}");
                out.skipped += 1;
            }
        }
    }
}

/// Builds a polygon from `GeoJSON` ring arrays, keeping the first ring.
fn polygon_from(
    rings: &[Value],
    options: &ParseOptions,
    dropped_rings: &mut usize,
) -> Result<Geometry, IngestError> {
    let mut rings = rings.iter().filter_map(Value::as_array);
    let exterior: Vec<Coordinate> = rings
        .next()
        .map(|ring| {
            ring.iter()
                .filter_map(Value::as_array)
                .filter_map(|vertex| coordinate_from(vertex))
                .collect()
        })
        .unwrap_or_default();
    let interior = rings.count();

    if interior > 0 {
        match options.interior_rings {
            InteriorRingPolicy::Drop => {
                log::warn!("{interior} interior ring(s) dropped, keeping the exterior ring only");
                *dropped_rings += interior;
            }
            InteriorRingPolicy::Reject => {
                return Err(IngestError::DegenerateGeometry {
                    message: format!("polygon has {interior} interior ring(s)"),
                });
            }
        }
    }

    let polygon = builder::polygon_from_ring(exterior);
    if options.degenerate == DegeneratePolicy::Reject && polygon.is_degenerate() {
        return Err(IngestError::DegenerateGeometry {
            message: format!(
                "exterior ring has {} vertices after closing",
                polygon.boundary().len()
            ),
        });
    }

    Ok(Geometry::Polygon(polygon))
}

/// Reads the first two numbers of a position array.
fn coordinate_from(position: &[Value]) -> Option<Coordinate> {
    match position {
        [x, y, ..] => Some(Coordinate::new(x.as_f64()?, y.as_f64()?)),
        _ => None,
    }
}

/// Reads a payload identifier: the feature's `id` member first, then the
/// configured property.
fn source_id(feature: &Map<String, Value>, options: &ParseOptions) -> Option<String> {
    feature.get("id").and_then(id_text).or_else(|| {
        let property = options.id_property.as_deref()?;
        feature
            .get("properties")
            .and_then(|p| p.get(property))
            .and_then(id_text)
    })
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use geoint_feature_models::AttributeValue;
    use serde_json::json;

    use super::*;

    fn parse(document: &Value) -> ParsedCollection {
        parse_document(document, &ParseOptions::default()).unwrap()
    }

    fn ring(points: &[(f64, f64)]) -> Vec<Coordinate> {
        points.iter().map(|&(x, y)| Coordinate::new(x, y)).collect()
    }

    #[test]
    fn parses_single_point_scenario() {
        let text = br#"{"type":"FeatureCollection","features":[{"geometry":{"type":"Point","coordinates":[10.0,20.0]},"properties":{"name":"A"}}]}"#;
        let parsed = parse_feature_collection(text, &ParseOptions::default()).unwrap();

        assert_eq!(parsed.features.len(), 1);
        let feature = &parsed.features[0];
        assert_eq!(feature.geometry, Geometry::point(10.0, 20.0));
        assert_eq!(
            feature.attributes["name"],
            AttributeValue::String("A".to_string())
        );
        assert!(feature.id.is_synthesized());
    }

    #[test]
    fn counts_only_valid_points() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [
                { "geometry": { "type": "Point", "coordinates": [1.0, 2.0] } },
                { "geometry": { "type": "Point", "coordinates": [1.0, 2.0, 300.0] } },
                { "geometry": { "type": "Point", "coordinates": [1.0] } },
                { "geometry": { "type": "Point", "coordinates": [] } },
                { "geometry": { "type": "Point", "coordinates": ["a", "b"] } },
                { "geometry": { "type": "Point" } },
                "not a feature",
                { "geometry": { "type": "Point", "coordinates": [-73.9, 40.7] } },
            ]
        });
        let parsed = parse(&doc);

        assert_eq!(parsed.features.len(), 3);
        assert_eq!(parsed.skipped, 5);
        assert_eq!(parsed.features[2].geometry, Geometry::point(-73.9, 40.7));
    }

    #[test]
    fn line_strings_are_skipped_not_errors() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [{
                "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] },
                "properties": {}
            }]
        });
        let parsed = parse(&doc);
        assert!(parsed.features.is_empty());
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn missing_features_array_is_empty() {
        assert!(parse(&json!({ "type": "FeatureCollection" })).features.is_empty());
        assert!(parse(&json!({ "features": {} })).features.is_empty());
    }

    #[test]
    fn rejects_non_object_documents() {
        let err = parse_feature_collection(b"[1, 2]", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, IngestError::NotAnObject));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = parse_feature_collection(b"{", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, IngestError::MalformedJson(_)));
    }

    #[test]
    fn polygon_keeps_exterior_ring_only() {
        let doc = json!({
            "features": [{
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [
                        [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]],
                        [[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 1.0]]
                    ]
                },
                "properties": { "name": "holey" }
            }]
        });
        let parsed = parse(&doc);

        assert_eq!(parsed.features.len(), 1);
        assert_eq!(parsed.dropped_rings, 1);
        let Geometry::Polygon(polygon) = &parsed.features[0].geometry else {
            panic!("expected polygon");
        };
        assert_eq!(
            polygon.boundary(),
            ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)]).as_slice()
        );
    }

    #[test]
    fn polygon_with_holes_is_rejected_under_strict_policy() {
        let doc = json!({
            "features": [{
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [
                        [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 0.0]],
                        [[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 1.0]]
                    ]
                }
            }]
        });
        let options = ParseOptions {
            interior_rings: InteriorRingPolicy::Reject,
            ..ParseOptions::default()
        };
        let parsed = parse_document(&doc, &options).unwrap();
        assert!(parsed.features.is_empty());
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.dropped_rings, 0);
    }

    #[test]
    fn open_polygon_ring_is_closed() {
        let doc = json!({
            "features": [{
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]]
                }
            }]
        });
        let parsed = parse(&doc);
        let Geometry::Polygon(polygon) = &parsed.features[0].geometry else {
            panic!("expected polygon");
        };
        assert_eq!(polygon.boundary().len(), 4);
        assert_eq!(polygon.boundary().first(), polygon.boundary().last());
    }

    #[test]
    fn degenerate_polygons_follow_policy() {
        let doc = json!({
            "features": [
                { "geometry": { "type": "Polygon", "coordinates": [] } },
                { "geometry": { "type": "Polygon", "coordinates": [[[1.0, 1.0]]] } },
            ]
        });
        assert_eq!(parse(&doc).features.len(), 2);

        let strict = ParseOptions {
            degenerate: DegeneratePolicy::Reject,
            ..ParseOptions::default()
        };
        let parsed = parse_document(&doc, &strict).unwrap();
        assert!(parsed.features.is_empty());
        assert_eq!(parsed.skipped, 2);
    }

    #[test]
    fn multipolygon_yields_one_feature_per_part() {
        let doc = json!({
            "features": [{
                "id": 42,
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
                        [[[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 5.0]]],
                        [[[9.0, 9.0], [10.0, 9.0], [10.0, 10.0], [9.0, 9.0]]]
                    ]
                },
                "properties": { "name": "islands", "population": 12 }
            }]
        });
        let parsed = parse(&doc);

        assert_eq!(parsed.features.len(), 3);
        for feature in &parsed.features {
            assert_eq!(feature.attributes, parsed.features[0].attributes);
        }
        let ids: Vec<String> = parsed.features.iter().map(|f| f.id.to_string()).collect();
        assert_eq!(ids, ["42#0", "42#1", "42#2"]);
        assert_eq!(parsed.features[1].id, FeatureId::part("42", 1));
    }

    #[test]
    fn single_part_multipolygon_keeps_plain_id() {
        let doc = json!({
            "features": [{
                "id": "relation/62422",
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]]
                }
            }]
        });
        let parsed = parse(&doc);
        assert_eq!(
            parsed.features[0].id,
            FeatureId::Source("relation/62422".to_string())
        );
    }

    #[test]
    fn reads_id_from_configured_property() {
        let doc = json!({
            "features": [
                {
                    "geometry": { "type": "Point", "coordinates": [13.4, 52.5] },
                    "properties": { "place_id": 240_109_189, "name": "Berlin" }
                },
                {
                    "geometry": { "type": "Point", "coordinates": [13.4, 52.5] },
                    "properties": { "name": "no id" }
                }
            ]
        });
        let options = ParseOptions {
            id_property: Some("place_id".to_string()),
            ..ParseOptions::default()
        };
        let parsed = parse_document(&doc, &options).unwrap();

        assert_eq!(
            parsed.features[0].id,
            FeatureId::Source("240109189".to_string())
        );
        assert!(parsed.features[1].id.is_synthesized());
    }

    #[test]
    fn top_level_id_wins_over_property() {
        let doc = json!({
            "features": [{
                "id": "a",
                "geometry": { "type": "Point", "coordinates": [0.0, 0.0] },
                "properties": { "place_id": "b" }
            }]
        });
        let options = ParseOptions {
            id_property: Some("place_id".to_string()),
            ..ParseOptions::default()
        };
        let parsed = parse_document(&doc, &options).unwrap();
        assert_eq!(parsed.features[0].id, FeatureId::Source("a".to_string()));
    }

    #[test]
    fn missing_properties_yield_empty_bag() {
        let doc = json!({
            "features": [{ "geometry": { "type": "Point", "coordinates": [0.0, 0.0] } }]
        });
        assert!(parse(&doc).features[0].attributes.is_empty());
    }
}
