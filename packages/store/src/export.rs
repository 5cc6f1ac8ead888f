//! Conversion of stored features back into `GeoJSON`.

use geoint_feature_models::Feature;
use geojson::{FeatureCollection, JsonObject, feature::Id};

/// Converts one feature into a `GeoJSON` feature.
///
/// Every identifier is written as its display string, so part keys come
/// out as `{id}#{part}`.
#[must_use]
pub fn to_geojson_feature(feature: &Feature) -> geojson::Feature {
    let geometry = geo::Geometry::from(&feature.geometry);
    let properties: JsonObject = feature
        .attributes
        .iter()
        .map(|(key, value)| (key.clone(), serde_json::Value::from(value)))
        .collect();

    geojson::Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(&geometry))),
        id: Some(Id::String(feature.id.to_string())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Collects features into a `FeatureCollection`, preserving order.
#[must_use]
pub fn to_feature_collection<'a>(features: impl IntoIterator<Item = &'a Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: features.into_iter().map(to_geojson_feature).collect(),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use geoint_feature_models::{AttributeBag, AttributeValue, Coordinate, FeatureId, Geometry, Polygon};

    use super::*;

    #[test]
    fn exports_point_with_properties() {
        let mut attributes = AttributeBag::new();
        attributes.insert("name".to_string(), AttributeValue::String("Berlin".to_string()));
        attributes.insert("rank".to_string(), AttributeValue::Number(4.0));
        let feature = Feature::new(
            FeatureId::Source("node/1".to_string()),
            Geometry::point(13.4, 52.5),
            attributes,
        );

        let exported = to_geojson_feature(&feature);

        assert_eq!(exported.id, Some(Id::String("node/1".to_string())));
        assert_eq!(
            exported.geometry.map(|g| g.value),
            Some(geojson::Value::Point(vec![13.4, 52.5]))
        );
        let properties = exported.properties.unwrap();
        assert_eq!(properties["name"], serde_json::json!("Berlin"));
        assert_eq!(properties["rank"], serde_json::json!(4.0));
    }

    #[test]
    fn exports_polygon_ring() {
        let ring = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(0.0, 0.0),
        ];
        let feature = Feature::new(
            FeatureId::Source("a".to_string()),
            Geometry::Polygon(Polygon::from_closed_ring(ring)),
            AttributeBag::new(),
        );

        let collection = to_feature_collection([&feature]);
        assert_eq!(collection.features.len(), 1);

        let Some(geojson::Value::Polygon(rings)) =
            collection.features[0].geometry.as_ref().map(|g| g.value.clone())
        else {
            panic!("expected polygon");
        };
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].len(), 4);
        assert_eq!(rings[0][1], vec![1.0, 0.0]);
    }

    #[test]
    fn serialized_collection_is_valid_json() {
        let feature = Feature::new(
            FeatureId::Source("x".to_string()),
            Geometry::point(1.0, 2.0),
            AttributeBag::new(),
        );
        let text = to_feature_collection([&feature]).to_string();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["id"], "x");
    }
}
