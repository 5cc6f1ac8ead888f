//! Wikimapia `box` API requests and response conversion.
//!
//! Wikimapia does not speak `GeoJSON`. A response looks like
//!
//! ```json
//! {"places": [{"id": 55, "title": "Park", "url": "http://wikimapia.org/55/",
//!              "location": {"lon": 7.1, "lat": 50.7},
//!              "polygon": [{"x": 7.0, "y": 50.6}, {"x": 7.2, "y": 50.6}, ...]}]}
//! ```
//!
//! and is reshaped into a `FeatureCollection` document before the shared
//! parser runs. Errors come back as `{"debug": {"code": .., "message": ..}}`
//! with a success status.

use geoint_feature_models::BoundingBox;
use geoint_geojson::IngestError;
use reqwest::Url;
use serde_json::{Map, Value, json};

use crate::{SourceError, parse_url};

/// Place fields that are turned into geometry rather than properties.
const GEOMETRY_FIELDS: &[&str] = &["polygon", "location"];

/// Builds a Wikimapia bounding box query URL.
///
/// # Errors
///
/// Returns [`SourceError::InvalidUrl`] if `base_url` is not a valid URL.
pub fn build_url(
    base_url: &str,
    key: &str,
    bbox: &BoundingBox,
    language: &str,
    count: u32,
) -> Result<Url, SourceError> {
    let mut url = parse_url(base_url)?;
    url.query_pairs_mut()
        .append_pair("key", key)
        .append_pair("function", "box")
        .append_pair("coordsby", "latlon")
        .append_pair("lon_min", &bbox.min_x.to_string())
        .append_pair("lat_min", &bbox.min_y.to_string())
        .append_pair("lon_max", &bbox.max_x.to_string())
        .append_pair("lat_max", &bbox.max_y.to_string())
        .append_pair("format", "json")
        .append_pair("language", language)
        .append_pair("page", "1")
        .append_pair("count", &count.to_string());
    Ok(url)
}

/// Converts a Wikimapia response document into a `FeatureCollection`
/// document.
///
/// Places with a polygon become polygons, places with only a location
/// become points, and places with neither keep a `null` geometry (the
/// parser skips them). Scalar place fields become properties.
///
/// # Errors
///
/// Returns [`SourceError::Api`] if the response carries a `debug` error
/// object, or [`SourceError::Ingest`] if it is not a JSON object.
pub fn to_feature_collection(document: &Value) -> Result<Value, SourceError> {
    let object = document.as_object().ok_or(IngestError::NotAnObject)?;

    if let Some(debug) = object.get("debug") {
        let message = debug
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| debug.to_string(), str::to_string);
        return Err(SourceError::Api { message });
    }

    let features: Vec<Value> = object
        .get("places")
        .and_then(Value::as_array)
        .map(|places| places.iter().filter_map(place_to_feature).collect())
        .unwrap_or_default();

    Ok(json!({
        "type": "FeatureCollection",
        "features": features,
    }))
}

fn place_to_feature(place: &Value) -> Option<Value> {
    let place = place.as_object()?;

    let geometry = polygon_geometry(place)
        .or_else(|| point_geometry(place))
        .unwrap_or(Value::Null);

    let properties: Map<String, Value> = place
        .iter()
        .filter(|(key, value)| {
            !GEOMETRY_FIELDS.contains(&key.as_str()) && !value.is_object() && !value.is_array()
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let mut feature = Map::new();
    feature.insert("type".to_string(), json!("Feature"));
    if let Some(id) = place.get("id") {
        feature.insert("id".to_string(), id.clone());
    }
    feature.insert("geometry".to_string(), geometry);
    feature.insert("properties".to_string(), Value::Object(properties));
    Some(Value::Object(feature))
}

fn polygon_geometry(place: &Map<String, Value>) -> Option<Value> {
    let vertices: Vec<Value> = place
        .get("polygon")?
        .as_array()?
        .iter()
        .filter_map(|vertex| {
            let x = vertex.get("x")?.as_f64()?;
            let y = vertex.get("y")?.as_f64()?;
            Some(json!([x, y]))
        })
        .collect();

    (!vertices.is_empty()).then(|| json!({"type": "Polygon", "coordinates": [vertices]}))
}

fn point_geometry(place: &Map<String, Value>) -> Option<Value> {
    let location = place.get("location")?;
    let lon = location.get("lon")?.as_f64()?;
    let lat = location.get("lat")?.as_f64()?;
    Some(json!({"type": "Point", "coordinates": [lon, lat]}))
}
