//! Terminal output and GeoJSON export for layers.

use std::path::Path;

use geoint_feature_models::Feature;
use geoint_source::SourceLayer;
use geoint_source::callout::CalloutData;
use geoint_source_models::SourceDefinition;
use geoint_store::OutputBuckets;
use geoint_store::export::to_feature_collection;

/// Prints the source table.
pub fn print_sources(sources: &[SourceDefinition]) {
    println!("{:<12} {:<12} NAME", "ID", "TYPE");
    println!("{}", "-".repeat(50));
    for source in sources {
        println!(
            "{:<12} {:<12} {}",
            source.id,
            source.fetcher.as_ref(),
            source.name
        );
    }
}

/// One-line summary of bucket sizes, e.g. `points: 3, lines: 0, areas: 1`.
pub fn bucket_counts(buckets: &OutputBuckets) -> String {
    buckets
        .iter()
        .map(|(kind, features)| format!("{kind}: {}", features.len()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders a callout as indented text.
pub fn format_callout(callout: &CalloutData) -> String {
    let mut lines = vec![format!("[{}] {}", callout.uid, callout.title)];
    if !callout.detail.is_empty() {
        lines.push(format!("    {}", callout.detail));
    }
    if let Some(link) = &callout.link {
        lines.push(format!("    link:  {link}"));
    }
    if let Some(image) = &callout.image {
        lines.push(format!("    image: {image}"));
    }
    lines.join("\n")
}

/// Prints a layer's bucket sizes and, optionally, a callout per feature.
pub fn print_layer(layer: &SourceLayer, callouts: bool) {
    println!("{} ({})", layer.definition().name, layer.id());
    println!("  {}", bucket_counts(layer.buckets()));

    if callouts {
        for feature in bucketed_features(layer) {
            println!("{}", format_callout(&CalloutData::from_feature(feature)));
        }
    }
}

/// Writes every bucketed feature of `layer` to `path` as a
/// `FeatureCollection`.
///
/// Returns the number of features written.
///
/// # Errors
///
/// Returns an error if serialization or the file write fails.
pub fn write_geojson(layer: &SourceLayer, path: &Path) -> Result<usize, Box<dyn std::error::Error>> {
    let features = bucketed_features(layer);
    let collection = to_feature_collection(features.iter().copied());
    std::fs::write(path, serde_json::to_string_pretty(&collection)?)?;
    Ok(features.len())
}

fn bucketed_features(layer: &SourceLayer) -> Vec<&Feature> {
    layer
        .buckets()
        .iter()
        .flat_map(|(_, features)| features.iter())
        .collect()
}

#[cfg(test)]
mod tests {
    use geoint_feature_models::{AttributeBag, FeatureId, Geometry};
    use geoint_store::{BucketRouting, UpsertOutcome};

    use super::*;

    #[test]
    fn counts_every_bucket_in_order() {
        let mut buckets = OutputBuckets::new(BucketRouting::ByGeometry);
        let point = Feature::new(
            FeatureId::Source("p".to_string()),
            Geometry::point(1.0, 2.0),
            AttributeBag::new(),
        );
        buckets.apply(UpsertOutcome::Inserted, &point);

        assert_eq!(bucket_counts(&buckets), "points: 1, lines: 0, areas: 0");
        assert_eq!(
            bucket_counts(&OutputBuckets::new(BucketRouting::Single)),
            "combined: 0"
        );
    }

    #[test]
    fn formats_callout_lines() {
        let callout = CalloutData {
            uid: "evt-1".to_string(),
            title: "Bonn".to_string(),
            detail: "Flooding".to_string(),
            link: Some("https://news.example/a".to_string()),
            image: None,
        };
        assert_eq!(
            format_callout(&callout),
            "[evt-1] Bonn\n    Flooding\n    link:  https://news.example/a"
        );
    }

    #[test]
    fn omits_empty_detail() {
        let callout = CalloutData {
            uid: "1".to_string(),
            title: "Park".to_string(),
            detail: String::new(),
            link: None,
            image: None,
        };
        assert_eq!(format_callout(&callout), "[1] Park");
    }
}
