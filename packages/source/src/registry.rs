//! Source registry: loads all source definitions from embedded TOML configs.
//!
//! Each `.toml` file in `packages/source/sources/` is baked into the binary
//! at compile time via [`include_str!`]. Adding a source means adding a TOML
//! file and listing it below.

use geoint_source_models::SourceDefinition;

/// TOML configs embedded at compile time.
const SOURCE_TOMLS: &[(&str, &str)] = &[
    ("gdelt", include_str!("../sources/gdelt.toml")),
    ("nominatim", include_str!("../sources/nominatim.toml")),
    ("wikimapia", include_str!("../sources/wikimapia.toml")),
    ("geojson", include_str!("../sources/geojson.toml")),
];

/// Total number of configured sources (used in tests).
#[cfg(test)]
const EXPECTED_SOURCE_COUNT: usize = 4;

/// Parses one source definition from TOML text.
///
/// # Errors
///
/// Returns the TOML error message if the text is not a valid definition.
pub fn parse_source_toml(toml_str: &str) -> Result<SourceDefinition, String> {
    toml::de::from_str(toml_str).map_err(|e| e.to_string())
}

/// Returns all configured source definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (the configs are embedded, so
/// this is caught by the registry tests).
#[must_use]
pub fn all_sources() -> Vec<SourceDefinition> {
    SOURCE_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_source_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Looks up one built-in source definition by id.
#[must_use]
pub fn find_source(id: &str) -> Option<SourceDefinition> {
    all_sources().into_iter().find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use geoint_source_models::{FetcherConfig, FilterRequirement};
    use geoint_store::BucketRouting;

    use super::*;

    #[test]
    fn loads_all_sources() {
        let sources = all_sources();
        assert_eq!(sources.len(), EXPECTED_SOURCE_COUNT);
    }

    #[test]
    fn source_ids_are_unique() {
        let sources = all_sources();
        let mut ids: Vec<&str> = sources.iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), EXPECTED_SOURCE_COUNT);
    }

    #[test]
    fn file_names_match_ids() {
        for (name, toml) in SOURCE_TOMLS {
            let def = parse_source_toml(toml).unwrap();
            assert_eq!(&def.id, name);
        }
    }

    #[test]
    fn all_sources_have_required_fields() {
        for source in &all_sources() {
            assert!(!source.id.is_empty(), "source id is empty");
            assert!(!source.name.is_empty(), "source name is empty");
            match &source.fetcher {
                FetcherConfig::Gdelt { base_url, .. }
                | FetcherConfig::Nominatim { base_url, .. }
                | FetcherConfig::Wikimapia { base_url, .. } => {
                    assert!(
                        crate::parse_url(base_url).is_ok(),
                        "{}: invalid base_url",
                        source.id
                    );
                }
                FetcherConfig::GeojsonUrl { .. } => {}
            }
        }
    }

    #[test]
    fn gdelt_clears_before_each_query() {
        let gdelt = find_source("gdelt").unwrap();
        assert!(gdelt.clear_before_query);
        assert_eq!(gdelt.routing, BucketRouting::Single);
        assert_eq!(gdelt.fetcher.requirement(), FilterRequirement::QueryText);

        for id in ["nominatim", "wikimapia", "geojson"] {
            assert!(!find_source(id).unwrap().clear_before_query, "{id}");
        }
    }

    #[test]
    fn nominatim_uses_place_id() {
        let nominatim = find_source("nominatim").unwrap();
        assert_eq!(nominatim.parse.id_property.as_deref(), Some("place_id"));
    }

    #[test]
    fn unknown_source_is_none() {
        assert!(find_source("missing").is_none());
    }
}
