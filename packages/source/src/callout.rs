//! Callout contents for an identified feature.
//!
//! GDELT features carry a `name`, an `html` snippet with the article link
//! (`<a href="..." title="...">`) and a `shareimage` URL. Wikimapia places
//! carry a plain `url`.

use std::sync::LazyLock;

use geoint_feature_models::Feature;
use regex::Regex;

/// Title used when a feature has no `name`.
pub const DEFAULT_TITLE: &str = "GDELT Graphic";

static TITLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"title="(?<title>[^"]+)""#).unwrap_or_else(|_| unreachable!()));

static HREF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="(?<href>[^"]+)""#).unwrap_or_else(|_| unreachable!()));

/// Text and links to show for a selected feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalloutData {
    /// Identifier of the feature, for re-selecting it later.
    pub uid: String,
    /// Headline.
    pub title: String,
    /// Body text.
    pub detail: String,
    /// Article or place link.
    pub link: Option<String>,
    /// Preview image URL.
    pub image: Option<String>,
}

impl CalloutData {
    /// Extracts callout contents from a feature's attributes.
    #[must_use]
    pub fn from_feature(feature: &Feature) -> Self {
        let title = feature
            .text_attribute("name")
            .unwrap_or(DEFAULT_TITLE)
            .to_string();

        let html = feature.text_attribute("html");
        let detail = html
            .map(|html| {
                TITLE_PATTERN
                    .captures(html)
                    .map_or_else(|| html.to_string(), |c| c["title"].to_string())
            })
            .unwrap_or_default();

        let link = html
            .and_then(|html| HREF_PATTERN.captures(html))
            .map(|c| c["href"].to_string())
            .or_else(|| feature.text_attribute("url").map(str::to_string));

        let image = feature
            .text_attribute("shareimage")
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self {
            uid: feature.id.to_string(),
            title,
            detail,
            link,
            image,
        }
    }
}

#[cfg(test)]
mod tests {
    use geoint_feature_models::{AttributeBag, AttributeValue, FeatureId, Geometry};

    use super::*;

    fn feature(attributes: &[(&str, &str)]) -> Feature {
        let bag: AttributeBag = attributes
            .iter()
            .map(|(k, v)| ((*k).to_string(), AttributeValue::String((*v).to_string())))
            .collect();
        Feature::new(FeatureId::Source("evt-1".to_string()), Geometry::point(0.0, 0.0), bag)
    }

    #[test]
    fn extracts_gdelt_fields() {
        let callout = CalloutData::from_feature(&feature(&[
            ("name", "Bonn, Germany"),
            (
                "html",
                r#"<a href="https://news.example/story" title="Flooding in Bonn">Story</a>"#,
            ),
            ("shareimage", "https://news.example/img.jpg"),
        ]));

        assert_eq!(
            callout,
            CalloutData {
                uid: "evt-1".to_string(),
                title: "Bonn, Germany".to_string(),
                detail: "Flooding in Bonn".to_string(),
                link: Some("https://news.example/story".to_string()),
                image: Some("https://news.example/img.jpg".to_string()),
            }
        );
    }

    #[test]
    fn falls_back_to_raw_html_and_default_title() {
        let callout = CalloutData::from_feature(&feature(&[("html", "plain text")]));
        assert_eq!(callout.title, DEFAULT_TITLE);
        assert_eq!(callout.detail, "plain text");
        assert_eq!(callout.link, None);
        assert_eq!(callout.image, None);
    }

    #[test]
    fn uses_url_attribute_as_link() {
        let callout = CalloutData::from_feature(&feature(&[
            ("title", "Park"),
            ("url", "http://wikimapia.org/55/"),
        ]));
        assert_eq!(callout.link.as_deref(), Some("http://wikimapia.org/55/"));
        assert!(callout.detail.is_empty());
    }
}
