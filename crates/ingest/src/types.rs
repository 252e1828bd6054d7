//! Input record types.
//!
//! A payload carries one or more [`UserRecord`]s. Each user lists creative
//! sources, which may offer several named URL variants, and preview
//! sources, which always have exactly one URL.
//!
//! # Creative URL formats
//!
//! Two shapes are accepted for a creative:
//!
//! ```json
//! {"id": "c1", "urls": {"original": "https://cdn/a.jpg", "1:1": "https://cdn/a_sq.jpg"}}
//! {"id": "c1", "url": "https://cdn/a.jpg"}
//! ```
//!
//! Both shapes flatten to a list of [`CreativeVariant`]s. A legacy single
//! `url` becomes one variant without a key; it covers the same URL a
//! `{"original": url}` map would. When both fields are present, a non-empty
//! `urls` wins.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Opaque identifier passed through from input to output unchanged.
///
/// Strings and numbers are accepted; `null`, booleans, arrays and objects
/// are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "JsonValue", into = "JsonValue")]
pub struct Identifier(JsonValue);

impl Identifier {
    pub fn as_value(&self) -> &JsonValue {
        &self.0
    }

    pub fn into_value(self) -> JsonValue {
        self.0
    }
}

impl TryFrom<JsonValue> for Identifier {
    type Error = String;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::String(_) | JsonValue::Number(_) => Ok(Self(value)),
            JsonValue::Null => Err("identifier must not be null".into()),
            other => Err(format!("identifier must be a string or number, got {other}")),
        }
    }
}

impl From<Identifier> for JsonValue {
    fn from(value: Identifier) -> Self {
        value.0
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self(JsonValue::String(value.to_string()))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            JsonValue::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

/// One user's creatives and previews as given in the input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserRecord {
    pub user_id: Identifier,
    #[serde(default)]
    pub ad_creative_images: Vec<CreativeSource>,
    #[serde(default)]
    pub metaad_previews: Vec<PreviewSource>,
}

impl UserRecord {
    /// Every URL this user references, previews first, each listed once in
    /// first-seen order.
    pub fn distinct_urls(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.metaad_previews
            .iter()
            .map(|p| p.url.as_str())
            .chain(
                self.ad_creative_images
                    .iter()
                    .flat_map(|c| c.variants.iter().map(|v| v.url.as_str())),
            )
            .filter(|url| seen.insert(*url))
            .collect()
    }

    /// Number of creative variants across all creatives.
    pub fn variant_count(&self) -> usize {
        self.ad_creative_images.iter().map(|c| c.variants.len()).sum()
    }
}

/// A creative asset with its URL variants flattened in input order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawCreativeSource")]
pub struct CreativeSource {
    pub id: Identifier,
    pub variants: Vec<CreativeVariant>,
}

/// One URL of a creative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreativeVariant {
    /// Crop name from the `urls` map; `None` for the legacy `url` field.
    pub key: Option<String>,
    pub url: String,
}

#[derive(Deserialize)]
struct RawCreativeSource {
    id: Identifier,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    urls: Option<Map<String, JsonValue>>,
}

impl TryFrom<RawCreativeSource> for CreativeSource {
    type Error = String;

    fn try_from(raw: RawCreativeSource) -> Result<Self, Self::Error> {
        let urls = raw.urls.unwrap_or_default();
        let variants = if urls.is_empty() {
            raw.url
                .map(|url| CreativeVariant { key: None, url })
                .into_iter()
                .collect()
        } else {
            urls.into_iter()
                .map(|(key, value)| match value {
                    JsonValue::String(url) => Ok(CreativeVariant {
                        key: Some(key),
                        url,
                    }),
                    other => Err(format!(
                        "creative {}: url for variant `{key}` must be a string, got {other}",
                        raw.id
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(Self {
            id: raw.id,
            variants,
        })
    }
}

impl CreativeSource {
    /// The URLs of all variants, in order.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|v| v.url.as_str())
    }
}

/// A rendered ad preview.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PreviewSource {
    pub id: Identifier,
    pub url: String,
}
