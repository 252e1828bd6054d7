//! admatch Ingest Layer
//!
//! This is where a request payload enters admatch. We take raw JSON text,
//! check its shape, and hand back typed [`UserRecord`]s that the matching
//! stages can work with directly.
//!
//! ## What we do here
//!
//! - **Accept both payload shapes** - a single user object or an array of them.
//! - **Normalize creative URLs** - the legacy single `url` and the `urls` map
//!   both become an ordered list of [`CreativeVariant`]s.
//! - **Keep identifiers opaque** - ids are carried through as the JSON value
//!   they arrived as.
//! - **Enforce limits** - optional caps on input size and user count.
//!
//! Nothing here touches the network. Any error returned is fatal for the
//! whole payload.
//!
//! ## Example
//!
//! ```
//! use ingest::parse_users;
//!
//! let users = parse_users(r#"{
//!     "user_id": "u1",
//!     "ad_creative_images": [{"id": "c1", "url": "https://cdn.example/c1.jpg"}],
//!     "metaad_previews": [{"id": "p1", "url": "https://cdn.example/p1.jpg"}]
//! }"#).unwrap();
//!
//! assert_eq!(users.len(), 1);
//! assert_eq!(users[0].ad_creative_images[0].variants[0].key, None);
//! ```

use std::time::Instant;

use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

mod config;
mod error;
mod types;

pub use crate::config::{ConfigError, IngestConfig};
pub use crate::error::IngestError;
pub use crate::types::{CreativeSource, CreativeVariant, Identifier, PreviewSource, UserRecord};

/// Parse a payload with default (unbounded) limits.
pub fn parse_users(input: &str) -> Result<Vec<UserRecord>, IngestError> {
    parse_users_with_config(input, &IngestConfig::default())
}

/// Parse a payload, enforcing the limits in `cfg`.
pub fn parse_users_with_config(
    input: &str,
    cfg: &IngestConfig,
) -> Result<Vec<UserRecord>, IngestError> {
    let start = Instant::now();

    if let Some(limit) = cfg.max_input_bytes {
        if input.len() > limit {
            let err = IngestError::PayloadTooLarge(format!(
                "input of {} bytes exceeds limit of {limit}",
                input.len()
            ));
            warn!(error = %err, "ingest_failure");
            return Err(err);
        }
    }

    let value: JsonValue = match serde_json::from_str(input) {
        Ok(value) => value,
        Err(err) => {
            let err = IngestError::InvalidJson(err.to_string());
            warn!(error = %err, "ingest_failure");
            return Err(err);
        }
    };

    match parse_users_value_with_config(value, cfg) {
        Ok(users) => {
            info!(
                users = users.len(),
                input_bytes = input.len(),
                elapsed_micros = start.elapsed().as_micros(),
                "ingest_success"
            );
            Ok(users)
        }
        Err(err) => {
            warn!(error = %err, elapsed_micros = start.elapsed().as_micros(), "ingest_failure");
            Err(err)
        }
    }
}

/// Interpret an already-parsed JSON value as one or more user records.
pub fn parse_users_value(value: JsonValue) -> Result<Vec<UserRecord>, IngestError> {
    parse_users_value_with_config(value, &IngestConfig::default())
}

/// Like [`parse_users_value`] but enforces `cfg.max_users`.
///
/// An object is treated as a single user. An array is parsed element by
/// element and errors name the offending index.
pub fn parse_users_value_with_config(
    value: JsonValue,
    cfg: &IngestConfig,
) -> Result<Vec<UserRecord>, IngestError> {
    let users = match value {
        JsonValue::Object(_) => {
            vec![parse_user(value).map_err(|msg| IngestError::MalformedInput(format!("user: {msg}")))?]
        }
        JsonValue::Array(items) => {
            if let Some(limit) = cfg.max_users {
                if items.len() > limit {
                    return Err(IngestError::PayloadTooLarge(format!(
                        "{} users exceeds limit of {limit}",
                        items.len()
                    )));
                }
            }
            items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| {
                    parse_user(item)
                        .map_err(|msg| IngestError::MalformedInput(format!("users[{idx}]: {msg}")))
                })
                .collect::<Result<Vec<_>, _>>()?
        }
        other => {
            return Err(IngestError::MalformedInput(format!(
                "expected a user object or an array of users, got {}",
                json_kind(&other)
            )));
        }
    };

    for user in &users {
        debug!(
            user_id = %user.user_id,
            creatives = user.ad_creative_images.len(),
            variants = user.variant_count(),
            previews = user.metaad_previews.len(),
            "user_parsed"
        );
    }
    Ok(users)
}

fn parse_user(value: JsonValue) -> Result<UserRecord, String> {
    if !value.is_object() {
        return Err(format!("expected an object, got {}", json_kind(&value)));
    }
    UserRecord::deserialize(value).map_err(|err| err.to_string())
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SINGLE_USER: &str = r#"{
        "user_id": "u1",
        "ad_creative_images": [
            {"id": "c1", "urls": {"original": "https://cdn/c1.jpg", "1:1": "https://cdn/c1_sq.jpg"}},
            {"id": "c2", "url": "https://cdn/c2.jpg"}
        ],
        "metaad_previews": [
            {"id": "p1", "url": "https://cdn/p1.jpg"}
        ]
    }"#;

    #[test]
    fn single_object_becomes_one_user() {
        let users = parse_users(SINGLE_USER).expect("parse");
        assert_eq!(users.len(), 1);

        let user = &users[0];
        assert_eq!(user.user_id, Identifier::from("u1"));
        assert_eq!(user.ad_creative_images.len(), 2);
        assert_eq!(user.variant_count(), 3);
        assert_eq!(user.metaad_previews[0].url, "https://cdn/p1.jpg");
    }

    #[test]
    fn array_preserves_user_order() {
        let users = parse_users(r#"[{"user_id": "b"}, {"user_id": 7}, {"user_id": "a"}]"#).unwrap();
        let ids: Vec<String> = users.iter().map(|u| u.user_id.to_string()).collect();
        assert_eq!(ids, vec!["b", "7", "a"]);
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(parse_users("[]").unwrap().is_empty());
    }

    #[test]
    fn legacy_and_map_forms_name_the_same_urls() {
        let legacy = parse_users(
            r#"{"user_id": "u1", "ad_creative_images": [{"id": "c1", "url": "X"}]}"#,
        )
        .unwrap();
        let mapped = parse_users(
            r#"{"user_id": "u1", "ad_creative_images": [{"id": "c1", "urls": {"original": "X"}}]}"#,
        )
        .unwrap();

        let legacy = &legacy[0].ad_creative_images[0];
        let mapped = &mapped[0].ad_creative_images[0];
        assert_eq!(legacy.id, mapped.id);
        assert!(legacy.urls().eq(mapped.urls()));
    }

    #[test]
    fn syntax_errors_are_invalid_json() {
        let err = parse_users("{not json").unwrap_err();
        assert!(matches!(err, IngestError::InvalidJson(_)));
    }

    #[test]
    fn missing_user_id_is_malformed() {
        let err = parse_users(r#"{"metaad_previews": []}"#).unwrap_err();
        match err {
            IngestError::MalformedInput(msg) => assert!(msg.contains("user_id")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn array_errors_name_the_index() {
        let err = parse_users(r#"[{"user_id": "ok"}, {"user_id": "u2", "metaad_previews": [{"id": "p"}]}]"#)
            .unwrap_err();
        match err {
            IngestError::MalformedInput(msg) => {
                assert!(msg.starts_with("users[1]"), "{msg}");
                assert!(msg.contains("url"), "{msg}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn scalar_top_level_is_malformed() {
        for input in ["42", "\"text\"", "null", "true"] {
            let err = parse_users(input).unwrap_err();
            assert!(matches!(err, IngestError::MalformedInput(_)), "{input}");
        }
    }

    #[test]
    fn non_object_array_element_is_malformed() {
        let err = parse_users(r#"[{"user_id": "u1"}, 5]"#).unwrap_err();
        assert_eq!(
            err,
            IngestError::MalformedInput("users[1]: expected an object, got a number".into())
        );
    }

    #[test]
    fn null_identifier_is_rejected() {
        let err = parse_users(r#"{"user_id": null}"#).unwrap_err();
        assert!(matches!(err, IngestError::MalformedInput(_)));
    }

    #[test]
    fn input_byte_limit_is_enforced() {
        let cfg = IngestConfig::default().with_max_input_bytes(10);
        let err = parse_users_with_config(SINGLE_USER, &cfg).unwrap_err();
        assert!(matches!(err, IngestError::PayloadTooLarge(_)));
    }

    #[test]
    fn user_count_limit_is_enforced() {
        let cfg = IngestConfig::default().with_max_users(1);
        let err = parse_users_with_config(r#"[{"user_id": 1}, {"user_id": 2}]"#, &cfg).unwrap_err();
        assert_eq!(
            err,
            IngestError::PayloadTooLarge("2 users exceeds limit of 1".into())
        );
        assert!(parse_users_with_config(r#"[{"user_id": 1}]"#, &cfg).is_ok());
    }

    #[test]
    fn value_entry_point_matches_text_entry_point() {
        let from_text = parse_users(SINGLE_USER).unwrap();
        let value: JsonValue = serde_json::from_str(SINGLE_USER).unwrap();
        assert_eq!(parse_users_value(value).unwrap(), from_text);
        assert!(parse_users_value(json!([])).unwrap().is_empty());
    }
}
