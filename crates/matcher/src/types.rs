use std::sync::Arc;

use image::DynamicImage;
use perceptual::PerceptualError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Which collection drives the outer loop of a match run.
///
/// Both directions are valid configurations of the same greedy scan; they
/// differ only in which side gets exactly one result per item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchDirection {
    /// For every target (preview), pick the best candidate (creative variant).
    #[default]
    TargetsToCandidates,
    /// For every candidate (creative variant), pick the best target (preview).
    CandidatesToTargets,
}

/// Configuration for the matching stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct MatchConfig {
    /// Outer-loop selection.
    pub direction: MatchDirection,
    /// Collapse candidate-driven results to one per creative identifier,
    /// keeping the best variant. Applied by the batch pipeline after the
    /// matcher has run; requires [`MatchDirection::CandidatesToTargets`].
    pub group_variants: bool,
}

impl MatchConfig {
    pub fn with_direction(mut self, direction: MatchDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_group_variants(mut self, group_variants: bool) -> Self {
        self.group_variants = group_variants;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.group_variants && self.direction != MatchDirection::CandidatesToTargets {
            return Err(MatchError::InvalidConfig(
                "group_variants requires direction candidates_to_targets".into(),
            ));
        }
        Ok(())
    }
}

/// One creative asset, or one URL variant of it, with its decoded image.
#[derive(Debug, Clone)]
pub struct CandidateItem {
    /// Creative identifier, passed through from the input unchanged.
    pub id: JsonValue,
    pub url: String,
    /// Name of the crop/variant (`"original"`, `"1:1"`, ...), when known.
    pub variant_key: Option<String>,
    pub image: Arc<DynamicImage>,
}

/// One preview with its decoded image.
#[derive(Debug, Clone)]
pub struct TargetItem {
    /// Preview identifier, passed through from the input unchanged.
    pub id: JsonValue,
    pub url: String,
    pub image: Arc<DynamicImage>,
}

/// Best pairing found for one outer-loop item.
///
/// Serialized with the field names consumers of the match output expect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchResult {
    #[serde(rename = "metaad_preview_id")]
    pub target_id: JsonValue,
    #[serde(rename = "metaad_preview_url")]
    pub target_url: String,
    #[serde(rename = "ad_creative_image_id")]
    pub candidate_id: JsonValue,
    #[serde(rename = "ad_creative_image_url")]
    pub candidate_url: String,
    #[serde(
        rename = "ad_creative_image_url_key",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub candidate_variant_key: Option<String>,
    /// Similarity in `[0, 100]`, rounded to two decimals.
    pub similarity_percentage: f64,
}

/// Errors produced by the matching layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchError {
    /// Invalid configuration.
    #[error("invalid match config: {0}")]
    InvalidConfig(String),
    /// Fingerprinting or scoring failed in a way that invalidates the run,
    /// such as comparing fingerprints of different lengths.
    #[error("perceptual error: {0}")]
    Perceptual(#[from] PerceptualError),
}
