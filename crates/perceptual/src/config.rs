//! Configuration and error types for perceptual image fingerprinting.
//!
//! This module defines the public configuration surface for the perceptual
//! layer. It is free of any I/O so that fingerprinting stays a pure function
//! of `(pixels, config)`.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest supported hash edge. Below this a row has a single comparison.
pub const MIN_HASH_SIZE: u32 = 2;

/// Largest supported hash edge (4096 bits).
pub const MAX_HASH_SIZE: u32 = 64;

/// Resampling filter used when shrinking an image to the hash grid.
///
/// Mirrors [`image::imageops::FilterType`] so the choice can live in a
/// serialized config file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    /// Windowed sinc; the antialiasing filter classic dHash implementations use.
    #[default]
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(value: ResizeFilter) -> Self {
        match value {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Configuration for the difference-hash fingerprint.
///
/// Two fingerprints are only comparable when they were produced with the same
/// `hash_size`; the filter only changes how pixels are sampled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PerceptualConfig {
    /// Edge length of the hash grid. The image is reduced to
    /// `(hash_size + 1) x hash_size` pixels and yields `hash_size²` bits.
    pub hash_size: u32,
    /// Filter used for the reduction.
    pub filter: ResizeFilter,
}

impl PerceptualConfig {
    /// Create a new configuration with the default 8x8 (64-bit) hash.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hash edge length. 8 gives the canonical 64-bit dHash.
    pub fn with_hash_size(mut self, hash_size: u32) -> Self {
        self.hash_size = hash_size;
        self
    }

    /// Set the resampling filter.
    pub fn with_filter(mut self, filter: ResizeFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Number of bits a fingerprint produced with this config carries.
    pub fn bit_len(&self) -> usize {
        (self.hash_size as usize) * (self.hash_size as usize)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), PerceptualError> {
        if !(MIN_HASH_SIZE..=MAX_HASH_SIZE).contains(&self.hash_size) {
            return Err(PerceptualError::InvalidConfigHashSize {
                hash_size: self.hash_size,
            });
        }
        Ok(())
    }
}

impl Default for PerceptualConfig {
    fn default() -> Self {
        Self {
            hash_size: 8,
            filter: ResizeFilter::default(),
        }
    }
}

/// Errors returned by fingerprinting and scoring.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PerceptualError {
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("fingerprint length mismatch: {left} bits vs {right} bits")]
    DimensionMismatch { left: usize, right: usize },

    #[error("invalid config: hash_size must be between 2 and 64 (got {hash_size})")]
    InvalidConfigHashSize { hash_size: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let cfg = PerceptualConfig::default();
        assert_eq!(cfg.hash_size, 8);
        assert_eq!(cfg.filter, ResizeFilter::Lanczos3);
        assert_eq!(cfg.bit_len(), 64);
    }

    #[test]
    fn config_builder_chain() {
        let cfg = PerceptualConfig::new()
            .with_hash_size(16)
            .with_filter(ResizeFilter::Triangle);

        assert_eq!(cfg.hash_size, 16);
        assert_eq!(cfg.filter, ResizeFilter::Triangle);
        assert_eq!(cfg.bit_len(), 256);
    }

    #[test]
    fn config_validate_valid() {
        assert!(PerceptualConfig::default().validate().is_ok());
        assert!(PerceptualConfig::new().with_hash_size(2).validate().is_ok());
        assert!(PerceptualConfig::new().with_hash_size(64).validate().is_ok());
    }

    #[test]
    fn config_validate_hash_size_out_of_range() {
        for size in [0, 1, 65] {
            let cfg = PerceptualConfig::new().with_hash_size(size);
            assert_eq!(
                cfg.validate(),
                Err(PerceptualError::InvalidConfigHashSize { hash_size: size })
            );
        }
    }

    #[test]
    fn config_deserializes_partial_document() {
        let cfg: PerceptualConfig =
            serde_json::from_str(r#"{"hash_size": 12, "filter": "catmull_rom"}"#).unwrap();
        assert_eq!(cfg.hash_size, 12);
        assert_eq!(cfg.filter, ResizeFilter::CatmullRom);
    }

    #[test]
    fn filter_maps_onto_image_filter_type() {
        assert_eq!(FilterType::from(ResizeFilter::Nearest), FilterType::Nearest);
        assert_eq!(FilterType::from(ResizeFilter::Lanczos3), FilterType::Lanczos3);
    }

    #[test]
    fn error_display_dimension_mismatch() {
        let err = PerceptualError::DimensionMismatch {
            left: 64,
            right: 256,
        };
        let msg = err.to_string();
        assert!(msg.contains("64 bits"));
        assert!(msg.contains("256 bits"));
    }
}
