//! # admatch Matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` pairs ad creative images (candidates) with ad preview images
//! (targets) by perceptual similarity. Each item is fingerprinted once with
//! the `perceptual` crate, then every outer-loop item is compared with every
//! inner-loop item and keeps the best-scoring counterpart.
//!
//! The selection is greedy and per item. It is not a one-to-one assignment:
//! two previews may both resolve to the same creative variant.
//!
//! ## Core Types
//!
//! - [`MatchDirection`]: which side drives the outer loop.
//!   - `TargetsToCandidates`: one result per preview (default).
//!   - `CandidatesToTargets`: one result per creative variant.
//! - [`MatchConfig`]: direction plus the pipeline-level variant grouping flag.
//! - [`CandidateItem`] / [`TargetItem`]: identifier, source URL, and the
//!   decoded image.
//! - [`MatchResult`]: the chosen pair and its similarity percentage.
//! - [`Matcher`]: runs the scan.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use image::{DynamicImage, ImageBuffer, Luma};
//! use matcher::{CandidateItem, MatchConfig, Matcher, TargetItem};
//! use perceptual::PerceptualConfig;
//! use serde_json::json;
//!
//! let img = Arc::new(DynamicImage::ImageLuma8(ImageBuffer::from_fn(64, 64, |x, y| {
//!     Luma([((x * 4) ^ y) as u8])
//! })));
//!
//! let candidates = vec![CandidateItem {
//!     id: json!("c1"),
//!     url: "https://cdn.example/c1.png".into(),
//!     variant_key: Some("original".into()),
//!     image: img.clone(),
//! }];
//! let targets = vec![TargetItem {
//!     id: json!("p1"),
//!     url: "https://cdn.example/p1.png".into(),
//!     image: img,
//! }];
//!
//! let matcher = Matcher::new(PerceptualConfig::default(), &MatchConfig::default());
//! let hits = matcher.run(&candidates, &targets).unwrap();
//! assert_eq!(hits[0].similarity_percentage, 100.0);
//! ```

pub mod engine;
pub mod types;

pub use crate::engine::{select_best, Matcher};
pub use crate::types::{
    CandidateItem, MatchConfig, MatchDirection, MatchError, MatchResult, TargetItem,
};
