//! Error types produced by the ingest crate.
//!
//! Every ingest error is terminal for the whole invocation: the payload
//! shape is a precondition for any matching work, so nothing here is
//! recovered per item.
//!
//! # Error Categories
//!
//! | Error | Description |
//! |-------|-------------|
//! | [`InvalidJson`](IngestError::InvalidJson) | Input is not syntactically valid JSON |
//! | [`MalformedInput`](IngestError::MalformedInput) | JSON is valid but a required field is missing or has the wrong type |
//! | [`PayloadTooLarge`](IngestError::PayloadTooLarge) | Input exceeds a configured size limit |
//!
//! # Examples
//!
//! ```rust
//! use ingest::{parse_users, IngestError};
//!
//! match parse_users(r#"{"ad_creative_images": []}"#) {
//!     Err(IngestError::MalformedInput(msg)) => assert!(msg.contains("user_id")),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```
use thiserror::Error;

/// Errors that can occur while parsing and validating an input payload.
///
/// The enum is marked `#[non_exhaustive]`; callers should include a
/// catch-all arm when matching.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    /// The input could not be parsed as JSON at all.
    #[error("invalid JSON input: {0}")]
    InvalidJson(String),

    /// The JSON does not have the expected shape.
    ///
    /// Raised for a missing `user_id`, a creative or preview without `id`,
    /// a preview without `url`, non-string URLs, or a top-level value that
    /// is neither an object nor an array.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The input exceeds a size limit from [`IngestConfig`](crate::IngestConfig).
    #[error("payload exceeds size limit: {0}")]
    PayloadTooLarge(String),
}
