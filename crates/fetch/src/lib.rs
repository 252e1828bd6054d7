//! Image fetch collaborator for admatch.
//!
//! Matching needs decoded pixels, not URLs. This crate owns the step in
//! between: download a URL, cap its size, decode it into an
//! [`image::DynamicImage`].
//!
//! - [`ImageFetcher`] is the seam the pipeline depends on. Tests plug in an
//!   in-memory implementation; production uses [`HttpFetcher`].
//! - [`fetch_all`] downloads a set of URLs with bounded concurrency and
//!   returns one [`FetchOutcome`] per URL in input order.
//!
//! Failures are per URL and never abort the batch.
//!
//! ```no_run
//! use fetch::{fetch_all, FetchConfig, HttpFetcher};
//!
//! # async fn run() -> Result<(), fetch::FetchError> {
//! let cfg = FetchConfig::default();
//! let fetcher = HttpFetcher::new(&cfg)?;
//! let outcomes = fetch_all(&fetcher, ["https://cdn.example/a.jpg"], cfg.max_concurrency).await;
//! for outcome in outcomes {
//!     match outcome.result {
//!         Ok(img) => println!("{} -> {}x{}", outcome.url, img.width(), img.height()),
//!         Err(err) => eprintln!("{err}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use image::DynamicImage;
use tracing::debug;

mod config;
mod error;
mod http;

pub use crate::config::{
    FetchConfig, DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_IMAGE_BYTES, DEFAULT_TIMEOUT_SECS,
};
pub use crate::error::FetchError;
pub use crate::http::{decode_image, HttpFetcher};

/// Source of decoded images keyed by URL.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<DynamicImage, FetchError>;
}

#[async_trait]
impl<T: ImageFetcher + ?Sized> ImageFetcher for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<DynamicImage, FetchError> {
        (**self).fetch(url).await
    }
}

/// Result of fetching one URL.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub url: String,
    pub elapsed: Duration,
    pub result: Result<Arc<DynamicImage>, FetchError>,
}

impl FetchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Fetch every URL with at most `max_concurrency` requests in flight.
///
/// Outcomes come back in the order the URLs were given regardless of
/// completion order. A `max_concurrency` of zero is treated as one.
pub async fn fetch_all<F, I, S>(fetcher: &F, urls: I, max_concurrency: usize) -> Vec<FetchOutcome>
where
    F: ImageFetcher + ?Sized,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
    let limit = max_concurrency.max(1);

    stream::iter(urls)
        .map(|url| async move {
            let start = Instant::now();
            let result = fetcher.fetch(&url).await.map(Arc::new);
            let elapsed = start.elapsed();
            debug!(
                url = %url,
                ok = result.is_ok(),
                elapsed_micros = elapsed.as_micros(),
                "fetch_complete"
            );
            FetchOutcome {
                url,
                elapsed,
                result,
            }
        })
        .buffered(limit)
        .collect()
        .await
}
