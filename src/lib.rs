//! Workspace umbrella crate for admatch.
//!
//! admatch pairs each ad preview a user ran with the ad creative image it
//! was most likely built from. This crate stitches the stages together:
//!
//! 1. [`ingest`] parses the payload into [`UserRecord`]s.
//! 2. [`fetch`] downloads every distinct URL a user references, once.
//! 3. [`matcher`] fingerprints the images with [`perceptual`] and keeps the
//!    best counterpart per outer-loop item.
//!
//! [`Pipeline`] runs those stages user by user and returns one
//! [`UserResult`] per input user, in input order.

pub mod config;

pub use crate::config::{AdmatchConfig, ConfigLoadError};
pub use fetch::{FetchConfig, FetchError, FetchOutcome, HttpFetcher, ImageFetcher, fetch_all};
pub use ingest::{
    CreativeSource, CreativeVariant, Identifier, IngestConfig, IngestError, PreviewSource,
    UserRecord, parse_users,
};
pub use matcher::{
    CandidateItem, MatchConfig, MatchDirection, MatchError, MatchResult, Matcher, TargetItem,
    select_best,
};
pub use perceptual::{
    ImageFingerprint, PerceptualConfig, PerceptualError, ResizeFilter, fingerprint_image,
    hamming_distance, round_percentage, similarity,
};

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use image::DynamicImage;
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Matches found for one input user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserResult {
    pub user_id: Identifier,
    pub matches: Vec<MatchResult>,
}

/// Errors that abort a whole pipeline invocation.
///
/// Per-image problems (download, decode, empty image) never show up here;
/// the affected item is dropped and processing continues.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("ingest failure: {0}")]
    Ingest(#[from] IngestError),

    #[error("matching failure: {0}")]
    Match(#[from] MatchError),

    #[error("fetcher setup failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigLoadError),
}

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    fn record_fetch(&self, latency: Duration, result: Result<(), FetchError>);
    fn record_user(&self, latency: Duration, result: Result<usize, MatchError>);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Batch orchestrator: per user, fetch, build items, match.
///
/// Generic over the [`ImageFetcher`] so tests can run without a network.
pub struct Pipeline<F> {
    fetcher: F,
    matcher: Matcher,
    group_variants: bool,
    max_concurrency: usize,
    ingest: IngestConfig,
}

impl Pipeline<HttpFetcher> {
    /// Build a pipeline that downloads images over HTTP.
    pub fn http(config: &AdmatchConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let fetcher = HttpFetcher::new(&config.fetch)?;
        Self::new(fetcher, config)
    }
}

impl<F: ImageFetcher> Pipeline<F> {
    pub fn new(fetcher: F, config: &AdmatchConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            fetcher,
            matcher: Matcher::new(config.perceptual.clone(), &config.matcher),
            group_variants: config.matcher.group_variants,
            max_concurrency: config.fetch.max_concurrency,
            ingest: config.ingest.clone(),
        })
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Parse a JSON payload (one user object or an array of them) and match it.
    pub async fn process_payload(&self, input: &str) -> Result<Vec<UserResult>, PipelineError> {
        let users = ingest::parse_users_with_config(input, &self.ingest)?;
        self.process_users(&users).await
    }

    /// Same as [`process_payload`](Self::process_payload) for an already-parsed value.
    pub async fn process_value(&self, value: JsonValue) -> Result<Vec<UserResult>, PipelineError> {
        let users = ingest::parse_users_value_with_config(value, &self.ingest)?;
        self.process_users(&users).await
    }

    /// Match every user in order. Users are independent of one another.
    pub async fn process_users(
        &self,
        users: &[UserRecord],
    ) -> Result<Vec<UserResult>, PipelineError> {
        let start = Instant::now();
        let mut results = Vec::with_capacity(users.len());
        for user in users {
            results.push(self.process_user(user).await?);
        }
        info!(
            users = results.len(),
            matches = results.iter().map(|r| r.matches.len()).sum::<usize>(),
            elapsed_micros = start.elapsed().as_micros(),
            "batch_complete"
        );
        Ok(results)
    }

    /// Fetch, build items, and match for a single user.
    pub async fn process_user(&self, user: &UserRecord) -> Result<UserResult, PipelineError> {
        let start = Instant::now();

        if user.metaad_previews.is_empty() || user.variant_count() == 0 {
            info!(
                user_id = %user.user_id,
                previews = user.metaad_previews.len(),
                variants = user.variant_count(),
                "user_has_nothing_to_match"
            );
            record_user(start, Ok(0));
            return Ok(UserResult {
                user_id: user.user_id.clone(),
                matches: Vec::new(),
            });
        }

        let images = self.fetch_images(user).await;
        let targets = build_targets(user, &images);
        let candidates = build_candidates(user, &images);

        let mut matches = match self.matcher.run(&candidates, &targets) {
            Ok(matches) => matches,
            Err(err) => {
                record_user(start, Err(err.clone()));
                return Err(err.into());
            }
        };
        if self.group_variants {
            matches = best_variant_per_creative(matches);
        }

        info!(
            user_id = %user.user_id,
            previews = targets.len(),
            variants = candidates.len(),
            matches = matches.len(),
            elapsed_micros = start.elapsed().as_micros(),
            "user_matched"
        );
        record_user(start, Ok(matches.len()));

        Ok(UserResult {
            user_id: user.user_id.clone(),
            matches,
        })
    }

    /// Download every distinct URL of `user` once. Failed URLs are absent from
    /// the returned map.
    async fn fetch_images(&self, user: &UserRecord) -> HashMap<String, Arc<DynamicImage>> {
        let recorder = metrics_recorder();
        let outcomes = fetch_all(&self.fetcher, user.distinct_urls(), self.max_concurrency).await;

        let mut images = HashMap::with_capacity(outcomes.len());
        for outcome in outcomes {
            if let Some(recorder) = &recorder {
                let result = outcome.result.as_ref().map(|_| ()).map_err(Clone::clone);
                recorder.record_fetch(outcome.elapsed, result);
            }
            match outcome.result {
                Ok(image) => {
                    images.insert(outcome.url, image);
                }
                Err(err) => {
                    warn!(
                        user_id = %user.user_id,
                        url = %outcome.url,
                        kind = err.kind(),
                        error = %err,
                        "image_skipped"
                    );
                }
            }
        }
        images
    }
}

fn record_user(start: Instant, result: Result<usize, MatchError>) {
    if let Some(recorder) = metrics_recorder() {
        recorder.record_user(start.elapsed(), result);
    }
}

fn build_targets(user: &UserRecord, images: &HashMap<String, Arc<DynamicImage>>) -> Vec<TargetItem> {
    user.metaad_previews
        .iter()
        .filter_map(|preview| {
            let image = images.get(&preview.url)?;
            Some(TargetItem {
                id: preview.id.clone().into_value(),
                url: preview.url.clone(),
                image: Arc::clone(image),
            })
        })
        .collect()
}

fn build_candidates(
    user: &UserRecord,
    images: &HashMap<String, Arc<DynamicImage>>,
) -> Vec<CandidateItem> {
    user.ad_creative_images
        .iter()
        .flat_map(|creative| {
            creative.variants.iter().filter_map(move |variant| {
                let image = images.get(&variant.url)?;
                Some(CandidateItem {
                    id: creative.id.clone().into_value(),
                    url: variant.url.clone(),
                    variant_key: variant.key.clone(),
                    image: Arc::clone(image),
                })
            })
        })
        .collect()
}

/// Collapse per-variant results to the best-scoring variant of each creative.
///
/// Creatives keep the position of their first result. Among equal scores
/// the earlier variant stays.
fn best_variant_per_creative(results: Vec<MatchResult>) -> Vec<MatchResult> {
    let mut best: Vec<MatchResult> = Vec::new();
    for result in results {
        match best
            .iter_mut()
            .find(|kept| kept.candidate_id == result.candidate_id)
        {
            Some(kept) => {
                if result.similarity_percentage > kept.similarity_percentage {
                    debug!(
                        candidate_id = %result.candidate_id,
                        from = ?kept.candidate_variant_key,
                        to = ?result.candidate_variant_key,
                        "variant_replaced"
                    );
                    *kept = result;
                }
            }
            None => best.push(result),
        }
    }
    best
}
