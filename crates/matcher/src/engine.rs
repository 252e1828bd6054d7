use image::DynamicImage;
use perceptual::{
    fingerprint_image, round_percentage, similarity, ImageFingerprint, PerceptualConfig,
};
use tracing::{debug, warn};

use crate::types::{
    CandidateItem, MatchConfig, MatchDirection, MatchError, MatchResult, TargetItem,
};


/// Greedy per-item best-match selector.
///
/// Every outer-loop item is paired with the inner item of strictly greatest
/// similarity. Outer items are independent: several of them may pick the
/// same inner item.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    perceptual_cfg: PerceptualConfig,
    direction: MatchDirection,
}

impl Matcher {
    /// Construct a matcher from explicit configs.
    pub fn new(perceptual_cfg: PerceptualConfig, match_cfg: &MatchConfig) -> Self {
        Self::with_direction(perceptual_cfg, match_cfg.direction)
    }

    pub fn with_direction(perceptual_cfg: PerceptualConfig, direction: MatchDirection) -> Self {
        Self {
            perceptual_cfg,
            direction,
        }
    }

    pub fn direction(&self) -> MatchDirection {
        self.direction
    }

    pub fn perceptual_config(&self) -> &PerceptualConfig {
        &self.perceptual_cfg
    }

    /// Match candidates against targets in the configured direction.
    ///
    /// Results follow the order of the outer collection. Outer items with no
    /// usable inner counterpart produce no result.
    pub fn run(
        &self,
        candidates: &[CandidateItem],
        targets: &[TargetItem],
    ) -> Result<Vec<MatchResult>, MatchError> {
        self.perceptual_cfg.validate()?;

        let candidate_fps: Vec<Option<ImageFingerprint>> = candidates
            .iter()
            .map(|c| self.fingerprint(&c.url, &c.image))
            .collect();
        let target_fps: Vec<Option<ImageFingerprint>> = targets
            .iter()
            .map(|t| self.fingerprint(&t.url, &t.image))
            .collect();

        let mut results = Vec::new();
        match self.direction {
            MatchDirection::TargetsToCandidates => {
                for (target, target_fp) in targets.iter().zip(&target_fps) {
                    let Some(target_fp) = target_fp else { continue };
                    if let Some((idx, score)) = best_counterpart(target_fp, &candidate_fps)? {
                        results.push(emit(&candidates[idx], target, score));
                    }
                }
            }
            MatchDirection::CandidatesToTargets => {
                for (candidate, candidate_fp) in candidates.iter().zip(&candidate_fps) {
                    let Some(candidate_fp) = candidate_fp else { continue };
                    if let Some((idx, score)) = best_counterpart(candidate_fp, &target_fps)? {
                        results.push(emit(candidate, &targets[idx], score));
                    }
                }
            }
        }

        Ok(results)
    }

    fn fingerprint(&self, url: &str, image: &DynamicImage) -> Option<ImageFingerprint> {
        match fingerprint_image(image, &self.perceptual_cfg) {
            Ok(fp) => Some(fp),
            Err(err) => {
                warn!(url, error = %err, "image excluded from matching");
                None
            }
        }
    }
}

/// Pick the highest-scoring entry. Only a strictly greater score replaces
/// the current best, so the first of several equal maxima wins.
pub fn select_best<T, I>(scored: I) -> Option<(T, f64)>
where
    I: IntoIterator<Item = (T, f64)>,
{
    scored.into_iter().fold(None, |best, (item, score)| match best {
        Some((_, best_score)) if score > best_score => Some((item, score)),
        Some(_) => best,
        None => Some((item, score)),
    })
}

fn best_counterpart(
    outer: &ImageFingerprint,
    inner: &[Option<ImageFingerprint>],
) -> Result<Option<(usize, f64)>, MatchError> {
    let mut scored = Vec::with_capacity(inner.len());
    for (idx, fp) in inner.iter().enumerate() {
        if let Some(fp) = fp {
            scored.push((idx, similarity(outer, fp)?));
        }
    }
    Ok(select_best(scored))
}

fn emit(candidate: &CandidateItem, target: &TargetItem, score: f64) -> MatchResult {
    let similarity_percentage = round_percentage(score);
    debug!(
        candidate_url = %candidate.url,
        target_url = %target.url,
        similarity_percentage,
        "best match selected"
    );
    MatchResult {
        target_id: target.id.clone(),
        target_url: target.url.clone(),
        candidate_id: candidate.id.clone(),
        candidate_url: candidate.url.clone(),
        candidate_variant_key: candidate.variant_key.clone(),
        similarity_percentage,
    }
}
