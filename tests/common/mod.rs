#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use admatch::{
    AdmatchConfig, FetchError, ImageFetcher, MatchConfig, MatchDirection, PerceptualConfig,
    Pipeline, ResizeFilter,
};
use async_trait::async_trait;
use image::{DynamicImage, ImageBuffer, Luma};

pub const WIDTH: u32 = 180;
pub const HEIGHT: u32 = 160;

/// Brightness rising left to right: every dHash bit set.
pub fn rising() -> DynamicImage {
    ramp(|_| true)
}

/// Brightness falling left to right: every dHash bit clear.
pub fn falling() -> DynamicImage {
    ramp(|_| false)
}

/// Top half rising, bottom half falling: half the bits set.
pub fn split() -> DynamicImage {
    ramp(|y| y < HEIGHT / 2)
}

pub fn empty() -> DynamicImage {
    DynamicImage::new_luma8(0, 0)
}

fn ramp(rising_row: impl Fn(u32) -> bool) -> DynamicImage {
    DynamicImage::ImageLuma8(ImageBuffer::from_fn(WIDTH, HEIGHT, |x, y| {
        let v = (x * 255 / (WIDTH - 1)) as u8;
        Luma([if rising_row(y) { v } else { 255 - v }])
    }))
}

/// In-memory fetcher that counts how often each URL is requested.
#[derive(Default)]
pub struct MemoryFetcher {
    images: HashMap<String, DynamicImage>,
    calls: Mutex<HashMap<String, usize>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, image: DynamicImage) -> Self {
        self.images.insert(url.to_string(), image);
        self
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl ImageFetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<DynamicImage, FetchError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
        self.images.get(url).cloned().ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

/// Nearest-neighbour resizing keeps the synthetic ramps' hashes exact.
pub fn test_config() -> AdmatchConfig {
    AdmatchConfig::default()
        .with_perceptual(PerceptualConfig::new().with_filter(ResizeFilter::Nearest))
}

pub fn config_with(direction: MatchDirection, group_variants: bool) -> AdmatchConfig {
    test_config().with_matcher(
        MatchConfig::default()
            .with_direction(direction)
            .with_group_variants(group_variants),
    )
}

pub fn pipeline(fetcher: MemoryFetcher) -> Pipeline<MemoryFetcher> {
    Pipeline::new(fetcher, &test_config()).expect("valid test config")
}
