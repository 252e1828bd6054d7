//! # admatch Perceptual Fingerprinting
//!
//! This crate turns decoded images into compact perceptual fingerprints and
//! scores how similar two fingerprints are. It is the leaf of the admatch
//! workspace: it knows nothing about users, creatives, previews, or URLs.
//!
//! ## Contract
//!
//! - Input is an already decoded [`image::DynamicImage`] of any size and
//!   color type.
//! - The API is a pure function of `(pixels, config)`: no I/O, no clocks,
//!   no global state.
//!
//! Invariant: for the same pixel data and the same [`PerceptualConfig`],
//! the fingerprint is bit identical.
//!
//! ## Algorithm
//!
//! The fingerprint is a difference hash (dHash):
//!
//! 1.  **Grayscale**: the image is converted to 8-bit luma with ITU-R
//!     BT.601 weights (`0.299 R + 0.587 G + 0.114 B`), the conversion
//!     classic dHash implementations use. Alpha is ignored.
//! 2.  **Reduce**: the luma image is resized to `(n + 1) x n` pixels, where
//!     `n` is [`PerceptualConfig::hash_size`] (8 by default).
//! 3.  **Gradient**: for every row, each pair of horizontally adjacent
//!     pixels yields one bit, set when the left pixel is darker than its
//!     right neighbour. That gives `n²` bits (64 by default).
//!
//! Because the bits encode gradient direction rather than absolute
//! intensity, the hash survives brightness shifts, re-encoding, and the
//! mild crops and aspect changes between variants of one creative.
//!
//! Similarity is `(1 - hamming / bit_len) * 100`.
//!
//! ## Example Usage
//!
//! ```
//! use image::{DynamicImage, ImageBuffer, Luma};
//! use perceptual::{fingerprint_image, similarity, PerceptualConfig};
//!
//! let ramp = ImageBuffer::from_fn(90, 80, |x, _| Luma([(x * 2) as u8]));
//! let image = DynamicImage::ImageLuma8(ramp);
//!
//! let cfg = PerceptualConfig::default();
//! let fp = fingerprint_image(&image, &cfg).unwrap();
//!
//! assert_eq!(fp.bit_len(), 64);
//! assert_eq!(similarity(&fp, &fp).unwrap(), 100.0);
//! ```
pub mod config;
pub mod fingerprint;

use image::{imageops, DynamicImage, GrayImage, ImageBuffer, Luma};

pub use crate::config::{PerceptualConfig, PerceptualError, ResizeFilter};
pub use crate::fingerprint::ImageFingerprint;

/// Compute the difference-hash fingerprint of an image.
pub fn fingerprint_image(
    image: &DynamicImage,
    cfg: &PerceptualConfig,
) -> Result<ImageFingerprint, PerceptualError> {
    cfg.validate()?;

    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(PerceptualError::EmptyImage { width, height });
    }

    let n = cfg.hash_size;
    let luma = bt601_luma(image);
    let reduced = imageops::resize(&luma, n + 1, n, cfg.filter.into());

    let mut bits = Vec::with_capacity(cfg.bit_len());
    for y in 0..n {
        for x in 0..n {
            let left = reduced.get_pixel(x, y)[0];
            let right = reduced.get_pixel(x + 1, y)[0];
            bits.push(left < right);
        }
    }

    Ok(ImageFingerprint::from_bits(bits))
}

/// 8-bit BT.601 luma in 16-bit fixed point, rounded to nearest.
///
/// `image`'s own `to_luma8` uses BT.709 weights, which reorders the
/// brightness of saturated reds and greens.
fn bt601_luma(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    ImageBuffer::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let l = (u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000) >> 16;
        Luma([l as u8])
    })
}

/// Hamming distance between two fingerprints of equal length.
pub fn hamming_distance(
    a: &ImageFingerprint,
    b: &ImageFingerprint,
) -> Result<u32, PerceptualError> {
    a.distance(b)
}

/// Similarity percentage in `[0, 100]`, at full precision.
///
/// Callers that emit the value should round with [`round_percentage`] only
/// at that point, so comparisons between candidates are not distorted.
pub fn similarity(a: &ImageFingerprint, b: &ImageFingerprint) -> Result<f64, PerceptualError> {
    let distance = a.distance(b)?;
    let bit_len = a.bit_len();
    if bit_len == 0 {
        return Ok(100.0);
    }
    Ok((1.0 - f64::from(distance) / bit_len as f64) * 100.0)
}

/// Round a percentage to two decimal places for output.
///
/// Ties go to the even neighbour, so `3.125` becomes `3.12`.
pub fn round_percentage(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
