//! Fingerprint type for the perceptual layer.
//!
//! The fingerprint is a packed bit vector. Its bit length is part of the
//! public contract: fingerprints of different lengths are never comparable.

use std::fmt;

use crate::config::PerceptualError;

/// Packed difference-hash bits.
///
/// Bits are stored row-major, most significant bit first within each 64-bit
/// word. Trailing bits of the last word are always zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageFingerprint {
    words: Vec<u64>,
    bit_len: usize,
}

impl ImageFingerprint {
    /// Build a fingerprint from a sequence of bits.
    pub fn from_bits<I>(bits: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut words = Vec::new();
        let mut bit_len = 0usize;
        for bit in bits {
            let offset = bit_len % 64;
            if offset == 0 {
                words.push(0u64);
            }
            if bit {
                if let Some(word) = words.last_mut() {
                    *word |= 1u64 << (63 - offset);
                }
            }
            bit_len += 1;
        }
        Self { words, bit_len }
    }

    #[cfg(test)]
    pub(crate) fn from_u64(hash: u64) -> Self {
        Self {
            words: vec![hash],
            bit_len: 64,
        }
    }

    /// Number of bits in the fingerprint.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    #[cfg(test)]
    pub(crate) fn words(&self) -> &[u64] {
        &self.words
    }

    #[cfg(test)]
    pub(crate) fn bit(&self, index: usize) -> Option<bool> {
        if index >= self.bit_len {
            return None;
        }
        let word = self.words.get(index / 64)?;
        Some(word & (1u64 << (63 - index % 64)) != 0)
    }

    #[cfg(test)]
    pub(crate) fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Hamming distance to another fingerprint of the same length.
    pub fn distance(&self, other: &Self) -> Result<u32, PerceptualError> {
        if self.bit_len != other.bit_len {
            return Err(PerceptualError::DimensionMismatch {
                left: self.bit_len,
                right: other.bit_len,
            });
        }
        Ok(self
            .words
            .iter()
            .zip(other.words.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum())
    }
}

/// Lowercase hex, word by word.
impl fmt::Display for ImageFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for word in &self.words {
            write!(f, "{word:016x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bits_packs_msb_first() {
        let fp = ImageFingerprint::from_bits([true, false, true]);
        assert_eq!(fp.bit_len(), 3);
        assert_eq!(fp.words(), &[0b101u64 << 61]);
        assert_eq!(fp.bit(0), Some(true));
        assert_eq!(fp.bit(1), Some(false));
        assert_eq!(fp.bit(2), Some(true));
        assert_eq!(fp.bit(3), None);
    }

    #[test]
    fn from_bits_spills_into_second_word() {
        let fp = ImageFingerprint::from_bits(std::iter::repeat(true).take(65));
        assert_eq!(fp.bit_len(), 65);
        assert_eq!(fp.words(), &[u64::MAX, 1u64 << 63]);
        assert_eq!(fp.count_ones(), 65);
    }

    #[test]
    fn distance_counts_differing_bits() {
        let a = ImageFingerprint::from_u64(0b1010);
        let b = ImageFingerprint::from_u64(0b0110);
        assert_eq!(a.distance(&b), Ok(2));
        assert_eq!(b.distance(&a), Ok(2));
        assert_eq!(a.distance(&a), Ok(0));
    }

    #[test]
    fn distance_rejects_length_mismatch() {
        let a = ImageFingerprint::from_u64(0);
        let b = ImageFingerprint::from_bits(std::iter::repeat(false).take(256));
        assert_eq!(
            a.distance(&b),
            Err(PerceptualError::DimensionMismatch {
                left: 64,
                right: 256
            })
        );
    }

    #[test]
    fn display_is_hex() {
        let fp = ImageFingerprint::from_u64(0xdead_beef);
        assert_eq!(fp.to_string(), "00000000deadbeef");
    }
}
