//! Bloom-filter singleton gate for n-gram tries.
//!
//! A compact probabilistic set over 64-bit n-gram fingerprints. `contains`
//! may return false positives but never false negatives: a `false` answer
//! means the fingerprint was definitely never inserted. The filter is
//! monotonic; there is no removal.

use serde::{Deserialize, Serialize};

/// Sizing parameters for a [`BloomFilter`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BloomParams {
    /// Expected number of distinct items.
    pub expected_items: u32,
    /// Target false-positive rate, in (0, 1).
    pub false_positive_rate: f64,
}

impl Default for BloomParams {
    fn default() -> Self {
        BloomParams {
            expected_items: 100_000,
            false_positive_rate: 0.01,
        }
    }
}

/// A probabilistic membership set over pre-hashed 64-bit fingerprints.
#[derive(Clone, Debug)]
pub struct BloomFilter {
    bits: Vec<u64>,
    num_hashes: u8,
    num_bits: usize,
}

impl BloomFilter {
    /// Create a filter sized for `expected_items` at the given target
    /// false-positive rate.
    ///
    /// # Panics
    ///
    /// Panics if `expected_items` is 0 or `false_positive_rate` is not in
    /// (0, 1).
    pub fn new(expected_items: u32, false_positive_rate: f64) -> Self {
        assert!(expected_items > 0, "expected_items must be > 0");
        assert!(
            false_positive_rate > 0.0 && false_positive_rate < 1.0,
            "false_positive_rate must be in (0, 1)"
        );

        let n = f64::from(expected_items);
        let ln2 = std::f64::consts::LN_2;

        // Optimal bit count: m = -(n * ln(p)) / (ln(2)^2), minimum one word.
        let m = (-(n * false_positive_rate.ln()) / (ln2 * ln2)).ceil() as usize;
        let m = m.max(64);

        // Optimal hash count: k = (m/n) * ln(2).
        let k = ((m as f64 / n) * ln2).ceil() as u8;
        let k = k.clamp(1, 32);

        let num_words = m.div_ceil(64);
        let num_bits = num_words * 64;

        BloomFilter {
            bits: vec![0u64; num_words],
            num_hashes: k,
            num_bits,
        }
    }

    /// Create a filter from [`BloomParams`].
    pub fn from_params(params: BloomParams) -> Self {
        Self::new(params.expected_items, params.false_positive_rate)
    }

    /// Insert a fingerprint into the filter.
    pub fn insert(&mut self, fingerprint: u64) {
        let (h1, h2) = derive_hashes(fingerprint);
        for i in 0..u64::from(self.num_hashes) {
            let idx = combined_hash(h1, h2, i, self.num_bits);
            self.bits[idx / 64] |= 1u64 << (idx % 64);
        }
    }

    /// Check whether a fingerprint is probably present.
    ///
    /// `true` means PROBABLY present (false positives possible); `false`
    /// means DEFINITELY absent.
    #[must_use]
    pub fn contains(&self, fingerprint: u64) -> bool {
        let (h1, h2) = derive_hashes(fingerprint);
        for i in 0..u64::from(self.num_hashes) {
            let idx = combined_hash(h1, h2, i, self.num_bits);
            if self.bits[idx / 64] & (1u64 << (idx % 64)) == 0 {
                return false;
            }
        }
        true
    }

    /// Number of bits in the filter (multiple of 64).
    #[inline]
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Number of hash functions applied per item.
    #[inline]
    pub fn num_hashes(&self) -> u8 {
        self.num_hashes
    }
}

/// Derive two independent hash streams from a fingerprint for
/// double-hashing.
fn derive_hashes(fingerprint: u64) -> (u64, u64) {
    let h1 = splitmix64(fingerprint);
    let h2 = splitmix64(fingerprint ^ 0x517c_c1b7_2722_0a95);
    (h1, h2)
}

/// h(i) = h1 + i * h2, mapped to `[0, num_bits)`.
fn combined_hash(h1: u64, h2: u64, i: u64, num_bits: usize) -> usize {
    let hash = h1.wrapping_add(i.wrapping_mul(h2));
    (hash % num_bits as u64) as usize
}

/// Fast 64-bit mixer with good distribution.
#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
