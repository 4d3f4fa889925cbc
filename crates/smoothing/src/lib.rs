//! Probability smoothing for n-gram models.
//!
//! A [`Smoother`] turns raw trie counts into a probability estimate,
//! assigning non-zero mass to n-grams absent from the training counts. Two
//! estimators are provided: add-k (Laplace when k = 1) and Witten-Bell.
//! Both return a value in (0, 1] whenever the vocabulary is non-empty.
//!
//! [`SmootherConfig`] is the closed, serializable sum of the available
//! estimators; persisted corpora store only the smoother *name*, so a
//! loader validates the configured smoother against the stored one.

use serde::{Deserialize, Serialize};

/// A probability estimator over n-gram counts.
///
/// `ngram_count` is the count of the full n-gram, `context_count` the count
/// of its (n-1)-prefix, `backoff` the lower-order fallback probability and
/// `vocab_size` the number of distinct tokens seen.
pub trait Smoother: Send + Sync {
    fn smooth(&self, ngram_count: i64, context_count: i64, backoff: f64, vocab_size: usize) -> f64;

    /// Stable name stored in persisted corpora.
    fn name(&self) -> &'static str;
}

/// Add-k (Laplace) smoothing: `(c + k) / (C + k·V)`.
#[derive(Debug, Clone, Copy)]
pub struct AddK {
    k: f64,
}

impl AddK {
    /// Create an add-k smoother. Non-positive k falls back to 1.0 (Laplace).
    pub fn new(k: f64) -> Self {
        let k = if k <= 0.0 { 1.0 } else { k };
        AddK { k }
    }

    pub fn k(&self) -> f64 {
        self.k
    }
}

impl Default for AddK {
    fn default() -> Self {
        AddK { k: 1.0 }
    }
}

impl Smoother for AddK {
    fn smooth(&self, ngram_count: i64, context_count: i64, _backoff: f64, vocab_size: usize) -> f64 {
        if context_count == 0 {
            return 1.0 / vocab_size as f64;
        }
        let numerator = ngram_count as f64 + self.k;
        let denominator = context_count as f64 + self.k * vocab_size as f64;
        numerator / denominator
    }

    fn name(&self) -> &'static str {
        "AddK"
    }
}

/// Witten-Bell smoothing with T approximated by the vocabulary size.
///
/// Seen n-grams get a discounted MLE `λ·c/C` with `λ = C/(C+T)`; unseen
/// n-grams back off with weight `T/(C+T)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WittenBell;

impl Smoother for WittenBell {
    fn smooth(&self, ngram_count: i64, context_count: i64, backoff: f64, vocab_size: usize) -> f64 {
        if context_count == 0 {
            return 1.0 / vocab_size as f64;
        }

        let unique_types = vocab_size as f64;
        if ngram_count > 0 {
            let lambda = context_count as f64 / (context_count as f64 + unique_types);
            return lambda * (ngram_count as f64 / context_count as f64);
        }

        let lambda = unique_types / (context_count as f64 + unique_types);
        lambda * backoff
    }

    fn name(&self) -> &'static str {
        "WittenBell"
    }
}

/// Closed sum of the available smoothers, serializable for configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SmootherConfig {
    AddK { k: f64 },
    WittenBell,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        SmootherConfig::AddK { k: 1.0 }
    }
}

impl SmootherConfig {
    /// Build the configured smoother.
    pub fn build(&self) -> Box<dyn Smoother> {
        match *self {
            SmootherConfig::AddK { k } => Box::new(AddK::new(k)),
            SmootherConfig::WittenBell => Box::new(WittenBell),
        }
    }

    /// The name the built smoother reports; used to validate persisted
    /// corpora against the loader's configuration.
    pub fn name(&self) -> &'static str {
        match self {
            SmootherConfig::AddK { .. } => "AddK",
            SmootherConfig::WittenBell => "WittenBell",
        }
    }
}
