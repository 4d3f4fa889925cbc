//! Corpus configuration.

use std::path::PathBuf;

use ngram_trie::BloomParams;
use serde::{Deserialize, Serialize};
use smoothing::SmootherConfig;

/// Configuration recognized when opening a corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// N-gram order; values below 1 fall back to the default of 3.
    pub n: usize,
    pub smoother: SmootherConfig,
    /// Singleton suppression for the global model's n-gram and context
    /// tries. `None` disables the gate.
    pub bloom: Option<BloomParams>,
    /// Directory snapshots are written to.
    pub storage_dir: Option<PathBuf>,
    /// Name used for the on-disk snapshot file (`<name>_ngram.bin`).
    pub corpus_name: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        CorpusConfig {
            n: 3,
            smoother: SmootherConfig::default(),
            bloom: Some(BloomParams::default()),
            storage_dir: None,
            corpus_name: "corpus".to_string(),
        }
    }
}

impl CorpusConfig {
    /// The effective n-gram order (floor of 1, default 3).
    pub fn effective_n(&self) -> usize {
        if self.n < 1 { 3 } else { self.n }
    }
}
