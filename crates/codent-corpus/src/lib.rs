//! Corpus engine for code naturalness analysis.
//!
//! This is the facade crate that wires together the lower-level
//! components:
//! - [`token_core`]: token and token-id types
//! - [`token_intern`]: the interning table
//! - [`ngram_trie`]: count tries with the bloom singleton gate
//! - [`smoothing`]: probability smoothing
//! - [`ngram_model`]: the n-gram model proper
//! - [`codent_tokenizer`]: tokenization and the language registry
//!
//! [`CorpusManager`] owns one global model trained on every ingested file
//! plus a per-file model map with cached self-entropies; the cached
//! distribution drives z-scoring of snippets. The persistence codec
//! flattens the whole thing through a versioned binary stream so a built
//! corpus reloads in a fraction of the build time.
//!
//! # Quick start
//!
//! ```
//! use std::sync::Arc;
//! use codent_corpus::{CancelFlag, CorpusConfig, CorpusManager};
//! use codent_tokenizer::default_registry;
//!
//! let corpus = CorpusManager::new(CorpusConfig::default(), Arc::new(default_registry()));
//! let cancel = CancelFlag::new();
//! corpus
//!     .add_file("add.go", b"func add(a, b int) int { return a + b }", "go", &cancel)
//!     .unwrap();
//! let report = corpus
//!     .analyze_code("go", b"func sub(a, b int) int { return a - b }", &cancel)
//!     .unwrap();
//! assert!(report.entropy >= 0.0);
//! ```

mod analysis;
mod cancel;
mod config;
mod error;
mod manager;
mod persist;

pub use analysis::{
    interpret_z_score, CodeAnalysis, NgramScore, ZScoreAnalysis, ZScoreInterpretation,
};
pub use cancel::CancelFlag;
pub use config::CorpusConfig;
pub use error::EngineError;
pub use manager::{entropy_statistics, CorpusManager, CorpusStats, EntropyStats, FileModel};
pub use persist::{model_path, FileMeta, SNAPSHOT_VERSION};

// Re-exported so callers can configure a corpus without naming the
// component crates directly.
pub use ngram_trie::BloomParams;
pub use smoothing::SmootherConfig;
