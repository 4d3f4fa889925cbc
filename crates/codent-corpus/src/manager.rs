//! Corpus manager: one global model plus per-file models.
//!
//! The manager owns a global [`NgramModel`] trained on every ingested file
//! and a `path -> FileModel` map where each file carries a self-contained
//! model of its own token stream plus a cached self-entropy. The cached
//! entropies drive the corpus entropy distribution used for z-scoring.
//!
//! Locking follows the engine's shared-resource policy: every model sits
//! behind its own reader-writer lock, and a separate lock guards the file
//! map. Operations across the global and per-file models are not atomic as
//! a pair; readers tolerate the transient skew.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

use codent_tokenizer::TokenizerRegistry;
use ngram_model::{ModelMemoryStats, ModelStats, NgramModel};
use ngram_trie::BloomParams;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cancel::CancelFlag;
use crate::config::CorpusConfig;
use crate::error::EngineError;

/// Per-file bloom sizing; file streams are far smaller than the corpus.
const FILE_BLOOM: BloomParams = BloomParams {
    expected_items: 10_000,
    false_positive_rate: 0.01,
};

/// The n-gram state of a single ingested file.
///
/// `model` is `None` for entries restored from a snapshot: snapshots keep
/// per-file metadata and cached entropy but not per-file tries.
#[derive(Debug)]
pub struct FileModel {
    pub path: String,
    pub language: String,
    pub token_count: usize,
    pub last_modified: SystemTime,
    pub entropy: f64,
    model: Option<RwLock<NgramModel>>,
}

impl FileModel {
    /// Entry restored from a snapshot: metadata and cached entropy only,
    /// no per-file tries.
    pub(crate) fn metadata_only(
        path: String,
        language: String,
        token_count: usize,
        last_modified: SystemTime,
        entropy: f64,
    ) -> Self {
        FileModel {
            path,
            language,
            token_count,
            last_modified,
            entropy,
            model: None,
        }
    }

    /// Run `f` against the file's own model under its read lock. Returns
    /// `None` for metadata-only entries.
    pub fn with_model<R>(&self, f: impl FnOnce(&NgramModel) -> R) -> Option<R> {
        let lock = self.model.as_ref()?;
        let guard = lock.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Some(f(&guard))
    }

    /// Whether this entry still carries its per-file tries.
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }
}

/// Distribution of cached per-file entropies, the basis for z-scores.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EntropyStats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Aggregate statistics over the whole corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusStats {
    pub total_files: usize,
    pub total_tokens: i64,
    pub language_counts: BTreeMap<String, usize>,
    pub global_model: ModelStats,
    pub entropy: EntropyStats,
}

/// Population statistics over a set of entropy values: arithmetic mean and
/// population standard deviation (`sqrt(Σ(e-mean)² / count)`).
pub fn entropy_statistics(entropies: &[f64]) -> EntropyStats {
    if entropies.is_empty() {
        return EntropyStats::default();
    }

    let mut sum = 0.0;
    let mut min = entropies[0];
    let mut max = entropies[0];
    for &e in entropies {
        sum += e;
        if e < min {
            min = e;
        }
        if e > max {
            max = e;
        }
    }
    let mean = sum / entropies.len() as f64;

    let variance_sum: f64 = entropies.iter().map(|&e| (e - mean) * (e - mean)).sum();
    let std_dev = (variance_sum / entropies.len() as f64).sqrt();

    EntropyStats {
        mean,
        std_dev,
        min,
        max,
        count: entropies.len(),
    }
}

/// Owns one global model and the per-file model map.
#[derive(Debug)]
pub struct CorpusManager {
    pub(crate) config: CorpusConfig,
    pub(crate) registry: Arc<TokenizerRegistry>,
    pub(crate) global: RwLock<NgramModel>,
    pub(crate) files: RwLock<HashMap<String, Arc<FileModel>>>,
}

impl CorpusManager {
    /// Open an empty corpus with the given configuration and tokenizer
    /// registry.
    pub fn new(config: CorpusConfig, registry: Arc<TokenizerRegistry>) -> Self {
        let n = config.effective_n();
        let global = NgramModel::new(n, config.smoother, config.bloom);
        CorpusManager {
            config,
            registry,
            global: RwLock::new(global),
            files: RwLock::new(HashMap::new()),
        }
    }

    /// Reassemble a manager from restored parts (persistence path).
    pub(crate) fn from_restored(
        config: CorpusConfig,
        registry: Arc<TokenizerRegistry>,
        global: NgramModel,
        files: HashMap<String, Arc<FileModel>>,
    ) -> Self {
        CorpusManager {
            config,
            registry,
            global: RwLock::new(global),
            files: RwLock::new(files),
        }
    }

    pub fn config(&self) -> &CorpusConfig {
        &self.config
    }

    pub fn registry(&self) -> &TokenizerRegistry {
        &self.registry
    }

    pub(crate) fn read_global(&self) -> RwLockReadGuard<'_, NgramModel> {
        self.global
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_global(&self) -> RwLockWriteGuard<'_, NgramModel> {
        self.global
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn read_files(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<FileModel>>> {
        self.files
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_files(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<FileModel>>> {
        self.files
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn tokenize_normalized(
        &self,
        language: &str,
        source: &[u8],
    ) -> Result<Vec<String>, EngineError> {
        if !self.registry.has_language(language) {
            return Err(EngineError::UnknownLanguage(language.to_string()));
        }
        Ok(self.registry.tokenize_normalized(language, source)?)
    }

    /// Build a fresh per-file model over `tokens` and cache its
    /// self-entropy.
    fn build_file_model(&self, path: &str, language: &str, tokens: Vec<String>) -> FileModel {
        let mut model = NgramModel::new(
            self.config.effective_n(),
            self.config.smoother,
            self.config.bloom.map(|_| FILE_BLOOM),
        );
        model.add(&tokens);
        let entropy = model.cross_entropy(&tokens);

        FileModel {
            path: path.to_string(),
            language: language.to_string(),
            token_count: tokens.len(),
            last_modified: SystemTime::now(),
            entropy,
            model: Some(RwLock::new(model)),
        }
    }

    /// Add a file to the corpus, updating the per-file and global models.
    /// A path that is already present routes to [`update_file`] semantics.
    ///
    /// Installation into the file map is the last step: on any error the
    /// file is simply not installed.
    pub fn add_file(
        &self,
        path: &str,
        source: &[u8],
        language: &str,
        cancel: &CancelFlag,
    ) -> Result<(), EngineError> {
        cancel.check()?;
        let tokens = self.tokenize_normalized(language, source)?;

        let already_present = self.read_files().contains_key(path);
        if already_present {
            return self.install_update(path, language, tokens);
        }

        let file_model = self.build_file_model(path, language, tokens.clone());
        let entropy = file_model.entropy;
        let token_count = file_model.token_count;

        self.write_global().add(&tokens);
        self.write_files()
            .insert(path.to_string(), Arc::new(file_model));

        debug!(path, language, tokens = token_count, entropy, "added file to corpus");
        Ok(())
    }

    /// Rebuild the model for an existing file. The new token stream is
    /// added to the global model without removing the old one; rebuilding
    /// the corpus from surviving files is the way to shed stale counts.
    pub fn update_file(
        &self,
        path: &str,
        source: &[u8],
        language: &str,
        cancel: &CancelFlag,
    ) -> Result<(), EngineError> {
        cancel.check()?;
        let tokens = self.tokenize_normalized(language, source)?;

        let present = self.read_files().contains_key(path);
        if !present {
            // Not in the corpus yet: behave as a plain add.
            let file_model = self.build_file_model(path, language, tokens.clone());
            self.write_global().add(&tokens);
            self.write_files()
                .insert(path.to_string(), Arc::new(file_model));
            return Ok(());
        }

        self.install_update(path, language, tokens)
    }

    fn install_update(
        &self,
        path: &str,
        language: &str,
        tokens: Vec<String>,
    ) -> Result<(), EngineError> {
        let old = self.read_files().get(path).cloned();
        let file_model = self.build_file_model(path, language, tokens.clone());
        let new_entropy = file_model.entropy;
        let new_tokens = file_model.token_count;

        self.write_global().add(&tokens);
        self.write_files()
            .insert(path.to_string(), Arc::new(file_model));

        debug!(
            path,
            language,
            old_tokens = old.as_ref().map(|f| f.token_count),
            new_tokens,
            old_entropy = old.as_ref().map(|f| f.entropy),
            new_entropy,
            "updated file in corpus"
        );
        Ok(())
    }

    /// Drop a file's entry. The global model is intentionally not rewound;
    /// undoing a file's contribution would need per-file counting the
    /// engine does not maintain.
    pub fn remove_file(&self, path: &str, cancel: &CancelFlag) -> Result<(), EngineError> {
        cancel.check()?;
        let removed = self.write_files().remove(path);
        match removed {
            Some(_) => {
                debug!(path, "removed file from corpus");
                Ok(())
            }
            None => Err(EngineError::FileNotFound(path.to_string())),
        }
    }

    /// Cached self-entropy of an ingested file.
    pub fn file_entropy(&self, path: &str) -> Result<f64, EngineError> {
        self.read_files()
            .get(path)
            .map(|f| f.entropy)
            .ok_or_else(|| EngineError::FileNotFound(path.to_string()))
    }

    /// The full per-file record.
    pub fn file_model(&self, path: &str) -> Result<Arc<FileModel>, EngineError> {
        self.read_files()
            .get(path)
            .cloned()
            .ok_or_else(|| EngineError::FileNotFound(path.to_string()))
    }

    /// All ingested paths, sorted.
    pub fn list_files(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.read_files().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Aggregate corpus statistics.
    pub fn stats(&self) -> CorpusStats {
        let files = self.read_files();

        let mut language_counts = BTreeMap::new();
        let mut total_tokens = 0i64;
        let mut entropies = Vec::with_capacity(files.len());
        for file in files.values() {
            *language_counts.entry(file.language.clone()).or_insert(0) += 1;
            total_tokens += file.token_count as i64;
            entropies.push(file.entropy);
        }

        CorpusStats {
            total_files: files.len(),
            total_tokens,
            language_counts,
            global_model: self.read_global().stats(),
            entropy: entropy_statistics(&entropies),
        }
    }

    /// Entropy distribution over the corpus at this moment.
    pub fn entropy_stats(&self) -> EntropyStats {
        let files = self.read_files();
        let entropies: Vec<f64> = files.values().map(|f| f.entropy).collect();
        entropy_statistics(&entropies)
    }

    /// Standard deviations `entropy` sits from the corpus mean. Zero when
    /// the distribution is degenerate.
    pub fn z_score(&self, entropy: f64) -> f64 {
        let stats = self.entropy_stats();
        if stats.std_dev == 0.0 {
            return 0.0;
        }
        (entropy - stats.mean) / stats.std_dev
    }

    /// Prune low-frequency n-grams from the global model. Returns counts
    /// deducted from the n-gram and context tries.
    pub fn prune_global(&self, min_count: i64) -> (i64, i64) {
        self.write_global().prune(min_count)
    }

    /// Memory estimate for the global model.
    pub fn memory_stats(&self) -> ModelMemoryStats {
        self.read_global().memory_stats()
    }
}
