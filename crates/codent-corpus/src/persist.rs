//! Versioned binary persistence for a corpus.
//!
//! A snapshot flattens the global model's tries into serial-id node arrays
//! and captures the interning table, scalar header and per-file metadata,
//! so a built corpus reloads without re-tokenizing any source. The stream
//! layout is a leading version record followed by the snapshot body; the
//! version is consulted before the body is decoded, and a mismatch means
//! the caller must rebuild from source.
//!
//! Bloom filter bits are not persisted: a reloaded corpus starts with a
//! fresh gate, so the first post-load occurrence of any n-gram is
//! suppressed once more. Accepted as a known property of the append-only
//! filter.

use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bincode::serde::{decode_from_std_read, encode_into_std_write};
use codent_tokenizer::TokenizerRegistry;
use ngram_model::NgramModel;
use ngram_trie::{BloomParams, CountTrie, FlatNode};
use serde::{Deserialize, Serialize};
use token_intern::InternTable;
use tracing::info;

use crate::config::CorpusConfig;
use crate::error::EngineError;
use crate::manager::{CorpusManager, FileModel};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: &str = "1.0";

/// Minimal per-file record kept in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMeta {
    pub path: String,
    pub language: String,
    pub token_count: usize,
    pub entropy: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct TrieCounters {
    total_ngrams: i64,
    total_tokens: i64,
}

/// Serializable form of a corpus: scalar header, file metadata, interning
/// table, flattened tries and their counters.
#[derive(Debug, Serialize, Deserialize)]
struct CorpusSnapshot {
    n: usize,
    bloom: Option<BloomParams>,
    total_tokens: i64,
    created_at: u64,
    corpus_name: String,
    smoother_name: String,
    files: BTreeMap<String, FileMeta>,
    intern: InternTable,
    ngram_nodes: Vec<FlatNode>,
    vocab_nodes: Vec<FlatNode>,
    context_nodes: Vec<FlatNode>,
    ngram_counters: TrieCounters,
    vocab_counters: TrieCounters,
    context_counters: TrieCounters,
}

/// Canonical on-disk location of a corpus snapshot.
pub fn model_path(storage_dir: &Path, corpus_name: &str) -> PathBuf {
    storage_dir.join(format!("{corpus_name}_ngram.bin"))
}

fn counters_of(trie: &CountTrie) -> TrieCounters {
    TrieCounters {
        total_ngrams: trie.total_ngrams(),
        total_tokens: trie.total_tokens(),
    }
}

fn restore_trie(nodes: &[FlatNode], counters: TrieCounters) -> Result<CountTrie, EngineError> {
    let mut trie =
        CountTrie::from_flat(nodes).map_err(|e| EngineError::FormatCorrupt(e.to_string()))?;
    trie.set_counters(counters.total_ngrams, counters.total_tokens);
    Ok(trie)
}

impl CorpusManager {
    fn snapshot(&self) -> CorpusSnapshot {
        let global = self.read_global();
        let files = self.read_files();

        let mut file_meta = BTreeMap::new();
        for (path, fm) in files.iter() {
            file_meta.insert(
                path.clone(),
                FileMeta {
                    path: fm.path.clone(),
                    language: fm.language.clone(),
                    token_count: fm.token_count,
                    entropy: fm.entropy,
                },
            );
        }

        CorpusSnapshot {
            n: global.n(),
            bloom: self.config.bloom,
            total_tokens: global.total_tokens(),
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            corpus_name: self.config.corpus_name.clone(),
            smoother_name: self.config.smoother.name().to_string(),
            files: file_meta,
            intern: global.intern_table().clone(),
            ngram_nodes: global.ngram_trie().flatten(),
            vocab_nodes: global.vocabulary_trie().flatten(),
            context_nodes: global.context_trie().flatten(),
            ngram_counters: counters_of(global.ngram_trie()),
            vocab_counters: counters_of(global.vocabulary_trie()),
            context_counters: counters_of(global.context_trie()),
        }
    }

    /// Serialize the corpus to a byte stream: a version record followed by
    /// the snapshot body.
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<(), EngineError> {
        let cfg = bincode::config::standard();
        let snapshot = self.snapshot();

        encode_into_std_write(SNAPSHOT_VERSION.to_string(), writer, cfg)
            .map_err(|e| EngineError::Io(std::io::Error::other(e)))?;
        encode_into_std_write(&snapshot, writer, cfg)
            .map_err(|e| EngineError::Io(std::io::Error::other(e)))?;

        info!(
            corpus = %snapshot.corpus_name,
            n = snapshot.n,
            total_tokens = snapshot.total_tokens,
            files = snapshot.files.len(),
            "saved corpus snapshot"
        );
        Ok(())
    }

    /// Restore a corpus from a byte stream produced by [`save`](Self::save).
    ///
    /// The version record is checked before the body is decoded, and the
    /// configured smoother must match the one the snapshot was built with.
    /// Per-file entries come back metadata-only; the global model is fully
    /// reconstructed.
    pub fn load<R: Read>(
        reader: &mut R,
        config: CorpusConfig,
        registry: Arc<TokenizerRegistry>,
    ) -> Result<Self, EngineError> {
        let cfg = bincode::config::standard();

        let version: String = decode_from_std_read(reader, cfg)
            .map_err(|e| EngineError::FormatCorrupt(e.to_string()))?;
        if version != SNAPSHOT_VERSION {
            return Err(EngineError::FormatVersion {
                found: version,
                expected: SNAPSHOT_VERSION.to_string(),
            });
        }

        let snapshot: CorpusSnapshot = decode_from_std_read(reader, cfg)
            .map_err(|e| EngineError::FormatCorrupt(e.to_string()))?;

        if snapshot.smoother_name != config.smoother.name() {
            return Err(EngineError::SmootherMismatch {
                stored: snapshot.smoother_name,
                configured: config.smoother.name().to_string(),
            });
        }

        let ngrams = restore_trie(&snapshot.ngram_nodes, snapshot.ngram_counters)?;
        let vocabulary = restore_trie(&snapshot.vocab_nodes, snapshot.vocab_counters)?;
        let contexts = restore_trie(&snapshot.context_nodes, snapshot.context_counters)?;

        let global = NgramModel::from_parts(
            snapshot.n,
            config.smoother,
            snapshot.bloom,
            snapshot.intern,
            vocabulary,
            ngrams,
            contexts,
            snapshot.total_tokens,
        );

        let last_modified = UNIX_EPOCH + Duration::from_secs(snapshot.created_at);
        let files: HashMap<String, Arc<FileModel>> = snapshot
            .files
            .into_iter()
            .map(|(path, meta)| {
                let fm = FileModel::metadata_only(
                    meta.path,
                    meta.language,
                    meta.token_count,
                    last_modified,
                    meta.entropy,
                );
                (path, Arc::new(fm))
            })
            .collect();

        info!(
            corpus = %snapshot.corpus_name,
            n = snapshot.n,
            total_tokens = snapshot.total_tokens,
            files = files.len(),
            "loaded corpus snapshot"
        );

        let config = CorpusConfig {
            n: snapshot.n,
            bloom: snapshot.bloom,
            corpus_name: snapshot.corpus_name,
            ..config
        };

        Ok(CorpusManager::from_restored(config, registry, global, files))
    }

    /// Write the snapshot atomically under `dir` as
    /// `<corpus_name>_ngram.bin` (write-to-temp, then rename).
    pub fn save_to_dir(&self, dir: &Path) -> Result<PathBuf, EngineError> {
        std::fs::create_dir_all(dir)?;
        let final_path = model_path(dir, &self.config.corpus_name);
        let tmp_path = final_path.with_extension("bin.tmp");

        let mut file = std::fs::File::create(&tmp_path)?;
        self.save(&mut file)?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&tmp_path, &final_path)?;
        Ok(final_path)
    }

    /// Load the snapshot named by `config.corpus_name` from `dir`.
    pub fn load_from_dir(
        dir: &Path,
        config: CorpusConfig,
        registry: Arc<TokenizerRegistry>,
    ) -> Result<Self, EngineError> {
        let path = model_path(dir, &config.corpus_name);
        let mut file = std::fs::File::open(path)?;
        Self::load(&mut file, config, registry)
    }
}
