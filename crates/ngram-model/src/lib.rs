//! N-gram language model over count tries.
//!
//! [`NgramModel`] binds the n-gram order, a smoother, one shared
//! [`InternTable`] and three [`CountTrie`]s: the vocabulary (unigrams), the
//! full n-grams, and the (n-1)-contexts. The context trie exists because
//! probability estimation needs `count(context)` independently of the
//! n-gram's final token.
//!
//! The model itself is a plain data structure with no interior locking;
//! callers wrap it in a single reader-writer lock so that tries, interning
//! table and counters always move together.

use ngram_trie::{BloomParams, CountTrie, TrieMemoryStats};
use serde::{Deserialize, Serialize};
use smoothing::{Smoother, SmootherConfig};
use token_core::TokenId;
use token_intern::InternTable;
use xxhash_rust::xxh3::Xxh3;

/// Summary statistics of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    pub n: usize,
    pub vocabulary_size: usize,
    pub ngram_count: i64,
    pub total_tokens: i64,
    pub smoother_name: String,
}

/// Detailed memory estimate across the model's tries and intern table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMemoryStats {
    pub n: usize,
    pub total_tokens: i64,
    pub vocabulary: TrieMemoryStats,
    pub ngrams: TrieMemoryStats,
    pub contexts: TrieMemoryStats,
    pub intern_string_bytes: usize,
}

impl ModelMemoryStats {
    /// Estimated total bytes.
    pub fn total_bytes(&self) -> i64 {
        self.vocabulary.node_bytes
            + self.ngrams.node_bytes
            + self.contexts.node_bytes
            + self.intern_string_bytes as i64
    }
}

/// One n-gram (as strings) with its stored count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NgramWithCount {
    pub tokens: Vec<String>,
    pub count: i64,
}

/// Content-addressed fingerprint of an n-gram: every token's bytes hashed
/// in order with a zero-byte separator.
pub fn ngram_fingerprint<S: AsRef<str>>(tokens: &[S]) -> u64 {
    let mut hasher = Xxh3::new();
    for token in tokens {
        hasher.update(token.as_ref().as_bytes());
        hasher.update(&[0]);
    }
    hasher.digest()
}

/// Statistical n-gram model: vocabulary + n-gram + context tries over one
/// shared interning table.
pub struct NgramModel {
    n: usize,
    smoother: Box<dyn Smoother>,
    smoother_config: SmootherConfig,
    intern: InternTable,
    vocabulary: CountTrie,
    ngrams: CountTrie,
    contexts: CountTrie,
    total_tokens: i64,
}

impl std::fmt::Debug for NgramModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NgramModel")
            .field("n", &self.n)
            .field("smoother", &self.smoother.name())
            .field("smoother_config", &self.smoother_config)
            .field("vocabulary", &self.vocabulary)
            .field("ngrams", &self.ngrams)
            .field("contexts", &self.contexts)
            .field("total_tokens", &self.total_tokens)
            .finish()
    }
}

impl NgramModel {
    /// Create an empty model. An order below 1 falls back to trigrams.
    /// When `bloom` is given, the n-gram and context tries are gated; the
    /// vocabulary never is, so vocabulary size stays exact.
    pub fn new(n: usize, smoother: SmootherConfig, bloom: Option<BloomParams>) -> Self {
        let n = if n < 1 { 3 } else { n };
        let (ngrams, contexts) = match bloom {
            Some(params) => (CountTrie::with_bloom(params), CountTrie::with_bloom(params)),
            None => (CountTrie::new(), CountTrie::new()),
        };
        NgramModel {
            n,
            smoother: smoother.build(),
            smoother_config: smoother,
            intern: InternTable::new(),
            vocabulary: CountTrie::new(),
            ngrams,
            contexts,
            total_tokens: 0,
        }
    }

    /// Reassemble a model from persisted parts. Bloom bits are not part of
    /// a snapshot, so gated tries restart with fresh filters.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        n: usize,
        smoother: SmootherConfig,
        bloom: Option<BloomParams>,
        intern: InternTable,
        vocabulary: CountTrie,
        mut ngrams: CountTrie,
        mut contexts: CountTrie,
        total_tokens: i64,
    ) -> Self {
        if let Some(params) = bloom {
            ngrams.set_bloom(Some(ngram_trie::BloomFilter::from_params(params)));
            contexts.set_bloom(Some(ngram_trie::BloomFilter::from_params(params)));
        }
        NgramModel {
            n,
            smoother: smoother.build(),
            smoother_config: smoother,
            intern,
            vocabulary,
            ngrams,
            contexts,
            total_tokens,
        }
    }

    /// N-gram order.
    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn total_tokens(&self) -> i64 {
        self.total_tokens
    }

    #[inline]
    pub fn smoother_config(&self) -> SmootherConfig {
        self.smoother_config
    }

    /// Number of distinct tokens observed.
    #[inline]
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.root_child_count()
    }

    pub fn intern_table(&self) -> &InternTable {
        &self.intern
    }

    pub fn vocabulary_trie(&self) -> &CountTrie {
        &self.vocabulary
    }

    pub fn ngram_trie(&self) -> &CountTrie {
        &self.ngrams
    }

    pub fn context_trie(&self) -> &CountTrie {
        &self.contexts
    }

    /// Add a token stream: every token feeds the vocabulary, every window
    /// of size n feeds the n-gram trie and its prefix the context trie. A
    /// stream shorter than n emits exactly one short window.
    pub fn add<S: AsRef<str>>(&mut self, tokens: &[S]) {
        if tokens.is_empty() {
            return;
        }
        self.total_tokens += tokens.len() as i64;

        let ids: Vec<TokenId> = tokens
            .iter()
            .map(|t| self.intern.intern(t.as_ref()))
            .collect();
        for &id in &ids {
            self.vocabulary.insert(&[id], 0);
        }

        if tokens.len() >= self.n {
            for i in 0..=tokens.len() - self.n {
                self.insert_window(&tokens[i..i + self.n], &ids[i..i + self.n]);
            }
        } else {
            self.insert_window(tokens, &ids);
        }
    }

    fn insert_window<S: AsRef<str>>(&mut self, tokens: &[S], ids: &[TokenId]) {
        let fp = if self.ngrams.has_bloom() {
            ngram_fingerprint(tokens)
        } else {
            0
        };
        self.ngrams.insert(ids, fp);

        if ids.len() > 1 {
            let ctx_tokens = &tokens[..tokens.len() - 1];
            let ctx_ids = &ids[..ids.len() - 1];
            let ctx_fp = if self.contexts.has_bloom() {
                ngram_fingerprint(ctx_tokens)
            } else {
                0
            };
            self.contexts.insert(ctx_ids, ctx_fp);
        }
    }

    /// Best-effort inverse of [`add`](Self::add): decrements vocabulary,
    /// n-gram and context counts, all floored at zero. Windows containing
    /// never-seen tokens are skipped.
    pub fn remove<S: AsRef<str>>(&mut self, tokens: &[S]) {
        if tokens.is_empty() {
            return;
        }
        self.total_tokens = (self.total_tokens - tokens.len() as i64).max(0);

        for token in tokens {
            if let Some(id) = self.intern.lookup(token.as_ref()) {
                self.vocabulary.remove(&[id]);
            }
        }

        if tokens.len() >= self.n {
            for i in 0..=tokens.len() - self.n {
                self.remove_window(&tokens[i..i + self.n]);
            }
        } else {
            self.remove_window(tokens);
        }
    }

    fn remove_window<S: AsRef<str>>(&mut self, tokens: &[S]) {
        let ids: Option<Vec<TokenId>> = tokens
            .iter()
            .map(|t| self.intern.lookup(t.as_ref()))
            .collect();
        let Some(ids) = ids else { return };
        self.ngrams.remove(&ids);
        if ids.len() > 1 {
            self.contexts.remove(&ids[..ids.len() - 1]);
        }
    }

    fn count_in(&self, trie: &CountTrie, tokens: &[&str]) -> i64 {
        let ids: Option<Vec<TokenId>> =
            tokens.iter().map(|t| self.intern.lookup(t)).collect();
        match ids {
            Some(ids) => trie.count_of(&ids),
            None => 0,
        }
    }

    /// Probability of `token` following `context`, trimmed to the model
    /// order and smoothed. Returns 0 for an empty vocabulary.
    pub fn probability<S: AsRef<str>>(&self, token: &str, context: &[S]) -> f64 {
        let vocab_size = self.vocabulary_size();
        if vocab_size == 0 {
            return 0.0;
        }

        let mut gram: Vec<&str> = context.iter().map(|t| t.as_ref()).collect();
        gram.push(token);
        if gram.len() > self.n {
            gram.drain(..gram.len() - self.n);
        }

        let ngram_count = self.count_in(&self.ngrams, &gram);
        let context_count = if gram.len() > 1 {
            self.count_in(&self.contexts, &gram[..gram.len() - 1])
        } else {
            0
        };

        let backoff = 1.0 / vocab_size as f64;
        self.smoother
            .smooth(ngram_count, context_count, backoff, vocab_size)
    }

    /// Cross-entropy of a token stream under this model: the mean
    /// `-log2 P(token | context)` over positions with non-zero probability.
    /// Empty streams (and streams where every position has zero
    /// probability) score 0.
    pub fn cross_entropy<S: AsRef<str>>(&self, tokens: &[S]) -> f64 {
        if tokens.is_empty() {
            return 0.0;
        }

        let mut total_log_prob = 0.0;
        let mut counted = 0usize;

        for i in 0..tokens.len() {
            let context_start = i.saturating_sub(self.n - 1);
            let context = &tokens[context_start..i];
            let p = self.probability(tokens[i].as_ref(), context);
            if p > 0.0 {
                total_log_prob += p.log2();
                counted += 1;
            }
        }

        if counted == 0 {
            return 0.0;
        }
        -total_log_prob / counted as f64
    }

    /// `2^cross_entropy`, the geometric-mean branching factor.
    pub fn perplexity<S: AsRef<str>>(&self, tokens: &[S]) -> f64 {
        2f64.powf(self.cross_entropy(tokens))
    }

    /// Direct count of a stored n-gram.
    pub fn ngram_count<S: AsRef<str>>(&self, tokens: &[S]) -> i64 {
        let gram: Vec<&str> = tokens.iter().map(|t| t.as_ref()).collect();
        self.count_in(&self.ngrams, &gram)
    }

    /// Direct count of a stored context.
    pub fn context_count<S: AsRef<str>>(&self, tokens: &[S]) -> i64 {
        let gram: Vec<&str> = tokens.iter().map(|t| t.as_ref()).collect();
        self.count_in(&self.contexts, &gram)
    }

    /// All stored n-grams extending `prefix`, resolved back to strings.
    pub fn ngrams_with_prefix<S: AsRef<str>>(&self, prefix: &[S]) -> Vec<NgramWithCount> {
        let ids: Option<Vec<TokenId>> = prefix
            .iter()
            .map(|t| self.intern.lookup(t.as_ref()))
            .collect();
        let Some(ids) = ids else {
            return Vec::new();
        };

        self.ngrams
            .all_with_prefix(&ids)
            .into_iter()
            .map(|ng| NgramWithCount {
                tokens: ng
                    .path
                    .iter()
                    .map(|&id| self.intern.resolve(id).to_string())
                    .collect(),
                count: ng.count,
            })
            .collect()
    }

    /// Remove low-frequency n-grams from the n-gram and context tries.
    /// Returns the counts deducted from each.
    pub fn prune(&mut self, min_count: i64) -> (i64, i64) {
        let ngram_pruned = self.ngrams.prune(min_count);
        let context_pruned = self.contexts.prune(min_count);
        (ngram_pruned, context_pruned)
    }

    pub fn stats(&self) -> ModelStats {
        ModelStats {
            n: self.n,
            vocabulary_size: self.vocabulary_size(),
            ngram_count: self.ngrams.total_ngrams(),
            total_tokens: self.total_tokens,
            smoother_name: self.smoother.name().to_string(),
        }
    }

    pub fn memory_stats(&self) -> ModelMemoryStats {
        ModelMemoryStats {
            n: self.n,
            total_tokens: self.total_tokens,
            vocabulary: self.vocabulary.memory_stats(),
            ngrams: self.ngrams.memory_stats(),
            contexts: self.contexts.memory_stats(),
            intern_string_bytes: self.intern.string_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigram_model() -> NgramModel {
        NgramModel::new(3, SmootherConfig::default(), None)
    }

    // Normalized stream for a tiny function: `func ID ( ID ) { return ID }`
    const FUNC_TOKENS: [&str; 9] = ["func", "ID", "(", "ID", ")", "{", "return", "ID", "}"];

    #[test]
    fn add_counts_trigrams_exactly() {
        let mut model = trigram_model();
        model.add(&FUNC_TOKENS);

        assert_eq!(model.ngram_count(&["func", "ID", "("]), 1);
        assert_eq!(model.context_count(&["func", "ID"]), 1);
        assert_eq!(model.vocabulary_size(), 7);
        assert_eq!(model.total_tokens(), 9);
    }

    #[test]
    fn add_window_arithmetic() {
        let mut model = trigram_model();
        model.add(&FUNC_TOKENS);
        // 9 tokens, n=3 -> 7 windows.
        assert_eq!(model.ngram_trie().total_ngrams(), 7);
    }

    #[test]
    fn short_stream_emits_single_short_window() {
        let mut model = trigram_model();
        model.add(&["ID", "="]);

        // Exactly one (short) n-gram, no padding variants.
        assert_eq!(model.ngram_trie().total_ngrams(), 1);
        assert_eq!(model.ngram_count(&["ID", "="]), 1);
        assert_eq!(model.ngram_count(&["ID"]), 0);
        assert_eq!(model.context_count(&["ID"]), 1);
    }

    #[test]
    fn stream_of_exactly_n_emits_one_window() {
        let mut model = trigram_model();
        model.add(&["a", "b", "c"]);
        assert_eq!(model.ngram_trie().total_ngrams(), 1);
        assert_eq!(model.ngram_count(&["a", "b", "c"]), 1);
    }

    #[test]
    fn empty_add_is_noop() {
        let mut model = trigram_model();
        model.add::<&str>(&[]);
        assert_eq!(model.total_tokens(), 0);
        assert_eq!(model.vocabulary_size(), 0);
    }

    #[test]
    fn order_below_one_defaults_to_trigrams() {
        let model = NgramModel::new(0, SmootherConfig::default(), None);
        assert_eq!(model.n(), 3);
    }

    #[test]
    fn probability_unseen_context_is_uniform() {
        let mut model = trigram_model();
        model.add(&FUNC_TOKENS); // V = 7
        let p = model.probability("}", &["never", "seen"]);
        assert!((p - 1.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn probability_seen_ngram_follows_add_k() {
        let mut model = trigram_model();
        model.add(&FUNC_TOKENS);
        // c("func ID (") = 1, C("func ID") = 1, V = 7: (1+1)/(1+7) = 0.25
        let p = model.probability("(", &["func", "ID"]);
        assert!((p - 0.25).abs() < 1e-12);
    }

    #[test]
    fn probability_trims_long_context_to_order() {
        let mut model = trigram_model();
        model.add(&FUNC_TOKENS);
        let long_context = ["x", "y", "z", "func", "ID"];
        let trimmed = model.probability("(", &long_context);
        let direct = model.probability("(", &["func", "ID"]);
        assert!((trimmed - direct).abs() < 1e-12);
    }

    #[test]
    fn probability_empty_vocabulary_is_zero() {
        let model = trigram_model();
        assert_eq!(model.probability("ID", &["func"]), 0.0);
    }

    #[test]
    fn cross_entropy_empty_stream_is_zero() {
        let model = trigram_model();
        assert_eq!(model.cross_entropy::<&str>(&[]), 0.0);
        assert!((model.perplexity::<&str>(&[]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cross_entropy_nonnegative_and_perplexity_consistent() {
        let mut model = trigram_model();
        model.add(&FUNC_TOKENS);

        let h = model.cross_entropy(&FUNC_TOKENS);
        assert!(h >= 0.0);
        let ppl = model.perplexity(&FUNC_TOKENS);
        assert!((ppl - 2f64.powf(h)).abs() < 1e-9);
    }

    #[test]
    fn repetition_lowers_entropy() {
        let mut model = trigram_model();
        for _ in 0..20 {
            model.add(&FUNC_TOKENS);
        }
        let familiar = model.cross_entropy(&FUNC_TOKENS);
        let unfamiliar = model.cross_entropy(&["}", "return", "(", "func", ")"]);
        assert!(
            familiar < unfamiliar,
            "familiar {familiar} should be below unfamiliar {unfamiliar}"
        );
    }

    #[test]
    fn remove_inverts_add_counts() {
        let mut model = trigram_model();
        model.add(&FUNC_TOKENS);
        model.add(&FUNC_TOKENS);
        model.remove(&FUNC_TOKENS);

        assert_eq!(model.ngram_count(&["func", "ID", "("]), 1);
        assert_eq!(model.context_count(&["func", "ID"]), 1);
        assert_eq!(model.total_tokens(), 9);
    }

    #[test]
    fn remove_unknown_tokens_is_noop_on_tries() {
        let mut model = trigram_model();
        model.add(&FUNC_TOKENS);
        let before = model.ngram_trie().total_ngrams();
        model.remove(&["nope", "nada", "zilch"]);
        assert_eq!(model.ngram_trie().total_ngrams(), before);
    }

    #[test]
    fn ngrams_with_prefix_resolves_strings() {
        let mut model = trigram_model();
        model.add(&FUNC_TOKENS);

        let found = model.ngrams_with_prefix(&["func", "ID"]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tokens, vec!["func", "ID", "("]);
        assert_eq!(found[0].count, 1);

        assert!(model.ngrams_with_prefix(&["unseen"]).is_empty());
    }

    #[test]
    fn stats_reports_configured_smoother() {
        let mut model = NgramModel::new(2, SmootherConfig::WittenBell, None);
        model.add(&["a", "b", "c"]);
        let stats = model.stats();
        assert_eq!(stats.n, 2);
        assert_eq!(stats.smoother_name, "WittenBell");
        assert_eq!(stats.vocabulary_size, 3);
        assert_eq!(stats.total_tokens, 3);
        assert_eq!(stats.ngram_count, 2); // "a b", "b c"
    }

    #[test]
    fn bloom_gated_model_suppresses_singleton_windows() {
        let params = BloomParams {
            expected_items: 1000,
            false_positive_rate: 0.01,
        };
        let mut model = NgramModel::new(3, SmootherConfig::default(), Some(params));

        model.add(&["a", "b", "c"]);
        assert_eq!(model.ngram_count(&["a", "b", "c"]), 0);
        // Vocabulary is never gated.
        assert_eq!(model.vocabulary_size(), 3);

        model.add(&["a", "b", "c"]);
        assert_eq!(model.ngram_count(&["a", "b", "c"]), 1);

        model.add(&["a", "b", "c"]);
        assert_eq!(model.ngram_count(&["a", "b", "c"]), 2);
    }

    #[test]
    fn fingerprint_separator_prevents_concatenation_collisions() {
        assert_ne!(
            ngram_fingerprint(&["ab", "c"]),
            ngram_fingerprint(&["a", "bc"])
        );
        assert_eq!(
            ngram_fingerprint(&["a", "bc"]),
            ngram_fingerprint(&["a", "bc"])
        );
    }

    #[test]
    fn prune_drops_singletons_from_both_tries() {
        let mut model = trigram_model();
        for _ in 0..3 {
            model.add(&["a", "b", "c"]);
        }
        model.add(&["x", "y", "z"]);

        let (ngram_pruned, _context_pruned) = model.prune(2);
        assert_eq!(ngram_pruned, 1);
        assert_eq!(model.ngram_count(&["a", "b", "c"]), 3);
        assert_eq!(model.ngram_count(&["x", "y", "z"]), 0);
    }

    #[test]
    fn memory_stats_totals_are_positive() {
        let mut model = trigram_model();
        model.add(&FUNC_TOKENS);
        let stats = model.memory_stats();
        assert!(stats.total_bytes() > 0);
        assert_eq!(stats.n, 3);
        assert!(stats.vocabulary.node_count > 1);
    }

    #[test]
    fn from_parts_reassembles_equivalent_model() {
        let mut model = trigram_model();
        model.add(&FUNC_TOKENS);

        let rebuilt = NgramModel::from_parts(
            model.n(),
            model.smoother_config(),
            None,
            model.intern_table().clone(),
            model.vocabulary_trie().clone(),
            model.ngram_trie().clone(),
            model.context_trie().clone(),
            model.total_tokens(),
        );

        assert_eq!(
            rebuilt.cross_entropy(&FUNC_TOKENS),
            model.cross_entropy(&FUNC_TOKENS)
        );
        assert_eq!(rebuilt.stats(), model.stats());
    }
}
