//! End-to-end snippet analysis against the global model.
//!
//! `analyze_code` reports model cross-entropy and perplexity for a
//! snippet. `calculate_z_score` additionally scores every n-gram window of
//! exactly n tokens, classifies the snippet's entropy against the corpus
//! distribution, and attaches a categorical interpretation.

use ngram_model::NgramModel;
use serde::{Deserialize, Serialize};

use crate::cancel::CancelFlag;
use crate::error::EngineError;
use crate::manager::{CorpusManager, EntropyStats};

/// Surprise assigned to a window with zero probability.
const ZERO_PROB_LOG: f64 = 20.0;

/// Entropy and perplexity of a snippet under the global model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeAnalysis {
    pub token_count: usize,
    pub entropy: f64,
    pub perplexity: f64,
    pub language: String,
}

/// Score detail for one n-gram window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NgramScore {
    pub ngram: Vec<String>,
    pub probability: f64,
    /// `-log2(probability)`, capped at 20 when the probability is zero.
    pub log_prob: f64,
    /// This window's contribution to the snippet entropy.
    pub entropy: f64,
}

/// Categorical reading of a z-score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZScoreInterpretation {
    pub level: String,
    pub description: String,
    pub percentile: f64,
}

/// Full z-score report for a snippet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZScoreAnalysis {
    pub token_count: usize,
    pub entropy: f64,
    pub z_score: f64,
    pub entropy_stats: EntropyStats,
    pub ngram_scores: Vec<NgramScore>,
    pub interpretation: ZScoreInterpretation,
}

/// Map a z-score to its categorical band.
pub fn interpret_z_score(z_score: f64) -> ZScoreInterpretation {
    let (level, description, percentile) = if z_score < -2.0 {
        (
            "very_low",
            "Extremely typical code - simpler than 97.5% of corpus",
            2.5,
        )
    } else if z_score < -1.0 {
        (
            "low",
            "More typical than average - simpler than 84% of corpus",
            16.0,
        )
    } else if z_score <= 1.0 {
        (
            "normal",
            "Normal entropy - within 1 standard deviation of mean",
            50.0,
        )
    } else if z_score <= 2.0 {
        (
            "high",
            "Unusual code - more complex than 84% of corpus",
            84.0,
        )
    } else {
        (
            "very_high",
            "Highly unusual code - more complex than 97.5% of corpus (potential bug indicator)",
            97.5,
        )
    };

    ZScoreInterpretation {
        level: level.to_string(),
        description: description.to_string(),
        percentile,
    }
}

/// Score every window of exactly `n` tokens and return the windowed
/// entropy (total surprise divided by the token count) alongside the
/// per-window details. Streams shorter than `n` score zero with no
/// windows.
fn windowed_scores(model: &NgramModel, tokens: &[String], n: usize) -> (f64, Vec<NgramScore>) {
    if tokens.len() < n {
        return (0.0, Vec::new());
    }

    let mut total = 0.0;
    let mut scores = Vec::with_capacity(tokens.len() - n + 1);

    for window in tokens.windows(n) {
        let context = &window[..n - 1];
        let token = &window[n - 1];
        let probability = model.probability(token, context);
        let log_prob = if probability > 0.0 {
            -probability.log2()
        } else {
            ZERO_PROB_LOG
        };
        total += log_prob;

        scores.push(NgramScore {
            ngram: window.to_vec(),
            probability,
            log_prob,
            entropy: log_prob,
        });
    }

    (total / tokens.len() as f64, scores)
}

impl CorpusManager {
    /// Tokenize, normalize and score a snippet with the global model.
    pub fn analyze_code(
        &self,
        language: &str,
        source: &[u8],
        cancel: &CancelFlag,
    ) -> Result<CodeAnalysis, EngineError> {
        cancel.check()?;
        let tokens = self.tokenize_normalized(language, source)?;

        let global = self.read_global();
        let entropy = global.cross_entropy(&tokens);
        let perplexity = global.perplexity(&tokens);

        Ok(CodeAnalysis {
            token_count: tokens.len(),
            entropy,
            perplexity,
            language: language.to_string(),
        })
    }

    /// Score a snippet's windows, z-score its entropy against the corpus
    /// distribution and classify the result.
    pub fn calculate_z_score(
        &self,
        language: &str,
        source: &[u8],
        cancel: &CancelFlag,
    ) -> Result<ZScoreAnalysis, EngineError> {
        cancel.check()?;
        let tokens = self.tokenize_normalized(language, source)?;

        let (entropy, ngram_scores) = {
            let global = self.read_global();
            windowed_scores(&global, &tokens, global.n())
        };

        let z_score = self.z_score(entropy);
        let entropy_stats = self.entropy_stats();
        let interpretation = interpret_z_score(z_score);

        Ok(ZScoreAnalysis {
            token_count: tokens.len(),
            entropy,
            z_score,
            entropy_stats,
            ngram_scores,
            interpretation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CorpusConfig;
    use codent_tokenizer::default_registry;
    use smoothing::SmootherConfig;
    use std::sync::Arc;

    fn manager() -> CorpusManager {
        let config = CorpusConfig {
            bloom: None,
            smoother: SmootherConfig::AddK { k: 1.0 },
            ..CorpusConfig::default()
        };
        CorpusManager::new(config, Arc::new(default_registry()))
    }

    #[test]
    fn interpret_bands_match_table() {
        assert_eq!(interpret_z_score(-2.5).level, "very_low");
        assert_eq!(interpret_z_score(-2.5).percentile, 2.5);
        assert_eq!(interpret_z_score(-1.5).level, "low");
        assert_eq!(interpret_z_score(-1.5).percentile, 16.0);
        assert_eq!(interpret_z_score(0.0).level, "normal");
        assert_eq!(interpret_z_score(1.0).level, "normal");
        assert_eq!(interpret_z_score(1.5).level, "high");
        assert_eq!(interpret_z_score(2.0).level, "high");
        assert_eq!(interpret_z_score(2.12).level, "very_high");
        assert_eq!(interpret_z_score(2.12).percentile, 97.5);
    }

    #[test]
    fn interpret_band_edges() {
        assert_eq!(interpret_z_score(-2.0).level, "low");
        assert_eq!(interpret_z_score(-1.0).level, "normal");
        assert_eq!(interpret_z_score(1.0001).level, "high");
        assert_eq!(interpret_z_score(2.0001).level, "very_high");
    }

    #[test]
    fn analyze_code_scores_against_global_model() {
        let cm = manager();
        let cancel = CancelFlag::new();
        cm.add_file(
            "a.go",
            b"func add(a, b int) int { return a + b }",
            "go",
            &cancel,
        )
        .unwrap();

        let analysis = cm
            .analyze_code("go", b"func sub(a, b int) int { return a - b }", &cancel)
            .unwrap();
        assert!(analysis.token_count > 0);
        assert!(analysis.entropy >= 0.0);
        assert!((analysis.perplexity - 2f64.powf(analysis.entropy)).abs() < 1e-9);
        assert_eq!(analysis.language, "go");
    }

    #[test]
    fn analyze_code_unknown_language() {
        let cm = manager();
        let err = cm
            .analyze_code("brainfuck", b"++", &CancelFlag::new())
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownLanguage(_)));
    }

    #[test]
    fn z_score_report_emits_window_per_ngram() {
        let cm = manager();
        let cancel = CancelFlag::new();
        cm.add_file(
            "a.go",
            b"func add(a, b int) int { return a + b }",
            "go",
            &cancel,
        )
        .unwrap();

        let report = cm
            .calculate_z_score("go", b"func id(a int) int { return a }", &cancel)
            .unwrap();

        // Windows of exactly n over the token stream.
        let n = cm.config().effective_n();
        assert_eq!(report.ngram_scores.len(), report.token_count - n + 1);
        for score in &report.ngram_scores {
            assert_eq!(score.ngram.len(), n);
            assert!(score.log_prob >= 0.0);
            assert!(score.log_prob <= ZERO_PROB_LOG);
            assert_eq!(score.entropy, score.log_prob);
        }
        assert_eq!(report.interpretation, interpret_z_score(report.z_score));
    }

    #[test]
    fn z_score_short_snippet_has_no_windows() {
        let cm = manager();
        let cancel = CancelFlag::new();
        cm.add_file("a.go", b"func f() {}", "go", &cancel).unwrap();

        let report = cm.calculate_z_score("go", b"x", &cancel).unwrap();
        assert!(report.ngram_scores.is_empty());
        assert_eq!(report.entropy, 0.0);
    }

    #[test]
    fn windowed_scores_cap_zero_probability() {
        // Empty model: vocabulary size 0, every probability is 0.
        let model = NgramModel::new(3, SmootherConfig::default(), None);
        let tokens: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let (entropy, scores) = windowed_scores(&model, &tokens, 3);

        assert_eq!(scores.len(), 2);
        for score in &scores {
            assert_eq!(score.probability, 0.0);
            assert_eq!(score.log_prob, ZERO_PROB_LOG);
        }
        // 2 windows * 20.0 / 4 tokens.
        assert!((entropy - 10.0).abs() < 1e-12);
    }
}
