//! Engine-level error taxonomy.
//!
//! A closed sum over every failure the corpus surfaces. The engine never
//! recovers internally; callers decide whether to skip, retry or abort.

use codent_tokenizer::TokenizeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The tokenizer could not produce a token stream. Non-retryable.
    #[error("tokenization failed: {0}")]
    Parse(TokenizeError),

    /// No tokenizer registered for the requested language or extension.
    #[error("no tokenizer registered for language {0:?}")]
    UnknownLanguage(String),

    /// An operation targeted a path that is not in the corpus.
    #[error("file not found in corpus: {0}")]
    FileNotFound(String),

    /// The persistence codec cannot decode a stream at this version.
    #[error("unsupported snapshot version {found:?} (expected {expected:?})")]
    FormatVersion { found: String, expected: String },

    /// Persistence decoding hit inconsistent indices or truncated data.
    #[error("corrupt corpus snapshot: {0}")]
    FormatCorrupt(String),

    /// A loaded snapshot was built with a different smoother than the one
    /// the loader is configured with.
    #[error("snapshot was built with smoother {stored:?}, loader configured {configured:?}")]
    SmootherMismatch { stored: String, configured: String },

    /// The caller-provided cancellation flag fired mid-operation. Partial
    /// state is left in place; there is no rollback.
    #[error("operation cancelled")]
    Cancelled,

    /// Stream plumbing failure while saving or loading.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<TokenizeError> for EngineError {
    fn from(err: TokenizeError) -> Self {
        match err {
            TokenizeError::UnknownLanguage(language) => EngineError::UnknownLanguage(language),
            other => EngineError::Parse(other),
        }
    }
}
