//! Source-code tokenization for n-gram naturalness models.
//!
//! The engine's contract with a tokenizer is small: produce the ordered
//! leaf-token stream of a source file, and normalize each token into a
//! short stable string (identifiers collapse to `ID`, numbers to `NUM`,
//! strings to `STR`, and so on) so the model learns code *structure*
//! instead of naming. Comments never reach the stream.
//!
//! [`LexTokenizer`] is a byte-level scanner parameterized by a
//! [`LanguageSpec`]; [`languages`] ships specs for the languages the
//! default registry covers. A heavier syntax-tree parser can be slotted in
//! by implementing [`Tokenizer`]; the registry and the engine only see
//! the trait.
//!
//! Tokenizers hold parser state and are not shareable across threads;
//! [`TokenizerRegistry`] wraps each one in its own mutex and serializes
//! callers through it.

mod languages;
mod scanner;

pub use languages::{go, java, javascript, python, typescript};
pub use scanner::{LanguageSpec, LexTokenizer};

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;
use token_core::Token;

/// Errors produced while turning source bytes into a token stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("unterminated string literal starting at line {line}")]
    UnterminatedString { line: u32 },
    #[error("unterminated block comment starting at line {line}")]
    UnterminatedComment { line: u32 },
    #[error("no tokenizer registered for language {0:?}")]
    UnknownLanguage(String),
}

/// Language-specific tokenization.
///
/// `tokenize` takes `&mut self` because a tokenizer owns a single parser
/// handle; callers must not share one tokenizer across threads without
/// external mutual exclusion. `normalize` is pure and cheap.
pub trait Tokenizer: Send {
    /// Produce the ordered token stream for `source`. Fails when the input
    /// is structurally broken beyond recovery.
    fn tokenize(&mut self, source: &[u8]) -> Result<Vec<Token>, TokenizeError>;

    /// Collapse a token into its normalized categorical form.
    fn normalize(&self, token: &Token) -> String;

    /// The language this tokenizer handles.
    fn language(&self) -> &str;
}

/// Registry mapping language names (and file extensions) to tokenizers.
///
/// Registration is one-shot at startup; lookups serialize through a
/// per-tokenizer mutex, so concurrent callers for different languages do
/// not contend.
pub struct TokenizerRegistry {
    tokenizers: HashMap<String, Mutex<Box<dyn Tokenizer>>>,
    extensions: HashMap<String, String>,
}

impl std::fmt::Debug for TokenizerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenizerRegistry")
            .field("tokenizers", &self.tokenizers.keys().collect::<Vec<_>>())
            .field("extensions", &self.extensions)
            .finish()
    }
}

impl TokenizerRegistry {
    pub fn new() -> Self {
        TokenizerRegistry {
            tokenizers: HashMap::new(),
            extensions: HashMap::new(),
        }
    }

    /// Register a tokenizer for `language`, reachable through the given
    /// file extensions (leading dot included, e.g. `".py"`).
    pub fn register(
        &mut self,
        language: &str,
        tokenizer: Box<dyn Tokenizer>,
        extensions: &[&str],
    ) {
        self.tokenizers
            .insert(language.to_string(), Mutex::new(tokenizer));
        for ext in extensions {
            self.extensions.insert(ext.to_string(), language.to_string());
        }
    }

    /// Whether a tokenizer is registered for `language`.
    pub fn has_language(&self, language: &str) -> bool {
        self.tokenizers.contains_key(language)
    }

    /// Resolve a file extension (with leading dot) to its language name.
    pub fn language_for_extension(&self, extension: &str) -> Option<&str> {
        self.extensions.get(extension).map(String::as_str)
    }

    /// All registered language names, sorted.
    pub fn supported_languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self.tokenizers.keys().cloned().collect();
        languages.sort();
        languages
    }

    /// Tokenize `source` under the named language's tokenizer lock.
    pub fn tokenize(&self, language: &str, source: &[u8]) -> Result<Vec<Token>, TokenizeError> {
        let slot = self
            .tokenizers
            .get(language)
            .ok_or_else(|| TokenizeError::UnknownLanguage(language.to_string()))?;
        let mut tokenizer = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        tokenizer.tokenize(source)
    }

    /// Tokenize and normalize in one pass under the tokenizer lock.
    pub fn tokenize_normalized(
        &self,
        language: &str,
        source: &[u8],
    ) -> Result<Vec<String>, TokenizeError> {
        let slot = self
            .tokenizers
            .get(language)
            .ok_or_else(|| TokenizeError::UnknownLanguage(language.to_string()))?;
        let mut tokenizer = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let tokens = tokenizer.tokenize(source)?;
        Ok(tokens.iter().map(|t| tokenizer.normalize(t)).collect())
    }
}

impl Default for TokenizerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a registry with the bundled language specs registered under the
/// conventional extensions.
pub fn default_registry() -> TokenizerRegistry {
    let mut registry = TokenizerRegistry::new();
    registry.register("go", Box::new(LexTokenizer::new(go())), &[".go"]);
    registry.register(
        "python",
        Box::new(LexTokenizer::new(python())),
        &[".py", ".pyw"],
    );
    registry.register(
        "javascript",
        Box::new(LexTokenizer::new(javascript())),
        &[".js", ".jsx", ".mjs"],
    );
    registry.register(
        "typescript",
        Box::new(LexTokenizer::new(typescript())),
        &[".ts", ".tsx"],
    );
    registry.register("java", Box::new(LexTokenizer::new(java())), &[".java"]);
    registry
}
