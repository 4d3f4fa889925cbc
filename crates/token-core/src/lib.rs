//! Core token types for n-gram code models.
//!
//! This crate defines the foundational vocabulary shared by the tokenizer,
//! the interning table and the tries: a lexical [`Token`] as produced by a
//! source-code tokenizer, and the compact [`TokenId`] assigned to each
//! distinct normalized token.

use serde::{Deserialize, Serialize};

/// Compact identifier assigned to a normalized token by an interning table.
///
/// Ids are assigned in first-seen order and never reused. Id 0 is reserved
/// for the trie-root sentinel [`ROOT_ID`]; real tokens start at id 1.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct TokenId(pub u32);

impl TokenId {
    /// Raw u32 value.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Convert to usize for indexing.
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Create a TokenId from a usize index. Panics if index > u32::MAX.
    #[inline]
    pub fn from_usize(index: usize) -> Self {
        assert!(index <= u32::MAX as usize, "TokenId overflow: {index}");
        TokenId(index as u32)
    }
}

/// Sentinel id of the trie root. Never assigned to a real token.
pub const ROOT_ID: TokenId = TokenId(0);

/// String interned at [`ROOT_ID`].
pub const ROOT_TOKEN: &str = "<ROOT>";

/// A single lexical token extracted from source code.
///
/// `kind` is the tokenizer-assigned category (e.g. `"identifier"`,
/// `"number"`, `"string"`); `text` is the raw lexeme. Positions are
/// 1-indexed. Tokens carry no further meaning until normalized.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Token {
    pub kind: String,
    pub text: String,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn new(kind: impl Into<String>, text: impl Into<String>, line: u32, column: u32) -> Self {
        Token {
            kind: kind.into(),
            text: text.into(),
            line,
            column,
        }
    }
}
