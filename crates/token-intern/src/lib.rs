//! Interning table mapping token strings to compact [`TokenId`] values.
//!
//! The table maintains two parallel structures:
//! - `token_to_id`: hash map for O(1) lookup of known tokens
//! - `id_to_token`: strings in assignment order (index = TokenId)
//!
//! Id 0 is pre-populated with the `<ROOT>` sentinel; real tokens start at
//! id 1. The reverse vector is append-only and ids are never reclaimed, so
//! ids stay stable for the table's whole lifetime. Serializing captures
//! both maps; a reloaded table continues assigning from
//! `next_id = id_to_token.len()`.

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use token_core::{ROOT_ID, ROOT_TOKEN, TokenId};

/// Bidirectional `string <-> TokenId` mapping with append-only ids.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InternTable {
    /// Known token -> id. Does not contain the root sentinel under its
    /// string form; `lookup("<ROOT>")` intentionally resolves to [`ROOT_ID`].
    token_to_id: FxHashMap<String, TokenId>,
    /// Id -> token string. `id_to_token[0]` is always `<ROOT>`.
    id_to_token: Vec<String>,
}

impl InternTable {
    /// Create a table holding only the root sentinel at id 0.
    pub fn new() -> Self {
        let mut token_to_id = FxHashMap::default();
        token_to_id.insert(ROOT_TOKEN.to_string(), ROOT_ID);
        InternTable {
            token_to_id,
            id_to_token: vec![ROOT_TOKEN.to_string()],
        }
    }

    /// Return the id for `token`, assigning the next free id if unseen.
    pub fn intern(&mut self, token: &str) -> TokenId {
        if let Some(&id) = self.token_to_id.get(token) {
            return id;
        }
        let id = TokenId::from_usize(self.id_to_token.len());
        self.token_to_id.insert(token.to_string(), id);
        self.id_to_token.push(token.to_string());
        id
    }

    /// Look up a token without interning it. Returns `None` for unknown
    /// strings.
    pub fn lookup(&self, token: &str) -> Option<TokenId> {
        self.token_to_id.get(token).copied()
    }

    /// Resolve an id back to its token string. Out-of-range ids resolve to
    /// the empty string.
    pub fn resolve(&self, id: TokenId) -> &str {
        self.id_to_token
            .get(id.as_usize())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Number of entries including the root sentinel.
    #[inline]
    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    /// Whether the table holds only the sentinel.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.id_to_token.len() <= 1
    }

    /// Number of real (non-sentinel) tokens.
    #[inline]
    pub fn token_count(&self) -> usize {
        self.id_to_token.len() - 1
    }

    /// Approximate heap bytes held by the stored strings.
    pub fn string_bytes(&self) -> usize {
        self.id_to_token.iter().map(|s| s.len() + 16).sum()
    }
}

impl Default for InternTable {
    fn default() -> Self {
        Self::new()
    }
}
