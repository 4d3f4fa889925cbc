//! Arena-based n-gram count trie with an optional bloom-filter singleton gate.
//!
//! Nodes are stored in a contiguous arena (`Vec<TrieNode>`) and referenced
//! by opaque [`NodeRef`] handles, which are plain indices: holding a
//! `NodeRef` does not borrow the arena. Children of each node are kept
//! sorted by [`TokenId`] for O(log n) binary search and deterministic
//! traversal order.
//!
//! A path of token ids from the root identifies one n-gram; the terminal
//! node's `count` is the n-gram's observed frequency. Interior nodes of
//! longer paths legitimately carry a zero count. When the bloom gate is
//! enabled, the first occurrence of each distinct n-gram is recorded only
//! in the filter; the trie sees the n-gram from its second occurrence on,
//! so singletons cost bloom bits instead of nodes.

mod bloom;

pub use bloom::{BloomFilter, BloomParams};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use token_core::{ROOT_ID, TokenId};

/// Opaque handle into the trie's node arena.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct NodeRef(u32);

impl NodeRef {
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    #[inline]
    fn from_usize(index: usize) -> Self {
        NodeRef(index as u32)
    }
}

/// A single node in the count trie.
#[derive(Debug, Clone)]
pub struct TrieNode {
    /// Token id this node represents. The root carries [`ROOT_ID`].
    pub token: TokenId,
    /// Observed frequency of the n-gram ending at this node.
    pub count: i64,
    /// Child node references, kept sorted by token id.
    children: Vec<NodeRef>,
}

impl TrieNode {
    fn new(token: TokenId) -> Self {
        TrieNode {
            token,
            count: 0,
            children: Vec::new(),
        }
    }
}

/// One n-gram path (as token ids) with its stored count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NgramCount {
    pub path: Vec<TokenId>,
    pub count: i64,
}

/// Memory usage estimate for a trie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrieMemoryStats {
    /// Nodes reachable from the root (pruned nodes excluded).
    pub node_count: i64,
    pub total_ngrams: i64,
    /// Estimated bytes held by reachable nodes.
    pub node_bytes: i64,
}

/// Flattened trie node for the persistence codec.
///
/// `serial` equals the node's index within the flattened array; the root
/// has serial 0 and `parent = -1`. Child maps are keyed by token id and
/// point at child serials; `BTreeMap` keeps them sorted so identical tries
/// flatten to identical byte streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatNode {
    pub serial: u32,
    pub token: u32,
    pub count: i64,
    pub children: BTreeMap<u32, u32>,
    pub parent: i32,
}

/// Errors surfaced when rebuilding a trie from flattened nodes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlatTrieError {
    #[error("flat node {found} stored at index {index}")]
    SerialMismatch { index: usize, found: u32 },
    #[error("root node must have parent -1, found {0}")]
    BadRoot(i32),
    #[error("child serial {child} out of range for node {node}")]
    ChildOutOfRange { node: u32, child: u32 },
}

/// Arena-based n-gram count trie.
///
/// # Example
///
/// ```
/// use ngram_trie::CountTrie;
/// use token_core::TokenId;
///
/// let mut trie = CountTrie::new();
/// let path = [TokenId(1), TokenId(2), TokenId(3)];
/// trie.insert(&path, 0);
/// trie.insert(&path, 0);
/// assert_eq!(trie.count_of(&path), 2);
/// assert_eq!(trie.total_ngrams(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct CountTrie {
    nodes: Vec<TrieNode>,
    total_ngrams: i64,
    total_tokens: i64,
    bloom: Option<BloomFilter>,
}

impl CountTrie {
    /// Create a trie with a single root node and no bloom gate.
    pub fn new() -> Self {
        CountTrie {
            nodes: vec![TrieNode::new(ROOT_ID)],
            total_ngrams: 0,
            total_tokens: 0,
            bloom: None,
        }
    }

    /// Create a trie whose inserts are gated by a bloom filter: the first
    /// occurrence of each distinct n-gram is only remembered in the filter.
    pub fn with_bloom(params: BloomParams) -> Self {
        let mut trie = Self::new();
        trie.bloom = Some(BloomFilter::from_params(params));
        trie
    }

    /// Whether this trie gates inserts through a bloom filter.
    #[inline]
    pub fn has_bloom(&self) -> bool {
        self.bloom.is_some()
    }

    /// Replace the bloom gate. Used when restoring a snapshot: bloom bits
    /// are not persisted, so a reloaded trie starts with a fresh filter.
    pub fn set_bloom(&mut self, bloom: Option<BloomFilter>) {
        self.bloom = bloom;
    }

    #[inline]
    pub fn root(&self) -> NodeRef {
        NodeRef(0)
    }

    #[inline]
    pub fn node(&self, r: NodeRef) -> &TrieNode {
        &self.nodes[r.as_usize()]
    }

    /// Find an existing child of `parent` matching `token`.
    pub fn find_child(&self, parent: NodeRef, token: TokenId) -> Option<NodeRef> {
        let children = &self.nodes[parent.as_usize()].children;
        children
            .binary_search_by(|child| self.nodes[child.as_usize()].token.cmp(&token))
            .ok()
            .map(|idx| children[idx])
    }

    /// Find or create a child of `parent` matching `token`. Counts are not
    /// touched; only terminal nodes of inserted paths carry counts.
    fn find_or_create_child(&mut self, parent: NodeRef, token: TokenId) -> NodeRef {
        let search = self.nodes[parent.as_usize()]
            .children
            .binary_search_by(|child| self.nodes[child.as_usize()].token.cmp(&token));

        match search {
            Ok(idx) => self.nodes[parent.as_usize()].children[idx],
            Err(idx) => {
                let child = NodeRef::from_usize(self.nodes.len());
                self.nodes.push(TrieNode::new(token));
                self.nodes[parent.as_usize()].children.insert(idx, child);
                child
            }
        }
    }

    /// Insert an n-gram path and increment its terminal count.
    ///
    /// `fingerprint` is the content-addressed 64-bit key of the n-gram; it
    /// is only consulted when the bloom gate is enabled. An empty path is
    /// a no-op.
    pub fn insert(&mut self, path: &[TokenId], fingerprint: u64) {
        if path.is_empty() {
            return;
        }

        if let Some(bloom) = &mut self.bloom {
            if !bloom.contains(fingerprint) {
                // First sighting: remember it in the filter only.
                bloom.insert(fingerprint);
                return;
            }
        }

        let mut current = self.root();
        for &token in path {
            current = self.find_or_create_child(current, token);
        }
        self.nodes[current.as_usize()].count += 1;
        self.total_ngrams += 1;
        self.total_tokens += path.len() as i64;
    }

    /// Stored frequency of an n-gram path. Returns 0 when any step of the
    /// path is missing.
    pub fn count_of(&self, path: &[TokenId]) -> i64 {
        if path.is_empty() {
            return 0;
        }
        let mut current = self.root();
        for &token in path {
            match self.find_child(current, token) {
                Some(child) => current = child,
                None => return 0,
            }
        }
        self.nodes[current.as_usize()].count
    }

    /// Decrement an n-gram's count (floored at zero). Nodes are never
    /// unlinked here; structure stays stable and prune runs separately.
    /// Missing paths are a no-op. The bloom filter is never touched.
    pub fn remove(&mut self, path: &[TokenId]) {
        if path.is_empty() {
            return;
        }
        let mut current = self.root();
        for &token in path {
            match self.find_child(current, token) {
                Some(child) => current = child,
                None => return,
            }
        }
        let node = &mut self.nodes[current.as_usize()];
        if node.count > 0 {
            node.count -= 1;
            self.total_ngrams -= 1;
            self.total_tokens = (self.total_tokens - path.len() as i64).max(0);
        }
    }

    /// Collect every stored n-gram extending `prefix`, in token-id order.
    pub fn all_with_prefix(&self, prefix: &[TokenId]) -> Vec<NgramCount> {
        let mut current = self.root();
        for &token in prefix {
            match self.find_child(current, token) {
                Some(child) => current = child,
                None => return Vec::new(),
            }
        }

        let mut results = Vec::new();
        let mut path = prefix.to_vec();
        self.collect_ngrams(current, &mut path, &mut results);
        results
    }

    fn collect_ngrams(&self, node: NodeRef, path: &mut Vec<TokenId>, results: &mut Vec<NgramCount>) {
        let n = &self.nodes[node.as_usize()];
        if n.count > 0 {
            results.push(NgramCount {
                path: path.clone(),
                count: n.count,
            });
        }
        for &child in &n.children {
            path.push(self.nodes[child.as_usize()].token);
            self.collect_ngrams(child, path, results);
            path.pop();
        }
    }

    /// Remove n-grams with count below `min_count`.
    ///
    /// Post-order: childless nodes below the threshold are unlinked from
    /// their parent; surviving below-threshold counts are zeroed. Every
    /// deducted count is subtracted from `total_ngrams`. Returns the total
    /// count deducted.
    pub fn prune(&mut self, min_count: i64) -> i64 {
        let mut pruned = 0;
        let root = self.root();
        self.prune_node(root, min_count, &mut pruned);
        pruned
    }

    fn prune_node(&mut self, node: NodeRef, min_count: i64, pruned: &mut i64) {
        let child_refs = self.nodes[node.as_usize()].children.clone();
        let mut unlinked = Vec::new();

        for child in child_refs {
            self.prune_node(child, min_count, pruned);

            let c = &self.nodes[child.as_usize()];
            if c.count < min_count && c.children.is_empty() {
                if c.count > 0 {
                    self.total_ngrams -= c.count;
                    *pruned += c.count;
                }
                unlinked.push(child);
            }
        }

        if !unlinked.is_empty() {
            self.nodes[node.as_usize()]
                .children
                .retain(|r| !unlinked.contains(r));
        }

        let n = &mut self.nodes[node.as_usize()];
        if n.count < min_count && n.count > 0 {
            self.total_ngrams -= n.count;
            *pruned += n.count;
            n.count = 0;
        }
    }

    /// Number of distinct tokens directly under the root. For a unigram
    /// trie this is the vocabulary size.
    #[inline]
    pub fn root_child_count(&self) -> usize {
        self.nodes[0].children.len()
    }

    /// Total count over all stored n-grams.
    #[inline]
    pub fn total_ngrams(&self) -> i64 {
        self.total_ngrams
    }

    /// Total tokens across stored insertions (sum of stored path lengths).
    #[inline]
    pub fn total_tokens(&self) -> i64 {
        self.total_tokens
    }

    /// Restore the counters from a snapshot.
    pub fn set_counters(&mut self, total_ngrams: i64, total_tokens: i64) {
        self.total_ngrams = total_ngrams;
        self.total_tokens = total_tokens;
    }

    /// Arena length including unlinked (pruned) slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the trie contains only the root node.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Walk the reachable tree and estimate memory usage.
    pub fn memory_stats(&self) -> TrieMemoryStats {
        let mut node_count = 0i64;
        self.count_nodes(self.root(), &mut node_count);
        let per_node = std::mem::size_of::<TrieNode>() as i64 + 8;
        TrieMemoryStats {
            node_count,
            total_ngrams: self.total_ngrams,
            node_bytes: node_count * per_node,
        }
    }

    fn count_nodes(&self, node: NodeRef, count: &mut i64) {
        *count += 1;
        for &child in &self.nodes[node.as_usize()].children {
            self.count_nodes(child, count);
        }
    }

    /// Flatten the reachable tree into serial-id order (pre-order DFS).
    pub fn flatten(&self) -> Vec<FlatNode> {
        let mut out = Vec::new();
        self.flatten_node(self.root(), -1, &mut out);
        out
    }

    fn flatten_node(&self, node: NodeRef, parent: i32, out: &mut Vec<FlatNode>) -> u32 {
        let serial = out.len() as u32;
        let n = &self.nodes[node.as_usize()];
        out.push(FlatNode {
            serial,
            token: n.token.as_u32(),
            count: n.count,
            children: BTreeMap::new(),
            parent,
        });
        for &child in &n.children {
            let token = self.nodes[child.as_usize()].token.as_u32();
            let child_serial = self.flatten_node(child, serial as i32, out);
            out[serial as usize].children.insert(token, child_serial);
        }
        serial
    }

    /// Rebuild a trie from flattened nodes (two passes: allocate, then wire
    /// children). Counters are not part of the flat form; restore them with
    /// [`set_counters`](Self::set_counters).
    pub fn from_flat(flat: &[FlatNode]) -> Result<Self, FlatTrieError> {
        if flat.is_empty() {
            return Ok(Self::new());
        }

        if flat[0].parent != -1 {
            return Err(FlatTrieError::BadRoot(flat[0].parent));
        }

        let mut nodes = Vec::with_capacity(flat.len());
        for (index, fnode) in flat.iter().enumerate() {
            if fnode.serial as usize != index {
                return Err(FlatTrieError::SerialMismatch {
                    index,
                    found: fnode.serial,
                });
            }
            let mut node = TrieNode::new(TokenId(fnode.token));
            node.count = fnode.count;
            nodes.push(node);
        }

        for fnode in flat {
            for (&_token, &child_serial) in &fnode.children {
                if child_serial as usize >= nodes.len() {
                    return Err(FlatTrieError::ChildOutOfRange {
                        node: fnode.serial,
                        child: child_serial,
                    });
                }
                nodes[fnode.serial as usize]
                    .children
                    .push(NodeRef(child_serial));
            }
            // BTreeMap iterates in token-id order, so children arrive sorted.
        }

        Ok(CountTrie {
            nodes,
            total_ngrams: 0,
            total_tokens: 0,
            bloom: None,
        })
    }
}

impl Default for CountTrie {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u32]) -> Vec<TokenId> {
        raw.iter().map(|&i| TokenId(i)).collect()
    }

    #[test]
    fn new_trie_has_root_only() {
        let trie = CountTrie::new();
        assert!(trie.is_empty());
        assert_eq!(trie.node(trie.root()).token, ROOT_ID);
        assert_eq!(trie.total_ngrams(), 0);
    }

    #[test]
    fn insert_and_count() {
        let mut trie = CountTrie::new();
        let path = ids(&[1, 2, 3]);
        trie.insert(&path, 0);
        assert_eq!(trie.count_of(&path), 1);
        assert_eq!(trie.total_ngrams(), 1);
        assert_eq!(trie.total_tokens(), 3);

        trie.insert(&path, 0);
        assert_eq!(trie.count_of(&path), 2);
        assert_eq!(trie.total_ngrams(), 2);
    }

    #[test]
    fn empty_path_is_noop() {
        let mut trie = CountTrie::new();
        trie.insert(&[], 0);
        assert!(trie.is_empty());
        assert_eq!(trie.count_of(&[]), 0);
    }

    #[test]
    fn interior_nodes_carry_no_count() {
        let mut trie = CountTrie::new();
        trie.insert(&ids(&[1, 2, 3]), 0);
        assert_eq!(trie.count_of(&ids(&[1])), 0);
        assert_eq!(trie.count_of(&ids(&[1, 2])), 0);
    }

    #[test]
    fn count_of_missing_path_is_zero() {
        let mut trie = CountTrie::new();
        trie.insert(&ids(&[1, 2]), 0);
        assert_eq!(trie.count_of(&ids(&[1, 3])), 0);
        assert_eq!(trie.count_of(&ids(&[9])), 0);
    }

    #[test]
    fn remove_decrements_and_floors() {
        let mut trie = CountTrie::new();
        let path = ids(&[4, 5]);
        trie.insert(&path, 0);
        trie.insert(&path, 0);

        trie.remove(&path);
        assert_eq!(trie.count_of(&path), 1);
        assert_eq!(trie.total_ngrams(), 1);

        trie.remove(&path);
        trie.remove(&path); // already at zero
        assert_eq!(trie.count_of(&path), 0);
        assert_eq!(trie.total_ngrams(), 0);
    }

    #[test]
    fn remove_missing_path_is_noop() {
        let mut trie = CountTrie::new();
        trie.insert(&ids(&[1]), 0);
        trie.remove(&ids(&[2]));
        assert_eq!(trie.total_ngrams(), 1);
    }

    #[test]
    fn insert_remove_insert_matches_call_balance() {
        let mut trie = CountTrie::new();
        let g = ids(&[7, 8, 9]);
        for _ in 0..5 {
            trie.insert(&g, 0);
        }
        for _ in 0..2 {
            trie.remove(&g);
        }
        assert_eq!(trie.count_of(&g), 3);
    }

    #[test]
    fn children_sorted_by_token_id() {
        let mut trie = CountTrie::new();
        trie.insert(&ids(&[10]), 0);
        trie.insert(&ids(&[3]), 0);
        trie.insert(&ids(&[7]), 0);

        let root = trie.root();
        let tokens: Vec<u32> = trie.nodes[root.as_usize()]
            .children
            .iter()
            .map(|&r| trie.node(r).token.as_u32())
            .collect();
        assert_eq!(tokens, vec![3, 7, 10]);
    }

    #[test]
    fn all_with_prefix_collects_descendants() {
        let mut trie = CountTrie::new();
        trie.insert(&ids(&[1, 2, 3]), 0);
        trie.insert(&ids(&[1, 2, 4]), 0);
        trie.insert(&ids(&[1, 5, 6]), 0);
        trie.insert(&ids(&[2, 2, 3]), 0);

        let found = trie.all_with_prefix(&ids(&[1, 2]));
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].path, ids(&[1, 2, 3]));
        assert_eq!(found[1].path, ids(&[1, 2, 4]));
        assert!(found.iter().all(|n| n.count == 1));
    }

    #[test]
    fn all_with_prefix_missing_prefix_is_empty() {
        let mut trie = CountTrie::new();
        trie.insert(&ids(&[1, 2]), 0);
        assert!(trie.all_with_prefix(&ids(&[3])).is_empty());
    }

    #[test]
    fn all_with_prefix_empty_prefix_returns_everything() {
        let mut trie = CountTrie::new();
        trie.insert(&ids(&[1]), 0);
        trie.insert(&ids(&[2, 3]), 0);
        let all = trie.all_with_prefix(&[]);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn prune_min_count_one_is_noop() {
        let mut trie = CountTrie::new();
        trie.insert(&ids(&[1, 2]), 0);
        trie.insert(&ids(&[1, 3]), 0);
        let deducted = trie.prune(1);
        assert_eq!(deducted, 0);
        assert_eq!(trie.total_ngrams(), 2);
        assert_eq!(trie.count_of(&ids(&[1, 2])), 1);
    }

    #[test]
    fn prune_removes_low_count_leaves() {
        let mut trie = CountTrie::new();
        let keep = ids(&[1, 2]);
        let drop = ids(&[1, 3]);
        for _ in 0..5 {
            trie.insert(&keep, 0);
        }
        trie.insert(&drop, 0);

        let deducted = trie.prune(2);
        assert_eq!(deducted, 1);
        assert_eq!(trie.count_of(&keep), 5);
        assert_eq!(trie.count_of(&drop), 0);
        assert_eq!(trie.total_ngrams(), 5);
        // The pruned leaf is unlinked.
        let child_1 = trie.find_child(trie.root(), TokenId(1)).unwrap();
        assert!(trie.find_child(child_1, TokenId(3)).is_none());
    }

    #[test]
    fn prune_everything_clears_totals() {
        let mut trie = CountTrie::new();
        trie.insert(&ids(&[1, 2]), 0);
        trie.insert(&ids(&[3]), 0);
        trie.insert(&ids(&[3]), 0);

        let deducted = trie.prune(i64::MAX);
        assert_eq!(deducted, 3);
        assert_eq!(trie.total_ngrams(), 0);
        assert_eq!(trie.count_of(&ids(&[1, 2])), 0);
        assert_eq!(trie.count_of(&ids(&[3])), 0);
    }

    #[test]
    fn bloom_suppresses_first_occurrence() {
        let mut trie = CountTrie::with_bloom(BloomParams {
            expected_items: 1000,
            false_positive_rate: 0.01,
        });
        let path = ids(&[1, 2, 3]);
        let fp = 0xDEAD_BEEF_u64;

        trie.insert(&path, fp);
        assert_eq!(trie.count_of(&path), 0, "first occurrence suppressed");

        trie.insert(&path, fp);
        assert_eq!(trie.count_of(&path), 1, "second occurrence stored");

        trie.insert(&path, fp);
        assert_eq!(trie.count_of(&path), 2);
    }

    #[test]
    fn remove_never_touches_bloom() {
        let mut trie = CountTrie::with_bloom(BloomParams {
            expected_items: 1000,
            false_positive_rate: 0.01,
        });
        let path = ids(&[1, 2]);
        let fp = 42u64;

        trie.insert(&path, fp); // gated
        trie.remove(&path); // no-op on count 0, must not reset the gate
        trie.insert(&path, fp);
        assert_eq!(trie.count_of(&path), 1);
    }

    #[test]
    fn root_child_count_tracks_distinct_unigrams() {
        let mut trie = CountTrie::new();
        trie.insert(&ids(&[1]), 0);
        trie.insert(&ids(&[1]), 0);
        trie.insert(&ids(&[2]), 0);
        assert_eq!(trie.root_child_count(), 2);
    }

    #[test]
    fn memory_stats_counts_reachable_nodes() {
        let mut trie = CountTrie::new();
        trie.insert(&ids(&[1, 2, 3]), 0);
        let stats = trie.memory_stats();
        assert_eq!(stats.node_count, 4); // root + 3 path nodes
        assert_eq!(stats.total_ngrams, 1);
        assert!(stats.node_bytes > 0);
    }

    #[test]
    fn flatten_assigns_serials_in_dfs_order() {
        let mut trie = CountTrie::new();
        trie.insert(&ids(&[1, 2]), 0);
        trie.insert(&ids(&[3]), 0);

        let flat = trie.flatten();
        assert_eq!(flat.len(), 4);
        assert_eq!(flat[0].parent, -1);
        assert_eq!(flat[0].token, 0);
        for (i, node) in flat.iter().enumerate() {
            assert_eq!(node.serial as usize, i);
        }
        // Root's child map references tokens 1 and 3.
        let root_children: Vec<u32> = flat[0].children.keys().copied().collect();
        assert_eq!(root_children, vec![1, 3]);
    }

    #[test]
    fn flatten_from_flat_roundtrip() {
        let mut trie = CountTrie::new();
        trie.insert(&ids(&[1, 2, 3]), 0);
        trie.insert(&ids(&[1, 2, 3]), 0);
        trie.insert(&ids(&[1, 4]), 0);
        trie.insert(&ids(&[5]), 0);

        let flat = trie.flatten();
        let mut back = CountTrie::from_flat(&flat).unwrap();
        back.set_counters(trie.total_ngrams(), trie.total_tokens());

        assert_eq!(back.count_of(&ids(&[1, 2, 3])), 2);
        assert_eq!(back.count_of(&ids(&[1, 4])), 1);
        assert_eq!(back.count_of(&ids(&[5])), 1);
        assert_eq!(back.count_of(&ids(&[1, 2])), 0); // interior node
        assert_eq!(back.total_ngrams(), 4);
        assert_eq!(back.flatten(), flat, "flatten is stable across a roundtrip");
    }

    #[test]
    fn from_flat_empty_is_fresh_trie() {
        let trie = CountTrie::from_flat(&[]).unwrap();
        assert!(trie.is_empty());
    }

    #[test]
    fn from_flat_rejects_serial_mismatch() {
        let flat = vec![FlatNode {
            serial: 5,
            token: 0,
            count: 0,
            children: BTreeMap::new(),
            parent: -1,
        }];
        assert!(matches!(
            CountTrie::from_flat(&flat),
            Err(FlatTrieError::SerialMismatch { .. })
        ));
    }

    #[test]
    fn from_flat_rejects_dangling_child() {
        let mut children = BTreeMap::new();
        children.insert(1u32, 7u32);
        let flat = vec![FlatNode {
            serial: 0,
            token: 0,
            count: 0,
            children,
            parent: -1,
        }];
        assert!(matches!(
            CountTrie::from_flat(&flat),
            Err(FlatTrieError::ChildOutOfRange { .. })
        ));
    }

    #[test]
    fn from_flat_rejects_bad_root_parent() {
        let flat = vec![FlatNode {
            serial: 0,
            token: 0,
            count: 0,
            children: BTreeMap::new(),
            parent: 3,
        }];
        assert!(matches!(
            CountTrie::from_flat(&flat),
            Err(FlatTrieError::BadRoot(3))
        ));
    }

    #[test]
    fn flat_node_serde_roundtrip() {
        let mut trie = CountTrie::new();
        trie.insert(&ids(&[1, 2]), 0);
        let flat = trie.flatten();

        let json = serde_json::to_string(&flat).unwrap();
        let back: Vec<FlatNode> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flat);
    }
}
