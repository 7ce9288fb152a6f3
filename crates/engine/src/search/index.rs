//! Index snapshot and atomic publication
//!
//! An [`IndexSnapshot`] holds three term maps built from the same dataset:
//! - **exact**: token → ids of items containing the token
//! - **prefix**: every prefix of length `1..=min(len, prefix_max)` → ids
//! - **ngram**: every window of `ngram_size` chars → ids; tokens shorter than
//!   `ngram_size` map as a whole
//!
//! Snapshots are immutable once built. [`SnapshotHandle`] publishes a new
//! snapshot with a single reference swap, so readers see either the old
//! snapshot in full or the new one in full.

use super::tokenizer::{char_len, char_prefix, char_windows, tokenize};
use parking_lot::RwLock;
use quarry_core::{IdSet, Item, ItemId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Map from index key to the set of ids carrying it
pub type TermMap = FxHashMap<String, IdSet>;

// ============================================================================
// IndexKind
// ============================================================================

/// Which of the three term maps a key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Whole tokens
    Exact,
    /// Token prefixes
    Prefix,
    /// Fixed-width char windows
    Ngram,
}

impl IndexKind {
    /// All kinds, in staging order
    pub const ALL: [IndexKind; 3] = [IndexKind::Exact, IndexKind::Prefix, IndexKind::Ngram];

    /// Stable name used in staging keys and logs
    pub fn as_str(self) -> &'static str {
        match self {
            IndexKind::Exact => "exact",
            IndexKind::Prefix => "prefix",
            IndexKind::Ngram => "ngram",
        }
    }

    /// On-disk discriminant
    pub(crate) fn code(self) -> u32 {
        match self {
            IndexKind::Exact => 0,
            IndexKind::Prefix => 1,
            IndexKind::Ngram => 2,
        }
    }

    pub(crate) fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(IndexKind::Exact),
            1 => Some(IndexKind::Prefix),
            2 => Some(IndexKind::Ngram),
            _ => None,
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TermMaps
// ============================================================================

/// The three term maps, without dataset metadata.
///
/// Used both for a single batch during staging and for the merged result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermMaps {
    exact: TermMap,
    prefix: TermMap,
    ngram: TermMap,
}

impl TermMaps {
    /// Index every token of `item`'s searchable text.
    pub fn add_item(&mut self, item: &Item, prefix_max: usize, ngram_size: usize) {
        for token in tokenize(&item.searchable_text()) {
            self.add_token(item.id, &token, prefix_max, ngram_size);
        }
    }

    fn add_token(&mut self, id: ItemId, token: &str, prefix_max: usize, ngram_size: usize) {
        let len = char_len(token);

        for n in 1..=len.min(prefix_max) {
            insert(&mut self.prefix, char_prefix(token, n), id);
        }

        if len >= ngram_size {
            for gram in char_windows(token, ngram_size) {
                insert(&mut self.ngram, gram, id);
            }
        } else {
            insert(&mut self.ngram, token, id);
        }

        insert(&mut self.exact, token, id);
    }

    /// Borrow one map
    pub fn map(&self, kind: IndexKind) -> &TermMap {
        match kind {
            IndexKind::Exact => &self.exact,
            IndexKind::Prefix => &self.prefix,
            IndexKind::Ngram => &self.ngram,
        }
    }

    pub(crate) fn map_mut(&mut self, kind: IndexKind) -> &mut TermMap {
        match kind {
            IndexKind::Exact => &mut self.exact,
            IndexKind::Prefix => &mut self.prefix,
            IndexKind::Ngram => &mut self.ngram,
        }
    }

    /// True if no keys in any map
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.prefix.is_empty() && self.ngram.is_empty()
    }
}

/// Add `id` under `key`, allocating the key only when it is new.
#[inline]
fn insert(map: &mut TermMap, key: &str, id: ItemId) {
    match map.get_mut(key) {
        Some(ids) => {
            ids.insert(id);
        }
        None => {
            let mut ids = IdSet::default();
            ids.insert(id);
            map.insert(key.to_owned(), ids);
        }
    }
}

// ============================================================================
// IndexSnapshot
// ============================================================================

/// Key counts per map, for telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexStats {
    /// Items the snapshot was built from
    pub items: usize,
    /// Distinct exact tokens
    pub tokens: usize,
    /// Distinct prefixes
    pub prefixes: usize,
    /// Distinct n-grams
    pub ngrams: usize,
}

/// An immutable, fully built set of the three indexes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSnapshot {
    maps: TermMaps,
    item_count: usize,
    prefix_max: usize,
    ngram_size: usize,
}

impl IndexSnapshot {
    /// Wrap merged term maps.
    pub fn new(maps: TermMaps, item_count: usize, prefix_max: usize, ngram_size: usize) -> Self {
        IndexSnapshot {
            maps,
            item_count,
            prefix_max,
            ngram_size,
        }
    }

    /// Ids of items containing `token`
    pub fn exact(&self, token: &str) -> Option<&IdSet> {
        self.maps.exact.get(token)
    }

    /// Ids of items with a token starting with `prefix`
    pub fn prefix(&self, prefix: &str) -> Option<&IdSet> {
        self.maps.prefix.get(prefix)
    }

    /// Ids of items with a token containing `gram` (or equal to it, for
    /// tokens shorter than the n-gram width)
    pub fn ngram(&self, gram: &str) -> Option<&IdSet> {
        self.maps.ngram.get(gram)
    }

    /// Borrow one map
    pub fn map(&self, kind: IndexKind) -> &TermMap {
        self.maps.map(kind)
    }

    /// Number of items indexed
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Longest indexed prefix
    pub fn prefix_max(&self) -> usize {
        self.prefix_max
    }

    /// N-gram width
    pub fn ngram_size(&self) -> usize {
        self.ngram_size
    }

    /// Key counts
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            items: self.item_count,
            tokens: self.maps.exact.len(),
            prefixes: self.maps.prefix.len(),
            ngrams: self.maps.ngram.len(),
        }
    }
}

// ============================================================================
// SnapshotHandle
// ============================================================================

struct Published {
    snapshot: Option<Arc<IndexSnapshot>>,
    generation: u64,
}

/// Holder of the active snapshot.
///
/// # Thread Safety
///
/// `current()` clones an `Arc` under a read lock; `publish()` swaps it under
/// a write lock. A reader that already holds the old `Arc` keeps using it
/// until it drops it.
pub struct SnapshotHandle {
    inner: RwLock<Published>,
}

impl Default for SnapshotHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotHandle {
    /// Create a handle with no snapshot (generation 0)
    pub fn new() -> Self {
        SnapshotHandle {
            inner: RwLock::new(Published {
                snapshot: None,
                generation: 0,
            }),
        }
    }

    /// The active snapshot, if one has been published
    pub fn current(&self) -> Option<Arc<IndexSnapshot>> {
        self.inner.read().snapshot.clone()
    }

    /// The active snapshot together with its generation
    pub fn current_with_generation(&self) -> (Option<Arc<IndexSnapshot>>, u64) {
        let guard = self.inner.read();
        (guard.snapshot.clone(), guard.generation)
    }

    /// Generation of the active snapshot (0 before the first publish)
    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    /// Replace the active snapshot. Returns the new generation.
    pub fn publish(&self, snapshot: IndexSnapshot) -> u64 {
        let snapshot = Arc::new(snapshot);
        let mut guard = self.inner.write();
        guard.snapshot = Some(snapshot);
        guard.generation += 1;
        guard.generation
    }
}
