//! Per-session view state
//!
//! A [`SessionState`] owns one user's view over the dataset:
//! - `order`: a permutation of `1..=N`, with its inverse kept in step
//! - `selected`: selected ids in insertion order
//! - `view_state`: search text and sort settings
//! - `search_cache`: memoized, ordered matches per query
//! - `search_orders`: user-pinned orderings per query
//!
//! A session is either uninitialized or initialized; once initialized it
//! never reverts. Every operation other than [`SessionState::initialize`]
//! assumes the initialized state.
//!
//! Query keys for the cache and the pinned orders are the trimmed query.
//! Every accessor that hands out ids returns an owned copy or a shared
//! borrow, never a handle into mutable internal storage.

use quarry_core::{intersect_all, union_into, Error, IdSet, ItemId, Result};
use quarry_engine::search::{tokenize, IndexSnapshot};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Deserializer, Serialize};

/// Position marker for ids not present in `order`
const ABSENT: usize = usize::MAX;

// ============================================================================
// ViewState
// ============================================================================

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

/// What the user is looking at
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Active search text
    pub search: String,
    /// Field the view is sorted by, if any
    pub sort_by: Option<String>,
    /// Sort direction
    pub sort_dir: SortDir,
}

/// Partial update of a [`ViewState`]; absent fields are left unchanged.
///
/// `sort_by: Some(None)` clears the sort field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewStatePatch {
    /// New search text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// New sort field (`null` clears it)
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub sort_by: Option<Option<String>>,
    /// New sort direction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_dir: Option<SortDir>,
}

/// Distinguish a field set to `null` from a missing field.
fn present_or_null<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl ViewState {
    fn apply(&mut self, patch: ViewStatePatch) {
        if let Some(search) = patch.search {
            self.search = search;
        }
        if let Some(sort_by) = patch.sort_by {
            self.sort_by = sort_by;
        }
        if let Some(sort_dir) = patch.sort_dir {
            self.sort_dir = sort_dir;
        }
    }
}

// ============================================================================
// SessionState
// ============================================================================

/// One user's mutable view over the dataset
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    initialized: bool,
    order: Vec<ItemId>,
    /// `order_index[id]` is the position of `id` in `order`; slot 0 unused
    order_index: Vec<usize>,
    selected: Vec<ItemId>,
    view_state: ViewState,
    search_cache: FxHashMap<String, Vec<ItemId>>,
    search_orders: FxHashMap<String, Vec<ItemId>>,
    /// Snapshot generation this session's caches were computed against
    pub(crate) generation: u64,
}

impl SessionState {
    /// Create an uninitialized session
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether [`initialize`](Self::initialize) has run
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Set identity order over `n` items with empty selection and caches.
    ///
    /// No-op if already initialized.
    pub fn initialize(&mut self, n: usize) {
        if self.initialized {
            return;
        }
        self.order = (1..=n as ItemId).collect();
        self.order_index = build_order_index(&self.order);
        self.selected = Vec::new();
        self.view_state = ViewState::default();
        self.search_cache.clear();
        self.search_orders.clear();
        self.initialized = true;
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current global order
    pub fn order(&self) -> &[ItemId] {
        &self.order
    }

    /// Number of ids in the order
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if the order is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Position of `id` in the order
    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.order_index
            .get(id as usize)
            .copied()
            .filter(|&pos| pos != ABSENT)
    }

    /// Selected ids, in selection order
    pub fn selected(&self) -> &[ItemId] {
        &self.selected
    }

    /// Current view settings
    pub fn view_state(&self) -> &ViewState {
        &self.view_state
    }

    /// Pinned order for `query`, if any
    pub fn search_order(&self, query: &str) -> Option<&[ItemId]> {
        self.search_orders.get(query.trim()).map(Vec::as_slice)
    }

    /// Cached matches for `query`, if any
    pub fn cached_matches(&self, query: &str) -> Option<&[ItemId]> {
        self.search_cache.get(query.trim()).map(Vec::as_slice)
    }

    // ========================================================================
    // Matching
    // ========================================================================

    /// Ids matching `query`, ordered for this session.
    ///
    /// Each token's candidates are its exact-token ids united with the ids
    /// under the token as a prefix; the tokens' candidate sets are then
    /// intersected. Ordering: the pinned order for this query (restricted to
    /// the matches) followed by any remaining matches in global order; with
    /// no pinned order, all matches in global order.
    ///
    /// The result is cached per trimmed query and returned as a copy. A blank
    /// query or a missing snapshot yields an empty list without caching.
    pub fn build_matching_array(
        &mut self,
        query: &str,
        snapshot: Option<&IndexSnapshot>,
    ) -> Vec<ItemId> {
        let key = query.trim();
        if key.is_empty() {
            return Vec::new();
        }
        if let Some(cached) = self.search_cache.get(key) {
            return cached.clone();
        }
        let Some(snapshot) = snapshot else {
            return Vec::new();
        };

        let ordered = match self.matched_set(key, snapshot) {
            Some(matched) if !matched.is_empty() => self.order_matches(key, matched),
            _ => Vec::new(),
        };

        self.search_cache.insert(key.to_owned(), ordered.clone());
        ordered
    }

    /// Intersection of per-token exact ∪ prefix candidates.
    ///
    /// `None` when there are no tokens or a token has no candidates.
    fn matched_set(&self, key: &str, snapshot: &IndexSnapshot) -> Option<IdSet> {
        let tokens = tokenize(key);
        if tokens.is_empty() {
            return None;
        }

        let mut per_token = Vec::with_capacity(tokens.len());
        for token in &tokens {
            let exact = snapshot.exact(token);
            let prefix = snapshot.prefix(token);
            let candidates = match (exact, prefix) {
                (None, None) => return None,
                (Some(ids), None) | (None, Some(ids)) => ids.clone(),
                (Some(exact), Some(prefix)) => {
                    let mut union = exact.clone();
                    union_into(&mut union, prefix);
                    union
                }
            };
            per_token.push(candidates);
        }
        Some(intersect_all(&per_token))
    }

    fn order_matches(&self, key: &str, matched: IdSet) -> Vec<ItemId> {
        match self.search_orders.get(key).filter(|pinned| !pinned.is_empty()) {
            Some(pinned) => {
                let mut ordered: Vec<ItemId> = pinned
                    .iter()
                    .copied()
                    .filter(|id| matched.contains(id))
                    .collect();
                if ordered.len() < matched.len() {
                    let pinned_set: FxHashSet<ItemId> = pinned.iter().copied().collect();
                    let mut missing: Vec<ItemId> = matched
                        .into_iter()
                        .filter(|id| !pinned_set.contains(id))
                        .collect();
                    self.sort_by_position(&mut missing);
                    ordered.extend(missing);
                }
                ordered
            }
            None => {
                let mut ids: Vec<ItemId> = matched.into_iter().collect();
                self.sort_by_position(&mut ids);
                ids
            }
        }
    }

    /// Sort by global position; ids outside the order go last, by id.
    fn sort_by_position(&self, ids: &mut [ItemId]) {
        ids.sort_unstable_by_key(|&id| (self.position(id).unwrap_or(ABSENT), id));
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Replace the global order.
    ///
    /// Clears the search cache; pinned orders are kept and recombined with
    /// the new order on next access.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if `new_order` is not a permutation of the
    /// current ids `1..=N`.
    pub fn update_order(&mut self, new_order: Vec<ItemId>) -> Result<()> {
        validate_permutation(&new_order, self.order.len())?;
        self.order = new_order;
        self.order_index = build_order_index(&self.order);
        self.search_cache.clear();
        Ok(())
    }

    /// Move `source` to the position `destination` occupies, shifting the
    /// ids in between by one.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if either id is not in the order.
    pub fn reorder(&mut self, source: ItemId, destination: ItemId) -> Result<()> {
        let from = self.position(source).ok_or(Error::NotFound { id: source })?;
        let to = self
            .position(destination)
            .ok_or(Error::NotFound { id: destination })?;

        let moved = self.order.remove(from);
        self.order.insert(to, moved);

        let (lo, hi) = if from < to { (from, to) } else { (to, from) };
        for pos in lo..=hi {
            self.order_index[self.order[pos] as usize] = pos;
        }
        self.search_cache.clear();
        Ok(())
    }

    /// Add (`select = true`) or remove ids from the selection.
    ///
    /// Selecting appends ids not yet selected, keeping the existing order.
    /// Always installs a fresh vector.
    pub fn update_selection(&mut self, ids: &[ItemId], select: bool) {
        let mut next = self.selected.clone();
        if select {
            let mut present: FxHashSet<ItemId> = next.iter().copied().collect();
            for &id in ids {
                if present.insert(id) {
                    next.push(id);
                }
            }
        } else {
            let removed: FxHashSet<ItemId> = ids.iter().copied().collect();
            next.retain(|id| !removed.contains(id));
        }
        self.selected = next;
    }

    /// Shallow-merge `patch` into the view state.
    pub fn update_view_state(&mut self, patch: ViewStatePatch) {
        self.view_state.apply(patch);
    }

    /// Pin an ordering for `query` and seed the cache with it.
    pub fn update_search_order(&mut self, query: &str, order: Vec<ItemId>) {
        let key = query.trim().to_owned();
        self.search_cache.insert(key.clone(), order.clone());
        self.search_orders.insert(key, order);
    }

    /// Align the session with a rebuilt dataset of `n` items.
    ///
    /// Drops the search cache and every pinned order. If the item count
    /// changed, the order resets to identity and selected ids outside
    /// `1..=n` are dropped.
    pub(crate) fn reset_for_rebuild(&mut self, n: usize) {
        self.search_cache.clear();
        self.search_orders.clear();
        if n != self.order.len() {
            self.order = (1..=n as ItemId).collect();
            self.order_index = build_order_index(&self.order);
            self.selected.retain(|&id| id >= 1 && id as usize <= n);
        }
    }
}

/// Inverse of `order`, indexed by id.
fn build_order_index(order: &[ItemId]) -> Vec<usize> {
    let max_id = order.iter().copied().max().unwrap_or(0) as usize;
    let mut index = vec![ABSENT; max_id + 1];
    for (pos, &id) in order.iter().enumerate() {
        index[id as usize] = pos;
    }
    index
}

fn validate_permutation(order: &[ItemId], n: usize) -> Result<()> {
    if order.len() != n {
        return Err(Error::invalid_input(format!(
            "order has {} ids, expected {}",
            order.len(),
            n
        )));
    }
    let mut seen = vec![false; n + 1];
    for &id in order {
        let slot = id as usize;
        if slot == 0 || slot > n {
            return Err(Error::invalid_input(format!(
                "id {} is outside 1..={}",
                id, n
            )));
        }
        if std::mem::replace(&mut seen[slot], true) {
            return Err(Error::invalid_input(format!("id {} appears twice", id)));
        }
    }
    Ok(())
}
