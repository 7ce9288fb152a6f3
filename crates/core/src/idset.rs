//! Id set algebra
//!
//! `IdSet` is the set type used by every index posting and every query
//! result. Intersections always iterate the smallest set and probe the rest.

use crate::types::ItemId;
use rustc_hash::FxHashSet;
use std::borrow::Borrow;

/// Set of item ids
pub type IdSet = FxHashSet<ItemId>;

/// Union `src` into `dst`.
#[inline]
pub fn union_into(dst: &mut IdSet, src: &IdSet) {
    dst.extend(src.iter().copied());
}

/// Intersect all sets, smallest first.
///
/// An empty input yields an empty set.
pub fn intersect_all<S: Borrow<IdSet>>(sets: &[S]) -> IdSet {
    let mut ordered: Vec<&IdSet> = sets.iter().map(|s| s.borrow()).collect();
    ordered.sort_by_key(|s| s.len());

    let Some((smallest, rest)) = ordered.split_first() else {
        return IdSet::default();
    };

    smallest
        .iter()
        .copied()
        .filter(|id| rest.iter().all(|s| s.contains(id)))
        .collect()
}
