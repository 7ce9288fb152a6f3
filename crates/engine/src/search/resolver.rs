//! Multi-token query resolution against an [`IndexSnapshot`]
//!
//! Every query token gathers a candidate set; the result is the
//! intersection of all candidate sets (strict AND).
//!
//! Candidates for token `t` at position `i` of `k`:
//! 1. `exact[t]`
//! 2. if `i == k - 1`: `prefix[t[..l]]` for `l` in
//!    `min(len, 3)..=min(len, prefix_max)` (typing the trailing word)
//! 3. if `len < ngram_size`: `ngram[t]`

use super::index::IndexSnapshot;
use super::tokenizer::{char_len, char_prefix, tokenize};
use quarry_core::{intersect_all, union_into, IdSet};

/// Shortest trailing-token prefix consulted for incremental matching
pub const TRAILING_PREFIX_MIN: usize = 3;

/// Outcome of resolving a query
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Blank query: the caller shows its unfiltered order
    NoFilter,
    /// Ids matching every query token (possibly empty)
    Matched(IdSet),
}

impl Resolution {
    /// True for [`Resolution::NoFilter`]
    pub fn is_no_filter(&self) -> bool {
        matches!(self, Resolution::NoFilter)
    }

    /// Matched ids, `None` for [`Resolution::NoFilter`]
    pub fn into_matched(self) -> Option<IdSet> {
        match self {
            Resolution::NoFilter => None,
            Resolution::Matched(ids) => Some(ids),
        }
    }
}

/// Resolve `query` against `snapshot`.
///
/// Never fails: a missing snapshot or an unmatched token yields an empty
/// match set.
pub fn resolve(query: &str, snapshot: Option<&IndexSnapshot>) -> Resolution {
    if query.trim().is_empty() {
        return Resolution::NoFilter;
    }
    let Some(snapshot) = snapshot else {
        return Resolution::Matched(IdSet::default());
    };

    let tokens = tokenize(query);
    if tokens.is_empty() {
        return Resolution::Matched(IdSet::default());
    }

    let last = tokens.len() - 1;
    let mut per_token: Vec<IdSet> = Vec::with_capacity(tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        match token_candidates(snapshot, token, i == last) {
            Some(candidates) => per_token.push(candidates),
            None => return Resolution::Matched(IdSet::default()),
        }
    }

    Resolution::Matched(intersect_all(&per_token))
}

/// Union of every index source that applies to `token`.
///
/// `None` when no source has the token at all.
fn token_candidates(snapshot: &IndexSnapshot, token: &str, trailing: bool) -> Option<IdSet> {
    let len = char_len(token);
    let mut sources: Vec<&IdSet> = Vec::new();

    if let Some(ids) = snapshot.exact(token) {
        sources.push(ids);
    }

    if trailing {
        let upper = len.min(snapshot.prefix_max());
        for n in len.min(TRAILING_PREFIX_MIN)..=upper {
            if let Some(ids) = snapshot.prefix(char_prefix(token, n)) {
                sources.push(ids);
            }
        }
    }

    if len < snapshot.ngram_size() {
        if let Some(ids) = snapshot.ngram(token) {
            sources.push(ids);
        }
    }

    if sources.is_empty() {
        return None;
    }

    let mut candidates = IdSet::default();
    for ids in sources {
        union_into(&mut candidates, ids);
    }
    Some(candidates)
}
