//! Query entry point
//!
//! [`search`] composes resolution, capping, and ranking into the result the
//! surrounding service shows. It never fails: any panic raised while
//! composing a result is caught here, logged, and turned into an empty
//! result.

use crate::session::SessionState;
use quarry_core::{Item, ItemId};
use quarry_engine::search::{rank, resolve, IndexSnapshot, Resolution};
use quarry_engine::SearchConfig;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error};

/// Ordered ids for a query, with the size of the full match set
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchResult {
    /// Ids in display order
    pub ids: Vec<ItemId>,
    /// Matches before the ranking cap
    #[serde(rename = "totalFound")]
    pub total_found: usize,
}

impl SearchResult {
    fn all(ids: Vec<ItemId>) -> Self {
        let total_found = ids.len();
        SearchResult { ids, total_found }
    }
}

/// A window over an id list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdPage {
    /// Ids in the window
    pub ids: Vec<ItemId>,
    /// More ids follow the window
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

/// Search with default settings. See [`search_with`].
pub fn search(
    query: &str,
    session: Option<&SessionState>,
    items: &[Item],
    snapshot: Option<&IndexSnapshot>,
) -> SearchResult {
    search_with(query, session, items, snapshot, &SearchConfig::default())
}

/// Resolve, cap, and rank `query`.
///
/// - blank query, or a query that resolves to no filter: the session's order
///   (identity `1..=N` without a session), `total_found` its length
/// - all-digit query with `id_lookup` on: that id alone if it is in `1..=N`
/// - otherwise: matched ids in ascending id order, cut to `ranking_cap`,
///   sorted by descending score; `total_found` is the uncut match count
pub fn search_with(
    query: &str,
    session: Option<&SessionState>,
    items: &[Item],
    snapshot: Option<&IndexSnapshot>,
    config: &SearchConfig,
) -> SearchResult {
    downgrade_panics(query, || compose(query, session, items, snapshot, config))
}

/// Run `f`, turning a panic into a logged, empty result.
fn downgrade_panics(query: &str, f: impl FnOnce() -> SearchResult) -> SearchResult {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(cause) => {
            let reason = cause
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| cause.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_owned());
            error!(
                target: "quarry::search",
                query = query,
                reason = %reason,
                "Search failed, returning empty result"
            );
            SearchResult::default()
        }
    }
}

fn compose(
    query: &str,
    session: Option<&SessionState>,
    items: &[Item],
    snapshot: Option<&IndexSnapshot>,
    config: &SearchConfig,
) -> SearchResult {
    let trimmed = query.trim();
    if config.id_lookup && !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return lookup_id(trimmed, items.len());
    }

    let matched = match resolve(query, snapshot) {
        Resolution::NoFilter => return SearchResult::all(unfiltered(session, items.len())),
        Resolution::Matched(ids) => ids,
    };

    let total_found = matched.len();
    let mut ids: Vec<ItemId> = matched.into_iter().collect();
    ids.sort_unstable();
    ids.truncate(config.ranking_cap);

    let ids = rank(ids, items, query);
    debug!(
        target: "quarry::search",
        query = query,
        total_found,
        ranked = ids.len(),
        "Ranked matches"
    );
    SearchResult { ids, total_found }
}

fn unfiltered(session: Option<&SessionState>, n: usize) -> Vec<ItemId> {
    match session {
        Some(session) if session.is_initialized() => session.order().to_vec(),
        _ => (1..=n as ItemId).collect(),
    }
}

fn lookup_id(digits: &str, n: usize) -> SearchResult {
    match digits.parse::<ItemId>() {
        Ok(id) if id >= 1 && id as usize <= n => SearchResult {
            ids: vec![id],
            total_found: 1,
        },
        _ => SearchResult::default(),
    }
}

/// Window of `ids` starting at `offset`.
///
/// `limit` of 0 means the configured page size; larger limits are clamped
/// to `max_page_size`.
pub fn page_ids(ids: &[ItemId], offset: usize, limit: usize, config: &SearchConfig) -> IdPage {
    let limit = if limit == 0 { config.page_size } else { limit };
    let limit = limit.min(config.max_page_size);
    let start = offset.min(ids.len());
    let end = start.saturating_add(limit).min(ids.len());
    IdPage {
        ids: ids[start..end].to_vec(),
        has_more: end < ids.len(),
    }
}
