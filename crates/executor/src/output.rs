//! Output enum for command results.
//!
//! Every command produces exactly one output variant; see the mapping table
//! on [`Command`](crate::Command).

use crate::query::SearchResult;
use crate::session::ViewState;
use quarry_core::{Item, ItemId};
use quarry_engine::search::IndexStats;
use serde::{Deserialize, Serialize};

/// One page of items for a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Items in the page, in display order
    pub items: Vec<Item>,
    /// More items follow this page
    #[serde(rename = "hasMore")]
    pub has_more: bool,
    /// Matches for the query before the ranking cap
    #[serde(rename = "totalFound")]
    pub total_found: usize,
}

/// What a session shows on first load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    /// First page of the session's order
    #[serde(rename = "items")]
    pub first_page: Vec<Item>,
    /// Selected ids, in selection order
    #[serde(rename = "selectedIds")]
    pub selected: Vec<ItemId>,
}

/// Successful command results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Output {
    /// No return value
    Unit,

    /// Ranked ids with the uncapped match count
    Search(SearchResult),

    /// A page of items
    Page(Page),

    /// Ordered ids (matching, selection)
    Ids(Vec<ItemId>),

    /// View state after a patch
    ViewState(ViewState),

    /// Session first page and selection
    State(SessionView),

    /// Index key counts
    Stats(IndexStats),
}
