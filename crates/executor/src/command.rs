//! Command enum defining every Quarry operation.
//!
//! Commands let the surrounding service drive the engine with plain data:
//! every variant is self-contained and round-trips through JSON. Session
//! commands carry the session key; the executor creates the session on
//! first contact.

use crate::session::ViewStatePatch;
use quarry_core::{Item, ItemId};
use serde::{Deserialize, Serialize};

/// A self-contained, serializable operation.
///
/// # Command Categories
///
/// | Category | Commands |
/// |----------|----------|
/// | Query | `Search`, `Page`, `Matching` |
/// | Session | `Select`, `Reorder`, `UpdateOrder`, `UpdateViewState`, `PinSearchOrder`, `State` |
/// | Index | `Rebuild`, `Stats` |
///
/// # Output mapping
///
/// | Command | Output |
/// |---------|--------|
/// | `Search` | `Output::Search` |
/// | `Page` | `Output::Page` |
/// | `Matching`, `Select` | `Output::Ids` |
/// | `Reorder`, `UpdateOrder`, `PinSearchOrder` | `Output::Unit` |
/// | `UpdateViewState` | `Output::ViewState` |
/// | `State` | `Output::State` |
/// | `Rebuild`, `Stats` | `Output::Stats` |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum Command {
    /// Ranked ids for a query
    Search {
        /// Session key
        session: String,
        /// Free-text query
        query: String,
    },

    /// One page of items for a query
    Page {
        /// Session key
        session: String,
        /// Free-text query
        query: String,
        /// Ids to skip
        #[serde(default)]
        offset: usize,
        /// Page length; 0 means the configured default
        #[serde(default)]
        limit: usize,
    },

    /// Session-ordered matches for a query
    Matching {
        /// Session key
        session: String,
        /// Free-text query
        query: String,
    },

    /// Add ids to or remove ids from the selection
    Select {
        /// Session key
        session: String,
        /// Array of ids (integers or numeric strings)
        ids: serde_json::Value,
        /// Select (`true`) or deselect (`false`)
        selected: bool,
    },

    /// Move one id to the position of another
    Reorder {
        /// Session key
        session: String,
        /// Id to move
        source: ItemId,
        /// Id whose position it takes
        destination: ItemId,
    },

    /// Replace the global order
    UpdateOrder {
        /// Session key
        session: String,
        /// A permutation of `1..=N`
        order: Vec<ItemId>,
    },

    /// Patch the view state
    UpdateViewState {
        /// Session key
        session: String,
        /// Fields to change
        patch: ViewStatePatch,
    },

    /// Pin an ordering for a query
    PinSearchOrder {
        /// Session key
        session: String,
        /// Query the ordering applies to
        query: String,
        /// Ids in pinned order
        order: Vec<ItemId>,
    },

    /// First page of the session's order plus its selection
    State {
        /// Session key
        session: String,
    },

    /// Replace the dataset and rebuild the indexes
    Rebuild {
        /// New dataset, ids dense `1..=N`
        items: Vec<Item>,
    },

    /// Key counts of the active index
    Stats,
}

impl Command {
    /// Session key, for session-scoped commands
    pub fn session(&self) -> Option<&str> {
        match self {
            Command::Search { session, .. }
            | Command::Page { session, .. }
            | Command::Matching { session, .. }
            | Command::Select { session, .. }
            | Command::Reorder { session, .. }
            | Command::UpdateOrder { session, .. }
            | Command::UpdateViewState { session, .. }
            | Command::PinSearchOrder { session, .. }
            | Command::State { session } => Some(session),
            Command::Rebuild { .. } | Command::Stats => None,
        }
    }

    /// Whether the command changes state
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Command::Select { .. }
                | Command::Reorder { .. }
                | Command::UpdateOrder { .. }
                | Command::UpdateViewState { .. }
                | Command::PinSearchOrder { .. }
                | Command::Rebuild { .. }
        )
    }
}
