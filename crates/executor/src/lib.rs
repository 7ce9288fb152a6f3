//! # Quarry Executor
//!
//! The public API for Quarry - an in-memory text search and ranking engine
//! with per-session ordering and selection.
//!
//! This crate ties the pieces together:
//! - [`Executor`] - owns the dataset, the active index, and the sessions
//! - [`search`] / [`search_with`] - the query entry point
//! - [`SessionState`] - one user's order, selection, and search caches
//! - [`Command`]/[`Output`] - data-only command interface
//!
//! ## Quick Start
//!
//! ```text
//! use quarry_executor::{Executor, QuarryConfig};
//!
//! let executor = Executor::open(items, QuarryConfig::default())?;
//!
//! // Ranked ids, capped for ranking, with the full match count
//! let result = executor.search("session-1", "alpha be");
//!
//! // Per-session ordering and selection
//! executor.reorder("session-1", 4, 1)?;
//! executor.select("session-1", &serde_json::json!([1, "2"]), true)?;
//! ```
//!
//! ## Logging
//!
//! Everything is reported through `tracing` under these targets; install a
//! subscriber to see it:
//!
//! | Target | Events |
//! |--------|--------|
//! | `quarry::index` | build progress, memory, publication |
//! | `quarry::search` | ranking, failures downgraded to empty results |
//! | `quarry::session` | session resets after a rebuild |

#![warn(missing_docs)]

mod command;
mod executor;
mod output;
mod query;
mod session;
mod store;

pub use command::Command;
pub use executor::Executor;
pub use output::{Output, Page, SessionView};
pub use query::{page_ids, search, search_with, IdPage, SearchResult};
pub use session::{SessionState, SortDir, ViewState, ViewStatePatch};
pub use store::SessionStore;

pub use quarry_core::{Error, Item, ItemId, Result};
pub use quarry_engine::{IndexConfig, QuarryConfig, SearchConfig};
pub use quarry_engine::search::{IndexSnapshot, IndexStats};
