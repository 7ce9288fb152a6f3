//! Quarry - in-memory text search and ranking with per-session ordering
//!
//! Quarry indexes a dense, 1-based item dataset into exact-token, prefix, and
//! n-gram maps using bounded-memory batch staging, resolves multi-token
//! queries against them, ranks matches with a field-weighted heuristic, and
//! keeps a per-session order, selection, and search cache on top.
//!
//! # Quick Start
//!
//! ```ignore
//! use quarry::{Executor, Item, QuarryConfig};
//!
//! let items = vec![Item::new(1, "alpha beta"), Item::new(2, "beta gamma")];
//! let executor = Executor::open(items, QuarryConfig::default())?;
//!
//! let result = executor.search("session-1", "beta ga");
//! assert_eq!(result.ids, vec![2]);
//! ```
//!
//! # Architecture
//!
//! All operations go through the [`Executor`], which owns the dataset, the
//! active index snapshot, and the session store. Index internals live in
//! `quarry-engine`; only the executor API is re-exported here.

// Re-export the public API from quarry-executor
pub use quarry_executor::*;
