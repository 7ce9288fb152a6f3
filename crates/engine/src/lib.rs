//! Index engine for Quarry
//!
//! Builds the exact/prefix/n-gram indexes over a dataset in bounded memory,
//! publishes them as immutable snapshots, and answers queries against them.
//!
//! # Usage
//!
//! ```ignore
//! use quarry_engine::search::{resolve, BuildOptions, IndexBuilder, SnapshotHandle};
//!
//! let snapshot = IndexBuilder::new(BuildOptions::default())
//!     .build_in_dir(&items, &std::env::temp_dir())?;
//! let handle = SnapshotHandle::new();
//! handle.publish(snapshot);
//!
//! let matched = resolve("alpha be", handle.current().as_deref());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod search;

pub use config::{IndexConfig, QuarryConfig, SearchConfig, CONFIG_FILE_NAME};
pub use search::{
    rank, resolve, score, tokenize, BuildOptions, IndexBuilder, IndexKind, IndexSnapshot,
    Resolution, SnapshotHandle, StagingStore,
};
