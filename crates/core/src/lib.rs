//! Core types for Quarry
//!
//! This crate defines the foundational types shared by the index engine and
//! the executor:
//! - Item: immutable dataset record, addressed by a dense 1-based id
//! - IdSet: hash set of item ids, with smallest-first intersection
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod idset;
pub mod types;

pub use error::{Error, Result};
pub use idset::{intersect_all, union_into, IdSet};
pub use types::{validate_dense_ids, Item, ItemId};
