//! Search module: index construction and query-time lookup
//!
//! This module contains:
//! - `tokenizer`: lowercase alphanumeric tokenization
//! - `index`: term maps, `IndexSnapshot`, atomic `SnapshotHandle`
//! - `staging`: `StagingStore` trait with filesystem and memory backends
//! - `segment`: staged segment codec
//! - `manifest`: staging manifest
//! - `builder`: batched `IndexBuilder`
//! - `resolver`: multi-token query resolution
//! - `ranker`: relevance scoring

pub mod builder;
pub mod index;
pub mod manifest;
pub mod ranker;
pub mod resolver;
pub mod segment;
pub mod staging;
pub mod tokenizer;

pub use builder::{BuildOptions, IndexBuilder};
pub use index::{IndexKind, IndexSnapshot, IndexStats, SnapshotHandle, TermMap, TermMaps};
pub use ranker::{rank, score, RankQuery};
pub use resolver::{resolve, Resolution};
pub use staging::{FsStaging, MemoryStaging, StagingStore};
pub use tokenizer::tokenize;
