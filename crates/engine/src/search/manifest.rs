//! Staging manifest for a build run
//!
//! The manifest (`manifest` key in the staging store) stores:
//! - Build parameters (prefix_max, ngram_size, batch_size)
//! - The list of staged batches
//!
//! The merge step reads exactly the segments the manifest lists.

use super::index::IndexKind;
use quarry_core::{Error, ItemId, Result};
use serde::{Deserialize, Serialize};

/// Staging key of the manifest
pub const MANIFEST_KEY: &str = "manifest";

/// Magic bytes for the staging manifest
const MANIFEST_MAGIC: &[u8; 4] = b"QMNF";
/// Current manifest version
const MANIFEST_VERSION: u32 = 1;

// ============================================================================
// Manifest Data (serializable)
// ============================================================================

/// Serializable description of one build run's staged artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagingManifest {
    /// Format version
    pub version: u32,
    /// Unique id of the build run
    pub build_id: String,
    /// Items per batch
    pub batch_size: usize,
    /// Longest indexed prefix
    pub prefix_max: usize,
    /// N-gram width
    pub ngram_size: usize,
    /// Items across all batches
    pub total_items: usize,
    /// Staged batches, ordered by batch_id
    pub batches: Vec<StagedBatch>,
}

/// Manifest entry for a single staged batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedBatch {
    /// Sequential batch number
    pub batch_id: u32,
    /// Id of the batch's first item
    pub first_id: ItemId,
    /// Items in the batch
    pub item_count: u32,
}

impl StagingManifest {
    /// Create a manifest with no batches
    pub fn new(
        build_id: impl Into<String>,
        batch_size: usize,
        prefix_max: usize,
        ngram_size: usize,
    ) -> Self {
        StagingManifest {
            version: MANIFEST_VERSION,
            build_id: build_id.into(),
            batch_size,
            prefix_max,
            ngram_size,
            total_items: 0,
            batches: Vec::new(),
        }
    }
}

/// Staging key of one segment
pub fn segment_key(kind: IndexKind, batch_id: u32) -> String {
    format!("{}_{}", kind.as_str(), batch_id)
}

// ============================================================================
// Encode / Decode
// ============================================================================

/// Serialize a manifest: magic + version + MessagePack payload.
pub fn encode_manifest(data: &StagingManifest) -> Result<Vec<u8>> {
    let payload = rmp_serde::to_vec(data)
        .map_err(|e| Error::Serialization(format!("manifest encode error: {}", e)))?;

    let mut buf = Vec::with_capacity(8 + payload.len());
    buf.extend_from_slice(MANIFEST_MAGIC);
    buf.extend_from_slice(&MANIFEST_VERSION.to_le_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Parse a manifest produced by [`encode_manifest`].
pub fn decode_manifest(buf: &[u8]) -> Result<StagingManifest> {
    if buf.len() < 8 {
        return Err(Error::corruption("manifest too small"));
    }
    if &buf[0..4] != MANIFEST_MAGIC {
        return Err(Error::corruption("bad manifest magic"));
    }
    let version = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    if version != MANIFEST_VERSION {
        return Err(Error::corruption(format!(
            "unsupported manifest version {}",
            version
        )));
    }
    rmp_serde::from_slice(&buf[8..])
        .map_err(|e| Error::Serialization(format!("manifest decode error: {}", e)))
}
