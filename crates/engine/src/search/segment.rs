//! Staged segment format (.qseg) for batched index construction
//!
//! One segment holds one term map of one batch. Segments are written once,
//! read once during the merge, then deleted.
//!
//! ## File Format
//!
//! ```text
//! HEADER (20 bytes):
//!   magic "QSEG"            4B
//!   version                 u32 LE
//!   kind                    u32 LE    → 0 exact, 1 prefix, 2 ngram
//!   batch_id                u32 LE
//!   key_count               u32 LE
//!
//! ENTRIES (key_count, sorted by key):
//!   key_len                 u32 LE
//!   key_bytes               [u8; key_len]   (UTF-8)
//!   id_count                varint
//!   ids                     delta-encoded varints, ascending
//! ```

use super::index::{IndexKind, TermMap};
use quarry_core::{Error, IdSet, ItemId, Result};

/// Magic bytes for .qseg artifacts
const SEG_MAGIC: &[u8; 4] = b"QSEG";
/// Current format version
const SEG_VERSION: u32 = 1;
/// Header size in bytes
const HEADER_SIZE: usize = 20;

// ============================================================================
// Varint (LEB128) Codec
// ============================================================================

/// Encode a u32 as a variable-length integer (LEB128).
pub(crate) fn encode_varint(mut value: u32, buf: &mut Vec<u8>) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decode a varint from a byte slice, returning (value, bytes_consumed).
pub(crate) fn decode_varint(data: &[u8]) -> Option<(u32, usize)> {
    let mut value: u32 = 0;
    let mut shift = 0;
    for (i, &byte) in data.iter().enumerate() {
        value |= ((byte & 0x7F) as u32) << shift;
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
        shift += 7;
        if shift >= 35 {
            return None; // overflow
        }
    }
    None // truncated
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let raw = bytes.get(at..at + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

// ============================================================================
// Encoding
// ============================================================================

/// Serialize one batch-local term map.
pub fn encode_segment(kind: IndexKind, batch_id: u32, map: &TermMap) -> Vec<u8> {
    let mut entries: Vec<(&String, &IdSet)> = map.iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut buf = Vec::with_capacity(HEADER_SIZE + entries.len() * 16);
    buf.extend_from_slice(SEG_MAGIC);
    buf.extend_from_slice(&SEG_VERSION.to_le_bytes());
    buf.extend_from_slice(&kind.code().to_le_bytes());
    buf.extend_from_slice(&batch_id.to_le_bytes());
    buf.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    debug_assert_eq!(buf.len(), HEADER_SIZE);

    let mut ids: Vec<ItemId> = Vec::new();
    for (key, set) in entries {
        let key_bytes = key.as_bytes();
        buf.extend_from_slice(&(key_bytes.len() as u32).to_le_bytes());
        buf.extend_from_slice(key_bytes);

        ids.clear();
        ids.extend(set.iter().copied());
        ids.sort_unstable();

        encode_varint(ids.len() as u32, &mut buf);
        let mut prev = 0;
        for &id in &ids {
            encode_varint(id - prev, &mut buf);
            prev = id;
        }
    }
    buf
}

// ============================================================================
// Decoding
// ============================================================================

/// Sequential reader over a staged segment.
pub struct SegmentReader<'a> {
    data: &'a [u8],
    pos: usize,
    remaining: u32,
    batch_id: u32,
}

impl<'a> SegmentReader<'a> {
    /// Validate the header and position the reader at the first entry.
    ///
    /// # Errors
    ///
    /// [`Error::Corruption`] on short input, bad magic, unknown version or a
    /// kind other than `expected`.
    pub fn new(data: &'a [u8], expected: IndexKind) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::corruption("segment too small"));
        }
        if &data[0..4] != SEG_MAGIC {
            return Err(Error::corruption("bad QSEG magic"));
        }
        let version = read_u32(data, 4).unwrap_or_default();
        if version != SEG_VERSION {
            return Err(Error::corruption(format!(
                "unsupported QSEG version {}",
                version
            )));
        }
        let kind_code = read_u32(data, 8).unwrap_or(u32::MAX);
        match IndexKind::from_code(kind_code) {
            Some(kind) if kind == expected => {}
            _ => {
                return Err(Error::corruption(format!(
                    "segment kind {} does not match expected {}",
                    kind_code, expected
                )))
            }
        }
        Ok(SegmentReader {
            data,
            pos: HEADER_SIZE,
            remaining: read_u32(data, 16).unwrap_or_default(),
            batch_id: read_u32(data, 12).unwrap_or_default(),
        })
    }

    /// Batch this segment was staged from
    pub fn batch_id(&self) -> u32 {
        self.batch_id
    }

    /// Decode the next entry: returns its key and fills `ids`.
    ///
    /// Returns `Ok(None)` after the last entry.
    pub fn next_entry(&mut self, ids: &mut Vec<ItemId>) -> Result<Option<&'a str>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;

        let data: &'a [u8] = self.data;
        let key_len = read_u32(data, self.pos).ok_or_else(truncated)? as usize;
        self.pos += 4;
        let key_bytes = data.get(self.pos..self.pos + key_len).ok_or_else(truncated)?;
        let key = std::str::from_utf8(key_bytes)
            .map_err(|e| Error::corruption(format!("segment key is not UTF-8: {}", e)))?;
        self.pos += key_len;

        let count = self.read_varint()?;
        ids.clear();
        // Each id takes at least one byte
        ids.reserve((count as usize).min(data.len() - self.pos));
        let mut prev: ItemId = 0;
        for _ in 0..count {
            let delta = self.read_varint()?;
            prev = prev
                .checked_add(delta)
                .ok_or_else(|| Error::corruption("id delta overflow"))?;
            ids.push(prev);
        }
        Ok(Some(key))
    }

    fn read_varint(&mut self) -> Result<u32> {
        let (value, used) = decode_varint(&self.data[self.pos..]).ok_or_else(truncated)?;
        self.pos += used;
        Ok(value)
    }
}

fn truncated() -> Error {
    Error::corruption("segment truncated")
}

/// Union every entry of a staged segment into `target`.
///
/// Returns the number of entries read.
pub fn merge_segment(data: &[u8], kind: IndexKind, target: &mut TermMap) -> Result<usize> {
    let mut reader = SegmentReader::new(data, kind)?;
    let mut ids = Vec::new();
    let mut entries = 0;
    while let Some(key) = reader.next_entry(&mut ids)? {
        match target.get_mut(key) {
            Some(set) => set.extend(ids.iter().copied()),
            None => {
                target.insert(key.to_owned(), ids.iter().copied().collect());
            }
        }
        entries += 1;
    }
    Ok(entries)
}
