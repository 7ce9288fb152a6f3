//! Batched index construction with bounded peak memory
//!
//! The builder never holds more than one batch worth of partial indexes:
//!
//! 1. Split the items into contiguous batches of `batch_size`
//! 2. For each batch build three local term maps, encode each as a staged
//!    segment, write it to the [`StagingStore`] and drop the maps
//! 3. Write the staging manifest
//! 4. Merge: read every listed segment per index kind and union the id sets
//!    into the final maps
//! 5. Remove the staged artifacts
//!
//! Any staging failure aborts the build and returns the error; the caller's
//! active snapshot is untouched because nothing is published here.

use super::index::{IndexKind, IndexSnapshot, TermMaps};
use super::manifest::{
    decode_manifest, encode_manifest, segment_key, StagedBatch, StagingManifest, MANIFEST_KEY,
};
use super::segment::{encode_segment, merge_segment};
use super::staging::{FsStaging, StagingStore};
use quarry_core::{Error, Item, Result};
use rayon::prelude::*;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default items per batch
pub const DEFAULT_BATCH_SIZE: usize = 5000;
/// Default longest indexed prefix
pub const DEFAULT_PREFIX_MAX: usize = 6;
/// Default n-gram width
pub const DEFAULT_NGRAM_SIZE: usize = 3;
/// Default telemetry cadence, in items
pub const DEFAULT_PROGRESS_EVERY: usize = 50_000;

// ============================================================================
// BuildOptions
// ============================================================================

/// Parameters of one index build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Items per staged batch
    pub batch_size: usize,
    /// Longest indexed prefix, in chars
    pub prefix_max: usize,
    /// N-gram width, in chars
    pub ngram_size: usize,
    /// Emit progress telemetry every this many items (0 disables it)
    pub progress_every: usize,
    /// Emit progress and summary telemetry at all
    pub log_progress: bool,
    /// Stage batches on the rayon pool instead of sequentially
    pub parallel: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            batch_size: DEFAULT_BATCH_SIZE,
            prefix_max: DEFAULT_PREFIX_MAX,
            ngram_size: DEFAULT_NGRAM_SIZE,
            progress_every: DEFAULT_PROGRESS_EVERY,
            log_progress: true,
            parallel: false,
        }
    }
}

impl BuildOptions {
    /// Builder: set batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Builder: stage batches in parallel
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Builder: set telemetry cadence
    pub fn with_progress_every(mut self, every: usize) -> Self {
        self.progress_every = every;
        self
    }

    /// Reject zero sizes.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::invalid_input("batch_size must be at least 1"));
        }
        if self.prefix_max == 0 {
            return Err(Error::invalid_input("prefix_max must be at least 1"));
        }
        if self.ngram_size == 0 {
            return Err(Error::invalid_input("ngram_size must be at least 1"));
        }
        Ok(())
    }
}

// ============================================================================
// Progress telemetry
// ============================================================================

/// Counts staged items and reports every `every` items.
struct Progress {
    total: usize,
    every: usize,
    enabled: bool,
    processed: AtomicUsize,
}

impl Progress {
    fn new(total: usize, options: &BuildOptions) -> Self {
        Progress {
            total,
            every: options.progress_every,
            enabled: options.log_progress && options.progress_every > 0,
            processed: AtomicUsize::new(0),
        }
    }

    fn record(&self, items: usize) {
        let before = self.processed.fetch_add(items, Ordering::Relaxed);
        let after = before + items;
        if !self.enabled || after / self.every == before / self.every {
            return;
        }
        match resident_memory_mib() {
            Ok(rss_mib) => info!(
                target: "quarry::index",
                processed = after,
                total = self.total,
                rss_mib,
                "Index build progress"
            ),
            Err(e) => {
                debug!(target: "quarry::index", error = %e, "Memory probe unavailable");
                info!(
                    target: "quarry::index",
                    processed = after,
                    total = self.total,
                    "Index build progress"
                );
            }
        }
    }
}

/// Resident set size of this process in MiB, from `/proc/self/status`.
fn resident_memory_mib() -> io::Result<u64> {
    let status = std::fs::read_to_string("/proc/self/status")?;
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))
        .and_then(|rest| rest.trim().trim_end_matches("kB").trim().parse::<u64>().ok())
        .map(|kib| kib / 1024)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "VmRSS not reported"))
}

// ============================================================================
// IndexBuilder
// ============================================================================

/// Builds an [`IndexSnapshot`] through a staging store
#[derive(Debug, Clone, Default)]
pub struct IndexBuilder {
    options: BuildOptions,
}

impl IndexBuilder {
    /// Create a builder with the given options
    pub fn new(options: BuildOptions) -> Self {
        IndexBuilder { options }
    }

    /// Options this builder runs with
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build in a fresh staging directory under `root`.
    ///
    /// The directory is removed before returning, on success and on failure.
    pub fn build_in_dir(&self, items: &[Item], root: &Path) -> Result<IndexSnapshot> {
        let staging = FsStaging::create(root)?;
        self.build(items, &staging)
    }

    /// Build the three indexes for `items`, staging through `staging`.
    ///
    /// An empty item list yields an empty snapshot.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for zero sizes in the options
    /// - a storage error (`Io`, `Corruption`, `Serialization`) if any staged
    ///   write, read or delete fails
    pub fn build(&self, items: &[Item], staging: &dyn StagingStore) -> Result<IndexSnapshot> {
        self.options.validate()?;

        let started = Instant::now();
        if self.options.log_progress {
            info!(
                target: "quarry::index",
                items = items.len(),
                batch_size = self.options.batch_size,
                parallel = self.options.parallel,
                "Building indexes with staged batches"
            );
        }

        let built = self
            .stage_all(items, staging)
            .and_then(|_| self.merge(staging));

        let snapshot = match built {
            Ok(snapshot) => snapshot,
            Err(e) => {
                if let Err(cleanup) = staging.remove_all() {
                    warn!(
                        target: "quarry::index",
                        error = %cleanup,
                        "Could not remove staged artifacts after failed build"
                    );
                }
                warn!(target: "quarry::index", error = %e, "Index build failed");
                return Err(e);
            }
        };

        staging
            .remove_all()
            .map_err(|e| Error::Storage(format!("failed to remove staged artifacts: {}", e)))?;

        if self.options.log_progress {
            let stats = snapshot.stats();
            info!(
                target: "quarry::index",
                elapsed_ms = started.elapsed().as_millis() as u64,
                items = stats.items,
                tokens = stats.tokens,
                prefixes = stats.prefixes,
                ngrams = stats.ngrams,
                "Index build complete"
            );
        }
        Ok(snapshot)
    }

    /// Stage every batch and then the manifest.
    fn stage_all(&self, items: &[Item], staging: &dyn StagingStore) -> Result<()> {
        let batch_size = self.options.batch_size;
        let progress = Progress::new(items.len(), &self.options);

        let stage = |(batch_id, chunk): (usize, &[Item])| -> Result<StagedBatch> {
            let staged = self.stage_batch(batch_id as u32, chunk, staging)?;
            progress.record(chunk.len());
            Ok(staged)
        };

        let batches: Vec<StagedBatch> = if self.options.parallel {
            items
                .par_chunks(batch_size)
                .enumerate()
                .map(stage)
                .collect::<Result<Vec<_>>>()?
        } else {
            items
                .chunks(batch_size)
                .enumerate()
                .map(stage)
                .collect::<Result<Vec<_>>>()?
        };

        let mut manifest = StagingManifest::new(
            Uuid::new_v4().simple().to_string(),
            batch_size,
            self.options.prefix_max,
            self.options.ngram_size,
        );
        manifest.total_items = items.len();
        manifest.batches = batches;
        staging.put(MANIFEST_KEY, &encode_manifest(&manifest)?)?;
        Ok(())
    }

    /// Index one batch in memory and write its three segments.
    ///
    /// The local maps are dropped when this returns.
    fn stage_batch(
        &self,
        batch_id: u32,
        chunk: &[Item],
        staging: &dyn StagingStore,
    ) -> Result<StagedBatch> {
        let mut local = TermMaps::default();
        for item in chunk {
            local.add_item(item, self.options.prefix_max, self.options.ngram_size);
        }

        for kind in IndexKind::ALL {
            let bytes = encode_segment(kind, batch_id, local.map(kind));
            staging.put(&segment_key(kind, batch_id), &bytes)?;
        }

        Ok(StagedBatch {
            batch_id,
            first_id: chunk.first().map(|item| item.id).unwrap_or_default(),
            item_count: chunk.len() as u32,
        })
    }

    /// Read back every staged segment listed in the manifest and union them.
    fn merge(&self, staging: &dyn StagingStore) -> Result<IndexSnapshot> {
        let manifest = decode_manifest(&staging.get(MANIFEST_KEY)?)?;

        let mut maps = TermMaps::default();
        for kind in IndexKind::ALL {
            let target = maps.map_mut(kind);
            for batch in &manifest.batches {
                let bytes = staging.get(&segment_key(kind, batch.batch_id))?;
                merge_segment(&bytes, kind, target)?;
            }
        }

        Ok(IndexSnapshot::new(
            maps,
            manifest.total_items,
            manifest.prefix_max,
            manifest.ngram_size,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::staging::MemoryStaging;
    use quarry_core::IdSet;

    fn items(names: &[&str]) -> Vec<Item> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Item::new(i as u32 + 1, *name))
            .collect()
    }

    fn quiet() -> BuildOptions {
        BuildOptions {
            log_progress: false,
            ..BuildOptions::default()
        }
    }

    #[test]
    fn test_build_small_dataset() {
        let data = items(&["alpha beta", "beta gamma", "alpha gamma delta"]);
        let staging = MemoryStaging::new();
        let snapshot = IndexBuilder::new(quiet().with_batch_size(2))
            .build(&data, &staging)
            .unwrap();

        let alpha: IdSet = [1, 3].into_iter().collect();
        assert_eq!(snapshot.exact("alpha"), Some(&alpha));
        assert_eq!(snapshot.item_count(), 3);
        assert_eq!(snapshot.prefix_max(), 6);
        assert_eq!(snapshot.ngram_size(), 3);
        assert!(snapshot.prefix("gam").unwrap().contains(&2));
        assert!(snapshot.ngram("elt").unwrap().contains(&3));
        // Staged artifacts removed on success
        assert!(staging.is_empty());
    }

    #[test]
    fn test_build_empty_dataset() {
        let staging = MemoryStaging::new();
        let snapshot = IndexBuilder::new(quiet()).build(&[], &staging).unwrap();
        assert!(snapshot.map(IndexKind::Exact).is_empty());
        assert!(snapshot.map(IndexKind::Prefix).is_empty());
        assert!(snapshot.map(IndexKind::Ngram).is_empty());
        assert_eq!(snapshot.item_count(), 0);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let staging = MemoryStaging::new();
        let err = IndexBuilder::new(quiet().with_batch_size(0))
            .build(&items(&["a"]), &staging)
            .unwrap_err();
        assert!(err.is_input());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let data = items(&[
            "north wind", "south wind", "east river", "west river", "north east", "wind river",
            "calm sea",
        ]);
        let sequential = IndexBuilder::new(quiet().with_batch_size(2))
            .build(&data, &MemoryStaging::new())
            .unwrap();
        let parallel = IndexBuilder::new(quiet().with_batch_size(2).with_parallel(true))
            .build(&data, &MemoryStaging::new())
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_progress_telemetry_does_not_abort() {
        let data = items(&["a b c"; 10]);
        let options = BuildOptions::default()
            .with_batch_size(3)
            .with_progress_every(1);
        let snapshot = IndexBuilder::new(options)
            .build(&data, &MemoryStaging::new())
            .unwrap();
        assert_eq!(snapshot.exact("a").map(|s| s.len()), Some(10));
    }

    #[test]
    fn test_build_in_dir_cleans_up() {
        let tmp = tempfile::tempdir().unwrap();
        let data = items(&["one", "two"]);
        IndexBuilder::new(quiet())
            .build_in_dir(&data, tmp.path())
            .unwrap();
        let leftovers: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert!(leftovers.is_empty());
    }
}
