//! Common test utilities

use quarry::{Executor, Item, QuarryConfig};
use tempfile::TempDir;

/// Names of the reference dataset, ids 1..=5
pub const NAMES: [&str; 5] = [
    "alpha beta",
    "beta gamma",
    "alpha gamma delta",
    "zeta",
    "beta alpha gamma",
];

/// The reference dataset
pub fn reference_items() -> Vec<Item> {
    NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| Item::new(i as u32 + 1, *name))
        .collect()
}

/// `n` items with repeating vocabulary
pub fn generated_items(n: u32) -> Vec<Item> {
    let words = ["north", "south", "river", "stone", "maple", "harbor", "cedar"];
    (1..=n)
        .map(|id| {
            let i = id as usize;
            Item::new(id, format!("{} {}", words[i % 7], words[(i / 7) % 7]))
                .with_address(format!("{} street {}", words[(i + 3) % 7], id))
                .with_city(words[(i + 5) % 7])
        })
        .collect()
}

/// Config staging under `dir`, small batches, no progress logs
pub fn test_config(dir: &TempDir) -> QuarryConfig {
    let mut config = QuarryConfig::default();
    config.index.staging_dir = Some(dir.path().to_path_buf());
    config.index.batch_size = 3;
    config.index.log_progress = false;
    config
}

/// Executor over `items` with its staging directory
pub fn create_executor(items: Vec<Item>) -> (TempDir, Executor) {
    let dir = tempfile::tempdir().unwrap();
    let executor = Executor::open(items, test_config(&dir)).unwrap();
    (dir, executor)
}
