//! Configuration via `quarry.toml`
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Index parameters convert to [`BuildOptions`].

use crate::search::builder::{
    BuildOptions, DEFAULT_BATCH_SIZE, DEFAULT_NGRAM_SIZE, DEFAULT_PREFIX_MAX,
    DEFAULT_PROGRESS_EVERY,
};
use quarry_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file name
pub const CONFIG_FILE_NAME: &str = "quarry.toml";

/// Index construction settings (`[index]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Items per staged batch
    pub batch_size: usize,
    /// Longest indexed prefix
    pub prefix_max: usize,
    /// N-gram width
    pub ngram_size: usize,
    /// Telemetry cadence in items
    pub progress_every: usize,
    /// Emit build telemetry
    pub log_progress: bool,
    /// Stage batches on the rayon pool
    pub parallel: bool,
    /// Root directory for staging; defaults to the system temp dir
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<PathBuf>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            batch_size: DEFAULT_BATCH_SIZE,
            prefix_max: DEFAULT_PREFIX_MAX,
            ngram_size: DEFAULT_NGRAM_SIZE,
            progress_every: DEFAULT_PROGRESS_EVERY,
            log_progress: true,
            parallel: false,
            staging_dir: None,
        }
    }
}

impl IndexConfig {
    /// Builder options for these settings
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            batch_size: self.batch_size,
            prefix_max: self.prefix_max,
            ngram_size: self.ngram_size,
            progress_every: self.progress_every,
            log_progress: self.log_progress,
            parallel: self.parallel,
        }
    }

    /// Directory under which each build creates its staging namespace
    pub fn staging_root(&self) -> PathBuf {
        self.staging_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// Query-time settings (`[search]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Matched ids scored per query
    pub ranking_cap: usize,
    /// All-digit query resolves to that single id
    pub id_lookup: bool,
    /// Default page length
    pub page_size: usize,
    /// Largest page a caller may request
    pub max_page_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            ranking_cap: 1000,
            id_lookup: true,
            page_size: 20,
            max_page_size: 100,
        }
    }
}

/// Configuration loaded from `quarry.toml`.
///
/// # Example
///
/// ```toml
/// [index]
/// batch_size = 5000
/// parallel = true
///
/// [search]
/// ranking_cap = 1000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuarryConfig {
    /// Index construction
    pub index: IndexConfig,
    /// Query handling
    pub search: SearchConfig,
}

impl QuarryConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Quarry configuration

[index]
# Items per staged batch; bounds peak memory during a build
batch_size = 5000
# Longest indexed prefix and n-gram width, in characters
prefix_max = 6
ngram_size = 3
# Progress telemetry cadence, in items
progress_every = 50000
log_progress = true
# Stage batches on all cores
parallel = false
# Root for staging directories (default: system temp dir)
# staging_dir = "/var/tmp"

[search]
# Matched ids scored per query
ranking_cap = 1000
# An all-digit query returns that single id
id_lookup = true
page_size = 20
max_page_size = 100
"#
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.index
            .build_options()
            .validate()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if self.search.max_page_size == 0 {
            return Err(Error::InvalidConfig(
                "search.max_page_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Parse config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: QuarryConfig = toml::from_str(content)
            .map_err(|e| Error::InvalidConfig(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::InvalidConfig(reason) => {
                Error::InvalidConfig(format!("{} ({})", reason, path.display()))
            }
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
