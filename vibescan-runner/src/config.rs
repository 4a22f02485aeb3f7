//! Serializable scan configuration.
//!
//! Loaded from TOML (every field optional, documented defaults), overridden
//! by CLI flags, validated once, then threaded into the orchestrator.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use vibescan_core::data::ingest::DEFAULT_MAX_ROWS;
use vibescan_core::{IndicatorConfig, LoadOptions};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid indicator settings: {0}")]
    Indicators(#[from] vibescan_core::ConfigError),

    #[error("workers must be at least 1")]
    ZeroWorkers,

    #[error("max_rows must be at least 1")]
    ZeroMaxRows,

    #[error("archive_prefix must not be empty")]
    EmptyPrefix,

    #[error("at least one input file extension is required")]
    NoExtensions,
}

/// Everything a scan run needs. Run date is passed separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory of per-instrument files.
    pub input_dir: PathBuf,
    /// Where the archive bundle is written.
    pub output_dir: PathBuf,
    /// Archive file name prefix: `{prefix}_{YYYY-MM-DD}.csv`.
    pub archive_prefix: String,
    /// Accepted file extensions, compared case-insensitively.
    pub extensions: Vec<String>,
    /// Worker pool size. `None` = available hardware parallelism.
    pub workers: Option<usize>,
    /// Minimum rows per series. `None` = derived from the indicator windows.
    pub min_history: Option<usize>,
    /// Reject files with more data rows than this.
    pub max_rows: usize,
    /// Optional list restricting which tickers are scanned.
    pub ticker_list: Option<PathBuf>,
    pub indicators: IndicatorConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/raw"),
            output_dir: PathBuf::from("data/logs"),
            archive_prefix: "vibe_report".to_string(),
            extensions: vec!["csv".to_string()],
            workers: None,
            min_history: None,
            max_rows: DEFAULT_MAX_ROWS,
            ticker_list: None,
            indicators: IndicatorConfig::default(),
        }
    }
}

impl ScanConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.indicators.validate()?;
        self.indicators.effective_min_history(self.min_history)?;
        if self.workers == Some(0) {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.max_rows == 0 {
            return Err(ConfigError::ZeroMaxRows);
        }
        if self.archive_prefix.trim().is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if self.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(ConfigError::NoExtensions);
        }
        Ok(())
    }

    /// Rows a series needs before indicators are computed.
    pub fn min_history_rows(&self) -> Result<usize, ConfigError> {
        Ok(self.indicators.effective_min_history(self.min_history)?)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            max_rows: self.max_rows,
        }
    }

    /// Deterministic hash of this configuration.
    ///
    /// Two runs with identical settings share a hash, so archives can be
    /// matched to the settings that produced them.
    pub fn config_hash(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
