//! Runtime configuration.
//!
//! Values are layered: built-in defaults, then environment variables
//! (a `.env` file is loaded by the binary), then an optional JSON file,
//! then command-line flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DATA_ROOT_VAR: &str = "BIXI_DATA_ROOT";
pub const DEFAULT_YEAR_VAR: &str = "BIXI_DEFAULT_YEAR";
pub const LOG_FILE_VAR: &str = "LOG_FILE_PATH";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppConfig {
    /// Directory holding one subdirectory per year.
    pub data_root: PathBuf,
    /// Year selected when none is requested.
    pub default_year: String,
    pub log_file_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("./bixi_data"),
            default_year: "2014".to_string(),
            log_file_path: "logs/bixi_stats.log".to_string(),
        }
    }
}

/// On-disk form of the configuration; every key is optional.
///
/// ```json
/// {
///   "data_root": "/srv/bixi_data",
///   "default_year": "2016"
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    data_root: Option<PathBuf>,
    default_year: Option<String>,
    log_file_path: Option<String>,
}

impl AppConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(root) = lookup(DATA_ROOT_VAR) {
            self.data_root = PathBuf::from(root);
        }
        if let Some(year) = lookup(DEFAULT_YEAR_VAR) {
            self.default_year = year;
        }
        if let Some(path) = lookup(LOG_FILE_VAR) {
            self.log_file_path = path;
        }
        self
    }

    /// Applies the keys present in the JSON file at `path`.
    pub fn merge_file(mut self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let file: ConfigFile =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        if let Some(root) = file.data_root {
            self.data_root = root;
        }
        if let Some(year) = file.default_year {
            self.default_year = year;
        }
        if let Some(log) = file.log_file_path {
            self.log_file_path = log;
        }
        Ok(self)
    }

    pub fn with_data_root(mut self, data_root: Option<PathBuf>) -> Self {
        if let Some(root) = data_root {
            self.data_root = root;
        }
        self
    }
}
