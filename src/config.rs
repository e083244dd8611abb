//! Runtime configuration.
//!
//! Settings are read from a JSON file (every field optional) and then
//! adjusted by a few environment variables:
//!
//! - `SWEEPER_PREVIEW_ROWS`: rows shown in table previews
//! - `SWEEPER_INFER_SCHEMA_LENGTH`: CSV rows sampled for dtype inference
//! - `SWEEPER_LOG`: default log level

use crate::error::{Result, ResultExt as _};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CSV decoding options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CsvSettings {
    /// Rows sampled for dtype inference; `None` scans the whole file. A file
    /// that contradicts the sample is re-read with every row sampled.
    pub infer_schema_length: Option<usize>,
    /// Parse ISO-like date and datetime text into temporal columns.
    pub try_parse_dates: bool,
}

impl Default for CsvSettings {
    fn default() -> Self {
        Self {
            infer_schema_length: Some(10_000),
            try_parse_dates: true,
        }
    }
}

/// XLSX encoding options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct XlsxSettings {
    pub sheet_name: String,
    /// Excel number format applied to temporal cells.
    pub datetime_format: String,
}

impl Default for XlsxSettings {
    fn default() -> Self {
        Self {
            sheet_name: "Sheet1".to_owned(),
            datetime_format: "yyyy-mm-dd hh:mm:ss".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// When set, logs are also written to daily files in this directory.
    pub directory: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SweeperConfig {
    pub csv: CsvSettings,
    pub xlsx: XlsxSettings,
    /// Rows included in a table preview (the head of the table)
    pub preview_row_limit: usize,
    pub log: LogSettings,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            csv: CsvSettings::default(),
            xlsx: XlsxSettings::default(),
            preview_row_limit: 5,
            log: LogSettings::default(),
        }
    }
}

impl SweeperConfig {
    /// Default location: `<config_dir>/sweeper/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sweeper").join("config.json"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default location is used
    /// when present and built-in defaults otherwise. Environment overrides are
    /// applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse config JSON")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialise config")
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SWEEPER_PREVIEW_ROWS")
            && let Ok(parsed) = val.parse::<usize>()
        {
            self.preview_row_limit = parsed;
        }

        if let Ok(val) = std::env::var("SWEEPER_INFER_SCHEMA_LENGTH")
            && let Ok(parsed) = val.parse::<usize>()
        {
            // 0 means "scan every row"
            self.csv.infer_schema_length = (parsed > 0).then_some(parsed);
        }

        if let Ok(val) = std::env::var("SWEEPER_LOG")
            && !val.trim().is_empty()
        {
            self.log.level = val;
        }
    }
}
