//! Pipeline request data structures.
//!
//! A request bundles every choice the user makes for a file: cleaning
//! toggles, column selection, export target and whether to build a preview.
//! Requests serialise to JSON so a host can store and replay them.

use crate::cleaning::CleaningRequest;
use crate::error::{Result, ResultExt as _, SweeperError};
use crate::export::ExportRequest;
use crate::projection::ProjectionSpec;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current request format version
pub const REQUEST_VERSION: &str = "0.1";

fn default_version() -> String {
    REQUEST_VERSION.to_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRequest {
    /// Format version for future migrations
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub cleaning: CleaningRequest,

    #[serde(default)]
    pub projection: ProjectionSpec,

    #[serde(default)]
    pub export: ExportRequest,

    /// Build a [`crate::preview::TablePreview`] for each converted file
    #[serde(default)]
    pub preview: bool,
}

impl Default for PipelineRequest {
    fn default() -> Self {
        Self {
            version: default_version(),
            cleaning: CleaningRequest::default(),
            projection: ProjectionSpec::default(),
            export: ExportRequest::default(),
            preview: false,
        }
    }
}

impl PipelineRequest {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline request {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Parse and check the version.
    pub fn from_json(json: &str) -> Result<Self> {
        let request: Self =
            serde_json::from_str(json).context("Failed to parse pipeline request JSON")?;
        if request.version != REQUEST_VERSION {
            return Err(SweeperError::Config(format!(
                "Unsupported request version '{}', expected '{REQUEST_VERSION}'",
                request.version
            )));
        }
        Ok(request)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialise pipeline request")
    }
}
