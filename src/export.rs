//! Export planning: output naming, content type and serialisation.

use crate::codec::{FormatCodec, FormatKind};
use crate::error::Result;
use crate::table::SourceFile;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// Requested output format for one file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub target: FormatKind,
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self {
            target: FormatKind::Csv,
        }
    }
}

/// Output name and MIME type derived from the original file name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPlan {
    pub file_name: String,
    pub content_type: String,
}

/// A converted file ready for download. Owned by the caller once returned.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ExportArtifact {
    pub file_name: String,
    pub content_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl std::fmt::Debug for ExportArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportArtifact")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Replace the trailing `original_extension` of `original_file_name` with the
/// target's extension.
///
/// The extension is matched case-insensitively and only at the end of the
/// name. A name that does not end with it gets the target extension
/// appended.
pub fn plan(original_file_name: &str, original_extension: &str, target: FormatKind) -> ExportPlan {
    let stem = strip_suffix_ignore_case(original_file_name, original_extension)
        .filter(|_| !original_extension.is_empty())
        .unwrap_or(original_file_name);

    ExportPlan {
        file_name: format!("{stem}{}", target.extension()),
        content_type: target.content_type().to_owned(),
    }
}

fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(suffix.len())?;
    let (stem, tail) = (name.get(..split)?, name.get(split..)?);
    tail.eq_ignore_ascii_case(suffix).then_some(stem)
}

/// Turns tables into [`ExportArtifact`]s.
#[derive(Debug, Clone, Default)]
pub struct ExportPlanner {
    codec: FormatCodec,
}

impl ExportPlanner {
    pub fn new(codec: FormatCodec) -> Self {
        Self { codec }
    }

    pub fn encode(&self, df: &DataFrame, target: FormatKind) -> Result<Vec<u8>> {
        self.codec.encode(df, target)
    }

    /// Plan the output for `source` and serialise `df` into it.
    pub fn export(
        &self,
        df: &DataFrame,
        source: &SourceFile,
        request: &ExportRequest,
    ) -> Result<ExportArtifact> {
        let ExportPlan {
            file_name,
            content_type,
        } = plan(source.name(), source.extension(), request.target);
        let bytes = self.encode(df, request.target)?;

        Ok(ExportArtifact {
            file_name,
            content_type,
            bytes,
        })
    }
}
