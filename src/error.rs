//! Error handling for the sweeper pipeline.
//!
//! Every fallible library operation returns [`Result`], whose error type is
//! [`SweeperError`]. The variants mirror the per-file failure taxonomy that
//! the pipeline reports back to its caller:
//!
//! ```
//! use sweeper::error::SweeperError;
//!
//! fn describe(err: &SweeperError) -> String {
//!     match err {
//!         SweeperError::UnsupportedFormat(ext) => format!("cannot read {ext} files"),
//!         SweeperError::UnknownColumn(name) => format!("no column named {name}"),
//!         other => other.to_string(),
//!     }
//! }
//! ```
//!
//! ## Context Extension Trait
//!
//! [`ResultExt`] adds `.context()` to any result whose error converts into
//! [`SweeperError`]:
//!
//! ```no_run
//! use sweeper::error::ResultExt as _;
//!
//! fn load() -> sweeper::error::Result<Vec<u8>> {
//!     std::fs::read("data.csv").context("Failed to read upload")
//! }
//! ```
//!
//! Averaging a numeric column that holds no values is *not* an error; it is
//! reported through [`crate::cleaning::ImputationReport::skipped`].

use crate::codec::FormatKind;
use std::fmt;

/// Main error type for sweeper operations.
#[derive(Debug)]
pub enum SweeperError {
    /// The file extension is not one of the recognised tabular formats.
    UnsupportedFormat(String),

    /// The payload could not be parsed as the detected format.
    Decode { format: FormatKind, detail: String },

    /// A projection referenced a column the table does not have.
    UnknownColumn(String),

    /// A projection named the same column twice.
    DuplicateColumn(String),

    /// The table could not be serialised to the target format.
    Encode { format: FormatKind, detail: String },

    /// I/O errors (reading uploads, writing artifacts, config files)
    Io(std::io::Error),

    /// Configuration or request errors
    Config(String),

    /// Dataframe engine errors outside of decoding/encoding
    DataProcessing(String),

    /// Generic error with context
    Other(String),
}

impl SweeperError {
    /// Stable label reported to callers alongside the error detail.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "UnsupportedFormat",
            Self::Decode { .. } => "DecodeError",
            Self::UnknownColumn(_) => "UnknownColumn",
            Self::DuplicateColumn(_) => "DuplicateColumn",
            Self::Encode { .. } => "EncodeError",
            Self::Io(_) => "Io",
            Self::Config(_) => "Config",
            Self::DataProcessing(_) => "DataProcessing",
            Self::Other(_) => "Other",
        }
    }

    /// The message without the kind prefix.
    pub fn detail(&self) -> String {
        match self {
            Self::UnsupportedFormat(ext) if ext.is_empty() => "file has no extension".to_owned(),
            Self::UnsupportedFormat(ext) => format!("unsupported file extension '{ext}'"),
            Self::Decode { detail, .. } | Self::Encode { detail, .. } => detail.clone(),
            Self::UnknownColumn(name) => format!("column '{name}' does not exist"),
            Self::DuplicateColumn(name) => format!("column '{name}' selected more than once"),
            Self::Io(e) => e.to_string(),
            Self::Config(msg) | Self::DataProcessing(msg) | Self::Other(msg) => msg.clone(),
        }
    }

    pub(crate) fn decode(format: FormatKind, detail: impl fmt::Display) -> Self {
        Self::Decode {
            format,
            detail: detail.to_string(),
        }
    }

    pub(crate) fn encode(format: FormatKind, detail: impl fmt::Display) -> Self {
        Self::Encode {
            format,
            detail: detail.to_string(),
        }
    }

    /// Prefix the message with `msg`, keeping the variant and thus [`Self::kind`].
    ///
    /// Column errors carry a column name rather than a message and are
    /// returned unchanged.
    pub fn prefixed(self, msg: &str) -> Self {
        match self {
            Self::Decode { format, detail } => Self::Decode {
                format,
                detail: format!("{msg}: {detail}"),
            },
            Self::Encode { format, detail } => Self::Encode {
                format,
                detail: format!("{msg}: {detail}"),
            },
            Self::Io(e) => Self::Io(std::io::Error::new(e.kind(), format!("{msg}: {e}"))),
            Self::Config(detail) => Self::Config(format!("{msg}: {detail}")),
            Self::DataProcessing(detail) => Self::DataProcessing(format!("{msg}: {detail}")),
            Self::Other(detail) => Self::Other(format!("{msg}: {detail}")),
            unchanged @ (Self::UnsupportedFormat(_)
            | Self::UnknownColumn(_)
            | Self::DuplicateColumn(_)) => unchanged,
        }
    }
}

impl fmt::Display for SweeperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat(_) => write!(f, "Unsupported format: {}", self.detail()),
            Self::Decode { format, detail } => write!(f, "Failed to decode {format}: {detail}"),
            Self::UnknownColumn(name) => write!(f, "Unknown column: {name}"),
            Self::DuplicateColumn(name) => write!(f, "Duplicate column in selection: {name}"),
            Self::Encode { format, detail } => write!(f, "Failed to encode {format}: {detail}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for SweeperError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SweeperError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for SweeperError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for SweeperError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for SweeperError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for SweeperError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::encode(FormatKind::Xlsx, err)
    }
}

/// Result type alias for sweeper operations.
pub type Result<T> = std::result::Result<T, SweeperError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<SweeperError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: SweeperError = e.into();
            err.prefixed(&msg.into())
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: SweeperError = e.into();
            err.prefixed(&f())
        })
    }
}
