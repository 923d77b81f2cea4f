//! Error types for findr.
//!
//! Errors fall into two groups with very different fates:
//!
//! 1. **Per-entry errors** (`FileNotFound`, `PermissionDenied`, `EncodingError`,
//!    `IoError` raised while reading one file). The traversal engine turns these
//!    into [`crate::search::engine::Visit::Skipped`] and keeps walking; they never
//!    reach the caller of [`crate::search::search`].
//!
//! 2. **Run-level errors** (`ConfigError`, or an `IoError` while opening the
//!    search root). These are returned before any entry is visited.
//!
//! ```rust,ignore
//! match findr::search::search(&config, &mut reporter) {
//!     Ok(stats) => // traversal finished, possibly with skipped entries,
//!     Err(SearchError::ConfigError(msg)) => // bad key, bad mode,
//!     Err(e) => // root directory could not be read
//! }
//! ```

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Invalid UTF-8 in file {path} on line {line}")]
    EncodingError { path: PathBuf, line: usize },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl SearchError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn encoding_error(path: impl Into<PathBuf>, line: usize) -> Self {
        Self::EncodingError {
            path: path.into(),
            line,
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Classifies an I/O error raised while touching `path`
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::file_not_found(path),
            io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }
}

impl From<config::ConfigError> for SearchError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}
