//! Error types for definition loading

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading reference data
///
/// Every one of these is fatal at startup: the engine refuses to run with
/// a definition set it could not load cleanly.
#[derive(Debug, Error)]
pub enum DefsError {
    /// File or directory could not be read
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("YAML parse error in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// JSON parsing error
    #[error("JSON parse error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// File extension the loader does not understand
    #[error("unsupported definition file type: {0}")]
    UnsupportedFormat(PathBuf),

    /// Directory contained no definition files at all
    #[error("no definition files found under {0}")]
    Empty(PathBuf),
}

/// Result type for definition loading
pub type DefsResult<T> = Result<T, DefsError>;
