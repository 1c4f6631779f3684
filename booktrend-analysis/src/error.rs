//! Error types raised while aggregating books and writing reports.
#![forbid(unsafe_code)]

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while reading aggregates or persisting report artefacts.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Preparing or executing an aggregation query failed.
    #[error("failed to query {operation}")]
    Query {
        /// Description of the failed operation.
        operation: &'static str,
        /// Source error from `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Creating an output directory failed.
    #[error("failed to create output directory {path}")]
    CreateDir {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Writing a report or chart file failed.
    #[error("failed to write report file at {path}")]
    WriteFile {
        /// Target file path.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
}
