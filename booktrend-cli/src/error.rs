//! Error types emitted by the Booktrend CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>`.

use std::sync::Arc;

use booktrend_analysis::AnalysisError;
use booktrend_core::{GenreNameError, IngestError, SourceApi, StoreError};
use booktrend_data::SourceBuildError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors emitted by the Booktrend CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// The directory holding the database could not be created.
    #[error("failed to create database directory for {path:?}: {source}")]
    CreateDatabaseDir {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A command that reads existing data was pointed at a missing database.
    #[error("database {path:?} does not exist; gather some books first")]
    MissingDatabase { path: Utf8PathBuf },
    /// The database path could not be inspected.
    #[error("failed to inspect database path {path:?}: {source}")]
    InspectDatabase {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening, migrating, or querying the book store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// An ingestion run aborted.
    #[error(transparent)]
    Ingest(#[from] IngestError),
    /// Aggregating or writing reports failed.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    /// An HTTP source could not be constructed.
    #[error("failed to build the {api} source: {source}")]
    SourceBuild {
        api: SourceApi,
        #[source]
        source: SourceBuildError,
    },
    /// An interactive prompt failed or was cancelled.
    #[error("prompt failed: {0}")]
    Prompt(#[from] inquire::InquireError),
    /// A genre name was empty.
    #[error(transparent)]
    InvalidGenre(#[from] GenreNameError),
    /// The requested genre has never been gathered.
    #[error("genre {genre:?} is not in the database")]
    UnknownGenre { genre: String },
    /// A menu returned an index outside its options.
    #[error("selection {index} is outside the {options} menu options")]
    InvalidSelection { index: usize, options: usize },
    /// The database holds no genres to choose from.
    #[error("the database holds no genres yet; gather some books first")]
    NoGenres,
    /// Writing to the console failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
