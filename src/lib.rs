//! Facade crate for the Booktrend ingestion and reporting engine.
//!
//! This crate re-exports the core domain types and exposes the HTTP sources
//! and report writers behind feature flags.

#![forbid(unsafe_code)]

pub use booktrend_core::{
    BookDraft, BookSource, BookStore, COMMON_GENRES, FetchError, GenreId, GenreName,
    GenreRegistry, IngestError, IngestReport, IngestSettings, ResetConfirmation, ResetSummary,
    SourceApi, SqliteBookStore, StopReason, StoreError, ingest,
};

#[cfg(feature = "http-sources")]
pub use booktrend_data::{
    GoogleBooksConfig, GoogleBooksSource, HttpSettings, OpenLibraryConfig, OpenLibrarySource,
    SourceBuildError,
};

#[cfg(feature = "analysis")]
pub use booktrend_analysis::{
    AnalysisError, ChartKind, GenreAnalysis, ReportArtifacts, ReportSettings, write_reports,
};
