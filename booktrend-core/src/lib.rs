//! Core domain types for the Booktrend ingestion engine.
//!
//! The crate owns everything that does not talk to the network: the canonical
//! book and genre models, the record normaliser, the paginated ingestion loop,
//! and the SQLite-backed store that deduplicates titles across sources.
//! Constructors return `Result` to surface invalid input early.
//!
//! HTTP adapters implementing [`BookSource`] live in `booktrend-data`;
//! aggregation and report sinks live in `booktrend-analysis`.

#![forbid(unsafe_code)]

pub mod book;
pub mod genre;
pub mod ingest;
pub mod normalize;
pub mod source;
pub mod store;

#[doc(hidden)]
pub mod test_support;

pub use book::{BookDraft, SourceApi, UnknownSourceApi};
pub use genre::{COMMON_GENRES, GenreId, GenreName, GenreNameError, GenreRegistry};
pub use ingest::{
    IngestError, IngestReport, IngestSettings, RejectionTally, StopReason, ingest,
};
pub use normalize::{
    AuthorPolicy, GenreEvidence, GenreMatcher, RawBook, RawYear, RecordRejection, RejectionKind,
};
pub use source::{BookSource, FetchError, PageRequest, SourcePage};
pub use store::{
    BookStore, PageInsertOutcome, ResetConfirmation, ResetSummary, SqliteBookStore, StoreError,
    StoredGenre,
};
