//! Persistence traits for deduplicated book records.
//!
//! The `BookStore` trait accepts one page of normalised drafts at a time and
//! reports how many were new. Titles are the store-wide deduplication key, so
//! re-inserting a title from either source is a silent skip. Implementations
//! must apply a page atomically: either every new row in the page is visible
//! afterwards or none is.

use std::path::PathBuf;

use thiserror::Error;

use crate::{BookDraft, GenreId};

mod schema;
mod sqlite;

pub use schema::{SCHEMA_VERSION, initialise_schema};
pub use sqlite::{SqliteBookStore, StoredGenre};

/// Errors raised by store implementations.
///
/// Any of these is fatal to an ingestion run; pages committed before the
/// failure stay persisted.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A schema migration step failed.
    #[error("failed to execute migration step '{step}'")]
    Schema {
        /// Name of the failing step.
        step: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The database was created by an incompatible release.
    #[error("expected schema version {expected} but found {found}; apply migrations before retrying")]
    VersionMismatch {
        /// Version this build understands.
        expected: i64,
        /// Version recorded in the database.
        found: i64,
    },
    /// A read or write statement failed.
    #[error("SQLite operation '{operation}' failed")]
    Sqlite {
        /// Description of the failing operation.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Books were filed under a genre the registry never issued.
    #[error("genre {genre_id} is not registered")]
    MissingGenre {
        /// Identifier that failed the lookup.
        genre_id: GenreId,
    },
}

/// Counts produced by [`BookStore::insert_page`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageInsertOutcome {
    /// Drafts stored as new rows.
    pub inserted: usize,
    /// Drafts whose title was already stored.
    pub duplicates: usize,
    /// Drafts left unconsidered because the insert limit was reached.
    pub trimmed: usize,
}

/// Write access to persisted books.
pub trait BookStore {
    /// Insert up to `limit` new drafts under `genre` in one transaction.
    ///
    /// Drafts are considered in order. A draft whose title already exists,
    /// in the store or earlier in the same page, counts as a duplicate.
    /// Once `limit` rows have been inserted the remaining drafts count as
    /// trimmed.
    fn insert_page(
        &mut self,
        genre: GenreId,
        drafts: &[BookDraft],
        limit: usize,
    ) -> Result<PageInsertOutcome, StoreError>;

    /// Report whether a book with `title` is stored.
    fn contains_title(&self, title: &str) -> Result<bool, StoreError>;
}

/// Proof that the operator agreed to wipe the store.
///
/// Destructive resets take this value by move so they cannot run without an
/// explicit acknowledgement.
#[derive(Debug)]
#[non_exhaustive]
pub struct ResetConfirmation;

impl ResetConfirmation {
    /// Record that the operator confirmed the reset.
    #[must_use]
    pub const fn acknowledge() -> Self {
        Self
    }
}

/// Rows removed by a full reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetSummary {
    /// Book rows deleted.
    pub books_removed: usize,
    /// Genre rows deleted.
    pub genres_removed: usize,
}
