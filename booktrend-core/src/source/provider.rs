//! Source trait and page request/response types.

use crate::{AuthorPolicy, BookDraft, GenreMatcher, GenreName, RecordRejection, SourceApi};

use super::error::FetchError;

/// Window requested from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// One-based page counter, used for logging only.
    pub page: u32,
    /// Number of raw records consumed by earlier pages.
    pub offset: usize,
    /// Maximum number of records to return.
    pub limit: usize,
}

/// Raw records returned for one [`PageRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePage<R> {
    /// Records in source order. Empty means the query is exhausted.
    pub records: Vec<R>,
    /// Total number of hits reported by the source, when it reports one.
    pub total_found: Option<u64>,
}

impl<R> SourcePage<R> {
    /// Build a page without a reported total.
    #[must_use]
    pub const fn new(records: Vec<R>) -> Self {
        Self {
            records,
            total_found: None,
        }
    }

    /// Attach the total hit count reported by the source.
    #[must_use]
    pub const fn with_total(mut self, total_found: u64) -> Self {
        self.total_found = Some(total_found);
        self
    }
}

impl<R> Default for SourcePage<R> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// A paginated bibliographic search endpoint.
///
/// # Examples
///
/// ```rust
/// use booktrend_core::{
///     AuthorPolicy, BookDraft, BookSource, FetchError, GenreMatcher, GenreName, PageRequest,
///     RecordRejection, SourceApi, SourcePage,
/// };
///
/// struct OneBook;
///
/// impl BookSource for OneBook {
///     type Record = (String, i32);
///
///     fn source_api(&self) -> SourceApi {
///         SourceApi::GoogleBooks
///     }
///
///     fn page_size_ceiling(&self) -> usize {
///         40
///     }
///
///     fn author_policy(&self) -> AuthorPolicy {
///         AuthorPolicy::Optional
///     }
///
///     fn fetch_page(
///         &self,
///         _genre: &GenreName,
///         request: PageRequest,
///     ) -> Result<SourcePage<Self::Record>, FetchError> {
///         let records = if request.offset == 0 { vec![("Dune".into(), 1965)] } else { Vec::new() };
///         Ok(SourcePage::new(records))
///     }
///
///     fn normalize_record(
///         &self,
///         (title, year): Self::Record,
///         _matcher: &GenreMatcher,
///     ) -> Result<BookDraft, RecordRejection> {
///         Ok(BookDraft::new(title, None, year, self.source_api()))
///     }
/// }
///
/// let genre = GenreName::new("Science Fiction").unwrap();
/// let page = OneBook
///     .fetch_page(&genre, PageRequest { page: 1, offset: 0, limit: 10 })
///     .unwrap();
/// assert_eq!(page.records.len(), 1);
/// ```
pub trait BookSource {
    /// Source-specific raw record.
    type Record;

    /// API label persisted with every stored book.
    fn source_api(&self) -> SourceApi;

    /// Largest page the API will serve in one call.
    fn page_size_ceiling(&self) -> usize;

    /// Whether records must carry at least one author.
    fn author_policy(&self) -> AuthorPolicy;

    /// Fetch one page of records for `genre`.
    ///
    /// Implementations return an empty page when no further records exist.
    fn fetch_page(
        &self,
        genre: &GenreName,
        request: PageRequest,
    ) -> Result<SourcePage<Self::Record>, FetchError>;

    /// Turn one raw record into a draft or explain why it was skipped.
    fn normalize_record(
        &self,
        record: Self::Record,
        matcher: &GenreMatcher,
    ) -> Result<BookDraft, RecordRejection>;
}
