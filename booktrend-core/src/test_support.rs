//! Test-only sources and stores used by unit and behaviour tests.

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet, VecDeque},
};

use rusqlite::ffi;

use crate::{
    AuthorPolicy, BookDraft, BookSource, BookStore, FetchError, GenreEvidence, GenreId,
    GenreMatcher, GenreName, GenreRegistry, PageInsertOutcome, PageRequest, RawBook, RawYear,
    RecordRejection, SourceApi, SourcePage, StoreError,
};

/// Build a subject-tagged raw record with a single author.
pub fn raw_book(title: &str, year: Option<i64>, subjects: &[&str]) -> RawBook {
    RawBook {
        title: Some(title.to_owned()),
        authors: vec![format!("Author of {title}")],
        published: year.map(RawYear::Year),
        evidence: GenreEvidence::Subjects(subjects.iter().map(|s| (*s).to_owned()).collect()),
    }
}

/// Build `count` distinct records titled `"{prefix} {n}"` tagged with
/// `subject`, published one year apart from 1950.
pub fn numbered_books(prefix: &str, count: usize, subject: &str) -> Vec<RawBook> {
    (0..count)
        .map(|n| {
            let year = 1950 + i64::try_from(n).unwrap_or(0);
            raw_book(&format!("{prefix} {n}"), Some(year), &[subject])
        })
        .collect()
}

/// Build the error an unreachable database reports.
pub fn unavailable_store_error() -> StoreError {
    StoreError::Sqlite {
        operation: "insert page",
        source: rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_CANTOPEN),
            Some("database is unavailable".to_owned()),
        ),
    }
}

/// `BookSource` replaying a fixed script of pages.
///
/// Once the script runs out every request receives an empty page. Requests
/// are recorded so tests can assert on offsets and limits. Pages are
/// returned as scripted, regardless of the requested limit.
#[derive(Debug)]
pub struct ScriptedSource {
    api: SourceApi,
    ceiling: usize,
    policy: AuthorPolicy,
    pages: RefCell<VecDeque<Result<SourcePage<RawBook>, FetchError>>>,
    requests: RefCell<Vec<PageRequest>>,
}

impl ScriptedSource {
    /// Create an empty script for `api` with a page ceiling of 25.
    pub fn new(api: SourceApi) -> Self {
        Self {
            api,
            ceiling: 25,
            policy: AuthorPolicy::Optional,
            pages: RefCell::new(VecDeque::new()),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Override the page size ceiling.
    #[must_use]
    pub fn with_ceiling(mut self, ceiling: usize) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Override the author policy.
    #[must_use]
    pub fn with_author_policy(mut self, policy: AuthorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Queue a page without a reported total.
    #[must_use]
    pub fn with_page(self, records: Vec<RawBook>) -> Self {
        self.pages
            .borrow_mut()
            .push_back(Ok(SourcePage::new(records)));
        self
    }

    /// Queue a page reporting `total` hits.
    #[must_use]
    pub fn with_page_total(self, records: Vec<RawBook>, total: u64) -> Self {
        self.pages
            .borrow_mut()
            .push_back(Ok(SourcePage::new(records).with_total(total)));
        self
    }

    /// Queue a failing fetch.
    #[must_use]
    pub fn with_error(self, error: FetchError) -> Self {
        self.pages.borrow_mut().push_back(Err(error));
        self
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.borrow().clone()
    }
}

impl BookSource for ScriptedSource {
    type Record = RawBook;

    fn source_api(&self) -> SourceApi {
        self.api
    }

    fn page_size_ceiling(&self) -> usize {
        self.ceiling
    }

    fn author_policy(&self) -> AuthorPolicy {
        self.policy
    }

    fn fetch_page(
        &self,
        _genre: &GenreName,
        request: PageRequest,
    ) -> Result<SourcePage<RawBook>, FetchError> {
        self.requests.borrow_mut().push(request);
        self.pages
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(SourcePage::default()))
    }

    fn normalize_record(
        &self,
        record: RawBook,
        matcher: &GenreMatcher,
    ) -> Result<BookDraft, RecordRejection> {
        record.normalize(self.api, self.policy, matcher)
    }
}

/// In-memory `BookStore` and `GenreRegistry`.
///
/// The store performs linear scans and is intended only for small datasets.
#[derive(Debug, Default)]
pub struct MemoryBookStore {
    genres: BTreeMap<String, GenreId>,
    books: Vec<(GenreId, BookDraft)>,
    titles: BTreeSet<String>,
    pages_before_failure: Option<usize>,
}

impl MemoryBookStore {
    /// Fail every `insert_page` call after the first `pages` succeed.
    #[must_use]
    pub fn failing_after(mut self, pages: usize) -> Self {
        self.pages_before_failure = Some(pages);
        self
    }

    /// Stored books in insertion order.
    pub fn books(&self) -> &[(GenreId, BookDraft)] {
        &self.books
    }
}

impl GenreRegistry for MemoryBookStore {
    fn ensure_genre(&mut self, name: &GenreName) -> Result<GenreId, StoreError> {
        let next = GenreId::new(i64::try_from(self.genres.len()).unwrap_or(i64::MAX) + 1);
        Ok(*self.genres.entry(name.as_str().to_owned()).or_insert(next))
    }

    fn lookup_genre(&self, name: &GenreName) -> Result<Option<GenreId>, StoreError> {
        Ok(self.genres.get(name.as_str()).copied())
    }
}

impl BookStore for MemoryBookStore {
    fn insert_page(
        &mut self,
        genre: GenreId,
        drafts: &[BookDraft],
        limit: usize,
    ) -> Result<PageInsertOutcome, StoreError> {
        if let Some(remaining) = self.pages_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(unavailable_store_error());
            }
            *remaining -= 1;
        }
        if !self.genres.values().any(|id| *id == genre) {
            return Err(StoreError::MissingGenre { genre_id: genre });
        }

        let mut outcome = PageInsertOutcome::default();
        for draft in drafts {
            if outcome.inserted >= limit {
                outcome.trimmed += 1;
            } else if self.titles.insert(draft.title.clone()) {
                self.books.push((genre, draft.clone()));
                outcome.inserted += 1;
            } else {
                outcome.duplicates += 1;
            }
        }
        Ok(outcome)
    }

    fn contains_title(&self, title: &str) -> Result<bool, StoreError> {
        Ok(self.titles.contains(title))
    }
}
