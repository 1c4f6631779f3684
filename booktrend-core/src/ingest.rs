//! Paginated ingestion of one genre from one source.
//!
//! [`ingest`] drives a fetch, normalise, insert cycle until the goal is met,
//! the source runs dry, the page ceiling is hit, or a fetch fails. Each page
//! is committed on its own, so a run that stops early keeps everything it
//! inserted.

use std::{collections::BTreeMap, fmt};

use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    BookSource, BookStore, FetchError, GenreId, GenreMatcher, GenreName, GenreRegistry,
    PageRequest, RejectionKind, SourceApi, StoreError,
};

/// Records requested per call unless configured otherwise.
pub const DEFAULT_PER_CALL_LIMIT: usize = 25;

/// Pages fetched per run unless configured otherwise.
pub const DEFAULT_MAX_PAGES: u32 = 30;

/// Tunables for an ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSettings {
    /// Upper bound on records requested per fetch. Each source may cap it
    /// further.
    pub per_call_limit: usize,
    /// Upper bound on pages fetched in one run.
    pub max_pages: u32,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            per_call_limit: DEFAULT_PER_CALL_LIMIT,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl IngestSettings {
    /// Set the per-call record limit. Zero is raised to one.
    #[must_use]
    pub fn with_per_call_limit(mut self, per_call_limit: usize) -> Self {
        self.per_call_limit = per_call_limit.max(1);
        self
    }

    /// Set the page ceiling.
    #[must_use]
    pub const fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }
}

/// Why an ingestion run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The requested number of new books was inserted.
    GoalReached,
    /// The source reported no further records.
    Exhausted,
    /// The page ceiling was reached before the goal.
    PageLimit,
    /// A fetch failed; pages committed earlier are kept.
    FetchFailed(FetchError),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoalReached => f.write_str("goal reached"),
            Self::Exhausted => f.write_str("source exhausted"),
            Self::PageLimit => f.write_str("page limit reached"),
            Self::FetchFailed(err) => write!(f, "fetch failed: {err}"),
        }
    }
}

/// Per-reason counts of skipped records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectionTally(BTreeMap<RejectionKind, usize>);

impl RejectionTally {
    /// Count one rejection.
    pub fn record(&mut self, kind: RejectionKind) {
        *self.0.entry(kind).or_default() += 1;
    }

    /// Rejections recorded for `kind`.
    #[must_use]
    pub fn get(&self, kind: RejectionKind) -> usize {
        self.0.get(&kind).copied().unwrap_or_default()
    }

    /// Rejections across all reasons.
    #[must_use]
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    /// Iterate non-zero counts in reason order.
    pub fn iter(&self) -> impl Iterator<Item = (RejectionKind, usize)> + '_ {
        self.0.iter().map(|(kind, count)| (*kind, *count))
    }
}

/// Outcome of an ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Source the run fetched from.
    pub source: SourceApi,
    /// Genre the run targeted.
    pub genre: GenreName,
    /// Registry identifier of the genre.
    pub genre_id: GenreId,
    /// Requested number of new books.
    pub goal: usize,
    /// New books stored. Never exceeds `goal`.
    pub inserted: usize,
    /// Pages fetched successfully, including a final empty page.
    pub pages_fetched: u32,
    /// Raw records received across all pages.
    pub records_seen: usize,
    /// Records skipped because their title was already stored.
    pub duplicates: usize,
    /// Usable records left over once the goal was met.
    pub trimmed: usize,
    /// Records skipped by the normaliser.
    pub rejected: RejectionTally,
    /// Why the run ended.
    pub stop: StopReason,
}

impl IngestReport {
    /// Report whether the goal was met.
    #[must_use]
    pub const fn goal_met(&self) -> bool {
        self.inserted >= self.goal
    }
}

/// Errors that abort an ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The store failed; pages committed earlier are kept.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The genre name could not be compiled into a subject matcher.
    #[error("failed to build subject matcher for genre {genre:?}")]
    GenrePattern {
        /// Genre that failed to compile.
        genre: String,
        /// Regex compilation error.
        #[source]
        source: regex::Error,
    },
}

/// Ingest up to `goal` new books for `genre` from `source` into `store`.
///
/// The loop stops on the first of:
///
/// - `goal` new books inserted;
/// - an empty page, or an offset at or beyond the total the source reported;
/// - `settings.max_pages` pages fetched;
/// - a fetch failure, which is logged and returned as the stop reason.
///
/// Pages that yield fewer usable records than requested do not stop the run.
/// Running twice against the same store never inserts a title twice.
///
/// # Errors
///
/// Returns [`IngestError::Store`] when the store fails. Pages committed before
/// the failure remain stored.
///
/// # Examples
///
/// ```
/// use booktrend_core::{
///     GenreName, IngestSettings, SourceApi, StopReason, ingest,
///     test_support::{MemoryBookStore, ScriptedSource, numbered_books},
/// };
///
/// let source = ScriptedSource::new(SourceApi::OpenLibrary)
///     .with_page(numbered_books("Tale", 3, "Fantasy"));
/// let mut store = MemoryBookStore::default();
/// let genre = GenreName::new("Fantasy").unwrap();
///
/// let report = ingest(&source, &mut store, &genre, 2, &IngestSettings::default()).unwrap();
/// assert_eq!(report.inserted, 2);
/// assert_eq!(report.stop, StopReason::GoalReached);
/// ```
pub fn ingest<S, T>(
    source: &S,
    store: &mut T,
    genre: &GenreName,
    goal: usize,
    settings: &IngestSettings,
) -> Result<IngestReport, IngestError>
where
    S: BookSource + ?Sized,
    T: BookStore + GenreRegistry + ?Sized,
{
    let matcher = GenreMatcher::new(genre).map_err(|source| IngestError::GenrePattern {
        genre: genre.to_string(),
        source,
    })?;
    let genre_id = store.ensure_genre(genre)?;
    let api = source.source_api();
    info!("ingesting up to {goal} books for genre '{genre}' from {api}");

    let mut report = IngestReport {
        source: api,
        genre: genre.clone(),
        genre_id,
        goal,
        inserted: 0,
        pages_fetched: 0,
        records_seen: 0,
        duplicates: 0,
        trimmed: 0,
        rejected: RejectionTally::default(),
        stop: StopReason::GoalReached,
    };
    let mut offset = 0_usize;
    let mut total_found: Option<u64> = None;

    report.stop = loop {
        if report.inserted >= goal {
            break StopReason::GoalReached;
        }
        if total_found.is_some_and(|total| u64::try_from(offset).unwrap_or(u64::MAX) >= total) {
            break StopReason::Exhausted;
        }
        if report.pages_fetched >= settings.max_pages {
            break StopReason::PageLimit;
        }

        let remaining = goal - report.inserted;
        let request = PageRequest {
            page: report.pages_fetched + 1,
            offset,
            limit: remaining
                .min(settings.per_call_limit)
                .min(source.page_size_ceiling())
                .max(1),
        };
        let page = match source.fetch_page(genre, request) {
            Ok(page) => page,
            Err(err) => {
                warn!("page {} from {api} failed: {err}", request.page);
                break StopReason::FetchFailed(err);
            }
        };
        report.pages_fetched += 1;
        if page.records.is_empty() {
            break StopReason::Exhausted;
        }

        offset += page.records.len();
        report.records_seen += page.records.len();
        total_found = page.total_found.or(total_found);

        let mut drafts = Vec::with_capacity(page.records.len());
        for record in page.records {
            match source.normalize_record(record, &matcher) {
                Ok(draft) => drafts.push(draft),
                Err(rejection) => {
                    debug!("skipping record from {api}: {rejection}");
                    report.rejected.record(rejection.kind());
                }
            }
        }

        let outcome = store.insert_page(genre_id, &drafts, remaining)?;
        report.inserted += outcome.inserted;
        report.duplicates += outcome.duplicates;
        report.trimmed += outcome.trimmed;
        info!(
            "page {} from {api}: {} new, {} duplicate; {}/{goal} inserted",
            request.page, outcome.inserted, outcome.duplicates, report.inserted
        );
    };

    info!(
        "finished {api} run for '{genre}': {}/{goal} inserted over {} pages ({})",
        report.inserted, report.pages_fetched, report.stop
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryBookStore, ScriptedSource, numbered_books, raw_book};
    use rstest::{fixture, rstest};

    #[fixture]
    fn fantasy() -> GenreName {
        GenreName::new("Fantasy").expect("valid genre")
    }

    fn timeout() -> FetchError {
        FetchError::Timeout {
            url: "https://example.test/search.json".into(),
            timeout_secs: 30,
        }
    }

    #[rstest]
    fn zero_goal_fetches_nothing(fantasy: GenreName) {
        let source =
            ScriptedSource::new(SourceApi::OpenLibrary).with_page(numbered_books("B", 5, "Fantasy"));
        let mut store = MemoryBookStore::default();
        let report =
            ingest(&source, &mut store, &fantasy, 0, &IngestSettings::default()).expect("ingest");
        assert_eq!(report.stop, StopReason::GoalReached);
        assert!(source.requests().is_empty());
        assert_eq!(report.pages_fetched, 0);
    }

    #[rstest]
    fn stops_after_first_page_when_goal_met(fantasy: GenreName) {
        let source = ScriptedSource::new(SourceApi::OpenLibrary)
            .with_page(numbered_books("B", 25, "Fantasy"))
            .with_page(numbered_books("C", 25, "Fantasy"));
        let mut store = MemoryBookStore::default();
        let report =
            ingest(&source, &mut store, &fantasy, 25, &IngestSettings::default()).expect("ingest");
        assert_eq!(report.inserted, 25);
        assert_eq!(report.stop, StopReason::GoalReached);
        assert_eq!(source.requests().len(), 1);
    }

    #[rstest]
    fn empty_first_page_is_exhaustion(fantasy: GenreName) {
        let source = ScriptedSource::new(SourceApi::OpenLibrary).with_page(Vec::new());
        let mut store = MemoryBookStore::default();
        let report =
            ingest(&source, &mut store, &fantasy, 10, &IngestSettings::default()).expect("ingest");
        assert_eq!(report.inserted, 0);
        assert_eq!(report.stop, StopReason::Exhausted);
    }

    #[rstest]
    fn request_size_respects_every_cap(fantasy: GenreName) {
        let source = ScriptedSource::new(SourceApi::GoogleBooks)
            .with_ceiling(40)
            .with_page(numbered_books("B", 25, "Fantasy"))
            .with_page(numbered_books("C", 25, "Fantasy"));
        let mut store = MemoryBookStore::default();
        ingest(&source, &mut store, &fantasy, 30, &IngestSettings::default()).expect("ingest");
        let limits: Vec<_> = source.requests().iter().map(|req| req.limit).collect();
        assert_eq!(limits, vec![25, 5]);
        let offsets: Vec<_> = source.requests().iter().map(|req| req.offset).collect();
        assert_eq!(offsets, vec![0, 25]);
    }

    #[rstest]
    fn low_yield_pages_do_not_stop_the_run(fantasy: GenreName) {
        let mut sparse = numbered_books("Kept", 2, "Fantasy");
        sparse.extend(numbered_books("Skipped", 3, "Cookbook"));
        let source = ScriptedSource::new(SourceApi::OpenLibrary)
            .with_page(sparse)
            .with_page(numbered_books("Later", 3, "Fantasy"));
        let mut store = MemoryBookStore::default();
        let report =
            ingest(&source, &mut store, &fantasy, 4, &IngestSettings::default()).expect("ingest");
        assert_eq!(report.inserted, 4);
        assert_eq!(report.rejected.get(RejectionKind::GenreMismatch), 3);
        assert_eq!(report.trimmed, 1);
        assert_eq!(report.stop, StopReason::GoalReached);
    }

    #[rstest]
    fn reported_total_signals_exhaustion(fantasy: GenreName) {
        let source = ScriptedSource::new(SourceApi::OpenLibrary)
            .with_page_total(numbered_books("B", 3, "Fantasy"), 3)
            .with_page(numbered_books("C", 3, "Fantasy"));
        let mut store = MemoryBookStore::default();
        let report =
            ingest(&source, &mut store, &fantasy, 10, &IngestSettings::default()).expect("ingest");
        assert_eq!(report.inserted, 3);
        assert_eq!(report.stop, StopReason::Exhausted);
        assert_eq!(source.requests().len(), 1);
    }

    #[rstest]
    fn page_ceiling_bounds_the_run(fantasy: GenreName) {
        let source = ScriptedSource::new(SourceApi::OpenLibrary)
            .with_page(vec![raw_book("Dup", Some(2001), &["Fantasy"])])
            .with_page(vec![raw_book("Dup", Some(2001), &["Fantasy"])])
            .with_page(vec![raw_book("Dup", Some(2001), &["Fantasy"])]);
        let mut store = MemoryBookStore::default();
        let settings = IngestSettings::default().with_max_pages(2);
        let report = ingest(&source, &mut store, &fantasy, 5, &settings).expect("ingest");
        assert_eq!(report.inserted, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.pages_fetched, 2);
        assert_eq!(report.stop, StopReason::PageLimit);
    }

    #[rstest]
    fn fetch_failure_keeps_partial_progress(fantasy: GenreName) {
        let source = ScriptedSource::new(SourceApi::OpenLibrary)
            .with_page(numbered_books("B", 5, "Fantasy"))
            .with_error(timeout());
        let mut store = MemoryBookStore::default();
        let report =
            ingest(&source, &mut store, &fantasy, 20, &IngestSettings::default()).expect("ingest");
        assert_eq!(report.inserted, 5);
        assert_eq!(report.stop, StopReason::FetchFailed(timeout()));
        assert_eq!(store.books().len(), 5);
    }

    #[rstest]
    fn store_failure_propagates(fantasy: GenreName) {
        let source = ScriptedSource::new(SourceApi::OpenLibrary)
            .with_page(numbered_books("B", 2, "Fantasy"))
            .with_page(numbered_books("C", 2, "Fantasy"));
        let mut store = MemoryBookStore::default().failing_after(1);
        let err = ingest(&source, &mut store, &fantasy, 10, &IngestSettings::default())
            .expect_err("second page write fails");
        assert!(matches!(err, IngestError::Store(StoreError::Sqlite { .. })));
        assert_eq!(store.books().len(), 2);
    }

    #[rstest]
    fn second_run_inserts_nothing_new(fantasy: GenreName) {
        let mut store = MemoryBookStore::default();
        for expected in [4, 0] {
            let source = ScriptedSource::new(SourceApi::OpenLibrary)
                .with_page(numbered_books("B", 4, "Fantasy"));
            let report = ingest(&source, &mut store, &fantasy, 10, &IngestSettings::default())
                .expect("ingest");
            assert_eq!(report.inserted, expected);
        }
        assert_eq!(store.books().len(), 4);
    }
}
