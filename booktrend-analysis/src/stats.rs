//! Read-only aggregation queries over the book store.

use std::collections::BTreeMap;

use booktrend_core::GenreId;
use log::warn;
use rusqlite::{Connection, params};

use crate::AnalysisError;

/// Earliest publication year counted by [`StatsReader::books_per_decade`].
pub const MIN_YEAR: i32 = 1000;

/// Latest publication year counted by [`StatsReader::books_per_decade`].
pub const MAX_YEAR: i32 = 2100;

/// Book counts keyed by decade start year, iterated in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecadeHistogram {
    counts: BTreeMap<i32, u64>,
}

impl DecadeHistogram {
    /// Iterate `(decade, count)` pairs from the earliest decade.
    pub fn iter(&self) -> impl Iterator<Item = (i32, u64)> + '_ {
        self.counts.iter().map(|(decade, count)| (*decade, *count))
    }

    /// Count for the decade starting at `decade`.
    #[must_use]
    pub fn get(&self, decade: i32) -> Option<u64> {
        self.counts.get(&decade).copied()
    }

    /// Number of decades present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no decade is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all decade counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

impl FromIterator<(i32, u64)> for DecadeHistogram {
    fn from_iter<I: IntoIterator<Item = (i32, u64)>>(iter: I) -> Self {
        let mut counts = BTreeMap::new();
        for (decade, count) in iter {
            *counts.entry(decade).or_insert(0) += count;
        }
        Self { counts }
    }
}

/// Number of books attributed to one author string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorCount {
    /// Author string exactly as stored.
    pub author: String,
    /// Books in the genre carrying that author string.
    pub books: u64,
}

impl AuthorCount {
    /// Build a count for `author`.
    pub fn new(author: impl Into<String>, books: u64) -> Self {
        Self {
            author: author.into(),
            books,
        }
    }
}

/// Aggregation queries scoped to a single genre.
///
/// # Examples
///
/// ```
/// use booktrend_analysis::StatsReader;
/// use booktrend_core::{BookDraft, BookStore, GenreName, GenreRegistry, SourceApi, SqliteBookStore};
///
/// let mut store = SqliteBookStore::open_in_memory().expect("open store");
/// let genre = store
///     .ensure_genre(&GenreName::new("Horror").expect("valid genre"))
///     .expect("register genre");
/// let draft = BookDraft::new("Dracula", Some("Bram Stoker".into()), 1897, SourceApi::OpenLibrary);
/// store.insert_page(genre, &[draft], 1).expect("insert book");
///
/// let stats = StatsReader::new(store.connection());
/// let decades = stats.books_per_decade(genre).expect("query").expect("one decade");
/// assert_eq!(decades.get(1890), Some(1));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StatsReader<'conn> {
    connection: &'conn Connection,
}

impl<'conn> StatsReader<'conn> {
    /// Wrap an open connection to an initialised book database.
    #[must_use]
    pub const fn new(connection: &'conn Connection) -> Self {
        Self { connection }
    }

    /// Count books per decade for `genre`.
    ///
    /// Only integer years within [`MIN_YEAR`]`..=`[`MAX_YEAR`] are counted;
    /// other rows are logged and skipped. Returns `None` when no row
    /// qualifies.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Query`] when a query fails.
    pub fn books_per_decade(
        &self,
        genre: GenreId,
    ) -> Result<Option<DecadeHistogram>, AnalysisError> {
        let skipped: u64 = self
            .connection
            .query_row(
                "SELECT COUNT(*) FROM books
                 WHERE genre_id = ?1
                   AND NOT (typeof(publish_year) = 'integer'
                            AND publish_year BETWEEN ?2 AND ?3)",
                params![genre.get(), MIN_YEAR, MAX_YEAR],
                |row| row.get(0),
            )
            .map_err(|source| AnalysisError::Query {
                operation: "count out-of-range years",
                source,
            })?;
        if skipped > 0 {
            warn!(
                "skipping {skipped} book(s) in genre {genre} with publish years outside {MIN_YEAR}..={MAX_YEAR}"
            );
        }

        let mut statement = self
            .connection
            .prepare_cached(
                "SELECT (publish_year / 10) * 10 AS decade, COUNT(*)
                 FROM books
                 WHERE genre_id = ?1
                   AND typeof(publish_year) = 'integer'
                   AND publish_year BETWEEN ?2 AND ?3
                 GROUP BY decade
                 ORDER BY decade",
            )
            .map_err(|source| AnalysisError::Query {
                operation: "prepare decade histogram",
                source,
            })?;
        let histogram = statement
            .query_map(params![genre.get(), MIN_YEAR, MAX_YEAR], |row| {
                Ok((row.get::<_, i32>(0)?, row.get::<_, u64>(1)?))
            })
            .and_then(|rows| rows.collect::<Result<DecadeHistogram, _>>())
            .map_err(|source| AnalysisError::Query {
                operation: "read decade histogram",
                source,
            })?;

        Ok((!histogram.is_empty()).then_some(histogram))
    }

    /// Return up to `limit` authors of `genre` ranked by book count.
    ///
    /// Authors that are missing or blank are ignored. Ties are ordered by the
    /// author's earliest stored book. An empty vector means there is no
    /// author data.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Query`] when the query fails.
    pub fn top_authors(
        &self,
        genre: GenreId,
        limit: usize,
    ) -> Result<Vec<AuthorCount>, AnalysisError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let mut statement = self
            .connection
            .prepare_cached(
                "SELECT author, COUNT(*) AS books
                 FROM books
                 WHERE genre_id = ?1
                   AND author IS NOT NULL
                   AND trim(author) <> ''
                 GROUP BY author
                 ORDER BY books DESC, MIN(id) ASC
                 LIMIT ?2",
            )
            .map_err(|source| AnalysisError::Query {
                operation: "prepare top authors",
                source,
            })?;
        statement
            .query_map(params![genre.get(), limit], |row| {
                Ok(AuthorCount {
                    author: row.get(0)?,
                    books: row.get(1)?,
                })
            })
            .and_then(|rows| rows.collect())
            .map_err(|source| AnalysisError::Query {
                operation: "read top authors",
                source,
            })
    }

    /// Count every book stored under `genre`, whatever its year.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Query`] when the query fails.
    pub fn total_books(&self, genre: GenreId) -> Result<u64, AnalysisError> {
        self.connection
            .query_row(
                "SELECT COUNT(*) FROM books WHERE genre_id = ?1",
                [genre.get()],
                |row| row.get(0),
            )
            .map_err(|source| AnalysisError::Query {
                operation: "count genre books",
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use booktrend_core::{BookDraft, BookStore, GenreName, GenreRegistry, SourceApi, SqliteBookStore};
    use rstest::{fixture, rstest};

    struct Seeded {
        store: SqliteBookStore,
        genre: GenreId,
    }

    #[fixture]
    fn seeded() -> Seeded {
        let mut store = SqliteBookStore::open_in_memory().expect("open store");
        let genre = store
            .ensure_genre(&GenreName::new("Horror").expect("valid genre"))
            .expect("register genre");
        Seeded { store, genre }
    }

    fn insert(seeded: &mut Seeded, books: &[(&str, Option<&str>, i32)]) {
        let drafts: Vec<_> = books
            .iter()
            .map(|(title, author, year)| {
                BookDraft::new(*title, author.map(str::to_owned), *year, SourceApi::OpenLibrary)
            })
            .collect();
        seeded
            .store
            .insert_page(seeded.genre, &drafts, drafts.len())
            .expect("insert books");
    }

    #[rstest]
    fn groups_years_into_decades(mut seeded: Seeded) {
        insert(
            &mut seeded,
            &[
                ("Carrie", Some("Stephen King"), 1974),
                ("Salem's Lot", Some("Stephen King"), 1975),
                ("It", Some("Stephen King"), 1986),
                ("Frankenstein", Some("Mary Shelley"), 1818),
            ],
        );
        let stats = StatsReader::new(seeded.store.connection());

        let histogram = stats
            .books_per_decade(seeded.genre)
            .expect("query")
            .expect("histogram");

        let decades: Vec<_> = histogram.iter().collect();
        assert_eq!(decades, vec![(1810, 1), (1970, 2), (1980, 1)]);
        assert_eq!(histogram.total(), 4);
    }

    #[rstest]
    fn skips_out_of_range_and_non_integer_years(mut seeded: Seeded) {
        insert(
            &mut seeded,
            &[
                ("Beowulf", None, 950),
                ("Future Gothic", None, 2300),
                ("Edge Case", None, 2100),
                ("Dracula", Some("Bram Stoker"), 1897),
            ],
        );
        seeded
            .store
            .connection()
            .execute(
                "INSERT INTO books (title, publish_year, source, genre_id)
                 VALUES ('Undated Grimoire', 'unknown', 'Open Library', ?1)",
                [seeded.genre.get()],
            )
            .expect("insert text year");
        let stats = StatsReader::new(seeded.store.connection());

        let histogram = stats
            .books_per_decade(seeded.genre)
            .expect("query")
            .expect("histogram");
        let total = stats.total_books(seeded.genre).expect("total");

        assert!(histogram.iter().all(|(decade, _)| (MIN_YEAR..=MAX_YEAR).contains(&decade)));
        assert_eq!(histogram.get(1890), Some(1));
        assert_eq!(histogram.get(2100), Some(1));
        assert_eq!(histogram.total(), 2);
        assert_eq!(total, 5);
        assert!(histogram.total() <= total);
    }

    #[rstest]
    fn empty_genre_has_no_decade_data(seeded: Seeded) {
        let stats = StatsReader::new(seeded.store.connection());
        assert_eq!(stats.books_per_decade(seeded.genre).expect("query"), None);
        assert!(stats.top_authors(seeded.genre, 10).expect("query").is_empty());
        assert_eq!(stats.total_books(seeded.genre).expect("total"), 0);
    }

    #[rstest]
    fn ranks_authors_with_stable_ties(mut seeded: Seeded) {
        insert(
            &mut seeded,
            &[
                ("The Haunting of Hill House", Some("Shirley Jackson"), 1959),
                ("Carrie", Some("Stephen King"), 1974),
                ("We Have Always Lived in the Castle", Some("Shirley Jackson"), 1962),
                ("It", Some("Stephen King"), 1986),
                ("Misery", Some("Stephen King"), 1987),
                ("Dracula", Some("Bram Stoker"), 1897),
                ("Anonymous Tale", None, 1900),
                ("Blank Tale", Some("   "), 1901),
                ("Carmilla", Some("Sheridan Le Fanu"), 1872),
            ],
        );
        let stats = StatsReader::new(seeded.store.connection());

        let authors = stats.top_authors(seeded.genre, 10).expect("query");

        assert_eq!(
            authors,
            vec![
                AuthorCount::new("Stephen King", 3),
                AuthorCount::new("Shirley Jackson", 2),
                AuthorCount::new("Bram Stoker", 1),
                AuthorCount::new("Sheridan Le Fanu", 1),
            ]
        );
        assert!(authors.windows(2).all(|pair| match pair {
            [first, second] => first.books >= second.books,
            _ => true,
        }));
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(2, 2)]
    #[case(50, 3)]
    fn top_authors_respects_limit(mut seeded: Seeded, #[case] limit: usize, #[case] expected: usize) {
        insert(
            &mut seeded,
            &[
                ("A", Some("Ann"), 1990),
                ("B", Some("Bea"), 1991),
                ("C", Some("Cy"), 1992),
            ],
        );
        let stats = StatsReader::new(seeded.store.connection());
        assert_eq!(stats.top_authors(seeded.genre, limit).expect("query").len(), expected);
    }

    #[rstest]
    fn scopes_queries_to_one_genre(mut seeded: Seeded) {
        insert(&mut seeded, &[("Dracula", Some("Bram Stoker"), 1897)]);
        let other = seeded
            .store
            .ensure_genre(&GenreName::new("Poetry").expect("valid genre"))
            .expect("register genre");
        seeded
            .store
            .insert_page(
                other,
                &[BookDraft::new("Leaves of Grass", Some("Walt Whitman".into()), 1855, SourceApi::GoogleBooks)],
                1,
            )
            .expect("insert poetry");
        let stats = StatsReader::new(seeded.store.connection());

        assert_eq!(stats.total_books(seeded.genre).expect("total"), 1);
        assert_eq!(
            stats.top_authors(other, 10).expect("query"),
            vec![AuthorCount::new("Walt Whitman", 1)]
        );
    }

    #[rstest]
    fn histogram_merges_repeated_decades() {
        let histogram: DecadeHistogram = [(1990, 2), (1980, 1), (1990, 3)].into_iter().collect();
        assert_eq!(histogram.len(), 2);
        assert_eq!(histogram.get(1990), Some(5));
        assert_eq!(histogram.iter().next(), Some((1980, 1)));
    }
}
