//! SQLite-backed book store and genre registry.

use std::{collections::BTreeMap, fmt, path::Path};

use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, params};

use crate::{BookDraft, GenreId, GenreName, GenreRegistry};

use super::{
    BookStore, PageInsertOutcome, ResetConfirmation, ResetSummary, StoreError,
    schema::initialise_schema,
};

/// A registered genre with its stored book count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredGenre {
    /// Registry identifier.
    pub id: GenreId,
    /// Name as registered.
    pub name: String,
    /// Books filed under the genre.
    pub books: u64,
}

/// Book store persisting to a single SQLite database.
///
/// Genre identifiers are cached after the first lookup. The cache is owned
/// by the store and cleared by [`SqliteBookStore::reset`].
pub struct SqliteBookStore {
    connection: Connection,
    genres: BTreeMap<String, GenreId>,
}

impl fmt::Debug for SqliteBookStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteBookStore")
            .field("path", &self.connection.path())
            .field("cached_genres", &self.genres.len())
            .finish_non_exhaustive()
    }
}

impl SqliteBookStore {
    /// Open or create the database at `path` and initialise its schema.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] when the file cannot be opened and
    /// schema errors when initialisation fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let connection = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(connection)
    }

    /// Create a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns schema errors when initialisation fails.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let connection = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: ":memory:".into(),
            source,
        })?;
        Self::from_connection(connection)
    }

    fn from_connection(mut connection: Connection) -> Result<Self, StoreError> {
        initialise_schema(&mut connection)?;
        Ok(Self {
            connection,
            genres: BTreeMap::new(),
        })
    }

    /// Borrow the underlying connection for read-only queries.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Count stored books across all genres.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the query fails.
    pub fn count_books(&self) -> Result<u64, StoreError> {
        self.count("SELECT COUNT(*) FROM books", "count books")
    }

    /// Count registered genres.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the query fails.
    pub fn count_genres(&self) -> Result<u64, StoreError> {
        self.count("SELECT COUNT(*) FROM genres", "count genres")
    }

    fn count(&self, sql: &str, operation: &'static str) -> Result<u64, StoreError> {
        self.connection
            .query_row(sql, [], |row| row.get(0))
            .map_err(|source| StoreError::Sqlite { operation, source })
    }

    /// List registered genres in id order with their book counts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when the query fails.
    pub fn list_genres(&self) -> Result<Vec<StoredGenre>, StoreError> {
        let mut statement = self
            .connection
            .prepare_cached(
                "SELECT g.id, g.name, COUNT(b.id)
                 FROM genres AS g
                 LEFT JOIN books AS b ON b.genre_id = g.id
                 GROUP BY g.id, g.name
                 ORDER BY g.id",
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "prepare genre listing",
                source,
            })?;
        let rows = statement
            .query_map([], |row| {
                Ok(StoredGenre {
                    id: GenreId::new(row.get(0)?),
                    name: row.get(1)?,
                    books: row.get(2)?,
                })
            })
            .map_err(|source| StoreError::Sqlite {
                operation: "list genres",
                source,
            })?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|source| StoreError::Sqlite {
                operation: "read genre row",
                source,
            })
    }

    /// Delete every book and genre and restart identifier sequences.
    ///
    /// All deletions run in one transaction; the next genre and book
    /// inserted afterwards receive identifier 1.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`] when any deletion fails; the store is
    /// left unchanged in that case.
    pub fn reset(&mut self, confirmation: ResetConfirmation) -> Result<ResetSummary, StoreError> {
        let ResetConfirmation = confirmation;
        let transaction = self
            .connection
            .transaction()
            .map_err(|source| StoreError::Sqlite {
                operation: "begin reset transaction",
                source,
            })?;
        let books_removed =
            transaction
                .execute("DELETE FROM books", [])
                .map_err(|source| StoreError::Sqlite {
                    operation: "delete books",
                    source,
                })?;
        let genres_removed =
            transaction
                .execute("DELETE FROM genres", [])
                .map_err(|source| StoreError::Sqlite {
                    operation: "delete genres",
                    source,
                })?;
        transaction
            .execute(
                "DELETE FROM sqlite_sequence WHERE name IN ('books', 'genres')",
                [],
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "reset identifier sequences",
                source,
            })?;
        transaction.commit().map_err(|source| StoreError::Sqlite {
            operation: "commit reset transaction",
            source,
        })?;

        self.genres.clear();
        info!("reset store: removed {books_removed} books and {genres_removed} genres");
        Ok(ResetSummary {
            books_removed,
            genres_removed,
        })
    }
}

impl GenreRegistry for SqliteBookStore {
    fn ensure_genre(&mut self, name: &GenreName) -> Result<GenreId, StoreError> {
        if let Some(id) = self.genres.get(name.as_str()) {
            return Ok(*id);
        }

        let transaction = self
            .connection
            .transaction()
            .map_err(|source| StoreError::Sqlite {
                operation: "begin genre transaction",
                source,
            })?;
        transaction
            .execute(
                "INSERT OR IGNORE INTO genres (name) VALUES (?1)",
                [name.as_str()],
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "insert genre",
                source,
            })?;
        let raw: i64 = transaction
            .query_row(
                "SELECT id FROM genres WHERE name = ?1",
                [name.as_str()],
                |row| row.get(0),
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "read genre id",
                source,
            })?;
        transaction.commit().map_err(|source| StoreError::Sqlite {
            operation: "commit genre transaction",
            source,
        })?;

        let id = GenreId::new(raw);
        debug!("genre '{name}' registered as {id}");
        self.genres.insert(name.as_str().to_owned(), id);
        Ok(id)
    }

    fn lookup_genre(&self, name: &GenreName) -> Result<Option<GenreId>, StoreError> {
        if let Some(id) = self.genres.get(name.as_str()) {
            return Ok(Some(*id));
        }
        self.connection
            .query_row(
                "SELECT id FROM genres WHERE name = ?1",
                [name.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map(|raw| raw.map(GenreId::new))
            .map_err(|source| StoreError::Sqlite {
                operation: "look up genre",
                source,
            })
    }
}

impl BookStore for SqliteBookStore {
    fn insert_page(
        &mut self,
        genre: GenreId,
        drafts: &[BookDraft],
        limit: usize,
    ) -> Result<PageInsertOutcome, StoreError> {
        let transaction = self
            .connection
            .transaction()
            .map_err(|source| StoreError::Sqlite {
                operation: "begin page transaction",
                source,
            })?;

        let outcome = {
            let registered = transaction
                .prepare_cached("SELECT 1 FROM genres WHERE id = ?1 LIMIT 1")
                .and_then(|mut statement| statement.exists([genre.get()]))
                .map_err(|source| StoreError::Sqlite {
                    operation: "check genre",
                    source,
                })?;
            if !registered {
                return Err(StoreError::MissingGenre { genre_id: genre });
            }

            let mut check_title = transaction
                .prepare_cached("SELECT 1 FROM books WHERE title = ?1 LIMIT 1")
                .map_err(|source| StoreError::Sqlite {
                    operation: "prepare title lookup",
                    source,
                })?;
            let mut insert_book = transaction
                .prepare_cached(
                    "INSERT OR IGNORE INTO books (
                        title,
                        author,
                        publish_year,
                        source,
                        subject,
                        genre_id
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .map_err(|source| StoreError::Sqlite {
                    operation: "prepare insert book",
                    source,
                })?;

            let mut outcome = PageInsertOutcome::default();
            for draft in drafts {
                if outcome.inserted >= limit {
                    outcome.trimmed += 1;
                    continue;
                }
                let present = check_title.exists([draft.title.as_str()]).map_err(|source| {
                    StoreError::Sqlite {
                        operation: "check title",
                        source,
                    }
                })?;
                if present {
                    debug!("skipping duplicate title {:?}", draft.title);
                    outcome.duplicates += 1;
                    continue;
                }
                let changed = insert_book
                    .execute(params![
                        draft.title,
                        draft.author,
                        draft.publish_year,
                        draft.source.as_str(),
                        draft.subject,
                        genre.get(),
                    ])
                    .map_err(|source| StoreError::Sqlite {
                        operation: "insert book",
                        source,
                    })?;
                if changed == 0 {
                    outcome.duplicates += 1;
                } else {
                    outcome.inserted += 1;
                }
            }
            outcome
        };

        transaction.commit().map_err(|source| StoreError::Sqlite {
            operation: "commit page transaction",
            source,
        })?;
        Ok(outcome)
    }

    fn contains_title(&self, title: &str) -> Result<bool, StoreError> {
        self.connection
            .prepare_cached("SELECT 1 FROM books WHERE title = ?1 LIMIT 1")
            .and_then(|mut statement| statement.exists([title]))
            .map_err(|source| StoreError::Sqlite {
                operation: "check title",
                source,
            })
    }
}
