//! Schema creation and version checks for the book database.

use rusqlite::{Connection, OptionalExtension, Transaction};

use super::StoreError;

/// Schema version written by this release.
pub const SCHEMA_VERSION: i64 = 1;

/// Initialise the book schema inside an SQLite database.
///
/// The function enables foreign keys, creates the `genres` and `books` tables
/// with their index, and records the schema version. Existing databases must
/// already match the expected version; mismatches are rejected so migrations
/// can be applied explicitly. Calling it on an initialised database is a
/// no-op.
///
/// # Examples
/// ```
/// use booktrend_core::store::initialise_schema;
/// use rusqlite::Connection;
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// initialise_schema(&mut conn).expect("create book schema");
///
/// let version: i64 = conn
///     .query_row("SELECT version FROM booktrend_schema_version LIMIT 1", [], |row| row.get(0))
///     .expect("read schema version");
/// assert_eq!(version, 1);
/// ```
pub fn initialise_schema(connection: &mut Connection) -> Result<(), StoreError> {
    connection
        .pragma_update(None, "foreign_keys", true)
        .map_err(|source| StoreError::Schema {
            step: "enable foreign keys",
            source,
        })?;

    let transaction = connection
        .transaction()
        .map_err(|source| StoreError::Schema {
            step: "begin schema transaction",
            source,
        })?;

    create_tables(&transaction)?;
    create_indexes(&transaction)?;
    ensure_schema_version(&transaction)?;

    transaction.commit().map_err(|source| StoreError::Schema {
        step: "commit schema transaction",
        source,
    })
}

fn create_tables(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(
        transaction,
        "create genres",
        "CREATE TABLE IF NOT EXISTS genres (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL CHECK (length(trim(name)) > 0)
        )",
    )?;
    run_migration_step(
        transaction,
        "create books",
        "CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT UNIQUE NOT NULL,
            author TEXT,
            publish_year INTEGER NOT NULL,
            source TEXT NOT NULL,
            subject TEXT,
            genre_id INTEGER REFERENCES genres(id) ON DELETE SET NULL
        )",
    )
}

fn create_indexes(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(
        transaction,
        "index books by genre",
        "CREATE INDEX IF NOT EXISTS idx_books_genre_id ON books(genre_id)",
    )
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS booktrend_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0),
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;

    let existing_version: Option<i64> = transaction
        .query_row(
            "SELECT version FROM booktrend_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| StoreError::Schema {
            step: "read schema version",
            source,
        })?;

    match existing_version {
        Some(version) if version == SCHEMA_VERSION => Ok(()),
        Some(found) => Err(StoreError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        }),
        None => transaction
            .execute(
                "INSERT INTO booktrend_schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )
            .map(|_| ())
            .map_err(|source| StoreError::Schema {
                step: "record schema version",
                source,
            }),
    }
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), StoreError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| StoreError::Schema { step, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn initialisation_is_idempotent() {
        let mut connection = Connection::open_in_memory().expect("open database");
        initialise_schema(&mut connection).expect("first initialisation");
        initialise_schema(&mut connection).expect("second initialisation");
        let versions: i64 = connection
            .query_row("SELECT COUNT(*) FROM booktrend_schema_version", [], |row| {
                row.get(0)
            })
            .expect("count versions");
        assert_eq!(versions, 1);
    }

    #[rstest]
    fn rejects_foreign_schema_version() {
        let mut connection = Connection::open_in_memory().expect("open database");
        initialise_schema(&mut connection).expect("initialise schema");
        connection
            .execute("UPDATE booktrend_schema_version SET version = 7", [])
            .expect("tamper with version");
        let err = initialise_schema(&mut connection).expect_err("mismatch should be rejected");
        assert!(matches!(
            err,
            StoreError::VersionMismatch {
                expected: SCHEMA_VERSION,
                found: 7
            }
        ));
    }

    #[rstest]
    fn creates_genre_index() {
        let mut connection = Connection::open_in_memory().expect("open database");
        initialise_schema(&mut connection).expect("initialise schema");
        let index: String = connection
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'books' AND name = 'idx_books_genre_id'",
                [],
                |row| row.get(0),
            )
            .expect("genre index exists");
        assert_eq!(index, "idx_books_genre_id");
    }
}
