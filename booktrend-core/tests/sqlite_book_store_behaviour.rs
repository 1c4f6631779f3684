//! Behavioural tests for `SqliteBookStore` using rstest-bdd.

use std::{cell::RefCell, path::PathBuf};

use booktrend_core::{
    BookDraft, BookStore, GenreName, GenreRegistry, ResetConfirmation, SourceApi,
    SqliteBookStore,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

/// Shared state for SQLite store scenarios.
struct BookStoreWorld {
    temp_dir: TempDir,
    store: RefCell<Option<SqliteBookStore>>,
}

impl BookStoreWorld {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("create temp dir"),
            store: RefCell::new(None),
        }
    }

    fn db_path(&self) -> PathBuf {
        self.temp_dir.path().join("book_trends.db")
    }

    fn open(&self) {
        let store = SqliteBookStore::open(self.db_path()).expect("open store");
        self.store.replace(Some(store));
    }

    fn with_store<R>(&self, f: impl FnOnce(&mut SqliteBookStore) -> R) -> R {
        let mut borrowed = self.store.borrow_mut();
        let store = borrowed.as_mut().expect("store should be open");
        f(store)
    }
}

#[fixture]
fn world() -> BookStoreWorld {
    BookStoreWorld::new()
}

fn genre(name: &str) -> GenreName {
    GenreName::new(name).expect("valid genre")
}

fn store_book(world: &BookStoreWorld, title: &str, source: SourceApi, genre_name: &str) {
    world.with_store(|store| {
        let id = store.ensure_genre(&genre(genre_name)).expect("register genre");
        let draft = BookDraft::new(title, Some("Bram Stoker".into()), 1897, source);
        store.insert_page(id, &[draft], 1).expect("insert page");
    });
}

#[given("an empty book store")]
fn given_empty_store(world: &BookStoreWorld) {
    world.open();
}

#[given("a store with 10 books across 3 genres")]
fn given_populated_store(world: &BookStoreWorld) {
    world.open();
    world.with_store(|store| {
        for (name, count) in [("Horror", 4), ("Poetry", 3), ("Travel", 3)] {
            let id = store.ensure_genre(&genre(name)).expect("register genre");
            let drafts: Vec<_> = (0..count)
                .map(|n| BookDraft::new(format!("{name} {n}"), None, 1980, SourceApi::OpenLibrary))
                .collect();
            store.insert_page(id, &drafts, count).expect("insert page");
        }
    });
}

#[when("I store \"Dracula\" from Open Library under Horror")]
fn when_store_open_library(world: &BookStoreWorld) {
    store_book(world, "Dracula", SourceApi::OpenLibrary, "Horror");
}

#[when("I store \"Dracula\" from Google Books under Horror")]
fn when_store_google_books(world: &BookStoreWorld) {
    store_book(world, "Dracula", SourceApi::GoogleBooks, "Horror");
}

#[when("I reset the store with confirmation")]
fn when_reset(world: &BookStoreWorld) {
    world.with_store(|store| {
        store
            .reset(ResetConfirmation::acknowledge())
            .expect("reset store");
    });
}

#[when("I reopen the database")]
fn when_reopen(world: &BookStoreWorld) {
    world.store.replace(None);
    world.open();
}

#[then("the store holds {count} book")]
fn then_book_count_singular(world: &BookStoreWorld, count: u64) {
    assert_eq!(world.with_store(|store| store.count_books()).expect("count"), count);
}

#[then("the store holds {count} books")]
fn then_book_count(world: &BookStoreWorld, count: u64) {
    assert_eq!(world.with_store(|store| store.count_books()).expect("count"), count);
}

#[then("the store holds {count} genres")]
fn then_genre_count(world: &BookStoreWorld, count: u64) {
    assert_eq!(world.with_store(|store| store.count_genres()).expect("count"), count);
}

#[then("the next genre and book both receive id 1")]
fn then_ids_restart(world: &BookStoreWorld) {
    store_book(world, "Carmilla", SourceApi::GoogleBooks, "Gothic");
    let (genre_id, book_id): (i64, i64) = world.with_store(|store| {
        store
            .connection()
            .query_row("SELECT genre_id, id FROM books", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .expect("read ids")
    });
    assert_eq!((genre_id, book_id), (1, 1));
}

#[scenario(path = "tests/features/sqlite_book_store.feature", index = 0)]
fn titles_deduplicated(world: BookStoreWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/sqlite_book_store.feature", index = 1)]
fn reset_restarts_identifiers(world: BookStoreWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/sqlite_book_store.feature", index = 2)]
fn reopen_keeps_rows(world: BookStoreWorld) {
    let _ = world;
}
