//! Scripted prompts and sources for driving commands without a terminal.

use std::{cell::RefCell, collections::VecDeque};

use booktrend_core::{
    BookDraft, BookStore, GenreName, GenreRegistry, IngestSettings, SourceApi,
    SqliteBookStore, test_support::{ScriptedSource, numbered_books},
};
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

use crate::{
    CliError,
    gather::{GenreRuns, SourceRunner, ingest_each},
    prompt::Prompter,
};

/// One scripted reply, consumed in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Answer {
    Confirm(bool),
    Select(usize),
    SelectMany(Vec<usize>),
    Text(String),
}

/// Replays scripted answers and records every question asked.
#[derive(Debug, Default)]
pub(super) struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    pub(super) asked: Vec<String>,
    pub(super) offered: Vec<Vec<String>>,
}

impl ScriptedPrompter {
    pub(super) fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            ..Self::default()
        }
    }

    pub(super) fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, message: &str) -> Answer {
        self.asked.push(message.to_owned());
        self.answers
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted answer for {message:?}"))
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, message: &str) -> Result<bool, CliError> {
        match self.next(message) {
            Answer::Confirm(answer) => Ok(answer),
            other => panic!("expected a confirm answer for {message:?}, found {other:?}"),
        }
    }

    fn select_one(&mut self, message: &str, options: &[String]) -> Result<usize, CliError> {
        self.offered.push(options.to_vec());
        match self.next(message) {
            Answer::Select(index) => Ok(index),
            other => panic!("expected a select answer for {message:?}, found {other:?}"),
        }
    }

    fn select_many(&mut self, message: &str, options: &[String]) -> Result<Vec<usize>, CliError> {
        self.offered.push(options.to_vec());
        match self.next(message) {
            Answer::SelectMany(indices) => Ok(indices),
            other => panic!("expected a multi-select answer for {message:?}, found {other:?}"),
        }
    }

    fn text(&mut self, message: &str) -> Result<String, CliError> {
        match self.next(message) {
            Answer::Text(answer) => Ok(answer),
            other => panic!("expected a text answer for {message:?}, found {other:?}"),
        }
    }
}

/// Offers `per_genre` subject-tagged books for every genre and records the
/// API it was asked to use.
#[derive(Debug, Default)]
pub(super) struct StubRunner {
    pub(super) per_genre: usize,
    pub(super) used: RefCell<Vec<SourceApi>>,
}

impl StubRunner {
    pub(super) fn offering(per_genre: usize) -> Self {
        Self {
            per_genre,
            used: RefCell::new(Vec::new()),
        }
    }
}

impl SourceRunner for StubRunner {
    fn ingest_genres(
        &self,
        api: SourceApi,
        store: &mut SqliteBookStore,
        genres: &[GenreName],
        goal: usize,
        settings: &IngestSettings,
    ) -> Result<GenreRuns, CliError> {
        self.used.borrow_mut().push(api);
        let mut runs = GenreRuns::default();
        for genre in genres {
            let books = numbered_books(genre.as_str(), self.per_genre, genre.as_str());
            let source = ScriptedSource::new(api).with_page(books);
            let run = ingest_each(&source, store, std::slice::from_ref(genre), goal, settings);
            runs.reports.extend(run.reports);
            if run.failure.is_some() {
                runs.failure = run.failure;
                break;
            }
        }
        Ok(runs)
    }
}

/// Temporary workspace holding a database path and report directories.
pub(super) struct Workspace {
    _dir: TempDir,
    pub(super) root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn database(&self) -> Utf8PathBuf {
        self.root.join("data").join("books.db")
    }

    pub(super) fn calculations(&self) -> Utf8PathBuf {
        self.root.join("calculations")
    }

    pub(super) fn visualizations(&self) -> Utf8PathBuf {
        self.root.join("visualizations")
    }
}

/// Store `count` books under `genre` in the database at `path`.
pub(super) fn seed_books(path: &Utf8Path, genre: &str, count: usize) {
    booktrend_fs::ensure_parent_dir(path).expect("create database dir");
    let mut store = SqliteBookStore::open(path.as_std_path()).expect("open store");
    let genre_id = store
        .ensure_genre(&GenreName::new(genre).expect("valid genre"))
        .expect("register genre");
    let drafts: Vec<_> = (1900..)
        .take(count)
        .map(|year| {
            BookDraft::new(
                format!("{genre} book {year}"),
                Some(format!("{genre} author")),
                year,
                SourceApi::OpenLibrary,
            )
        })
        .collect();
    store
        .insert_page(genre_id, &drafts, drafts.len())
        .expect("insert books");
}

pub(super) fn output(buffer: &[u8]) -> String {
    String::from_utf8(buffer.to_vec()).expect("stdout utf-8")
}
