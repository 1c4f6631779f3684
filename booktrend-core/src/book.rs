//! Canonical book records produced by the normaliser.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Bibliographic API a record was gathered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceApi {
    /// Open Library subject search.
    OpenLibrary,
    /// Google Books volume search.
    GoogleBooks,
}

impl SourceApi {
    /// Every supported source, in menu order.
    pub const ALL: [Self; 2] = [Self::OpenLibrary, Self::GoogleBooks];

    /// Label persisted in the `books.source` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenLibrary => "Open Library",
            Self::GoogleBooks => "Google Books",
        }
    }
}

impl fmt::Display for SourceApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored or configured source label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown source API {label:?}")]
pub struct UnknownSourceApi {
    /// The label that failed to parse.
    pub label: String,
}

impl FromStr for SourceApi {
    type Err = UnknownSourceApi;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let folded: String = value
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        match folded.as_str() {
            "openlibrary" => Ok(Self::OpenLibrary),
            "googlebooks" => Ok(Self::GoogleBooks),
            _ => Err(UnknownSourceApi {
                label: value.to_owned(),
            }),
        }
    }
}

/// A normalised book ready for insertion.
///
/// Drafts carry no identifier; the store assigns one on first insertion and
/// ignores later drafts with the same title.
///
/// # Examples
///
/// ```
/// use booktrend_core::{BookDraft, SourceApi};
///
/// let draft = BookDraft::new("Dune", Some("Frank Herbert".into()), 1965, SourceApi::OpenLibrary);
/// assert_eq!(draft.decade(), 1960);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    /// Title, the store-wide deduplication key.
    pub title: String,
    /// Comma-joined authors, absent when the source supplied none.
    pub author: Option<String>,
    /// Publication year as derived from the source record.
    pub publish_year: i32,
    /// API the record came from.
    pub source: SourceApi,
    /// Subject or category that tied the record to the target genre.
    pub subject: Option<String>,
}

impl BookDraft {
    /// Construct a draft without subject metadata.
    pub fn new(
        title: impl Into<String>,
        author: Option<String>,
        publish_year: i32,
        source: SourceApi,
    ) -> Self {
        Self {
            title: title.into(),
            author,
            publish_year,
            source,
            subject: None,
        }
    }

    /// Attach the subject that matched the target genre.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Decade bucket of the publication year.
    #[must_use]
    pub const fn decade(&self) -> i32 {
        self.publish_year.div_euclid(10) * 10
    }
}
