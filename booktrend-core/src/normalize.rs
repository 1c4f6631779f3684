//! Map raw, source-specific records onto canonical [`BookDraft`] values.
//!
//! Sources translate their wire format into a [`RawBook`] and pick an
//! [`AuthorPolicy`]; [`RawBook::normalize`] then applies the shared rules:
//!
//! - the title must be non-empty after trimming;
//! - the year is either a bare integer or the leading four digits of a date
//!   string;
//! - authors are joined with `", "` in source order;
//! - subject-tagged records must carry a subject that mentions the target
//!   genre as a whole word, case-insensitively.
//!
//! The plausible-year window is not checked here. Out-of-range years are
//! stored and later excluded by the decade aggregation.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::{BookDraft, GenreName, SourceApi};

/// Publication date as supplied by a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawYear {
    /// A bare integer year, e.g. Open Library's `first_publish_year`.
    Year(i64),
    /// A date string whose first four characters hold the year,
    /// e.g. Google Books' `publishedDate` (`"2004-05-01"`).
    Date(String),
}

/// How a record demonstrates that it belongs to the requested genre.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenreEvidence {
    /// Free-form subject tags that must mention the genre.
    Subjects(Vec<String>),
    /// The source query already filtered on the genre; the first category,
    /// when present, is kept as the subject.
    QueryMatched {
        /// Category reported by the source, if any.
        category: Option<String>,
    },
}

/// Whether a source must supply at least one author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorPolicy {
    /// Records without authors are stored with an unset author.
    Optional,
    /// Records without authors are rejected.
    Required,
}

/// Why a raw record was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordRejection {
    /// The title was absent or blank.
    #[error("record has no title")]
    MissingTitle,
    /// No publication date was supplied.
    #[error("record has no publication year")]
    MissingYear,
    /// The publication date could not be read as a four-digit year.
    #[error("publication date {raw:?} does not start with a four-digit year")]
    InvalidYear {
        /// The offending value as supplied.
        raw: String,
    },
    /// The source requires an author and none was supplied.
    #[error("record has no author")]
    MissingAuthor,
    /// A subject-tagged record carried no subjects.
    #[error("record has no subjects")]
    NoSubjects,
    /// None of the record's subjects mention the genre as a whole word.
    #[error("no subject mentions genre {genre:?}")]
    GenreMismatch {
        /// Genre the record was checked against.
        genre: String,
    },
}

/// Field-free discriminant of [`RecordRejection`] used for tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RejectionKind {
    /// See [`RecordRejection::MissingTitle`].
    MissingTitle,
    /// See [`RecordRejection::MissingYear`].
    MissingYear,
    /// See [`RecordRejection::InvalidYear`].
    InvalidYear,
    /// See [`RecordRejection::MissingAuthor`].
    MissingAuthor,
    /// See [`RecordRejection::NoSubjects`].
    NoSubjects,
    /// See [`RecordRejection::GenreMismatch`].
    GenreMismatch,
}

impl RejectionKind {
    /// Short label used in run summaries.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingTitle => "missing title",
            Self::MissingYear => "missing year",
            Self::InvalidYear => "invalid year",
            Self::MissingAuthor => "missing author",
            Self::NoSubjects => "no subjects",
            Self::GenreMismatch => "genre mismatch",
        }
    }
}

impl std::fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RecordRejection {
    /// Discriminant used when counting skipped records.
    #[must_use]
    pub const fn kind(&self) -> RejectionKind {
        match self {
            Self::MissingTitle => RejectionKind::MissingTitle,
            Self::MissingYear => RejectionKind::MissingYear,
            Self::InvalidYear { .. } => RejectionKind::InvalidYear,
            Self::MissingAuthor => RejectionKind::MissingAuthor,
            Self::NoSubjects => RejectionKind::NoSubjects,
            Self::GenreMismatch { .. } => RejectionKind::GenreMismatch,
        }
    }
}

/// Case-insensitive whole-word matcher for one genre.
///
/// # Examples
///
/// ```
/// use booktrend_core::{GenreMatcher, GenreName};
///
/// let matcher = GenreMatcher::new(&GenreName::new("romance").unwrap()).unwrap();
/// assert!(matcher.matches("Romance and Drama"));
/// assert!(!matcher.matches("Aromance novel"));
/// ```
#[derive(Debug, Clone)]
pub struct GenreMatcher {
    genre: GenreName,
    pattern: Regex,
}

impl GenreMatcher {
    /// Compile a word-boundary pattern for `genre`.
    ///
    /// # Errors
    ///
    /// Returns the regex error when the escaped name exceeds the compiled
    /// pattern size limit.
    pub fn new(genre: &GenreName) -> Result<Self, regex::Error> {
        let escaped = regex::escape(genre.as_str());
        let pattern = RegexBuilder::new(&format!(r"\b{escaped}\b"))
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            genre: genre.clone(),
            pattern,
        })
    }

    /// Genre this matcher was built for.
    #[must_use]
    pub const fn genre(&self) -> &GenreName {
        &self.genre
    }

    /// Report whether `subject` mentions the genre as a whole word.
    #[must_use]
    pub fn matches(&self, subject: &str) -> bool {
        self.pattern.is_match(subject.trim())
    }

    fn first_match<'a>(&self, subjects: &'a [String]) -> Option<&'a str> {
        subjects
            .iter()
            .map(String::as_str)
            .find(|subject| self.matches(subject))
    }
}

/// A source record reduced to the fields the normaliser inspects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBook {
    /// Title as supplied.
    pub title: Option<String>,
    /// Author names in source order.
    pub authors: Vec<String>,
    /// Publication date as supplied.
    pub published: Option<RawYear>,
    /// Evidence tying the record to the requested genre.
    pub evidence: GenreEvidence,
}

impl RawBook {
    /// Apply the normalisation rules for `source` under `policy`.
    ///
    /// # Errors
    ///
    /// Returns the first [`RecordRejection`] that applies, checking the
    /// title, year, author, and genre evidence in that order.
    pub fn normalize(
        self,
        source: SourceApi,
        policy: AuthorPolicy,
        matcher: &GenreMatcher,
    ) -> Result<BookDraft, RecordRejection> {
        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .ok_or(RecordRejection::MissingTitle)?
            .to_owned();
        let publish_year = self
            .published
            .as_ref()
            .ok_or(RecordRejection::MissingYear)
            .and_then(derive_year)?;
        let author = join_authors(&self.authors);
        if author.is_none() && policy == AuthorPolicy::Required {
            return Err(RecordRejection::MissingAuthor);
        }
        let subject = match self.evidence {
            GenreEvidence::Subjects(subjects) => {
                if subjects.is_empty() {
                    return Err(RecordRejection::NoSubjects);
                }
                let matched =
                    matcher
                        .first_match(&subjects)
                        .ok_or_else(|| RecordRejection::GenreMismatch {
                            genre: matcher.genre().to_string(),
                        })?;
                Some(matched.trim().to_owned())
            }
            GenreEvidence::QueryMatched { category } => category
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty()),
        };

        Ok(BookDraft {
            title,
            author,
            publish_year,
            source,
            subject,
        })
    }
}

/// Derive a publication year from a bare integer or a date string.
///
/// # Errors
///
/// Returns [`RecordRejection::InvalidYear`] when the integer does not fit an
/// `i32` or the string does not start with four ASCII digits.
pub fn derive_year(raw: &RawYear) -> Result<i32, RecordRejection> {
    match raw {
        RawYear::Year(year) => i32::try_from(*year).map_err(|_| RecordRejection::InvalidYear {
            raw: year.to_string(),
        }),
        RawYear::Date(date) => {
            let prefix: String = date.trim().chars().take(4).collect();
            if prefix.len() != 4 || !prefix.chars().all(|ch| ch.is_ascii_digit()) {
                return Err(RecordRejection::InvalidYear { raw: date.clone() });
            }
            prefix
                .parse()
                .map_err(|_| RecordRejection::InvalidYear { raw: date.clone() })
        }
    }
}

/// Join non-blank author names with `", "`, preserving order.
#[must_use]
pub fn join_authors(authors: &[String]) -> Option<String> {
    let names: Vec<&str> = authors
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .collect();
    (!names.is_empty()).then(|| names.join(", "))
}
