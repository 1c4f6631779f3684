//! Genre names, persistent genre identifiers, and the registry contract.

use std::fmt;

use thiserror::Error;

use crate::store::StoreError;

/// Genres offered by the interactive menu.
pub const COMMON_GENRES: [&str; 16] = [
    "Science Fiction",
    "Fantasy",
    "Mystery",
    "Thriller",
    "Romance",
    "Historical Fiction",
    "Contemporary Fiction",
    "Young Adult",
    "Biography",
    "Autobiography",
    "Memoir",
    "Cookbook",
    "Travel",
    "Poetry",
    "Drama",
    "Horror",
];

/// Stable identifier assigned to a genre by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenreId(i64);

impl GenreId {
    /// Wrap a raw row identifier.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Return the raw row identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for GenreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors returned by [`GenreName::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenreNameError {
    /// The name was empty after trimming.
    #[error("genre name must not be empty")]
    Empty,
}

/// A validated, trimmed genre name.
///
/// # Examples
///
/// ```
/// use booktrend_core::GenreName;
///
/// # fn main() -> Result<(), booktrend_core::GenreNameError> {
/// let genre = GenreName::new("  Science Fiction ")?;
/// assert_eq!(genre.as_str(), "Science Fiction");
/// assert_eq!(genre.file_stem(), "science_fiction");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenreName(String);

impl GenreName {
    /// Validates and constructs a [`GenreName`].
    pub fn new(name: impl AsRef<str>) -> Result<Self, GenreNameError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(GenreNameError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the name as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-case stem used for report and chart file names.
    ///
    /// Every character outside `[A-Za-z0-9_-]` becomes `_`, so the stem is
    /// always a single path component. Names differing only in case or
    /// punctuation (`Horror` and `horror`) share a stem and therefore share
    /// report files.
    #[must_use]
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl fmt::Display for GenreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for GenreName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Owner of the genre name to identifier mapping.
///
/// Implementations insert unseen names and read the identifier back within a
/// single transactional unit, so callers never observe a name without an id.
/// The mapping is exposed only through these two operations.
pub trait GenreRegistry {
    /// Return the identifier for `name`, creating the genre when missing.
    ///
    /// Calling this repeatedly with the same name returns the same id.
    fn ensure_genre(&mut self, name: &GenreName) -> Result<GenreId, StoreError>;

    /// Return the identifier for `name` without creating it.
    fn lookup_genre(&self, name: &GenreName) -> Result<Option<GenreId>, StoreError>;
}
