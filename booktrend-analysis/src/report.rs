//! Report settings, per-genre aggregates, and the CSV calculations file.

use std::borrow::Cow;

use booktrend_core::{GenreId, GenreName};
use camino::Utf8PathBuf;
use rusqlite::Connection;

use crate::{AnalysisError, AuthorCount, ChartKind, DecadeHistogram, StatsReader};

/// Default number of authors in the ranking.
pub const DEFAULT_TOP_N: usize = 10;

/// Default number of pie slices, including the grouped "Others" slice.
pub const DEFAULT_MAX_SLICES: usize = 5;

/// Default directory for CSV calculation files.
pub const DEFAULT_CALCULATIONS_DIR: &str = "calculations";

/// Default directory for SVG charts.
pub const DEFAULT_VISUALIZATIONS_DIR: &str = "visualizations";

const CSV_LINE_END: &str = "\r\n";
const NO_DATA: &str = "No data available";

/// Output locations and ranking limits for a report run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    /// Number of authors to rank.
    pub top_n: usize,
    /// Maximum pie slices before smaller authors are grouped.
    pub max_slices: usize,
    /// Directory receiving `<genre>_analysis_results.csv`.
    pub calculations_dir: Utf8PathBuf,
    /// Directory receiving the SVG charts.
    pub visualizations_dir: Utf8PathBuf,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            max_slices: DEFAULT_MAX_SLICES,
            calculations_dir: Utf8PathBuf::from(DEFAULT_CALCULATIONS_DIR),
            visualizations_dir: Utf8PathBuf::from(DEFAULT_VISUALIZATIONS_DIR),
        }
    }
}

impl ReportSettings {
    /// Set the number of ranked authors.
    #[must_use]
    pub const fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Set the pie slice cap. Values below one are raised to one.
    #[must_use]
    pub fn with_max_slices(mut self, max_slices: usize) -> Self {
        self.max_slices = max_slices.max(1);
        self
    }

    /// Set the CSV output directory.
    #[must_use]
    pub fn with_calculations_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.calculations_dir = dir.into();
        self
    }

    /// Set the chart output directory.
    #[must_use]
    pub fn with_visualizations_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.visualizations_dir = dir.into();
        self
    }

    /// Path of the CSV calculations file for `genre`.
    #[must_use]
    pub fn csv_path(&self, genre: &GenreName) -> Utf8PathBuf {
        self.calculations_dir
            .join(format!("{}_analysis_results.csv", genre.file_stem()))
    }

    /// Path of the `kind` chart for `genre`.
    #[must_use]
    pub fn chart_path(&self, genre: &GenreName, kind: ChartKind) -> Utf8PathBuf {
        self.visualizations_dir.join(kind.file_name(genre))
    }
}

/// Aggregates computed for one genre.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreAnalysis {
    /// Genre the aggregates describe.
    pub genre: GenreName,
    /// Store identifier of the genre.
    pub genre_id: GenreId,
    /// Every book stored under the genre.
    pub total_books: u64,
    /// Decade histogram, `None` when no book has a usable year.
    pub decades: Option<DecadeHistogram>,
    /// Ranked authors, empty when no book has an author.
    pub top_authors: Vec<AuthorCount>,
}

/// Run every aggregation query for `genre`.
///
/// # Errors
///
/// Returns [`AnalysisError::Query`] when a query fails.
pub fn analyse_genre(
    connection: &Connection,
    genre_id: GenreId,
    genre: &GenreName,
    top_n: usize,
) -> Result<GenreAnalysis, AnalysisError> {
    let stats = StatsReader::new(connection);
    Ok(GenreAnalysis {
        genre: genre.clone(),
        genre_id,
        total_books: stats.total_books(genre_id)?,
        decades: stats.books_per_decade(genre_id)?,
        top_authors: stats.top_authors(genre_id, top_n)?,
    })
}

/// Render the two-section calculations CSV.
///
/// The decade section lists decades in ascending order and the author
/// section keeps the ranking order. Empty sections hold a single
/// `No data available` row.
///
/// # Examples
///
/// ```
/// use booktrend_analysis::{GenreAnalysis, render_csv};
/// use booktrend_core::{GenreId, GenreName};
///
/// let analysis = GenreAnalysis {
///     genre: GenreName::new("Poetry").expect("valid genre"),
///     genre_id: GenreId::new(1),
///     total_books: 0,
///     decades: None,
///     top_authors: Vec::new(),
/// };
/// let csv = render_csv(&analysis);
/// assert!(csv.starts_with("*** Books Per Decade ***\r\n"));
/// assert!(csv.contains("*** Top 0 Authors ***"));
/// ```
#[must_use]
pub fn render_csv(analysis: &GenreAnalysis) -> String {
    let mut out = String::new();

    push_row(&mut out, &["*** Books Per Decade ***"]);
    push_row(&mut out, &["Decade Start Year", "Book Count"]);
    match &analysis.decades {
        Some(histogram) => {
            for (decade, count) in histogram.iter() {
                push_row(&mut out, &[&decade.to_string(), &count.to_string()]);
            }
        }
        None => push_row(&mut out, &[NO_DATA, ""]),
    }

    push_row(&mut out, &[]);

    let heading = format!("*** Top {} Authors ***", analysis.top_authors.len());
    push_row(&mut out, &[&heading]);
    push_row(&mut out, &["Author", "Book Count"]);
    if analysis.top_authors.is_empty() {
        push_row(&mut out, &[NO_DATA, ""]);
    }
    for entry in &analysis.top_authors {
        push_row(&mut out, &[&entry.author, &entry.books.to_string()]);
    }

    out
}

fn push_row(out: &mut String, fields: &[&str]) {
    let line = fields
        .iter()
        .map(|field| quote_field(field))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push_str(CSV_LINE_END);
}

fn quote_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
