//! Aggregation and reporting for stored book metadata.
//!
//! The crate reads an initialised book database and produces, per genre:
//! - a **decade histogram** of publication years, restricted to plausible
//!   years,
//! - a **top-author ranking** by book count,
//! - a **calculations CSV** holding both aggregates, and
//! - three **SVG charts**: decades as bars, authors as a pie and as bars.
//!
//! Charts whose aggregate is empty are skipped rather than drawn blank.
//!
//! # Examples
//!
//! ```no_run
//! use booktrend_analysis::{ReportSettings, write_reports};
//! use booktrend_core::{GenreName, GenreRegistry, SqliteBookStore};
//!
//! let store = SqliteBookStore::open("book_trends.db").expect("open store");
//! let genre = GenreName::new("Horror").expect("valid genre");
//! let genre_id = store
//!     .lookup_genre(&genre)
//!     .expect("query genre")
//!     .expect("genre has been ingested");
//! let artifacts = write_reports(store.connection(), genre_id, &genre, &ReportSettings::default())
//!     .expect("write reports");
//! println!("wrote {}", artifacts.csv_path);
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

use booktrend_core::{GenreId, GenreName};
use booktrend_fs::{ensure_dir, write_file};
use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use rusqlite::Connection;

mod chart;
mod error;
mod report;
mod stats;

pub use chart::{
    ChartKind, OTHERS_LABEL, PieSlice, author_bar_chart, author_pie_chart, decade_bar_chart,
    pie_slices,
};
pub use error::AnalysisError;
pub use report::{
    DEFAULT_CALCULATIONS_DIR, DEFAULT_MAX_SLICES, DEFAULT_TOP_N, DEFAULT_VISUALIZATIONS_DIR,
    GenreAnalysis, ReportSettings, analyse_genre, render_csv,
};
pub use stats::{AuthorCount, DecadeHistogram, MAX_YEAR, MIN_YEAR, StatsReader};

/// Files written by [`write_reports`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifacts {
    /// Aggregates the files were rendered from.
    pub analysis: GenreAnalysis,
    /// Location of the calculations CSV.
    pub csv_path: Utf8PathBuf,
    /// Charts written, in rendering order.
    pub charts: Vec<Utf8PathBuf>,
    /// Charts skipped because their aggregate was empty.
    pub skipped: Vec<ChartKind>,
}

/// Aggregate `genre` and write its CSV and charts.
///
/// Output directories are created when missing. The CSV is always written;
/// each chart is written only when it has data.
///
/// # Errors
///
/// Returns [`AnalysisError::Query`] when aggregation fails and
/// [`AnalysisError::CreateDir`] or [`AnalysisError::WriteFile`] when an
/// output cannot be persisted.
pub fn write_reports(
    connection: &Connection,
    genre_id: GenreId,
    genre: &GenreName,
    settings: &ReportSettings,
) -> Result<ReportArtifacts, AnalysisError> {
    let analysis = analyse_genre(connection, genre_id, genre, settings.top_n)?;

    create_dir(&settings.calculations_dir)?;
    let csv_path = settings.csv_path(genre);
    write(&csv_path, &render_csv(&analysis))?;
    info!("wrote calculations for '{genre}' to {csv_path}");

    let mut charts = Vec::new();
    let mut skipped = Vec::new();
    for kind in ChartKind::ALL {
        let Some(svg) = kind.render(&analysis, settings.max_slices) else {
            info!("no data for the {kind} chart of '{genre}'; skipping");
            skipped.push(kind);
            continue;
        };
        create_dir(&settings.visualizations_dir)?;
        let path = settings.chart_path(genre, kind);
        write(&path, &svg)?;
        info!("wrote {kind} chart to {path}");
        charts.push(path);
    }

    Ok(ReportArtifacts {
        analysis,
        csv_path,
        charts,
        skipped,
    })
}

fn create_dir(path: &Utf8Path) -> Result<(), AnalysisError> {
    ensure_dir(path).map_err(|source| AnalysisError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Utf8Path, contents: &str) -> Result<(), AnalysisError> {
    write_file(path, contents).map_err(|source| AnalysisError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}
