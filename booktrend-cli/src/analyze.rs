//! Analyze command: write the report for a genre already gathered.

use std::io::Write;

use booktrend_analysis::{ReportArtifacts, ReportSettings, write_reports};
use booktrend_core::{GenreName, GenreRegistry, SqliteBookStore};
use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_CALCULATIONS_DIR, ARG_DATABASE, ARG_MAX_SLICES, ARG_TOP_N, ARG_VISUALIZATIONS_DIR,
    CliError, DEFAULT_DATABASE,
    prompt::Prompter,
    summary::{report_summary, write_lines},
};

/// CLI arguments for the `analyze` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "analyze",
    long_about = "Aggregate the books stored for one genre into a CSV \
                 calculations file and SVG charts. When no genre is given, \
                 choose one of the genres already in the database.",
    about = "Write the report for a stored genre"
)]
#[ortho_config(prefix = "BOOKTREND")]
pub(crate) struct AnalyzeArgs {
    /// Genre to analyse, matched exactly against stored genre names.
    #[arg(value_name = "genre")]
    #[serde(default)]
    pub(crate) genre: Option<String>,
    /// Path to the SQLite book database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Directory for the CSV calculations file.
    #[arg(long = ARG_CALCULATIONS_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) calculations_dir: Option<Utf8PathBuf>,
    /// Directory for the SVG charts.
    #[arg(long = ARG_VISUALIZATIONS_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) visualizations_dir: Option<Utf8PathBuf>,
    /// Number of authors in the ranking.
    #[arg(long = ARG_TOP_N, value_name = "count")]
    #[serde(default)]
    pub(crate) top_n: Option<usize>,
    /// Pie slices including the grouped remainder.
    #[arg(long = ARG_MAX_SLICES, value_name = "count")]
    #[serde(default)]
    pub(crate) max_slices: Option<usize>,
}

impl AnalyzeArgs {
    pub(crate) fn into_config(self) -> Result<AnalyzeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        AnalyzeConfig::try_from(merged)
    }
}

/// Resolved `analyze` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AnalyzeConfig {
    pub(crate) genre: Option<GenreName>,
    pub(crate) database: Utf8PathBuf,
    pub(crate) report: ReportSettings,
}

impl TryFrom<AnalyzeArgs> for AnalyzeConfig {
    type Error = CliError;

    fn try_from(args: AnalyzeArgs) -> Result<Self, Self::Error> {
        let genre = args.genre.map(GenreName::new).transpose()?;
        Ok(Self {
            genre,
            database: args
                .database
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
            report: crate::report_settings(
                args.top_n,
                args.max_slices,
                args.calculations_dir,
                args.visualizations_dir,
            ),
        })
    }
}

pub(crate) fn run_analyze(
    args: AnalyzeArgs,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    run_analyze_with(&config, prompter, out).map(|_| ())
}

pub(crate) fn run_analyze_with(
    config: &AnalyzeConfig,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
) -> Result<ReportArtifacts, CliError> {
    let store = crate::open_existing_store(&config.database)?;
    let genre = match &config.genre {
        Some(genre) => genre.clone(),
        None => choose_stored_genre(&store, prompter)?,
    };
    let genre_id = store
        .lookup_genre(&genre)?
        .ok_or_else(|| CliError::UnknownGenre {
            genre: genre.to_string(),
        })?;

    let artifacts = write_reports(store.connection(), genre_id, &genre, &config.report)?;
    write_lines(out, &report_summary(&artifacts))?;
    Ok(artifacts)
}

/// Offer the stored genres, labelled with their book counts.
fn choose_stored_genre(
    store: &SqliteBookStore,
    prompter: &mut dyn Prompter,
) -> Result<GenreName, CliError> {
    let genres = store.list_genres()?;
    let labels: Vec<String> = genres
        .iter()
        .map(|genre| format!("{} ({} books)", genre.name, genre.books))
        .collect();
    if labels.is_empty() {
        return Err(CliError::NoGenres);
    }
    let index = prompter.select_one("Choose a genre to analyze", &labels)?;
    let picked = genres
        .into_iter()
        .nth(index)
        .ok_or(CliError::InvalidSelection {
            index,
            options: labels.len(),
        })?;
    Ok(GenreName::new(picked.name)?)
}
