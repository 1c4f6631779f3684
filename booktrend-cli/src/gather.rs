//! Gather command: choose genres and a source, ingest, then optionally report.

use std::{io::Write, time::Duration};

use booktrend_analysis::{ReportArtifacts, ReportSettings, write_reports};
use booktrend_core::{
    BookSource, COMMON_GENRES, GenreName, IngestReport, IngestSettings, ResetConfirmation,
    SourceApi, SqliteBookStore, ingest,
};
use booktrend_data::{
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, GoogleBooksConfig, GoogleBooksSource, HttpSettings,
    OpenLibraryConfig, OpenLibrarySource, googlebooks::DEFAULT_GOOGLE_BOOKS_URL,
    openlibrary::DEFAULT_OPEN_LIBRARY_URL,
};
use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_CALCULATIONS_DIR, ARG_DATABASE, ARG_MAX_SLICES, ARG_TOP_N, ARG_VISUALIZATIONS_DIR,
    CliError, DEFAULT_DATABASE,
    prompt::Prompter,
    summary::{ingest_summary, line, report_summary, reset_summary, write_lines},
};

/// Default number of new books each run aims to insert.
pub(crate) const DEFAULT_GOAL: usize = 100;

pub(crate) const OTHER_GENRE: &str = "Other (type a genre)";

const RESET_PROMPT: &str = "Do you want to fully clear the database first?";
const ANALYSE_PROMPT: &str = "Would you like to analyze and visualize the data?";

/// CLI arguments for the `gather` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "gather",
    long_about = "Interactively choose genres and a bibliographic API, fetch \
                 new books into the SQLite store until the goal is met or the \
                 source runs dry, then optionally write the genre report. \
                 Limits and endpoints can come from CLI flags, configuration \
                 files, or environment variables.",
    about = "Gather books for one or more genres"
)]
#[ortho_config(prefix = "BOOKTREND")]
pub(crate) struct GatherArgs {
    /// Path to the SQLite book database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Number of new books to insert per genre.
    #[arg(long, value_name = "count")]
    #[serde(default)]
    pub(crate) goal: Option<usize>,
    /// Upper bound on records requested per API call.
    #[arg(long, value_name = "count")]
    #[serde(default)]
    pub(crate) per_call_limit: Option<usize>,
    /// Upper bound on pages fetched per genre.
    #[arg(long, value_name = "count")]
    #[serde(default)]
    pub(crate) max_pages: Option<u32>,
    /// Base URL of the Open Library service.
    #[arg(long, value_name = "url")]
    #[serde(default)]
    pub(crate) open_library_url: Option<String>,
    /// Base URL of the Google Books API.
    #[arg(long, value_name = "url")]
    #[serde(default)]
    pub(crate) google_books_url: Option<String>,
    /// Google Books API key; anonymous quota is used when absent.
    #[arg(long, value_name = "key")]
    #[serde(default)]
    pub(crate) google_books_api_key: Option<String>,
    /// HTTP timeout per request, in seconds.
    #[arg(long, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// User agent sent with every request.
    #[arg(long, value_name = "agent")]
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
    /// Offer a multi-select genre menu instead of a single choice.
    #[arg(long, value_name = "bool")]
    #[serde(default)]
    pub(crate) multi_genre: Option<bool>,
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

impl GatherArgs {
    pub(crate) fn into_config(self) -> Result<GatherConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(GatherConfig::from(merged))
    }
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<GatherConfig, CliError> {
    let merged = GatherArgs::merge_from_layers(layers).map_err(CliError::from)?;
    Ok(GatherConfig::from(merged))
}

/// Resolved `gather` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GatherConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) goal: usize,
    pub(crate) ingest: IngestSettings,
    pub(crate) open_library: OpenLibraryConfig,
    pub(crate) google_books: GoogleBooksConfig,
    pub(crate) report: ReportSettings,
    pub(crate) multi_genre: bool,
}

impl From<GatherArgs> for GatherConfig {
    fn from(args: GatherArgs) -> Self {
        let defaults = IngestSettings::default();
        let ingest = IngestSettings::default()
            .with_per_call_limit(args.per_call_limit.unwrap_or(defaults.per_call_limit))
            .with_max_pages(args.max_pages.unwrap_or(defaults.max_pages));

        let http = HttpSettings::default()
            .with_timeout(Duration::from_secs(
                args.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ))
            .with_user_agent(
                args.user_agent
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned()),
            );
        let open_library = OpenLibraryConfig::new(
            args.open_library_url
                .unwrap_or_else(|| DEFAULT_OPEN_LIBRARY_URL.to_owned()),
        )
        .with_http(http.clone());
        let google_books = GoogleBooksConfig::new(
            args.google_books_url
                .unwrap_or_else(|| DEFAULT_GOOGLE_BOOKS_URL.to_owned()),
        )
        .with_api_key(args.google_books_api_key)
        .with_http(http);

        Self {
            database: args
                .database
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
            goal: args.goal.unwrap_or(DEFAULT_GOAL),
            ingest,
            open_library,
            google_books,
            report: crate::report_settings(
                args.top_n,
                args.max_slices,
                args.calculations_dir,
                args.visualizations_dir,
            ),
            multi_genre: args.multi_genre.unwrap_or(false),
        }
    }
}

/// Runs ingestion for the chosen source over each genre in turn.
pub(crate) trait SourceRunner {
    fn ingest_genres(
        &self,
        api: SourceApi,
        store: &mut SqliteBookStore,
        genres: &[GenreName],
        goal: usize,
        settings: &IngestSettings,
    ) -> Result<GenreRuns, CliError>;
}

/// Reports for the genres that finished, plus the error that stopped the rest.
///
/// Pages committed before a failure stay stored, so their reports are kept.
#[derive(Debug, Default)]
pub(crate) struct GenreRuns {
    pub(crate) reports: Vec<IngestReport>,
    pub(crate) failure: Option<CliError>,
}

/// Runs ingestion against the public HTTP APIs.
pub(crate) struct HttpSourceRunner {
    open_library: OpenLibraryConfig,
    google_books: GoogleBooksConfig,
}

impl HttpSourceRunner {
    pub(crate) fn new(config: &GatherConfig) -> Self {
        Self {
            open_library: config.open_library.clone(),
            google_books: config.google_books.clone(),
        }
    }
}

impl SourceRunner for HttpSourceRunner {
    fn ingest_genres(
        &self,
        api: SourceApi,
        store: &mut SqliteBookStore,
        genres: &[GenreName],
        goal: usize,
        settings: &IngestSettings,
    ) -> Result<GenreRuns, CliError> {
        let build_error = |source| CliError::SourceBuild { api, source };
        match api {
            SourceApi::OpenLibrary => {
                let source = OpenLibrarySource::with_config(self.open_library.clone())
                    .map_err(build_error)?;
                Ok(ingest_each(&source, store, genres, goal, settings))
            }
            SourceApi::GoogleBooks => {
                let source = GoogleBooksSource::with_config(self.google_books.clone())
                    .map_err(build_error)?;
                Ok(ingest_each(&source, store, genres, goal, settings))
            }
        }
    }
}

/// Ingest every genre from `source`, stopping at the first store failure.
pub(crate) fn ingest_each<S: BookSource + ?Sized>(
    source: &S,
    store: &mut SqliteBookStore,
    genres: &[GenreName],
    goal: usize,
    settings: &IngestSettings,
) -> GenreRuns {
    let mut runs = GenreRuns::default();
    for genre in genres {
        match ingest(source, store, genre, goal, settings) {
            Ok(report) => runs.reports.push(report),
            Err(err) => {
                runs.failure = Some(err.into());
                break;
            }
        }
    }
    runs
}

/// Outcome of a gather session.
#[derive(Debug)]
pub(crate) struct GatherOutcome {
    pub(crate) reports: Vec<IngestReport>,
    pub(crate) artifacts: Vec<ReportArtifacts>,
}

pub(crate) fn run_gather(
    args: GatherArgs,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let runner = HttpSourceRunner::new(&config);
    let outcome = run_gather_with(&config, prompter, &runner, out)?;
    info!(
        "gathered {} genre(s) and wrote {} report(s)",
        outcome.reports.len(),
        outcome.artifacts.len()
    );
    Ok(())
}

pub(crate) fn run_gather_with(
    config: &GatherConfig,
    prompter: &mut dyn Prompter,
    runner: &dyn SourceRunner,
    out: &mut dyn Write,
) -> Result<GatherOutcome, CliError> {
    let mut store = crate::open_store(&config.database)?;
    info!("using book database at {}", config.database);

    if prompter.confirm(RESET_PROMPT)? {
        let summary = store.reset(ResetConfirmation::acknowledge())?;
        line(out, &reset_summary(summary))?;
    } else {
        line(out, "Skipping database reset.")?;
    }

    let genres = choose_genres(prompter, config.multi_genre)?;
    let api = choose_source(prompter)?;

    let GenreRuns { reports, failure } =
        runner.ingest_genres(api, &mut store, &genres, config.goal, &config.ingest)?;
    for report in &reports {
        write_lines(out, &ingest_summary(report))?;
    }
    if let Some(err) = failure {
        return Err(err);
    }

    let mut artifacts = Vec::new();
    if prompter.confirm(ANALYSE_PROMPT)? {
        for report in &reports {
            let written = write_reports(
                store.connection(),
                report.genre_id,
                &report.genre,
                &config.report,
            )?;
            write_lines(out, &report_summary(&written))?;
            artifacts.push(written);
        }
    } else {
        line(out, "Skipping analysis.")?;
    }

    Ok(GatherOutcome { reports, artifacts })
}

/// Ask for one genre, or several when `multi` is set.
///
/// The menu lists the common genres followed by a free-text entry.
pub(crate) fn choose_genres(
    prompter: &mut dyn Prompter,
    multi: bool,
) -> Result<Vec<GenreName>, CliError> {
    let mut options: Vec<String> = COMMON_GENRES.iter().map(|&name| name.to_owned()).collect();
    options.push(OTHER_GENRE.to_owned());

    let picked = if multi {
        prompter.select_many("Choose the genres to gather", &options)?
    } else {
        vec![prompter.select_one("Choose one genre to gather", &options)?]
    };

    let mut genres: Vec<GenreName> = Vec::with_capacity(picked.len());
    for index in picked {
        let genre = match COMMON_GENRES.get(index) {
            Some(name) => GenreName::new(name)?,
            None if index == COMMON_GENRES.len() => GenreName::new(prompter.text("Genre name")?)?,
            None => {
                return Err(CliError::InvalidSelection {
                    index,
                    options: options.len(),
                });
            }
        };
        if !genres.contains(&genre) {
            genres.push(genre);
        }
    }
    Ok(genres)
}

/// Ask which bibliographic API to gather from.
pub(crate) fn choose_source(prompter: &mut dyn Prompter) -> Result<SourceApi, CliError> {
    let options: Vec<String> = SourceApi::ALL
        .iter()
        .map(|api| api.as_str().to_owned())
        .collect();
    let index = prompter.select_one("Choose which API to gather book data from", &options)?;
    SourceApi::ALL
        .get(index)
        .copied()
        .ok_or(CliError::InvalidSelection {
            index,
            options: options.len(),
        })
}
