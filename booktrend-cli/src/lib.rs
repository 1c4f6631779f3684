//! Command-line interface for gathering and analysing book trends.
#![forbid(unsafe_code)]

use std::io::{self, Write};

use booktrend_analysis::ReportSettings;
use booktrend_core::SqliteBookStore;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};

mod analyze;
mod error;
mod gather;
mod prompt;
mod reset;
mod summary;

pub use error::CliError;

use analyze::{AnalyzeArgs, run_analyze};
use gather::{GatherArgs, run_gather};
use prompt::{InquirePrompter, Prompter};
use reset::{ResetArgs, run_reset};

const ARG_DATABASE: &str = "database";
const ARG_CALCULATIONS_DIR: &str = "calculations-dir";
const ARG_VISUALIZATIONS_DIR: &str = "visualizations-dir";
const ARG_TOP_N: &str = "top-n";
const ARG_MAX_SLICES: &str = "max-slices";

/// Database file used when none is configured.
const DEFAULT_DATABASE: &str = "book_trends.db";

/// Run the Booktrend CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut prompter = InquirePrompter;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    dispatch(cli.command, &mut prompter, &mut out)
}

fn dispatch(
    command: Option<Command>,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    match command.unwrap_or_default() {
        Command::Gather(args) => run_gather(args, prompter, out),
        Command::Analyze(args) => run_analyze(args, prompter, out),
        Command::Reset(args) => run_reset(args, prompter, out),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "booktrend",
    about = "Gather book metadata by genre and chart publication trends",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch books for chosen genres, then optionally write reports.
    Gather(GatherArgs),
    /// Write the CSV and charts for a genre already in the database.
    Analyze(AnalyzeArgs),
    /// Remove every stored book and genre.
    Reset(ResetArgs),
}

impl Default for Command {
    fn default() -> Self {
        Self::Gather(GatherArgs::default())
    }
}

/// Open the store at `path`, creating its parent directory first.
fn open_store(path: &Utf8Path) -> Result<SqliteBookStore, CliError> {
    booktrend_fs::ensure_parent_dir(path).map_err(|source| CliError::CreateDatabaseDir {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(SqliteBookStore::open(path.as_std_path())?)
}

/// Open an existing store; commands that only read or clear data never create one.
fn open_existing_store(path: &Utf8Path) -> Result<SqliteBookStore, CliError> {
    match booktrend_fs::is_file(path) {
        Ok(true) => Ok(SqliteBookStore::open(path.as_std_path())?),
        Ok(false) => Err(CliError::MissingDatabase {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(CliError::InspectDatabase {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn report_settings(
    top_n: Option<usize>,
    max_slices: Option<usize>,
    calculations_dir: Option<Utf8PathBuf>,
    visualizations_dir: Option<Utf8PathBuf>,
) -> ReportSettings {
    let mut settings = ReportSettings::default();
    if let Some(top_n) = top_n {
        settings = settings.with_top_n(top_n);
    }
    if let Some(max_slices) = max_slices {
        settings = settings.with_max_slices(max_slices);
    }
    if let Some(dir) = calculations_dir {
        settings = settings.with_calculations_dir(dir);
    }
    if let Some(dir) = visualizations_dir {
        settings = settings.with_visualizations_dir(dir);
    }
    settings
}

#[cfg(test)]
mod tests;
