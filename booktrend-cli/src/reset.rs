//! Reset command: wipe every stored book and genre after confirmation.

use std::io::Write;

use booktrend_core::{ResetConfirmation, ResetSummary};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DATABASE, CliError, DEFAULT_DATABASE,
    prompt::Prompter,
    summary::{line, reset_summary},
};

const CONFIRM_PROMPT: &str = "This permanently deletes every stored book and genre. Continue?";

/// CLI arguments for the `reset` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "reset", about = "Clear the book database")]
#[ortho_config(prefix = "BOOKTREND")]
pub(crate) struct ResetArgs {
    /// Path to the SQLite book database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl ResetArgs {
    fn into_database(self) -> Result<Utf8PathBuf, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(merged
            .database
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)))
    }
}

pub(crate) fn run_reset(
    args: ResetArgs,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let database = args.into_database()?;
    run_reset_with(&database, prompter, out).map(|_| ())
}

/// Returns `None` when the operator declines.
pub(crate) fn run_reset_with(
    database: &Utf8Path,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
) -> Result<Option<ResetSummary>, CliError> {
    let mut store = crate::open_existing_store(database)?;
    if !prompter.confirm(CONFIRM_PROMPT)? {
        line(out, "Reset cancelled.")?;
        return Ok(None);
    }
    let summary = store.reset(ResetConfirmation::acknowledge())?;
    line(out, &reset_summary(summary))?;
    Ok(Some(summary))
}
