//! Behaviour-driven step definitions for the gather and analyze commands.

use std::cell::RefCell;

use super::helpers::{Answer, ScriptedPrompter, StubRunner, Workspace, output, seed_books};
use crate::{
    CliError,
    analyze::{AnalyzeConfig, run_analyze_with},
    gather::{GatherArgs, GatherConfig, run_gather_with},
};
use booktrend_analysis::{ChartKind, ReportSettings};
use booktrend_core::{COMMON_GENRES, GenreName, SourceApi, SqliteBookStore};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

struct GatherWorld {
    workspace: Workspace,
    answers: RefCell<Vec<Answer>>,
    runner: RefCell<StubRunner>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl GatherWorld {
    fn new() -> Self {
        Self {
            workspace: Workspace::new(),
            answers: RefCell::new(Vec::new()),
            runner: RefCell::new(StubRunner::default()),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn answer(&self, answer: Answer) {
        self.answers.borrow_mut().push(answer);
    }

    fn report_settings(&self) -> ReportSettings {
        ReportSettings::default()
            .with_calculations_dir(self.workspace.calculations())
            .with_visualizations_dir(self.workspace.visualizations())
    }

    fn record(&self, outcome: Result<(), CliError>, prompter: &ScriptedPrompter) {
        if outcome.is_ok() {
            assert_eq!(prompter.remaining(), 0, "unused answers: {:?}", prompter.asked);
        }
        self.result.replace(Some(outcome));
    }

    fn stored_books(&self) -> u64 {
        let store = SqliteBookStore::open(self.workspace.database().as_std_path())
            .expect("open store");
        store.count_books().expect("count books")
    }

    fn stdout(&self) -> String {
        output(&self.stdout.borrow())
    }
}

#[fixture]
fn world() -> GatherWorld {
    GatherWorld::new()
}

#[given("an empty workspace")]
fn empty_workspace(#[from(world)] world: &GatherWorld) {
    assert!(!world.workspace.database().exists());
}

#[given("a database holding {count} {genre} books")]
fn database_holding_books(#[from(world)] world: &GatherWorld, count: usize, genre: String) {
    seed_books(&world.workspace.database(), &genre, count);
}

#[given("the source offers {count} books per genre")]
fn source_offers_books(#[from(world)] world: &GatherWorld, count: usize) {
    world.runner.replace(StubRunner::offering(count));
}

#[given("I decline the reset prompt")]
fn decline_reset(#[from(world)] world: &GatherWorld) {
    world.answer(Answer::Confirm(false));
}

#[given("I accept the reset prompt")]
fn accept_reset(#[from(world)] world: &GatherWorld) {
    world.answer(Answer::Confirm(true));
}

#[given("I pick the common genre {genre}")]
fn pick_common_genre(#[from(world)] world: &GatherWorld, genre: String) {
    let index = COMMON_GENRES
        .iter()
        .position(|name| *name == genre)
        .unwrap_or_else(|| panic!("{genre} is not a common genre"));
    world.answer(Answer::Select(index));
}

#[given("I type the genre {genre}")]
fn type_genre(#[from(world)] world: &GatherWorld, genre: String) {
    world.answer(Answer::Select(COMMON_GENRES.len()));
    world.answer(Answer::Text(genre));
}

#[given("I pick the Open Library source")]
fn pick_open_library(#[from(world)] world: &GatherWorld) {
    world.answer(Answer::Select(0));
}

#[given("I pick the Google Books source")]
fn pick_google_books(#[from(world)] world: &GatherWorld) {
    world.answer(Answer::Select(1));
}

#[given("I accept the analysis prompt")]
fn accept_analysis(#[from(world)] world: &GatherWorld) {
    world.answer(Answer::Confirm(true));
}

#[given("I decline the analysis prompt")]
fn decline_analysis(#[from(world)] world: &GatherWorld) {
    world.answer(Answer::Confirm(false));
}

#[when("I run the gather command with a goal of {goal}")]
fn run_gather_command(#[from(world)] world: &GatherWorld, goal: usize) {
    let workspace = &world.workspace;
    let config = GatherConfig::from(GatherArgs {
        database: Some(workspace.database()),
        goal: Some(goal),
        calculations_dir: Some(workspace.calculations()),
        visualizations_dir: Some(workspace.visualizations()),
        ..GatherArgs::default()
    });
    let mut prompter = ScriptedPrompter::new(world.answers.borrow().clone());
    let outcome = {
        let runner = world.runner.borrow();
        let mut stdout = world.stdout.borrow_mut();
        run_gather_with(&config, &mut prompter, &*runner, &mut *stdout).map(|_| ())
    };
    world.record(outcome, &prompter);
}

#[when("I run the analyze command for {genre}")]
fn run_analyze_command(#[from(world)] world: &GatherWorld, genre: String) {
    let config = AnalyzeConfig {
        genre: Some(GenreName::new(genre).expect("valid genre")),
        database: world.workspace.database(),
        report: world.report_settings(),
    };
    let mut prompter = ScriptedPrompter::new(world.answers.borrow().clone());
    let outcome = {
        let mut stdout = world.stdout.borrow_mut();
        run_analyze_with(&config, &mut prompter, &mut *stdout).map(|_| ())
    };
    world.record(outcome, &prompter);
}

#[then("the command succeeds")]
fn command_succeeds(#[from(world)] world: &GatherWorld) {
    let borrowed = world.result.borrow();
    let result = borrowed.as_ref().expect("result recorded");
    if let Err(err) = result {
        panic!("expected success, found {err:?}");
    }
}

#[then("the database holds {count} books")]
fn database_holds(#[from(world)] world: &GatherWorld, count: u64) {
    assert_eq!(world.stored_books(), count);
}

#[then("the {genre} report files are written")]
fn report_files_written(#[from(world)] world: &GatherWorld, genre: String) {
    let genre = GenreName::new(genre).expect("valid genre");
    let settings = world.report_settings();
    assert!(settings.csv_path(&genre).exists());
    for kind in ChartKind::ALL {
        assert!(settings.chart_path(&genre, kind).exists(), "missing {kind} chart");
    }
    assert!(world.stdout().contains("calculations written to"));
}

#[then("no report files are written")]
fn no_report_files(#[from(world)] world: &GatherWorld) {
    assert!(!world.workspace.calculations().exists());
    assert!(!world.workspace.visualizations().exists());
    assert!(world.stdout().contains("Skipping analysis."));
}

#[then("the source was asked for Google Books")]
fn source_was_google_books(#[from(world)] world: &GatherWorld) {
    assert_eq!(
        *world.runner.borrow().used.borrow(),
        vec![SourceApi::GoogleBooks]
    );
}

#[then("the output reports the goal was not met")]
fn output_reports_goal_shortfall(#[from(world)] world: &GatherWorld) {
    assert!(world.stdout().contains("goal not met"), "{}", world.stdout());
}

#[then("the output reports {books} books and {genres} genre removed")]
fn output_reports_reset(#[from(world)] world: &GatherWorld, books: usize, genres: usize) {
    let expected = format!("removed {books} books and {genres} genres");
    assert!(world.stdout().contains(&expected), "{}", world.stdout());
}

#[then("the command fails because the database is missing")]
fn command_fails_missing_database(#[from(world)] world: &GatherWorld) {
    let borrowed = world.result.borrow();
    let error = borrowed
        .as_ref()
        .expect("result recorded")
        .as_ref()
        .expect_err("expected error");
    match error {
        CliError::MissingDatabase { path } => assert_eq!(*path, world.workspace.database()),
        other => panic!("expected MissingDatabase, found {other:?}"),
    }
}

macro_rules! register_gather_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/gather_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: GatherWorld) {
            let _ = world;
        }
    };
}

register_gather_scenario!(gather_and_report, "Gathering one genre and writing its report");
register_gather_scenario!(gather_without_analysis, "Declining analysis after gathering");
register_gather_scenario!(
    reset_then_typed_genre,
    "Clearing the database before gathering a typed genre"
);
register_gather_scenario!(analyze_missing_database, "Analyzing without a database");
