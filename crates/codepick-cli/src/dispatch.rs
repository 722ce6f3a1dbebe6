use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use codepick_app::{App, ensure_report_ready, load_report};
use codepick_core::catalog::LookupOutcome;
use codepick_core::doctor::{CheckState, DoctorReport};
use codepick_core::selection::SelectionStore;
use codepick_core::submission::SubmissionReceipt;
use codepick_tui::UiExit;
use comfy_table::{Cell, ContentArrangement, Table};

use crate::cli::{Cli, Command};

/// Runs one parsed command. `open_app` is only called by commands that need a
/// valid config, so `doctor` keeps working without one.
pub fn run_with_deps<F>(cli: Cli, open_app: F) -> Result<()>
where
    F: FnOnce() -> Result<App>,
{
    match cli.command {
        Some(Command::Doctor) => run_doctor_command(),
        Some(Command::Suggest { report }) => run_suggest_command(&open_app()?, &report),
        Some(Command::Search { query }) => run_search_command(&open_app()?, &query),
        Some(Command::Submit { report, codes }) => {
            let app = open_app()?;
            let store = app.selection_from_specs(&codes);
            run_submit_command(&app, &report, &store)
        }
        None => run_root_command(open_app, cli.report),
    }
}

fn run_root_command<F>(open_app: F, report: Option<PathBuf>) -> Result<()>
where
    F: FnOnce() -> Result<App>,
{
    let app = open_app()?;
    let Some(report) = report else {
        bail!("the interactive review needs a report: codepick --report <FILE>");
    };

    match codepick_tui::run_review(&app, &report)? {
        UiExit::Submitted => println!("Selection submitted."),
        UiExit::Closed | UiExit::Canceled => {}
    }

    Ok(())
}

fn run_suggest_command(app: &App, report_path: &Path) -> Result<()> {
    let report = ensure_report_ready(report_path)?;
    let result = app.suggest(&report)?;

    print_selection(&result.store);
    let mut summary = format!("{} codes suggested", result.merged.appended);
    if result.merged.skipped_duplicates > 0 {
        summary.push_str(&format!(
            ", {} duplicates skipped",
            result.merged.skipped_duplicates
        ));
    }
    println!("{summary}");
    Ok(())
}

fn run_search_command(app: &App, query: &str) -> Result<()> {
    let outcome = app.search(query);
    if let Some(error) = outcome.error.as_deref() {
        bail!("catalog search failed: {error}");
    }

    if outcome.matches.is_empty() {
        println!("No matching codes.");
        return Ok(());
    }

    print_matches(&outcome);
    Ok(())
}

fn run_submit_command(app: &App, report_path: &Path, store: &SelectionStore) -> Result<()> {
    let report = load_report(report_path)?;
    let receipt = app.submit(&report, store)?;

    print_selection(store);
    let totals = format!("{} codes ({} units)", store.len(), store.total_units());
    match receipt {
        SubmissionReceipt::Logged => println!("Submitted {totals} to the log sink."),
        SubmissionReceipt::Written(path) => {
            println!("Submitted {totals} to {}", path.display())
        }
    }
    Ok(())
}

fn run_doctor_command() -> Result<()> {
    let report = codepick_app::doctor()?;
    print_doctor_report(&report);
    Ok(())
}

fn print_selection(store: &SelectionStore) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Code", "Name", "Qty", "Origin", "Rationale"]);

    for entry in store.entries() {
        table.add_row(vec![
            Cell::new(entry.code()),
            Cell::new(entry.name()),
            Cell::new(entry.quantity()),
            Cell::new(entry.origin().label()),
            Cell::new(entry.rationale().unwrap_or_default()),
        ]);
    }

    println!("{table}");
}

fn print_matches(outcome: &LookupOutcome) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Code", "Name", "Description"]);

    for found in &outcome.matches {
        table.add_row(vec![
            Cell::new(found.code.as_str()),
            Cell::new(found.name.as_str()),
            Cell::new(found.description.as_deref().unwrap_or_default()),
        ]);
    }

    println!("{table}");
}

fn print_doctor_report(report: &DoctorReport) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Check", "Status", "Details"]);

    for check in &report.checks {
        let status = match check.state {
            CheckState::Pass => "PASS",
            CheckState::Fail => "FAIL",
        };

        table.add_row(vec![
            Cell::new(check.name.as_str()),
            Cell::new(status),
            Cell::new(check.details.as_str()),
        ]);
    }

    println!("{table}");
    println!("{}", report.summary());
}
