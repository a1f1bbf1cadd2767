use std::sync::atomic::AtomicBool;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use rusqlite::Connection;

use tablo_rescue_lib::{
    IndexQuery, IndexSnapshot, OutcomeKind, RecordingOutcome, RescueOptions, RescueProgress,
    RescueReport, Rescuer, Toolchain,
};

use crate::CliError;
use crate::spinner::RescueSpinner;

/// Run the rescue: every recording when `ids` is empty, else just those.
pub(crate) fn run_rescue(
    conn: &Connection,
    tools: Toolchain<'_>,
    options: RescueOptions,
    ids: &[i64],
    cancel: &AtomicBool,
    show_spinner: bool,
) -> Result<(), CliError> {
    log::info!(
        "Rescuing recordings from {} into {}",
        options.mount.display(),
        options.output_dir.display(),
    );

    let spinner = RescueSpinner::new(!show_spinner);
    let progress = |event: RescueProgress| spinner.update(&event);
    let rescuer = Rescuer::new(tools, options).with_cancel(cancel);

    let report = if ids.is_empty() {
        let snapshot = IndexSnapshot::load(conn)?;
        rescuer.rescue_all(&snapshot, &progress)
    } else {
        rescuer.rescue_ids(&IndexQuery::new(conn), ids, &progress)
    };
    spinner.finish();

    print_report(&report, !ids.is_empty());
    if report.cancelled {
        return Err(CliError::Aborted);
    }
    Ok(())
}

fn print_report(report: &RescueReport, per_id: bool) {
    println!(
        "{}",
        format!("Rescued {} recordings.", report.rescued()).if_supports_color(Stdout, |t| t.bold()),
    );

    if per_id {
        for outcome in &report.outcomes {
            println!("{}", outcome_line(outcome));
        }
    }

    println!(
        "{} rescued, {} skipped, {} failed",
        report.rescued().if_supports_color(Stdout, |t| t.green()),
        report.skipped().if_supports_color(Stdout, |t| t.yellow()),
        report.failed().if_supports_color(Stdout, |t| t.red()),
    );
}

fn outcome_line(outcome: &RecordingOutcome) -> String {
    let label = format!("{:<15}", format!("{}:", outcome.kind.label()));
    let label = match outcome.kind {
        OutcomeKind::Rescued => label.if_supports_color(Stdout, |t| t.green()).to_string(),
        OutcomeKind::Skipped => label.if_supports_color(Stdout, |t| t.yellow()).to_string(),
        OutcomeKind::Failed => label.if_supports_color(Stdout, |t| t.red()).to_string(),
    };
    match (outcome.kind, &outcome.output) {
        (OutcomeKind::Failed, _) | (_, None) => format!("{label}{}", outcome.id),
        (_, Some(path)) => format!("{label}{} = {}", outcome.id, path.display()),
    }
}
