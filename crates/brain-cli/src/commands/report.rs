//! Report command: analytics over the recorded sessions.
//!
//! Reads the stored blob directly and never writes, so a report does not
//! accrue the running session.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use brain_core::analytics::{LabelTotal, NO_ACTIVITY, RecentSession, Report};
use brain_core::{AccrualEngine, KeyValueStore};

use super::util::{format_local, format_minutes, format_money, heading, progress_bar};

/// Formats one recent session's selection, e.g. `Home | Stationary | Work, TV`.
fn selection_text(session: &RecentSession) -> String {
    let activities = if session.activities.is_empty() {
        NO_ACTIVITY.to_string()
    } else {
        session.activities.join(", ")
    };
    format!(
        "{} | {} | {activities}",
        session.location.as_deref().unwrap_or("-"),
        session.movement.as_deref().unwrap_or("-"),
    )
}

fn write_minutes_with_bars(output: &mut String, rows: &[LabelTotal]) {
    let Some(max) = rows.first().map(|r| r.minutes) else {
        writeln!(output, "(none)").unwrap();
        return;
    };
    for row in rows {
        writeln!(
            output,
            "{:<28}{:>8}  {}",
            row.label,
            format_minutes(row.minutes),
            progress_bar(row.minutes, max)
        )
        .unwrap();
    }
}

/// Formats the human-readable report output.
pub fn format_report(report: &Report) -> String {
    let mut output = String::new();

    writeln!(output, "BRAIN REPORT").unwrap();
    writeln!(output).unwrap();

    heading(&mut output, "OVERVIEW");
    let overview = &report.overview;
    writeln!(output, "Sessions:    {}", overview.session_count).unwrap();
    writeln!(output, "Balance:     {}", format_money(overview.balance)).unwrap();
    writeln!(output, "Multiplier:  {:.2}x", overview.multiplier).unwrap();
    writeln!(output, "Streak:      {}", overview.streak).unwrap();

    writeln!(output).unwrap();
    let day = report.today.day_key.as_deref().unwrap_or("unknown day");
    heading(&mut output, &format!("TODAY ({day})"));
    writeln!(
        output,
        "Productive:  {}",
        format_minutes(report.today.productive_mins)
    )
    .unwrap();
    writeln!(output, "Relax:       {}", format_minutes(report.today.relax_mins)).unwrap();

    if overview.session_count == 0 {
        writeln!(output).unwrap();
        writeln!(output, "No sessions recorded yet.").unwrap();
        return output;
    }

    writeln!(output).unwrap();
    heading(&mut output, "TOP ACTIVITIES");
    for row in &report.top_activities {
        writeln!(
            output,
            "{:<28}{:>8}  {:>9}",
            row.label,
            format_minutes(row.minutes),
            format_money(row.net.unwrap_or_default())
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    heading(&mut output, "BY LOCATION");
    write_minutes_with_bars(&mut output, &report.by_location);

    writeln!(output).unwrap();
    heading(&mut output, "BY MOVEMENT");
    write_minutes_with_bars(&mut output, &report.by_movement);

    writeln!(output).unwrap();
    heading(&mut output, "RECENT SESSIONS");
    for session in &report.recent {
        let start = session
            .start_ms
            .and_then(|ms| format_local(ms, "%Y-%m-%d %H:%M"))
            .unwrap_or_else(|| "unknown".to_string());
        writeln!(
            output,
            "{start:<16}  {:>8}  {:>9}  {}",
            format_minutes(session.duration_min),
            format_money(session.net),
            selection_text(session)
        )
        .unwrap();
    }

    output
}

/// Formats the report as JSON; `null` when there is no data.
pub fn format_report_json(report: Option<&Report>) -> Result<String> {
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Runs the report command.
pub fn run<W: Write, S: KeyValueStore>(
    writer: &mut W,
    engine: &AccrualEngine<S>,
    json: bool,
) -> Result<()> {
    let raw = engine.store().get(engine.key())?;
    let report = Report::from_raw(raw.as_deref());

    if json {
        writeln!(writer, "{}", format_report_json(report.as_ref())?)?;
        return Ok(());
    }

    match report {
        Some(report) => write!(writer, "{}", format_report(&report))?,
        None => {
            writeln!(writer, "No saved data yet.")?;
            writeln!(writer)?;
            writeln!(
                writer,
                "Hint: Run 'brain set --activity <name>' to start tracking."
            )?;
        }
    }

    Ok(())
}
