//! Commands that change the active selection: `set`, `toggle` and `clear`.

use std::io::Write;

use anyhow::Result;
use brain_core::{
    AccrualEngine, EngineState, KeyValueStore, Selection, catalog, classify, rate_label,
};
use chrono::{DateTime, Utc};

use super::util::format_local;

/// Replaces the active selection.
pub fn run<W: Write, S: KeyValueStore>(
    writer: &mut W,
    engine: &mut AccrualEngine<S>,
    selection: Selection,
    now: DateTime<Utc>,
) -> Result<()> {
    let state = engine.set_active_at(selection, now);
    write_selection(writer, &state)
}

/// Adds `activity` to the selection, or removes it if already selected.
pub fn toggle<W: Write, S: KeyValueStore>(
    writer: &mut W,
    engine: &mut AccrualEngine<S>,
    activity: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let current = engine.get_state_at(now).active;
    run(writer, engine, current.toggled(activity), now)
}

/// Deselects every activity, which stops tracking.
pub fn clear<W: Write, S: KeyValueStore>(
    writer: &mut W,
    engine: &mut AccrualEngine<S>,
    now: DateTime<Utc>,
) -> Result<()> {
    let current = engine.get_state_at(now).active;
    run(writer, engine, current.without_activities(), now)
}

fn write_selection<W: Write>(writer: &mut W, state: &EngineState) -> Result<()> {
    let active = &state.active;
    writeln!(writer, "Active: {active}")?;

    for label in active.activities() {
        let meta = classify(label, &state.activity_meta);
        writeln!(writer, "  {label:<24}{}", rate_label(&meta))?;
    }

    match &state.current_session {
        Some(session) => {
            let since = format_local(session.start_ms, "%H:%M").unwrap_or_default();
            writeln!(writer, "Tracking since {since}.")?;
        }
        None => writeln!(writer, "No activity selected; time is not tracked.")?,
    }

    if let Some(location) = active
        .location
        .as_deref()
        .filter(|l| !catalog::is_known_location(l))
    {
        writeln!(writer, "Note: '{location}' is not a listed location.")?;
    }
    if let Some(movement) = active
        .movement
        .as_deref()
        .filter(|m| !catalog::is_known_movement(m))
    {
        writeln!(writer, "Note: '{movement}' is not a listed movement.")?;
    }
    for label in active.activities() {
        if !catalog::is_known_activity(label) && !state.activity_meta.contains_key(label) {
            let meta = classify(label, &state.activity_meta);
            writeln!(
                writer,
                "Note: '{label}' is not a listed activity; classified as {} ({}).",
                meta.kind,
                rate_label(&meta)
            )?;
        }
    }

    Ok(())
}
