//! Status command: balance, multiplier, streak and the running session.

use std::io::Write;

use anyhow::Result;
use brain_core::{AccrualEngine, KeyValueStore};
use chrono::{DateTime, Utc};

use super::util::{format_local, format_minutes, format_money};

pub fn run<W: Write, S: KeyValueStore>(
    writer: &mut W,
    engine: &mut AccrualEngine<S>,
    now: DateTime<Utc>,
) -> Result<()> {
    let state = engine.get_state_at(now);

    writeln!(writer, "Brain status")?;
    writeln!(writer, "Day:         {}", state.day_key)?;
    writeln!(writer, "Balance:     {}", format_money(state.balance))?;
    writeln!(writer, "Multiplier:  {:.2}x", state.multiplier)?;
    writeln!(writer, "Streak:      {}", state.streak)?;
    writeln!(
        writer,
        "Today:       {} productive, {} relax",
        format_minutes(state.productive_mins),
        format_minutes(state.relax_mins)
    )?;
    writeln!(writer, "Active:      {}", state.active)?;

    match (&state.current_session, state.session_age_minutes(now)) {
        (Some(session), Some(age)) => {
            let since = format_local(session.start_ms, "%H:%M").unwrap_or_default();
            writeln!(writer, "Session:     {} since {since}", format_minutes(age))?;
        }
        _ => writeln!(writer, "Session:     not tracking")?,
    }

    match state.last_delta {
        Some(delta) => writeln!(
            writer,
            "Last change: {} over {}",
            format_money(delta.net),
            format_minutes(delta.minutes)
        )?,
        None => writeln!(writer, "Last change: none")?,
    }
    writeln!(writer, "Sessions:    {} logged", state.sessions.len())?;

    let threshold = engine.config().long_session_minutes;
    if state
        .session_age_minutes(now)
        .is_some_and(|age| age > threshold)
    {
        writeln!(writer)?;
        writeln!(
            writer,
            "Warning: this session has run for over {threshold:.0} minutes. Still doing it? Run 'brain clear' if not."
        )?;
    }

    Ok(())
}
