//! Tick command: accrue the running session up to now.

use std::io::Write;

use anyhow::Result;
use brain_core::{AccrualEngine, KeyValueStore};
use chrono::{DateTime, Utc};

use super::util::{format_minutes, format_money};

pub fn run<W: Write, S: KeyValueStore>(
    writer: &mut W,
    engine: &mut AccrualEngine<S>,
    now: DateTime<Utc>,
) -> Result<()> {
    let state = engine.tick_at(now);
    let balance = format_money(state.balance);

    match state.last_delta {
        Some(delta) => writeln!(
            writer,
            "Balance: {balance} (last change {} over {})",
            format_money(delta.net),
            format_minutes(delta.minutes)
        )?,
        None => writeln!(writer, "Balance: {balance}")?,
    }
    match &state.current_session {
        Some(session) => writeln!(writer, "Tracking: {}", session.active)?,
        None => writeln!(writer, "Not tracking.")?,
    }

    Ok(())
}
