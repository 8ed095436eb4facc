//! Export command: the full up-to-date state as JSON.

use std::io::Write;

use anyhow::Result;
use brain_core::{AccrualEngine, KeyValueStore};
use chrono::{DateTime, Utc};

pub fn run<W: Write, S: KeyValueStore>(
    writer: &mut W,
    engine: &mut AccrualEngine<S>,
    now: DateTime<Utc>,
) -> Result<()> {
    let json = engine.export_json_at(now)?;
    writeln!(writer, "{json}")?;
    Ok(())
}
