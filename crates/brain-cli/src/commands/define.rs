//! Define command: classify an activity label.

use std::io::Write;

use anyhow::{Result, bail};
use brain_core::{AccrualEngine, ActivityMeta, KeyValueStore, rate_label};
use chrono::{DateTime, Utc};

pub fn run<W: Write, S: KeyValueStore>(
    writer: &mut W,
    engine: &mut AccrualEngine<S>,
    label: &str,
    meta: ActivityMeta,
    now: DateTime<Utc>,
) -> Result<()> {
    let label = label.trim();
    if label.is_empty() {
        bail!("activity label must not be empty");
    }
    engine.define_activity_at(label, meta, now);
    writeln!(
        writer,
        "Defined '{label}' as {} ({}).",
        meta.kind,
        rate_label(&meta)
    )?;
    Ok(())
}
