//! Options command: the catalog of choices with classification rates.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use brain_core::catalog::{ACTIVITY_SECTIONS, LOCATIONS, MOVEMENTS, is_known_activity};
use brain_core::{AccrualEngine, ActivityMeta, KeyValueStore, classify, rate_label};
use chrono::{DateTime, Utc};

use super::util::heading;

/// Formats the catalog, rating each activity against `table`.
///
/// Labels in `table` that the catalog does not list are shown under
/// `DEFINED`.
pub fn format_options(table: &BTreeMap<String, ActivityMeta>) -> String {
    let mut output = String::new();

    heading(&mut output, "LOCATIONS");
    writeln!(output, "{}", LOCATIONS.join(", ")).unwrap();
    writeln!(output).unwrap();

    heading(&mut output, "MOVEMENTS");
    writeln!(output, "{}", MOVEMENTS.join(", ")).unwrap();

    for section in ACTIVITY_SECTIONS {
        writeln!(output).unwrap();
        heading(&mut output, &section.title.to_uppercase());
        for label in section.items {
            let meta = classify(label, table);
            writeln!(output, "  {label:<24}{}", rate_label(&meta)).unwrap();
        }
    }

    let defined: Vec<(&String, &ActivityMeta)> = table
        .iter()
        .filter(|(label, _)| !is_known_activity(label))
        .collect();
    if !defined.is_empty() {
        writeln!(output).unwrap();
        heading(&mut output, "DEFINED");
        for (label, meta) in defined {
            writeln!(output, "  {label:<24}{}", rate_label(meta)).unwrap();
        }
    }

    output
}

pub fn run<W: Write, S: KeyValueStore>(
    writer: &mut W,
    engine: &mut AccrualEngine<S>,
    now: DateTime<Utc>,
) -> Result<()> {
    let state = engine.get_state_at(now);
    write!(writer, "{}", format_options(&state.activity_meta))?;
    Ok(())
}
