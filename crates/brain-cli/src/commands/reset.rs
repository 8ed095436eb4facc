//! Reset command: delete all tracked data.

use std::io::Write;

use anyhow::{Result, bail};
use brain_core::{AccrualEngine, KeyValueStore};

pub fn run<W: Write, S: KeyValueStore>(
    writer: &mut W,
    engine: &mut AccrualEngine<S>,
    confirmed: bool,
) -> Result<()> {
    if !confirmed {
        bail!("reset deletes all balance, sessions and history; pass --yes to confirm");
    }
    engine.reset_all();
    writeln!(writer, "All tracking data removed.")?;
    Ok(())
}
