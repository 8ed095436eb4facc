//! CLI subcommand implementations.
//!
//! Each command takes the output writer, the engine, and the current instant
//! so tests can drive them against a [`brain_core::MemoryStore`] at fixed
//! times.

pub mod define;
pub mod export;
pub mod options;
pub mod report;
pub mod reset;
pub mod set;
pub mod status;
pub mod tick;
pub mod util;
