//! Core domain logic for brain.
//!
//! This crate contains:
//! - Classification: mapping activity labels to productive/relax/neutral rates
//! - The accrual engine: sessions, day counters, balance, multiplier and streak
//! - Analytics: a defensive read-only projection over the stored state
//! - The option catalog offered to the user

pub mod analytics;
pub mod catalog;
pub mod classify;
mod engine;
mod store;
mod types;

pub use classify::{KeywordRule, classify, rate_label};
pub use engine::{AccrualEngine, DEFAULT_STATE_KEY, EconomyConfig, day_key};
pub use store::{KeyValueStore, MemoryStore};
pub use types::{
    ActivityKind, ActivityMeta, DaySummary, Delta, EngineState, OpenSession, Selection, Session,
    SessionTotals, ValidationError,
};
