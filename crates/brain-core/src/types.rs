//! Core type definitions for the persisted engine state.
//!
//! Every type here serializes with the camelCase field names of the stored
//! blob. Deserialization is lenient at the field level: missing fields fall
//! back to defaults so blobs written by older versions still load, a damaged
//! number or label reads as its default, and list or map entries that do not
//! parse are dropped without losing their neighbours.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A rate was negative or not a finite number.
    #[error("rate must be a finite, non-negative number, got {value}")]
    InvalidRate { value: f64 },

    /// Invalid activity kind value.
    #[error("invalid activity kind: {value}")]
    InvalidActivityKind { value: String },
}

/// Economic effect of an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// Earns currency and fills the productive bucket.
    Productive,
    /// Burns currency and fills the relax bucket.
    Relax,
    /// No economic effect.
    #[default]
    Neutral,
}

impl ActivityKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Productive => "productive",
            Self::Relax => "relax",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActivityKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "productive" => Ok(Self::Productive),
            "relax" => Ok(Self::Relax),
            "neutral" => Ok(Self::Neutral),
            _ => Err(ValidationError::InvalidActivityKind {
                value: s.to_string(),
            }),
        }
    }
}

/// Classification of an activity label: its kind and per-minute rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityMeta {
    #[serde(rename = "type", default)]
    pub kind: ActivityKind,
    /// Currency earned per minute (productive only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earn: Option<f64>,
    /// Currency burned per minute before the multiplier discount (relax only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burn: Option<f64>,
}

/// Rate applied when a productive or relax entry carries no explicit rate.
pub const DEFAULT_RATE: f64 = 1.2;

impl ActivityMeta {
    #[must_use]
    pub const fn productive(earn: f64) -> Self {
        Self {
            kind: ActivityKind::Productive,
            earn: Some(earn),
            burn: None,
        }
    }

    #[must_use]
    pub const fn relax(burn: f64) -> Self {
        Self {
            kind: ActivityKind::Relax,
            earn: None,
            burn: Some(burn),
        }
    }

    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            kind: ActivityKind::Neutral,
            earn: None,
            burn: None,
        }
    }

    /// Builds a classification from a kind and rate, rejecting unusable rates.
    pub fn with_rate(kind: ActivityKind, rate: f64) -> Result<Self, ValidationError> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(ValidationError::InvalidRate { value: rate });
        }
        Ok(match kind {
            ActivityKind::Productive => Self::productive(rate),
            ActivityKind::Relax => Self::relax(rate),
            ActivityKind::Neutral => Self::neutral(),
        })
    }

    /// The per-minute rate for this kind: earn for productive, burn for
    /// relax, zero for neutral.
    #[must_use]
    pub fn rate(&self) -> f64 {
        let rate = match self.kind {
            ActivityKind::Productive => self.earn.unwrap_or(DEFAULT_RATE),
            ActivityKind::Relax => self.burn.unwrap_or(DEFAULT_RATE),
            ActivityKind::Neutral => 0.0,
        };
        if rate.is_finite() { rate.max(0.0) } else { 0.0 }
    }
}

/// The user's current choice of location, movement and activities.
///
/// Activities behave as a set: labels are trimmed, blanks dropped and
/// duplicates removed, and the list is kept sorted so two selections with the
/// same labels compare equal regardless of the order they were picked in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default, deserialize_with = "lenient_label")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub movement: Option<String>,
    #[serde(default, deserialize_with = "lenient_activities")]
    activity: Vec<String>,
}

impl Selection {
    pub fn new<I, T>(location: Option<&str>, movement: Option<&str>, activities: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self {
            location: location.and_then(clean_label),
            movement: movement.and_then(clean_label),
            activity: normalize_activities(activities),
        }
    }

    /// Selected activities in display order.
    pub fn activities(&self) -> &[String] {
        &self.activity
    }

    pub fn has_activities(&self) -> bool {
        !self.activity.is_empty()
    }

    pub fn contains(&self, activity: &str) -> bool {
        self.activity.iter().any(|a| a == activity.trim())
    }

    /// Returns a copy with `activity` added, or removed if already selected.
    #[must_use]
    pub fn toggled(&self, activity: &str) -> Self {
        let label = activity.trim();
        let activities: Vec<&str> = if self.contains(label) {
            self.activity
                .iter()
                .map(String::as_str)
                .filter(|a| *a != label)
                .collect()
        } else {
            self.activity
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(label))
                .collect()
        };
        Self {
            location: self.location.clone(),
            movement: self.movement.clone(),
            activity: normalize_activities(activities),
        }
    }

    /// Returns a copy with every activity removed.
    #[must_use]
    pub fn without_activities(&self) -> Self {
        Self {
            location: self.location.clone(),
            movement: self.movement.clone(),
            activity: Vec::new(),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self
            .location
            .iter()
            .chain(self.movement.iter())
            .chain(self.activity.iter())
            .map(String::as_str)
            .collect();
        if parts.is_empty() {
            f.write_str("None")
        } else {
            f.write_str(&parts.join(" | "))
        }
    }
}

fn clean_label(label: &str) -> Option<String> {
    let label = label.trim();
    (!label.is_empty()).then(|| label.to_string())
}

fn normalize_activities<I, T>(activities: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    activities
        .into_iter()
        .filter_map(|a| clean_label(a.as_ref()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn lenient_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().and_then(clean_label))
}

/// Accepts any JSON value: arrays keep their string entries, anything else
/// becomes "no activity selected".
fn lenient_activities<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(normalize_activities(items.iter().filter_map(Value::as_str)))
}

/// Finite numbers pass through; `null`, strings and the like read as 0.
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|n| n.is_finite()).unwrap_or(0.0))
}

fn lenient_multiplier<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|n| n.is_finite()).unwrap_or(1.0))
}

/// Epoch milliseconds; fractional values are truncated.
fn lenient_ms<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    #[expect(
        clippy::cast_possible_truncation,
        reason = "stored timestamps are whole milliseconds well inside i64"
    )]
    let ms = value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.is_finite())
            .map(|n| n as i64)
    });
    Ok(ms.unwrap_or(0))
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().unwrap_or_default().to_string())
}

/// A value that does not parse reads as the type's default.
fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// A value that does not parse reads as `None`.
fn lenient_option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Keeps the entries that parse; a non-array reads as empty.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Keeps the entries that parse; a non-object reads as empty.
fn lenient_map<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(entries) = value else {
        return Ok(BTreeMap::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|(key, item)| Some((key, serde_json::from_value(item).ok()?)))
        .collect())
}

/// Economic effect of a single accrual event.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Delta {
    #[serde(deserialize_with = "lenient_ms")]
    pub at_ms: i64,
    #[serde(deserialize_with = "lenient_number")]
    pub minutes: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub earned: f64,
    /// Burn after the multiplier discount.
    #[serde(deserialize_with = "lenient_number")]
    pub burned: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub net: f64,
}

/// Running sum of the accrual events attributed to one session.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionTotals {
    #[serde(deserialize_with = "lenient_number")]
    pub minutes: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub earned: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub burned: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub net: f64,
}

impl SessionTotals {
    pub fn add(&mut self, delta: &Delta) {
        self.minutes += delta.minutes;
        self.earned += delta.earned;
        self.burned += delta.burned;
        self.net += delta.net;
    }
}

/// The session currently accruing time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenSession {
    #[serde(deserialize_with = "lenient_ms")]
    pub start_ms: i64,
    #[serde(deserialize_with = "lenient_ms")]
    pub last_accrual_ms: i64,
    #[serde(deserialize_with = "lenient_or_default")]
    pub active: Selection,
    #[serde(deserialize_with = "lenient_or_default")]
    pub totals: SessionTotals,
}

/// A closed session in the log.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Session {
    #[serde(deserialize_with = "lenient_ms")]
    pub start_ms: i64,
    #[serde(deserialize_with = "lenient_ms")]
    pub end_ms: i64,
    #[serde(deserialize_with = "lenient_number")]
    pub duration_min: f64,
    #[serde(deserialize_with = "lenient_or_default")]
    pub active: Selection,
    /// Copy of the most recent accrual event at close time.
    #[serde(deserialize_with = "lenient_or_default")]
    pub delta: Delta,
    #[serde(deserialize_with = "lenient_or_default")]
    pub totals: SessionTotals,
}

/// Counters of a finished day, recorded at rollover.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DaySummary {
    #[serde(deserialize_with = "lenient_text")]
    pub day_key: String,
    #[serde(deserialize_with = "lenient_number")]
    pub productive_mins: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub relax_mins: f64,
    /// Streak after this day was evaluated.
    #[serde(deserialize_with = "lenient_count")]
    pub streak: u32,
}

/// The single persisted aggregate owned by the accrual engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineState {
    #[serde(deserialize_with = "lenient_number")]
    pub balance: f64,
    #[serde(deserialize_with = "lenient_multiplier")]
    pub multiplier: f64,
    #[serde(deserialize_with = "lenient_count")]
    pub streak: u32,
    #[serde(deserialize_with = "lenient_or_default")]
    pub active: Selection,
    #[serde(deserialize_with = "lenient_option")]
    pub current_session: Option<OpenSession>,
    #[serde(deserialize_with = "lenient_list")]
    pub sessions: Vec<Session>,
    #[serde(deserialize_with = "lenient_text")]
    pub day_key: String,
    #[serde(deserialize_with = "lenient_number")]
    pub productive_mins: f64,
    #[serde(deserialize_with = "lenient_number")]
    pub relax_mins: f64,
    #[serde(deserialize_with = "lenient_map")]
    pub activity_meta: BTreeMap<String, ActivityMeta>,
    #[serde(deserialize_with = "lenient_option")]
    pub last_delta: Option<Delta>,
    #[serde(deserialize_with = "lenient_list")]
    pub history: Vec<DaySummary>,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            balance: 0.0,
            multiplier: 1.0,
            streak: 0,
            active: Selection::default(),
            current_session: None,
            sessions: Vec::new(),
            day_key: String::new(),
            productive_mins: 0.0,
            relax_mins: 0.0,
            activity_meta: crate::classify::default_activity_meta(),
            last_delta: None,
            history: Vec::new(),
        }
    }
}

impl EngineState {
    /// A fresh state for the given day.
    pub fn new(day_key: impl Into<String>) -> Self {
        Self {
            day_key: day_key.into(),
            ..Self::default()
        }
    }

    /// Adds any default classification missing from the table. Existing
    /// entries, including user overrides, are kept.
    pub fn seed_default_meta(&mut self) {
        for (label, meta) in crate::classify::default_activity_meta() {
            self.activity_meta.entry(label).or_insert(meta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_normalizes_activities() {
        let selection = Selection::new(
            Some(" Home "),
            Some(""),
            ["Phone", " Work", "Phone", "  "],
        );
        assert_eq!(selection.location.as_deref(), Some("Home"));
        assert_eq!(selection.movement, None);
        assert_eq!(selection.activities(), ["Phone", "Work"]);
    }

    #[test]
    fn selection_equality_ignores_pick_order() {
        let a = Selection::new(Some("Home"), None, ["Work", "Phone"]);
        let b = Selection::new(Some("Home"), None, ["Phone", "Work"]);
        assert_eq!(a, b);
    }

    #[test]
    fn selection_toggle_adds_then_removes() {
        let base = Selection::new(Some("Home"), Some("Stationary"), ["Work"]);
        let added = base.toggled("Phone");
        assert_eq!(added.activities(), ["Phone", "Work"]);
        let removed = added.toggled("Work");
        assert_eq!(removed.activities(), ["Phone"]);
        assert_eq!(removed.location.as_deref(), Some("Home"));
    }

    #[test]
    fn selection_display_joins_parts() {
        let selection = Selection::new(Some("Home"), Some("Walking"), ["Phone", "Music"]);
        assert_eq!(selection.to_string(), "Home | Walking | Music | Phone");
        assert_eq!(Selection::default().to_string(), "None");
    }

    #[test]
    fn malformed_activity_list_becomes_empty() {
        let selection: Selection =
            serde_json::from_str(r#"{"location":"Home","movement":7,"activity":"Work"}"#)
                .unwrap();
        assert_eq!(selection.location.as_deref(), Some("Home"));
        assert_eq!(selection.movement, None);
        assert!(!selection.has_activities());

        let selection: Selection =
            serde_json::from_str(r#"{"activity":["Work", 3, null, "Phone"]}"#).unwrap();
        assert_eq!(selection.activities(), ["Phone", "Work"]);
    }

    #[test]
    fn state_loads_from_sparse_blob() {
        let state: EngineState = serde_json::from_str(r#"{"balance": 4.5, "streak": 2}"#).unwrap();
        assert!((state.balance - 4.5).abs() < f64::EPSILON);
        assert_eq!(state.streak, 2);
        assert!((state.multiplier - 1.0).abs() < f64::EPSILON);
        assert!(state.sessions.is_empty());
        assert!(state.activity_meta.contains_key("Deep Focus"));
    }

    #[test]
    fn state_serializes_camel_case_fields() {
        let state = EngineState::new("2025-01-29");
        let value = serde_json::to_value(&state).unwrap();
        for key in [
            "balance",
            "multiplier",
            "streak",
            "active",
            "currentSession",
            "sessions",
            "dayKey",
            "productiveMins",
            "relaxMins",
            "activityMeta",
            "lastDelta",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["activityMeta"]["Deep Focus"]["type"], "productive");
        assert_eq!(value["activityMeta"]["Deep Focus"]["earn"], 2.0);
        assert!(value["activityMeta"]["Deep Focus"].get("burn").is_none());
    }

    #[test]
    fn seed_default_meta_keeps_overrides() {
        let mut state = EngineState::new("2025-01-29");
        state.activity_meta.clear();
        state
            .activity_meta
            .insert("Work".to_string(), ActivityMeta::productive(3.0));
        state.seed_default_meta();
        assert_eq!(state.activity_meta["Work"], ActivityMeta::productive(3.0));
        assert!(state.activity_meta.contains_key("Gaming"));
    }

    #[test]
    fn rate_falls_back_for_missing_values() {
        let meta: ActivityMeta = serde_json::from_str(r#"{"type":"relax"}"#).unwrap();
        assert!((meta.rate() - DEFAULT_RATE).abs() < f64::EPSILON);
        assert!(ActivityMeta::neutral().rate().abs() < f64::EPSILON);
    }

    #[test]
    fn with_rate_rejects_negative_and_nan() {
        assert!(ActivityMeta::with_rate(ActivityKind::Productive, -1.0).is_err());
        assert!(ActivityMeta::with_rate(ActivityKind::Relax, f64::NAN).is_err());
        assert_eq!(
            ActivityMeta::with_rate(ActivityKind::Relax, 0.5).unwrap(),
            ActivityMeta::relax(0.5)
        );
    }

    #[test]
    fn activity_kind_parses_known_values() {
        assert_eq!("relax".parse::<ActivityKind>().unwrap(), ActivityKind::Relax);
        let err = "fun".parse::<ActivityKind>().unwrap_err();
        assert_eq!(err.to_string(), "invalid activity kind: fun");
    }

    #[test]
    fn damaged_fields_read_as_defaults() {
        let raw = r#"{
            "balance": null,
            "multiplier": "x",
            "streak": -2,
            "dayKey": 7,
            "active": null,
            "currentSession": {"startMs": 1000, "lastAccrualMs": 1500.7, "active": null},
            "lastDelta": [],
            "sessions": [
                {"startMs": 0, "endMs": 60000, "durationMin": null,
                 "active": {"activity": ["Work"]}, "delta": null},
                {"startMs": 60000, "endMs": 120000, "durationMin": 1.0, "totals": {"net": "?"}}
            ]
        }"#;
        let state: EngineState = serde_json::from_str(raw).unwrap();

        assert!(state.balance.abs() < f64::EPSILON);
        assert!((state.multiplier - 1.0).abs() < f64::EPSILON);
        assert_eq!(state.streak, 0);
        assert_eq!(state.day_key, "");
        assert_eq!(state.active, Selection::default());
        assert_eq!(state.last_delta, None);

        let open = state.current_session.unwrap();
        assert_eq!(open.last_accrual_ms, 1500);
        assert!(!open.active.has_activities());

        assert_eq!(state.sessions.len(), 2);
        assert!(state.sessions[0].duration_min.abs() < f64::EPSILON);
        assert_eq!(state.sessions[0].active.activities(), ["Work"]);
        assert_eq!(state.sessions[0].delta, Delta::default());
        assert!(state.sessions[1].totals.net.abs() < f64::EPSILON);
    }

    #[test]
    fn unparseable_entries_are_dropped_individually() {
        let raw = r#"{
            "balance": 12.5,
            "sessions": [3, {"startMs": 5, "durationMin": 2.0}, "junk"],
            "history": [{"dayKey": "2025-01-28", "productiveMins": 30.0}, null],
            "activityMeta": {"Piano": {"type": "productive", "earn": 3.0}, "Bad": {"type": "loud"}}
        }"#;
        let state: EngineState = serde_json::from_str(raw).unwrap();

        assert!((state.balance - 12.5).abs() < f64::EPSILON);
        assert_eq!(state.sessions.len(), 1);
        assert_eq!(state.sessions[0].start_ms, 5);
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].day_key, "2025-01-28");
        assert_eq!(state.activity_meta["Piano"], ActivityMeta::productive(3.0));
        assert!(!state.activity_meta.contains_key("Bad"));
    }
}
