//! Read-only aggregation over a stored state blob.
//!
//! The aggregator reads raw JSON rather than [`crate::EngineState`] so blobs
//! from older versions, or with damaged fields, still produce a report:
//! missing or non-numeric numbers count as 0 and missing arrays as empty.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

/// Bucket for sessions recorded without any activity.
pub const NO_ACTIVITY: &str = "(No Activity)";

const TOP_ACTIVITIES: usize = 10;
const TOP_PLACES: usize = 12;
const RECENT_SESSIONS: usize = 20;

/// High-level snapshot of the economy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub session_count: usize,
    pub balance: f64,
    pub multiplier: f64,
    pub streak: u64,
}

/// Today's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayTotals {
    pub day_key: Option<String>,
    pub productive_mins: f64,
    pub relax_mins: f64,
}

/// Minutes (and, for activities, net currency) attributed to one label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelTotal {
    pub label: String,
    pub minutes: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net: Option<f64>,
}

/// One row of the recent sessions list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentSession {
    pub start_ms: Option<i64>,
    pub duration_min: f64,
    pub location: Option<String>,
    pub movement: Option<String>,
    pub activities: Vec<String>,
    pub net: f64,
}

/// Aggregated analytics over a stored state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub overview: Overview,
    pub today: TodayTotals,
    pub top_activities: Vec<LabelTotal>,
    pub by_location: Vec<LabelTotal>,
    pub by_movement: Vec<LabelTotal>,
    pub recent: Vec<RecentSession>,
}

impl Report {
    /// Builds a report from a raw stored blob. Returns `None` when there is
    /// no blob or it is not a JSON object.
    pub fn from_raw(raw: Option<&str>) -> Option<Self> {
        let value: Value = serde_json::from_str(raw?).ok()?;
        Self::from_value(&value)
    }

    /// Builds a report from a parsed blob. Returns `None` unless `state` is a
    /// JSON object.
    pub fn from_value(state: &Value) -> Option<Self> {
        if !state.is_object() {
            return None;
        }
        let sessions = array(state, "sessions");

        let multiplier = state
            .get("multiplier")
            .and_then(Value::as_f64)
            .filter(|m| m.is_finite())
            .unwrap_or(1.0);

        Some(Self {
            overview: Overview {
                session_count: sessions.len(),
                balance: number(state, "balance"),
                multiplier,
                streak: state.get("streak").and_then(Value::as_u64).unwrap_or(0),
            },
            today: TodayTotals {
                day_key: text(state, "dayKey"),
                productive_mins: number(state, "productiveMins"),
                relax_mins: number(state, "relaxMins"),
            },
            top_activities: top_activities(sessions),
            by_location: minutes_by(sessions, "location"),
            by_movement: minutes_by(sessions, "movement"),
            recent: recent_sessions(sessions),
        })
    }
}

fn number(value: &Value, key: &str) -> f64 {
    value
        .get(key)
        .and_then(Value::as_f64)
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

fn text(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn active(session: &Value) -> &Value {
    static NULL: Value = Value::Null;
    session.get("active").unwrap_or(&NULL)
}

fn activities(session: &Value) -> Vec<&str> {
    array(active(session), "activity")
        .iter()
        .filter_map(Value::as_str)
        .collect()
}

/// Net currency of a session: the accumulated totals when recorded, else the
/// copied last delta.
fn session_net(session: &Value) -> f64 {
    session
        .get("totals")
        .and_then(|t| t.get("net"))
        .and_then(Value::as_f64)
        .filter(|n| n.is_finite())
        .unwrap_or_else(|| {
            session
                .get("delta")
                .map_or(0.0, |delta| number(delta, "net"))
        })
}

/// Sorts descending by minutes, ties by label, and keeps the first `limit`.
fn ranked(totals: HashMap<String, (f64, f64)>, with_net: bool, limit: usize) -> Vec<LabelTotal> {
    let mut rows: Vec<LabelTotal> = totals
        .into_iter()
        .map(|(label, (minutes, net))| LabelTotal {
            label,
            minutes,
            net: with_net.then_some(net),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.minutes
            .total_cmp(&a.minutes)
            .then_with(|| a.label.cmp(&b.label))
    });
    rows.truncate(limit);
    rows
}

fn top_activities(sessions: &[Value]) -> Vec<LabelTotal> {
    let mut totals: HashMap<String, (f64, f64)> = HashMap::new();
    for session in sessions {
        let minutes = number(session, "durationMin");
        let net = session_net(session);
        let labels = activities(session);

        if labels.is_empty() {
            let entry = totals.entry(NO_ACTIVITY.to_string()).or_default();
            entry.0 += minutes;
            entry.1 += net;
            continue;
        }

        #[expect(clippy::cast_precision_loss, reason = "a handful of activities")]
        let count = labels.len() as f64;
        for label in labels {
            let entry = totals.entry(label.to_string()).or_default();
            entry.0 += minutes / count;
            entry.1 += net / count;
        }
    }
    ranked(totals, true, TOP_ACTIVITIES)
}

fn minutes_by(sessions: &[Value], key: &str) -> Vec<LabelTotal> {
    let mut totals: HashMap<String, (f64, f64)> = HashMap::new();
    for session in sessions {
        let Some(label) = text(active(session), key) else {
            continue;
        };
        totals.entry(label).or_default().0 += number(session, "durationMin");
    }
    ranked(totals, false, TOP_PLACES)
}

fn recent_sessions(sessions: &[Value]) -> Vec<RecentSession> {
    sessions
        .iter()
        .rev()
        .take(RECENT_SESSIONS)
        .map(|session| {
            let selection = active(session);
            RecentSession {
                start_ms: session.get("startMs").and_then(Value::as_i64),
                duration_min: number(session, "durationMin"),
                location: text(selection, "location"),
                movement: text(selection, "movement"),
                activities: activities(session).into_iter().map(str::to_string).collect(),
                net: session_net(session),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn session(location: &str, activity: Value, minutes: f64, net: f64) -> Value {
        json!({
            "startMs": 1_000,
            "endMs": 2_000,
            "durationMin": minutes,
            "active": {"location": location, "movement": "Stationary", "activity": activity},
            "delta": {"net": net, "earned": net.max(0.0), "burned": 0.0}
        })
    }

    #[test]
    fn missing_blob_has_no_report() {
        assert!(Report::from_raw(None).is_none());
        assert!(Report::from_raw(Some("not json")).is_none());
        assert!(Report::from_raw(Some("[1,2]")).is_none());
    }

    #[test]
    fn empty_object_uses_defaults() {
        let report = Report::from_raw(Some("{}")).unwrap();
        assert_eq!(report.overview.session_count, 0);
        assert!((report.overview.multiplier - 1.0).abs() < f64::EPSILON);
        assert_eq!(report.overview.streak, 0);
        assert_eq!(report.today.day_key, None);
        assert!(report.top_activities.is_empty());
        assert!(report.recent.is_empty());
    }

    #[test]
    fn activities_split_minutes_and_net() {
        let state = json!({
            "sessions": [
                session("Home", json!(["Work", "Phone"]), 10.0, 4.0),
                session("Home", json!(["Work"]), 6.0, 6.0),
                session("Car", json!([]), 3.0, 0.0),
            ]
        });
        let report = Report::from_value(&state).unwrap();

        let rows: Vec<(&str, f64, f64)> = report
            .top_activities
            .iter()
            .map(|r| (r.label.as_str(), r.minutes, r.net.unwrap()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Work", 11.0, 8.0),
                ("Phone", 5.0, 2.0),
                (NO_ACTIVITY, 3.0, 0.0)
            ]
        );
    }

    #[test]
    fn location_totals_skip_missing_labels() {
        let state = json!({
            "sessions": [
                session("Home", json!(["Work"]), 10.0, 0.0),
                session("Car", json!(["Phone"]), 12.0, 0.0),
                session("Home", json!(["TV"]), 5.0, 0.0),
                {"durationMin": 30.0, "active": {"activity": ["Work"]}},
            ]
        });
        let report = Report::from_value(&state).unwrap();
        let locations: Vec<(&str, f64)> = report
            .by_location
            .iter()
            .map(|r| (r.label.as_str(), r.minutes))
            .collect();
        assert_eq!(locations, vec![("Home", 15.0), ("Car", 12.0)]);
        assert!(report.by_location.iter().all(|r| r.net.is_none()));
        assert_eq!(report.by_movement[0].label, "Stationary");
        assert!((report.by_movement[0].minutes - 27.0).abs() < 1e-9);
    }

    #[test]
    fn damaged_sessions_count_as_zero() {
        let state = json!({
            "balance": "lots",
            "sessions": [
                {"durationMin": "ten", "active": {"activity": "Work"}, "delta": null},
                {"active": null},
            ]
        });
        let report = Report::from_value(&state).unwrap();
        assert_eq!(report.overview.session_count, 2);
        assert!(report.overview.balance.abs() < f64::EPSILON);
        assert_eq!(report.top_activities.len(), 1);
        assert_eq!(report.top_activities[0].label, NO_ACTIVITY);
        assert!(report.top_activities[0].minutes.abs() < f64::EPSILON);
    }

    #[test]
    fn session_totals_preferred_over_last_delta() {
        let state = json!({
            "sessions": [{
                "durationMin": 10.0,
                "active": {"activity": ["Work"]},
                "delta": {"net": 1.0},
                "totals": {"net": 10.0}
            }]
        });
        let report = Report::from_value(&state).unwrap();
        assert_eq!(report.top_activities[0].net, Some(10.0));
        assert!((report.recent[0].net - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn recent_sessions_newest_first_and_capped() {
        let sessions: Vec<Value> = (0..25)
            .map(|i| json!({"startMs": i, "durationMin": 1.0, "active": {"activity": ["Work"]}}))
            .collect();
        let report = Report::from_value(&json!({ "sessions": sessions })).unwrap();
        assert_eq!(report.recent.len(), 20);
        assert_eq!(report.recent[0].start_ms, Some(24));
        assert_eq!(report.recent[19].start_ms, Some(5));
    }
}
