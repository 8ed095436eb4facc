//! The accrual engine.
//!
//! [`EngineState`] carries the state machine: accrual, session open/close,
//! multiplier recompute and daily rollover are pure functions of the state,
//! the current instant and an [`EconomyConfig`]. [`AccrualEngine`] wraps them
//! in the load → rollover → mutate → persist cycle every public operation
//! runs.
//!
//! # Failure semantics
//!
//! No public operation returns an error. A missing or unparseable stored blob
//! loads as a fresh default state, and a failed write is logged and skipped:
//! the caller still receives the computed state. When the store itself fails
//! to read, the operation runs on a fresh state but does not write it back, so
//! a transient read error never replaces the stored blob.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::classify;
use crate::store::KeyValueStore;
use crate::types::{
    ActivityKind, ActivityMeta, DaySummary, Delta, EngineState, OpenSession, Selection, Session,
};

/// Storage key of the persisted state blob.
pub const DEFAULT_STATE_KEY: &str = "brain_state_v1";

const MS_PER_MINUTE: f64 = 60_000.0;

/// Where a loaded state came from, deciding whether it may be written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Loaded {
    /// Parsed from the store, or fresh because nothing usable was stored.
    Writable,
    /// Fresh because the store read failed; the stored blob may still be good.
    ReadFailed,
}

/// Tunables of the currency economy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Lower multiplier bound. Default: 1.0.
    pub min_multiplier: f64,

    /// Upper multiplier bound. Default: 9.0.
    pub max_multiplier: f64,

    /// Multiplier added per streak day. Default: 0.5.
    pub streak_weight: f64,

    /// Productive minutes today that add 1.0 to the multiplier. Default: 180.
    pub productive_minutes_per_point: f64,

    /// Closed sessions retained in the log. Default: 4000.
    pub max_sessions: usize,

    /// Day summaries retained in the history. Default: 400.
    pub max_history: usize,

    /// Age after which an open session is considered stale. Default: 180.
    pub long_session_minutes: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            min_multiplier: 1.0,
            max_multiplier: 9.0,
            streak_weight: 0.5,
            productive_minutes_per_point: 180.0,
            max_sessions: 4000,
            max_history: 400,
            long_session_minutes: 180.0,
        }
    }
}

/// Local calendar day of `now`, as `YYYY-MM-DD`.
pub fn day_key(now: DateTime<Utc>) -> String {
    now.with_timezone(&Local).format("%Y-%m-%d").to_string()
}

#[expect(
    clippy::cast_precision_loss,
    reason = "millisecond spans are far below 2^52"
)]
fn minutes_between(from_ms: i64, to_ms: i64) -> f64 {
    (to_ms - from_ms) as f64 / MS_PER_MINUTE
}

impl EngineState {
    /// Recomputes the multiplier from the streak and today's productive minutes.
    pub fn recompute_multiplier(&mut self, config: &EconomyConfig) {
        let mut raw = 1.0 + f64::from(self.streak) * config.streak_weight;
        if config.productive_minutes_per_point > 0.0 {
            raw += self.productive_mins / config.productive_minutes_per_point;
        }
        // max/min rather than clamp: a misconfigured range must not panic.
        self.multiplier = raw.max(config.min_multiplier).min(config.max_multiplier);
    }

    /// Folds `minutes` of `selection` into the day counters and the balance.
    ///
    /// Minutes are split evenly across the selected activities. The burn total
    /// is discounted by the current multiplier; earnings are not. Returns the
    /// recorded delta, or `None` when nothing was accrued.
    pub fn accrue_minutes(
        &mut self,
        minutes: f64,
        selection: &Selection,
        now_ms: i64,
        config: &EconomyConfig,
    ) -> Option<Delta> {
        let activities = selection.activities();
        if minutes.is_nan() || minutes <= 0.0 || activities.is_empty() {
            return None;
        }

        #[expect(clippy::cast_precision_loss, reason = "a handful of activities")]
        let share = minutes / activities.len() as f64;
        let mut earned = 0.0;
        let mut burned = 0.0;
        for label in activities {
            let meta = classify(label, &self.activity_meta);
            match meta.kind {
                ActivityKind::Productive => {
                    self.productive_mins += share;
                    earned += share * meta.rate();
                }
                ActivityKind::Relax => {
                    self.relax_mins += share;
                    burned += share * meta.rate();
                }
                ActivityKind::Neutral => {}
            }
        }

        let burned = burned / self.multiplier.max(1.0);
        self.balance += earned;
        self.balance -= burned;

        let delta = Delta {
            at_ms: now_ms,
            minutes,
            earned,
            burned,
            net: earned - burned,
        };
        self.last_delta = Some(delta);
        self.recompute_multiplier(config);
        Some(delta)
    }

    /// Opens a session for `selection`, overwriting any open session.
    pub fn start_new_session(&mut self, now_ms: i64, selection: Selection) {
        tracing::debug!(start_ms = now_ms, active = %selection, "session opened");
        self.current_session = Some(OpenSession {
            start_ms: now_ms,
            last_accrual_ms: now_ms,
            active: selection,
            totals: Default::default(),
        });
    }

    /// Closes the open session, if any, accruing the minutes since its last
    /// accrual and appending it to the log.
    pub fn end_current_session(&mut self, now_ms: i64, config: &EconomyConfig) {
        let Some(open) = self.current_session.take() else {
            return;
        };

        let minutes = minutes_between(open.last_accrual_ms, now_ms);
        let mut totals = open.totals;
        if let Some(delta) = self.accrue_minutes(minutes, &open.active, now_ms, config) {
            totals.add(&delta);
        }

        let session = Session {
            start_ms: open.start_ms,
            end_ms: now_ms,
            duration_min: minutes_between(open.start_ms, now_ms),
            active: open.active,
            delta: self.last_delta.unwrap_or_default(),
            totals,
        };
        tracing::info!(
            duration_min = session.duration_min,
            net = session.totals.net,
            active = %session.active,
            "session closed"
        );
        self.sessions.push(session);

        if self.sessions.len() > config.max_sessions {
            let excess = self.sessions.len() - config.max_sessions;
            self.sessions.drain(..excess);
        }
    }

    /// Starts a new day if the local date of `now` differs from `day_key`.
    ///
    /// The open session is closed into the old day and reopened at `now` with
    /// the same selection. The streak grows when the day tracked any time and
    /// productive minutes were at least relax minutes, and resets otherwise.
    /// Returns whether a rollover happened.
    pub fn rollover_if_needed(&mut self, now: DateTime<Utc>, config: &EconomyConfig) -> bool {
        let today = day_key(now);
        if self.day_key == today {
            return false;
        }

        let now_ms = now.timestamp_millis();
        let reopen = self.current_session.as_ref().map(|s| s.active.clone());
        self.end_current_session(now_ms, config);

        let tracked = self.productive_mins + self.relax_mins;
        if tracked > 0.0 && self.productive_mins >= self.relax_mins {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.streak = 0;
        }

        let previous = std::mem::replace(&mut self.day_key, today);
        tracing::info!(from = %previous, to = %self.day_key, streak = self.streak, "day rollover");

        if !previous.is_empty() {
            self.history.push(DaySummary {
                day_key: previous,
                productive_mins: self.productive_mins,
                relax_mins: self.relax_mins,
                streak: self.streak,
            });
            if self.history.len() > config.max_history {
                let excess = self.history.len() - config.max_history;
                self.history.drain(..excess);
            }
        }

        self.productive_mins = 0.0;
        self.relax_mins = 0.0;
        self.recompute_multiplier(config);

        if let Some(selection) = reopen {
            self.start_new_session(now_ms, selection);
        }
        true
    }

    /// Accrues the open session up to `now_ms`. `last_accrual_ms` moves to
    /// `now_ms` even when the clock went backwards, dropping that interval.
    pub fn accrue_open_session(&mut self, now_ms: i64, config: &EconomyConfig) {
        let Some(open) = self.current_session.as_ref() else {
            return;
        };
        let minutes = minutes_between(open.last_accrual_ms, now_ms);
        let selection = open.active.clone();

        let delta = self.accrue_minutes(minutes, &selection, now_ms, config);
        if let Some(open) = self.current_session.as_mut() {
            if let Some(delta) = delta {
                open.totals.add(&delta);
            }
            open.last_accrual_ms = now_ms;
        }
    }

    /// Minutes the open session has been running at `now`.
    pub fn session_age_minutes(&self, now: DateTime<Utc>) -> Option<f64> {
        self.current_session
            .as_ref()
            .map(|s| minutes_between(s.start_ms, now.timestamp_millis()))
    }
}

/// Runs engine operations against a [`KeyValueStore`].
///
/// Each operation has an `_at` form taking the current instant explicitly;
/// the plain form uses the system clock.
pub struct AccrualEngine<S> {
    store: S,
    key: String,
    config: EconomyConfig,
}

impl<S: KeyValueStore> AccrualEngine<S> {
    /// Creates an engine using the default key and economy.
    pub fn new(store: S) -> Self {
        Self::with_config(store, DEFAULT_STATE_KEY, EconomyConfig::default())
    }

    pub fn with_config(store: S, key: impl Into<String>, config: EconomyConfig) -> Self {
        Self {
            store,
            key: key.into(),
            config,
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub const fn config(&self) -> &EconomyConfig {
        &self.config
    }

    /// Changes the active selection.
    pub fn set_active(&mut self, selection: Selection) -> EngineState {
        self.set_active_at(selection, Utc::now())
    }

    /// Changes the active selection as of `now`.
    ///
    /// An identical selection is a no-op: the open session keeps running.
    /// Otherwise the open session is closed under the old selection and a new
    /// one opened if the new selection has any activity.
    pub fn set_active_at(&mut self, selection: Selection, now: DateTime<Utc>) -> EngineState {
        let (mut state, loaded) = self.load(now);
        state.rollover_if_needed(now, &self.config);

        if state.active == selection {
            tracing::debug!(active = %selection, "selection unchanged");
        } else {
            let now_ms = now.timestamp_millis();
            state.end_current_session(now_ms, &self.config);
            state.active = selection;
            if state.active.has_activities() {
                let selection = state.active.clone();
                state.start_new_session(now_ms, selection);
            }
        }

        self.persist(&state, loaded);
        state
    }

    /// Advances accrual of the open session.
    pub fn tick(&mut self) -> EngineState {
        self.tick_at(Utc::now())
    }

    /// Advances accrual of the open session to `now`.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> EngineState {
        let (mut state, loaded) = self.load(now);
        state.rollover_if_needed(now, &self.config);
        state.accrue_open_session(now.timestamp_millis(), &self.config);
        self.persist(&state, loaded);
        state
    }

    /// Returns the up-to-date state. Same as [`Self::tick`].
    pub fn get_state(&mut self) -> EngineState {
        self.tick()
    }

    pub fn get_state_at(&mut self, now: DateTime<Utc>) -> EngineState {
        self.tick_at(now)
    }

    /// Returns the up-to-date state for export. Same as [`Self::tick`].
    pub fn export_all(&mut self) -> EngineState {
        self.tick()
    }

    pub fn export_all_at(&mut self, now: DateTime<Utc>) -> EngineState {
        self.tick_at(now)
    }

    /// The up-to-date state as indented JSON.
    pub fn export_json_at(&mut self, now: DateTime<Utc>) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.export_all_at(now))
    }

    /// Adds or replaces the classification of `label`. Blank labels are
    /// ignored.
    pub fn define_activity_at(
        &mut self,
        label: &str,
        meta: ActivityMeta,
        now: DateTime<Utc>,
    ) -> EngineState {
        let (mut state, loaded) = self.load(now);
        state.rollover_if_needed(now, &self.config);
        // Accrue under the old rate before the new one applies.
        state.accrue_open_session(now.timestamp_millis(), &self.config);

        let label = label.trim();
        if label.is_empty() {
            tracing::warn!("ignoring activity definition with blank label");
        } else {
            tracing::info!(label, kind = %meta.kind, rate = meta.rate(), "activity defined");
            state.activity_meta.insert(label.to_string(), meta);
        }

        self.persist(&state, loaded);
        state
    }

    /// Removes the persisted state. The next load starts from defaults.
    pub fn reset_all(&mut self) {
        match self.store.remove(&self.key) {
            Ok(()) => tracing::info!(key = %self.key, "state reset"),
            Err(err) => tracing::warn!(key = %self.key, error = %err, "failed to remove state"),
        }
    }

    fn load(&self, now: DateTime<Utc>) -> (EngineState, Loaded) {
        let fresh = || EngineState::new(day_key(now));

        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(key = %self.key, "no stored state, starting fresh");
                return (fresh(), Loaded::Writable);
            }
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "failed to read state, using defaults");
                return (fresh(), Loaded::ReadFailed);
            }
        };

        match serde_json::from_str::<EngineState>(&raw) {
            Ok(mut state) => {
                state.seed_default_meta();
                (state, Loaded::Writable)
            }
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "stored state unreadable, using defaults");
                (fresh(), Loaded::Writable)
            }
        }
    }

    fn persist(&mut self, state: &EngineState, loaded: Loaded) {
        if loaded == Loaded::ReadFailed {
            tracing::warn!(key = %self.key, "skipping write after failed read");
            return;
        }
        let json = match serde_json::to_string(state) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize state");
                return;
            }
        };
        if let Err(err) = self.store.set(&self.key, &json) {
            tracing::warn!(key = %self.key, error = %err, "failed to persist state");
        } else {
            tracing::debug!(key = %self.key, bytes = json.len(), "state persisted");
        }
    }
}
