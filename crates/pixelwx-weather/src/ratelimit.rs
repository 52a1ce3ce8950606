//! Call gating for the provider: minimum interval, failure backoff, and a
//! daily ceiling keyed to the local calendar date.

use chrono::{DateTime, Local, NaiveDate};
use std::time::Duration;

/// Backoff multiplier cap.
const MAX_BACKOFF_MULTIPLIER: u32 = 8;

/// How one call attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    Failure,
}

/// Mutable rate bookkeeping, owned by the scheduler for the process
/// lifetime.
#[derive(Debug, Clone)]
pub struct RateState {
    last_call: Option<DateTime<Local>>,
    calls_today: u32,
    counter_date: Option<NaiveDate>,
    backoff_multiplier: u32,
}

impl RateState {
    pub fn new() -> Self {
        Self {
            last_call: None,
            calls_today: 0,
            counter_date: None,
            backoff_multiplier: 1,
        }
    }

    /// Calls recorded on the given local date.
    pub fn calls_on(&self, date: NaiveDate) -> u32 {
        if self.counter_date == Some(date) {
            self.calls_today
        } else {
            0
        }
    }

    pub fn backoff_multiplier(&self) -> u32 {
        self.backoff_multiplier
    }

    pub fn last_call(&self) -> Option<DateTime<Local>> {
        self.last_call
    }
}

impl Default for RateState {
    fn default() -> Self {
        Self::new()
    }
}

/// Policy side: decides whether a new provider call is currently permitted.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: Duration,
    daily_limit: u32,
}

impl RateLimiter {
    /// `interval` must already carry the configured floor
    /// (`WeatherSettings::update_interval`).
    pub fn new(interval: Duration, daily_limit: u32) -> Self {
        Self {
            interval,
            daily_limit,
        }
    }

    /// Wait required after the last call: the base interval scaled by the
    /// current backoff multiplier.
    pub fn current_wait(&self, state: &RateState) -> Duration {
        self.interval * state.backoff_multiplier
    }

    /// Whether a new call is permitted at `now`.
    pub fn may_call_now(&self, state: &RateState, now: DateTime<Local>) -> bool {
        if state.calls_on(now.date_naive()) >= self.daily_limit {
            return false;
        }

        match state.last_call {
            None => true,
            Some(last) => {
                let wait = chrono::Duration::from_std(self.current_wait(state))
                    .unwrap_or(chrono::Duration::MAX);
                now.signed_duration_since(last) >= wait
            }
        }
    }

    /// Record one completed attempt. Counts against the daily budget
    /// regardless of outcome; failure doubles the backoff multiplier
    /// (capped), success resets it.
    pub fn record_call(&self, state: &mut RateState, now: DateTime<Local>, outcome: CallOutcome) {
        let today = now.date_naive();
        if state.counter_date != Some(today) {
            state.counter_date = Some(today);
            state.calls_today = 0;
        }
        state.calls_today += 1;
        state.last_call = Some(now);

        match outcome {
            CallOutcome::Success => state.backoff_multiplier = 1,
            CallOutcome::Failure => {
                state.backoff_multiplier =
                    (state.backoff_multiplier * 2).min(MAX_BACKOFF_MULTIPLIER);
                tracing::debug!(
                    multiplier = state.backoff_multiplier,
                    "extended backoff after failed call"
                );
            }
        }

        if state.calls_today >= self.daily_limit {
            tracing::warn!(
                calls = state.calls_today,
                limit = self.daily_limit,
                "daily provider call ceiling reached; holding until the date rolls over"
            );
        }
    }
}
