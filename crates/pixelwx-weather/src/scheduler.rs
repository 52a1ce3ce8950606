//! Tick-driven refresh state machine.
//!
//! The host's timer is the only clock: each `tick` either starts a fetch,
//! polls an in-flight one, or waits out a cooldown. The fetch itself runs
//! on the runtime handle and reports back through a oneshot channel, so a
//! tick never blocks on the network. At most one fetch is in flight.

use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use pixelwx_core::{FetchError, Location, UnitsSystem};

use crate::cache::WeatherCache;
use crate::provider::WeatherFetch;
use crate::ratelimit::{CallOutcome, RateLimiter, RateState};
use crate::types::WeatherSnapshot;

/// Minimum spacing between error-level log lines during an outage.
const ERROR_LOG_THROTTLE: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Idle,
    Fetching,
    CooldownAfterSuccess,
    CooldownAfterFailure,
}

#[derive(Debug)]
pub struct UpdateScheduler<F: WeatherFetch> {
    fetcher: Arc<F>,
    location: Location,
    units: UnitsSystem,
    limiter: RateLimiter,
    rate: RateState,
    phase: FetchPhase,
    runtime: Handle,
    pending: Option<oneshot::Receiver<Result<WeatherSnapshot, FetchError>>>,
    last_error_log: Option<DateTime<Local>>,
}

impl<F: WeatherFetch> UpdateScheduler<F> {
    pub fn new(
        fetcher: Arc<F>,
        location: Location,
        units: UnitsSystem,
        limiter: RateLimiter,
        runtime: Handle,
    ) -> Self {
        Self {
            fetcher,
            location,
            units,
            limiter,
            rate: RateState::new(),
            phase: FetchPhase::Idle,
            runtime,
            pending: None,
            last_error_log: None,
        }
    }

    pub fn phase(&self) -> FetchPhase {
        self.phase
    }

    pub fn rate_state(&self) -> &RateState {
        &self.rate
    }

    /// Advance the state machine by one host tick.
    pub fn tick(&mut self, cache: &WeatherCache, now: DateTime<Local>) {
        match self.phase {
            FetchPhase::Idle => {
                if self.limiter.may_call_now(&self.rate, now) {
                    self.start_fetch();
                }
            }
            FetchPhase::Fetching => self.poll_pending(cache, now),
            FetchPhase::CooldownAfterSuccess | FetchPhase::CooldownAfterFailure => {
                if self.limiter.may_call_now(&self.rate, now) {
                    self.phase = FetchPhase::Idle;
                }
            }
        }
    }

    fn start_fetch(&mut self) {
        let (tx, rx) = oneshot::channel();
        let fetcher = Arc::clone(&self.fetcher);
        let location = self.location.clone();
        let units = self.units;

        self.runtime.spawn(async move {
            let result = fetcher.fetch(&location, units).await;
            // Receiver may be gone if the plugin deactivated mid-fetch
            let _ = tx.send(result);
        });

        self.pending = Some(rx);
        self.phase = FetchPhase::Fetching;
        tracing::debug!(location = %self.location, "weather fetch started");
    }

    fn poll_pending(&mut self, cache: &WeatherCache, now: DateTime<Local>) {
        let Some(rx) = self.pending.as_mut() else {
            // Invariant violation; recover rather than wedge
            self.phase = FetchPhase::Idle;
            return;
        };

        match rx.try_recv() {
            Err(oneshot::error::TryRecvError::Empty) => {
                // Still in flight; a fresh trigger here is a no-op
            }
            Ok(Ok(snapshot)) => {
                tracing::info!(
                    temperature = snapshot.temperature,
                    condition = snapshot.condition_text.as_str(),
                    "weather updated for {}",
                    self.location
                );
                cache.commit_success(snapshot, now);
                self.limiter.record_call(&mut self.rate, now, CallOutcome::Success);
                self.pending = None;
                self.phase = FetchPhase::CooldownAfterSuccess;
            }
            Ok(Err(error)) => self.complete_failure(cache, now, error),
            Err(oneshot::error::TryRecvError::Closed) => self.complete_failure(
                cache,
                now,
                FetchError::Network("fetch task dropped".to_string()),
            ),
        }
    }

    fn complete_failure(&mut self, cache: &WeatherCache, now: DateTime<Local>, error: FetchError) {
        cache.commit_failure(error.clone(), now);
        self.limiter.record_call(&mut self.rate, now, CallOutcome::Failure);
        self.pending = None;
        self.phase = FetchPhase::CooldownAfterFailure;

        let should_log = self.last_error_log.map_or(true, |last| {
            now.signed_duration_since(last).to_std().unwrap_or_default() >= ERROR_LOG_THROTTLE
        });
        if should_log {
            tracing::error!(
                error = %error,
                failures = cache.read().consecutive_failures,
                backoff = self.rate.backoff_multiplier(),
                "weather update failed; retrying on extended interval"
            );
            self.last_error_log = Some(now);
        } else {
            tracing::debug!(error = %error, "weather update failed (log throttled)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    fn at(hour: u32, min: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 6, 14, hour, min, 0).unwrap()
    }

    fn sample_snapshot(temperature: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            units: UnitsSystem::Imperial,
            temperature,
            feels_like: temperature,
            high: temperature,
            low: temperature,
            condition: crate::types::WeatherCondition::Clear,
            condition_text: "Clear".to_string(),
            icon: "01d".to_string(),
            humidity: 40,
            pressure: 1015,
            wind_speed: 5.0,
            wind_deg: 0.0,
            uv_index: 1.0,
            hourly: Vec::new(),
            daily: Vec::new(),
            fetched_at: at(9, 0),
        }
    }

    /// Fetcher that replays a script of results.
    struct ScriptedFetch {
        script: Mutex<VecDeque<Result<WeatherSnapshot, FetchError>>>,
    }

    impl ScriptedFetch {
        fn new(script: Vec<Result<WeatherSnapshot, FetchError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
            })
        }
    }

    impl WeatherFetch for ScriptedFetch {
        async fn fetch(
            &self,
            _location: &Location,
            _units: UnitsSystem,
        ) -> Result<WeatherSnapshot, FetchError> {
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Network("script exhausted".to_string())))
        }
    }

    fn scheduler_with(
        script: Vec<Result<WeatherSnapshot, FetchError>>,
        interval_secs: u64,
        daily_limit: u32,
    ) -> UpdateScheduler<ScriptedFetch> {
        UpdateScheduler::new(
            ScriptedFetch::new(script),
            Location::default(),
            UnitsSystem::Imperial,
            RateLimiter::new(Duration::from_secs(interval_secs), daily_limit),
            Handle::current(),
        )
    }

    /// Let the spawned fetch task run to completion.
    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_success_path_commits_once() {
        let cache = WeatherCache::new();
        let mut scheduler = scheduler_with(vec![Ok(sample_snapshot(70.0))], 300, 100);

        scheduler.tick(&cache, at(9, 0));
        assert_eq!(scheduler.phase(), FetchPhase::Fetching);
        settle().await;

        scheduler.tick(&cache, at(9, 0));
        assert_eq!(scheduler.phase(), FetchPhase::CooldownAfterSuccess);
        let entry = cache.read();
        assert_eq!(entry.snapshot.as_ref().unwrap().temperature, 70.0);
        assert_eq!(entry.last_fetch, Some(at(9, 0)));
        assert_eq!(scheduler.rate_state().calls_on(at(9, 0).date_naive()), 1);
    }

    #[tokio::test]
    async fn test_cooldown_returns_to_idle_after_interval() {
        let cache = WeatherCache::new();
        let mut scheduler = scheduler_with(vec![Ok(sample_snapshot(70.0))], 300, 100);

        scheduler.tick(&cache, at(9, 0));
        settle().await;
        scheduler.tick(&cache, at(9, 0));

        // Interval not yet elapsed: still cooling down
        scheduler.tick(&cache, at(9, 2));
        assert_eq!(scheduler.phase(), FetchPhase::CooldownAfterSuccess);

        scheduler.tick(&cache, at(9, 5));
        assert_eq!(scheduler.phase(), FetchPhase::Idle);
    }

    #[tokio::test]
    async fn test_no_fetch_while_limiter_denies() {
        let cache = WeatherCache::new();
        let mut scheduler = scheduler_with(vec![], 300, 0);

        scheduler.tick(&cache, at(9, 0));
        assert_eq!(scheduler.phase(), FetchPhase::Idle);
        assert!(!cache.read().has_data());
    }

    #[tokio::test]
    async fn test_failure_path_records_backoff_and_keeps_snapshot() {
        let cache = WeatherCache::new();
        let mut scheduler = scheduler_with(
            vec![
                Ok(sample_snapshot(70.0)),
                Err(FetchError::Network("down".to_string())),
            ],
            300,
            100,
        );

        scheduler.tick(&cache, at(9, 0));
        settle().await;
        scheduler.tick(&cache, at(9, 0));
        scheduler.tick(&cache, at(9, 5));

        scheduler.tick(&cache, at(9, 5));
        settle().await;
        scheduler.tick(&cache, at(9, 5));
        assert_eq!(scheduler.phase(), FetchPhase::CooldownAfterFailure);

        let entry = cache.read();
        assert_eq!(entry.snapshot.as_ref().unwrap().temperature, 70.0);
        assert_eq!(entry.consecutive_failures, 1);
        assert_eq!(scheduler.rate_state().backoff_multiplier(), 2);
    }

    #[tokio::test]
    async fn test_second_trigger_while_fetching_is_noop() {
        // A fetch that never completes keeps the scheduler in Fetching
        struct StalledFetch;
        impl WeatherFetch for StalledFetch {
            async fn fetch(
                &self,
                _location: &Location,
                _units: UnitsSystem,
            ) -> Result<WeatherSnapshot, FetchError> {
                std::future::pending().await
            }
        }

        let cache = WeatherCache::new();
        let mut scheduler = UpdateScheduler::new(
            Arc::new(StalledFetch),
            Location::default(),
            UnitsSystem::Imperial,
            RateLimiter::new(Duration::from_secs(300), 100),
            Handle::current(),
        );

        scheduler.tick(&cache, at(9, 0));
        assert_eq!(scheduler.phase(), FetchPhase::Fetching);

        // Further ticks neither start a second fetch nor record a call
        scheduler.tick(&cache, at(9, 30));
        scheduler.tick(&cache, at(10, 0));
        assert_eq!(scheduler.phase(), FetchPhase::Fetching);
        assert_eq!(scheduler.rate_state().calls_on(at(9, 0).date_naive()), 0);
    }
}
