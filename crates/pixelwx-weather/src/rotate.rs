//! Display mode rotation and per-mode view projection.
//!
//! Owns all rotation state: the host just calls `advance` and
//! `current_view` each tick and renders whatever comes back.

use chrono::{DateTime, Local, Timelike};
use std::time::Duration;

use pixelwx_core::{
    CardinalDirection, ConfigError, CurrentConditionsFrame, DailyForecastFrame, DailySlot,
    DisplayModesSettings, HourlyForecastFrame, HourlySlot, NoDataFrame, RenderableFrame, UvBand,
};

use crate::cache::CacheEntry;
use crate::types::WeatherSnapshot;

/// Hourly points shown per frame.
pub const HOURLY_SLOTS: usize = 4;
/// Days shown per frame, starting tomorrow.
pub const DAILY_SLOTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Weather,
    HourlyForecast,
    DailyForecast,
}

impl DisplayMode {
    pub fn name(&self) -> &'static str {
        match self {
            DisplayMode::Weather => "weather",
            DisplayMode::HourlyForecast => "hourly_forecast",
            DisplayMode::DailyForecast => "daily_forecast",
        }
    }
}

/// Which mode is active and for how long it has dwelled there.
#[derive(Debug, Clone)]
pub struct RotationState {
    index: usize,
    dwelled: Duration,
}

impl RotationState {
    pub fn new() -> Self {
        Self {
            index: 0,
            dwelled: Duration::ZERO,
        }
    }

    /// Back to the first enabled mode.
    pub fn reset(&mut self) {
        self.index = 0;
        self.dwelled = Duration::ZERO;
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct DisplayModeRotator {
    modes: Vec<DisplayMode>,
    dwell: Duration,
}

impl DisplayModeRotator {
    /// Build the enabled-mode sequence from configuration, preserving the
    /// canonical order current -> hourly -> daily.
    pub fn from_settings(
        modes: &DisplayModesSettings,
        dwell: Duration,
    ) -> Result<Self, ConfigError> {
        let mut enabled = Vec::new();
        if modes.weather {
            enabled.push(DisplayMode::Weather);
        }
        if modes.hourly_forecast {
            enabled.push(DisplayMode::HourlyForecast);
        }
        if modes.daily_forecast {
            enabled.push(DisplayMode::DailyForecast);
        }
        if enabled.is_empty() {
            return Err(ConfigError::NoModesEnabled);
        }

        Ok(Self {
            modes: enabled,
            dwell,
        })
    }

    pub fn modes(&self) -> &[DisplayMode] {
        &self.modes
    }

    pub fn active_mode(&self, state: &RotationState) -> DisplayMode {
        self.modes[state.index % self.modes.len()]
    }

    /// Accumulate dwell time; step to the next enabled mode (wrapping)
    /// once the configured duration is reached.
    pub fn advance(&self, state: &mut RotationState, elapsed: Duration) {
        state.dwelled += elapsed;
        if state.dwelled >= self.dwell {
            state.index = (state.index + 1) % self.modes.len();
            state.dwelled = Duration::ZERO;
            tracing::debug!(mode = self.active_mode(state).name(), "display mode switched");
        }
    }

    /// Project the cached snapshot into the active mode's frame.
    ///
    /// Never fails: with no snapshot this is the "no data yet" frame, and
    /// a mode whose slice of the snapshot is empty falls back to current
    /// conditions.
    pub fn current_view(
        &self,
        entry: &CacheEntry,
        state: &RotationState,
        now: DateTime<Local>,
    ) -> RenderableFrame {
        let Some(snapshot) = entry.snapshot.as_deref() else {
            return no_data_frame(entry);
        };
        let staleness_secs = entry.staleness(now).unwrap_or_default().as_secs();

        match self.active_mode(state) {
            DisplayMode::Weather => current_frame(snapshot, staleness_secs),
            DisplayMode::HourlyForecast => {
                if snapshot.hourly.is_empty() {
                    tracing::warn!("no hourly data in snapshot; showing current conditions");
                    current_frame(snapshot, staleness_secs)
                } else {
                    hourly_frame(snapshot, staleness_secs)
                }
            }
            DisplayMode::DailyForecast => {
                // Days start at tomorrow, so one entry (today) is not enough
                if snapshot.daily.len() <= 1 {
                    tracing::warn!("no daily data in snapshot; showing current conditions");
                    current_frame(snapshot, staleness_secs)
                } else {
                    daily_frame(snapshot, staleness_secs)
                }
            }
        }
    }
}

fn no_data_frame(entry: &CacheEntry) -> RenderableFrame {
    RenderableFrame::NoData(NoDataFrame {
        last_error: entry.last_error.as_ref().map(|e| e.to_string()),
        ..NoDataFrame::default()
    })
}

fn current_frame(snapshot: &WeatherSnapshot, staleness_secs: u64) -> RenderableFrame {
    RenderableFrame::Weather(CurrentConditionsFrame {
        temperature: snapshot.temperature,
        feels_like: snapshot.feels_like,
        high: snapshot.high,
        low: snapshot.low,
        condition: snapshot.condition_text.clone(),
        icon: snapshot.icon.clone(),
        humidity: snapshot.humidity,
        wind_speed: snapshot.wind_speed,
        wind_direction: CardinalDirection::from_degrees(snapshot.wind_deg),
        uv_index: snapshot.uv_index,
        uv_band: UvBand::from_index(snapshot.uv_index),
        units: snapshot.units,
        staleness_secs,
    })
}

fn hourly_frame(snapshot: &WeatherSnapshot, staleness_secs: u64) -> RenderableFrame {
    let slots = snapshot
        .hourly
        .iter()
        .take(HOURLY_SLOTS)
        .map(|point| HourlySlot {
            label: hour_label(&point.time),
            temperature: point.temperature,
            condition: point.condition_text.clone(),
            icon: point.icon.clone(),
        })
        .collect();

    RenderableFrame::HourlyForecast(HourlyForecastFrame {
        slots,
        units: snapshot.units,
        staleness_secs,
    })
}

fn daily_frame(snapshot: &WeatherSnapshot, staleness_secs: u64) -> RenderableFrame {
    let slots = snapshot
        .daily
        .iter()
        .skip(1) // today is covered by the current-conditions frame
        .take(DAILY_SLOTS)
        .map(|point| DailySlot {
            day: point.date.format("%a").to_string(),
            date: point.date.format("%-m/%-d").to_string(),
            high: point.high,
            low: point.low,
            condition: point.condition_text.clone(),
            icon: point.icon.clone(),
        })
        .collect();

    RenderableFrame::DailyForecast(DailyForecastFrame {
        slots,
        units: snapshot.units,
        staleness_secs,
    })
}

/// Compressed 12-hour label, e.g. "2p" or "11a".
fn hour_label(time: &DateTime<Local>) -> String {
    let (is_pm, hour) = time.hour12();
    format!("{}{}", hour, if is_pm { "p" } else { "a" })
}
