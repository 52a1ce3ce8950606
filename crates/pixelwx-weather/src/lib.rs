//! Weather display plugin for LED-matrix hosts.
//!
//! Periodically fetches OpenWeatherMap data for one configured location,
//! caches the latest good snapshot, and rotates a sequence of renderable
//! frames (current conditions, hourly forecast, daily forecast) past the
//! host. The host pushes ticks; this crate returns frames.

pub mod api;
pub mod cache;
pub mod provider;
pub mod ratelimit;
pub mod rotate;
pub mod scheduler;
pub mod types;

mod plugin;

pub use cache::{CacheEntry, WeatherCache};
pub use plugin::{WeatherPlugin, PLUGIN_ID};
pub use provider::{OpenWeatherClient, WeatherFetch};
pub use ratelimit::{CallOutcome, RateLimiter, RateState};
pub use rotate::{DisplayMode, DisplayModeRotator, RotationState};
pub use scheduler::{FetchPhase, UpdateScheduler};
pub use types::{
    DailyPoint, HourlyPoint, WeatherCondition, WeatherSnapshot, MAX_DAILY_POINTS,
    MAX_HOURLY_POINTS,
};
