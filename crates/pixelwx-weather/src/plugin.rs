//! The weather display plugin: wires provider, rate limiting, cache,
//! scheduler, and rotation behind the host's `DisplayPlugin` interface.

use anyhow::Result;
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Duration;

use pixelwx_core::{
    DisplayPlugin, PluginContext, PluginError, RenderableFrame, WeatherSettings,
};

use crate::cache::WeatherCache;
use crate::provider::OpenWeatherClient;
use crate::ratelimit::RateLimiter;
use crate::rotate::{DisplayModeRotator, RotationState};
use crate::scheduler::UpdateScheduler;

pub const PLUGIN_ID: &str = "weather";

#[derive(Debug)]
pub struct WeatherPlugin {
    settings: WeatherSettings,
    rotator: DisplayModeRotator,
    rotation: RotationState,
    cache: WeatherCache,
    /// Present only while the plugin is active
    scheduler: Option<UpdateScheduler<OpenWeatherClient>>,
}

impl WeatherPlugin {
    /// Build the plugin from validated settings.
    ///
    /// Fails on any fatal configuration error (missing credential, zero
    /// enabled modes, invalid location); the host must not activate a
    /// plugin it could not construct.
    pub fn new(settings: WeatherSettings) -> Result<Self, PluginError> {
        settings.ensure_valid()?;
        for warning in &settings.validate().warnings {
            tracing::warn!("Weather config warning: {}", warning);
        }

        let rotator =
            DisplayModeRotator::from_settings(&settings.display_modes, settings.display_duration())?;

        tracing::info!(
            location = %settings.location,
            units = settings.units.api_value(),
            interval_secs = settings.update_interval().as_secs(),
            "weather plugin configured"
        );

        Ok(Self {
            settings,
            rotator,
            rotation: RotationState::new(),
            cache: WeatherCache::new(),
            scheduler: None,
        })
    }

    pub fn is_active(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Status summary for an external observer (host status page, logs).
    pub fn info(&self, now: DateTime<Local>) -> serde_json::Value {
        let entry = self.cache.read();
        serde_json::json!({
            "id": PLUGIN_ID,
            "location": self.settings.location,
            "units": self.settings.units,
            "active": self.is_active(),
            "has_data": entry.has_data(),
            "staleness_secs": entry.staleness(now).map(|s| s.as_secs()),
            "consecutive_failures": entry.consecutive_failures,
            "last_error": entry.last_error.as_ref().map(|e| e.to_string()),
            "hourly_count": entry.snapshot.as_ref().map_or(0, |s| s.hourly.len()),
            "daily_count": entry.snapshot.as_ref().map_or(0, |s| s.daily.len()),
        })
    }
}

impl DisplayPlugin for WeatherPlugin {
    fn id(&self) -> &str {
        PLUGIN_ID
    }

    fn name(&self) -> &str {
        "Weather"
    }

    fn activate(&mut self, ctx: &PluginContext) -> Result<()> {
        let client = OpenWeatherClient::new(self.settings.api_key.clone())
            .map_err(PluginError::from)?;
        let limiter = RateLimiter::new(
            self.settings.update_interval(),
            self.settings.daily_call_limit,
        );

        self.scheduler = Some(UpdateScheduler::new(
            Arc::new(client),
            self.settings.location.clone(),
            self.settings.units,
            limiter,
            ctx.runtime.clone(),
        ));

        if self.settings.reset_rotation_on_activate {
            self.rotation.reset();
        }

        tracing::info!(location = %self.settings.location, "weather plugin activated");
        Ok(())
    }

    fn deactivate(&mut self) {
        // Dropping the scheduler drops the oneshot receiver; an in-flight
        // fetch finishes on the runtime and its result is discarded. The
        // cache keeps its snapshot for the next activation.
        self.scheduler = None;
        tracing::info!("weather plugin deactivated");
    }

    fn tick(&mut self, now: DateTime<Local>, elapsed: Duration) -> RenderableFrame {
        if let Some(scheduler) = self.scheduler.as_mut() {
            scheduler.tick(&self.cache, now);
        }
        self.rotator.advance(&mut self.rotation, elapsed);
        self.rotator.current_view(&self.cache.read(), &self.rotation, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pixelwx_core::ConfigError;

    fn settings() -> WeatherSettings {
        WeatherSettings {
            api_key: "test-key".to_string(),
            ..WeatherSettings::default()
        }
    }

    #[test]
    fn test_new_rejects_missing_api_key() {
        let err = WeatherPlugin::new(WeatherSettings::default()).unwrap_err();
        assert!(matches!(
            err,
            PluginError::Config(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_new_with_valid_settings() {
        let plugin = WeatherPlugin::new(settings()).unwrap();
        assert_eq!(plugin.id(), "weather");
        assert!(!plugin.is_active());
    }

    #[tokio::test]
    async fn test_activate_deactivate_lifecycle() {
        let mut plugin = WeatherPlugin::new(settings()).unwrap();
        let ctx = PluginContext::new(tokio::runtime::Handle::current());

        plugin.activate(&ctx).unwrap();
        assert!(plugin.is_active());

        plugin.deactivate();
        assert!(!plugin.is_active());
    }

    #[test]
    fn test_inactive_tick_still_returns_frame() {
        let mut plugin = WeatherPlugin::new(settings()).unwrap();
        let now = Local.with_ymd_and_hms(2026, 6, 14, 9, 0, 0).unwrap();

        let frame = plugin.tick(now, Duration::from_secs(1));
        assert!(frame.is_no_data());
    }

    #[test]
    fn test_info_reports_cache_state() {
        let plugin = WeatherPlugin::new(settings()).unwrap();
        let now = Local.with_ymd_and_hms(2026, 6, 14, 9, 0, 0).unwrap();

        let info = plugin.info(now);
        assert_eq!(info["id"], "weather");
        assert_eq!(info["active"], false);
        assert_eq!(info["has_data"], false);
        assert_eq!(info["consecutive_failures"], 0);
    }
}
