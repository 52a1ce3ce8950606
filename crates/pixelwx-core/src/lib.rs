//! Host-facing contract for the pixelwx display component: plugin trait,
//! configuration, error hierarchy, and the renderable frame types.

pub mod config;
pub mod error;
pub mod frame;
pub mod plugin;

pub use config::{
    DisplayModesSettings, Location, UnitsSystem, ValidationResult, WeatherSettings,
    MIN_UPDATE_INTERVAL_SECS,
};
pub use error::{ConfigError, FetchError, PluginError, ReqwestErrorExt};
pub use frame::{
    CardinalDirection, CurrentConditionsFrame, DailyForecastFrame, DailySlot,
    HourlyForecastFrame, HourlySlot, NoDataFrame, RenderableFrame, UvBand,
};
pub use plugin::{DisplayPlugin, PluginContext};

use anyhow::Result;

/// Initialize logging for the component.
///
/// Hosts embedding pixelwx into a larger application with their own
/// tracing subscriber should skip this.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("pixelwx core initialized");
    Ok(())
}
