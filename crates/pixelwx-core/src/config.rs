use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Minimum allowed update interval. Smaller configured values are floored
/// to this to protect the provider quota.
pub const MIN_UPDATE_INTERVAL_SECS: u64 = 300;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Units the provider is asked to report in.
///
/// Governs presentation only; a snapshot stores provider-native values
/// tagged with the units they were fetched under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitsSystem {
    #[default]
    Imperial,
    Metric,
}

impl UnitsSystem {
    /// Value of the provider's `units` query parameter.
    pub fn api_value(&self) -> &'static str {
        match self {
            UnitsSystem::Imperial => "imperial",
            UnitsSystem::Metric => "metric",
        }
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            UnitsSystem::Imperial => "°F",
            UnitsSystem::Metric => "°C",
        }
    }

    pub fn wind_speed_suffix(&self) -> &'static str {
        match self {
            UnitsSystem::Imperial => "mph",
            UnitsSystem::Metric => "m/s",
        }
    }
}

/// The single place this instance tracks weather for.
///
/// Immutable after configuration load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "US".to_string()
}

impl Location {
    /// Comma-joined form used as the geocoding query, e.g. `Dallas,Texas,US`.
    pub fn query(&self) -> String {
        match &self.state {
            Some(state) if !state.trim().is_empty() => {
                format!("{},{},{}", self.city, state, self.country)
            }
            _ => format!("{},{}", self.city, self.country),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.city, self.country)
    }
}

impl Default for Location {
    fn default() -> Self {
        Self {
            city: "Dallas".to_string(),
            state: Some("Texas".to_string()),
            country: default_country(),
        }
    }
}

/// Which display modes are enabled, in rotation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayModesSettings {
    #[serde(default = "default_true")]
    pub weather: bool,
    #[serde(default = "default_true")]
    pub hourly_forecast: bool,
    #[serde(default = "default_true")]
    pub daily_forecast: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DisplayModesSettings {
    fn default() -> Self {
        Self {
            weather: true,
            hourly_forecast: true,
            daily_forecast: true,
        }
    }
}

impl DisplayModesSettings {
    pub fn any_enabled(&self) -> bool {
        self.weather || self.hourly_forecast || self.daily_forecast
    }
}

/// Weather plugin settings, loaded once at startup and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSettings {
    /// OpenWeatherMap API key
    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub location: Location,

    #[serde(default)]
    pub units: UnitsSystem,

    /// Seconds between provider calls (floored to `MIN_UPDATE_INTERVAL_SECS`)
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: u64,

    #[serde(default)]
    pub display_modes: DisplayModesSettings,

    /// Seconds each display mode stays active before rotating
    #[serde(default = "default_display_duration")]
    pub display_duration_secs: u64,

    /// Ceiling on provider calls per local calendar day
    #[serde(default = "default_daily_call_limit")]
    pub daily_call_limit: u32,

    /// Restart the rotation at the first enabled mode whenever the host
    /// re-activates the plugin
    #[serde(default = "default_true")]
    pub reset_rotation_on_activate: bool,
}

fn default_update_interval() -> u64 {
    1800
}

fn default_display_duration() -> u64 {
    30
}

fn default_daily_call_limit() -> u32 {
    800
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            location: Location::default(),
            units: UnitsSystem::default(),
            update_interval_secs: default_update_interval(),
            display_modes: DisplayModesSettings::default(),
            display_duration_secs: default_display_duration(),
            daily_call_limit: default_daily_call_limit(),
            reset_rotation_on_activate: true,
        }
    }
}

impl WeatherSettings {
    /// Parse settings from a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load settings from a TOML file at the given path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.as_ref().display()))?;
        Ok(Self::from_toml_str(&contents)?)
    }

    /// Load settings and validate them.
    ///
    /// Returns the settings along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<(Self, ValidationResult)> {
        let settings = Self::load_from_path(path)?;
        let validation = settings.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((settings, validation))
    }

    /// Check the API key is present and not the distribution placeholder.
    pub fn api_key_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.api_key.starts_with("YOUR_")
    }

    /// Update interval with the quota-protecting floor applied.
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs.max(MIN_UPDATE_INTERVAL_SECS))
    }

    /// Dwell duration per display mode; never zero.
    pub fn display_duration(&self) -> Duration {
        Duration::from_secs(self.display_duration_secs.max(1))
    }

    /// Validate the settings.
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if !self.api_key_configured() {
            result.add_error("api_key", "missing or placeholder OpenWeatherMap API key");
        }

        if self.location.city.trim().is_empty() {
            result.add_error("location.city", "city must not be empty");
        }

        if !self.display_modes.any_enabled() {
            result.add_error(
                "display_modes",
                "at least one display mode must be enabled",
            );
        }

        if self.update_interval_secs < MIN_UPDATE_INTERVAL_SECS {
            result.add_warning(
                "update_interval_secs",
                format!(
                    "below the {}s floor; the floor will be used",
                    MIN_UPDATE_INTERVAL_SECS
                ),
            );
        }

        if self.display_duration_secs == 0 {
            result.add_warning("display_duration_secs", "zero dwell; using 1s");
        }

        if self.daily_call_limit == 0 {
            result.add_warning("daily_call_limit", "daily call limit of 0 disables updates");
        }

        result
    }

    /// First fatal configuration error, if any.
    ///
    /// The plugin refuses to activate on any of these.
    pub fn ensure_valid(&self) -> Result<(), ConfigError> {
        if !self.api_key_configured() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.location.city.trim().is_empty() {
            return Err(ConfigError::InvalidLocation(
                "city must not be empty".to_string(),
            ));
        }
        if !self.display_modes.any_enabled() {
            return Err(ConfigError::NoModesEnabled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> WeatherSettings {
        WeatherSettings {
            api_key: "abc123".to_string(),
            ..WeatherSettings::default()
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = WeatherSettings::default();
        assert_eq!(settings.update_interval_secs, 1800);
        assert_eq!(settings.display_duration_secs, 30);
        assert_eq!(settings.daily_call_limit, 800);
        assert!(settings.reset_rotation_on_activate);
        assert_eq!(settings.units, UnitsSystem::Imperial);
    }

    #[test]
    fn test_placeholder_api_key_is_fatal() {
        let settings = WeatherSettings {
            api_key: "YOUR_OPENWEATHERMAP_API_KEY".to_string(),
            ..WeatherSettings::default()
        };
        assert!(!settings.api_key_configured());
        assert!(matches!(
            settings.ensure_valid(),
            Err(ConfigError::MissingApiKey)
        ));
        assert!(!settings.validate().is_valid());
    }

    #[test]
    fn test_zero_modes_is_fatal() {
        let settings = WeatherSettings {
            display_modes: DisplayModesSettings {
                weather: false,
                hourly_forecast: false,
                daily_forecast: false,
            },
            ..configured()
        };
        assert!(matches!(
            settings.ensure_valid(),
            Err(ConfigError::NoModesEnabled)
        ));
    }

    #[test]
    fn test_empty_city_is_fatal() {
        let settings = WeatherSettings {
            location: Location {
                city: "  ".to_string(),
                state: None,
                country: "US".to_string(),
            },
            ..configured()
        };
        assert!(matches!(
            settings.ensure_valid(),
            Err(ConfigError::InvalidLocation(_))
        ));
    }

    #[test]
    fn test_update_interval_floor() {
        let settings = WeatherSettings {
            update_interval_secs: 60,
            ..configured()
        };
        assert_eq!(settings.update_interval(), Duration::from_secs(300));
        let validation = settings.validate();
        assert!(validation.is_valid());
        assert_eq!(validation.warnings.len(), 1);
    }

    #[test]
    fn test_location_query_with_and_without_state() {
        let loc = Location {
            city: "Dallas".to_string(),
            state: Some("Texas".to_string()),
            country: "US".to_string(),
        };
        assert_eq!(loc.query(), "Dallas,Texas,US");

        let loc = Location {
            city: "Berlin".to_string(),
            state: None,
            country: "DE".to_string(),
        };
        assert_eq!(loc.query(), "Berlin,DE");
    }

    #[test]
    fn test_toml_roundtrip() {
        let toml_str = r#"
            api_key = "abc123"
            units = "metric"
            update_interval_secs = 900

            [location]
            city = "Portland"
            state = "Maine"
            country = "US"

            [display_modes]
            weather = true
            hourly_forecast = false
            daily_forecast = true
        "#;

        let settings = WeatherSettings::from_toml_str(toml_str).unwrap();
        assert_eq!(settings.api_key, "abc123");
        assert_eq!(settings.units, UnitsSystem::Metric);
        assert_eq!(settings.update_interval_secs, 900);
        assert_eq!(settings.location.city, "Portland");
        assert!(!settings.display_modes.hourly_forecast);
        // Unspecified fields fall back to defaults
        assert_eq!(settings.display_duration_secs, 30);
        assert_eq!(settings.daily_call_limit, 800);
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = WeatherSettings::from_toml_str("api_key = [broken").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
