use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub use pixelwx_core::config::{Location, UnitsSystem};

/// Most hourly entries a snapshot keeps.
pub const MAX_HOURLY_POINTS: usize = 48;
/// Most daily entries a snapshot keeps.
pub const MAX_DAILY_POINTS: usize = 7;

/// Weather condition categories mapped from OpenWeatherMap condition ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Atmosphere,
    Drizzle,
    Rain,
    Sleet,
    Snow,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert an OpenWeatherMap condition id to a WeatherCondition
    /// See: https://openweathermap.org/weather-conditions
    pub fn from_owm_id(id: u32) -> Self {
        match id {
            200..=232 => Self::Thunderstorm,
            300..=321 => Self::Drizzle,
            500..=504 => Self::Rain,
            511 => Self::Sleet, // Freezing rain
            520..=531 => Self::Rain,
            600..=602 | 620..=622 => Self::Snow,
            611..=616 => Self::Sleet,
            701..=781 => Self::Atmosphere, // Mist, fog, haze, dust...
            800 => Self::Clear,
            801 | 802 => Self::PartlyCloudy,
            803 | 804 => Self::Cloudy,
            _ => Self::Clear, // Unknown ids default to clear
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Atmosphere => "Mist",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Sleet => "Sleet",
            Self::Snow => "Snow",
            Self::Thunderstorm => "Thunderstorm",
        }
    }

    /// Get a generic icon name for hosts without provider icon art
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Clear => "sun",
            Self::PartlyCloudy => "cloud_sun",
            Self::Cloudy => "cloud",
            Self::Atmosphere => "mist",
            Self::Drizzle => "cloud_rain",
            Self::Rain => "cloud_rain",
            Self::Sleet => "cloud_snow",
            Self::Snow => "cloud_snow",
            Self::Thunderstorm => "cloud_lightning",
        }
    }
}

/// Hourly forecast entry. Immutable once part of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub time: DateTime<Local>,
    pub temperature: f64,
    pub condition: WeatherCondition,
    /// Provider condition label, e.g. "Clouds"
    pub condition_text: String,
    /// Provider icon code, e.g. "04d"
    pub icon: String,
}

/// Daily forecast entry. Immutable once part of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: DateTime<Local>,
    pub high: f64,
    pub low: f64,
    pub condition: WeatherCondition,
    pub condition_text: String,
    pub icon: String,
}

/// One complete, internally consistent fetch result.
///
/// Produced atomically by one successful provider call; never partially
/// updated. Values are provider-native for the units the snapshot is
/// tagged with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub units: UnitsSystem,
    pub temperature: f64,
    pub feels_like: f64,
    /// Today's high
    pub high: f64,
    /// Today's low
    pub low: f64,
    pub condition: WeatherCondition,
    pub condition_text: String,
    pub icon: String,
    /// Relative humidity, percent
    pub humidity: u8,
    /// Surface pressure, hPa
    pub pressure: u32,
    pub wind_speed: f64,
    /// Wind bearing in degrees
    pub wind_deg: f64,
    pub uv_index: f64,
    /// Chronological, at most `MAX_HOURLY_POINTS` entries
    pub hourly: Vec<HourlyPoint>,
    /// Chronological, at most `MAX_DAILY_POINTS` entries; first entry is today
    pub daily: Vec<DailyPoint>,
    pub fetched_at: DateTime<Local>,
}
