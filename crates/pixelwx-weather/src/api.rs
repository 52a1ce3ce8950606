//! Serde mirror of the OpenWeatherMap payloads we consume: the geocoding
//! lookup and the One Call 3.0 forecast.

use chrono::{DateTime, Local, TimeZone};
use serde::Deserialize;

use pixelwx_core::FetchError;

use crate::types::{
    DailyPoint, HourlyPoint, UnitsSystem, WeatherCondition, WeatherSnapshot, MAX_DAILY_POINTS,
    MAX_HOURLY_POINTS,
};

/// One entry of the geocoding response array.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeEntry {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionData {
    pub id: u32,
    pub main: String,
    #[serde(default)]
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub struct CurrentData {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub pressure: u32,
    #[serde(default)]
    pub uvi: f64,
    pub wind_speed: f64,
    #[serde(default)]
    pub wind_deg: f64,
    pub weather: Vec<ConditionData>,
}

#[derive(Debug, Deserialize)]
pub struct HourData {
    pub dt: i64,
    pub temp: f64,
    pub weather: Vec<ConditionData>,
}

#[derive(Debug, Deserialize)]
pub struct DayTemp {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Deserialize)]
pub struct DayData {
    pub dt: i64,
    pub temp: DayTemp,
    pub weather: Vec<ConditionData>,
}

/// The subset of the One Call response we keep (`exclude=minutely,alerts`).
#[derive(Debug, Deserialize)]
pub struct OneCallResponse {
    pub current: CurrentData,
    #[serde(default)]
    pub hourly: Vec<HourData>,
    #[serde(default)]
    pub daily: Vec<DayData>,
}

fn first_condition(weather: &[ConditionData]) -> Result<&ConditionData, FetchError> {
    weather
        .first()
        .ok_or_else(|| FetchError::MalformedResponse("empty weather array".to_string()))
}

fn local_timestamp(dt: i64) -> Result<DateTime<Local>, FetchError> {
    Local
        .timestamp_opt(dt, 0)
        .single()
        .ok_or_else(|| FetchError::MalformedResponse(format!("invalid timestamp {}", dt)))
}

impl OneCallResponse {
    /// Build one atomic snapshot from the response.
    ///
    /// Hourly/daily sequences arrive chronological from the provider and
    /// are truncated to the snapshot bounds. Today's high/low comes from
    /// `daily[0]`; if the provider sent no daily data, the current
    /// temperature stands in.
    pub fn into_snapshot(
        self,
        units: UnitsSystem,
        fetched_at: DateTime<Local>,
    ) -> Result<WeatherSnapshot, FetchError> {
        let current_condition = first_condition(&self.current.weather)?.clone();

        let (high, low) = match self.daily.first() {
            Some(today) => (today.temp.max, today.temp.min),
            None => (self.current.temp, self.current.temp),
        };

        let mut hourly = Vec::with_capacity(self.hourly.len().min(MAX_HOURLY_POINTS));
        for hour in self.hourly.into_iter().take(MAX_HOURLY_POINTS) {
            let condition = first_condition(&hour.weather)?;
            hourly.push(HourlyPoint {
                time: local_timestamp(hour.dt)?,
                temperature: hour.temp,
                condition: WeatherCondition::from_owm_id(condition.id),
                condition_text: condition.main.clone(),
                icon: condition.icon.clone(),
            });
        }

        let mut daily = Vec::with_capacity(self.daily.len().min(MAX_DAILY_POINTS));
        for day in self.daily.into_iter().take(MAX_DAILY_POINTS) {
            let condition = first_condition(&day.weather)?;
            daily.push(DailyPoint {
                date: local_timestamp(day.dt)?,
                high: day.temp.max,
                low: day.temp.min,
                condition: WeatherCondition::from_owm_id(condition.id),
                condition_text: condition.main.clone(),
                icon: condition.icon.clone(),
            });
        }

        Ok(WeatherSnapshot {
            units,
            temperature: self.current.temp,
            feels_like: self.current.feels_like,
            high,
            low,
            condition: WeatherCondition::from_owm_id(current_condition.id),
            condition_text: current_condition.main,
            icon: current_condition.icon,
            humidity: self.current.humidity,
            pressure: self.current.pressure,
            wind_speed: self.current.wind_speed,
            wind_deg: self.current.wind_deg,
            uv_index: self.current.uvi,
            hourly,
            daily,
            fetched_at,
        })
    }
}
