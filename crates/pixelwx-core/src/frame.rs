//! Render output contract: the data-only frames the component hands to the
//! host each tick. Pixels, fonts, and icon bitmaps are entirely the host's
//! responsibility.

use serde::Serialize;

use crate::config::UnitsSystem;

/// One renderable frame, tagged with the display mode that produced it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RenderableFrame {
    /// Current conditions
    Weather(CurrentConditionsFrame),
    /// Upcoming hours
    HourlyForecast(HourlyForecastFrame),
    /// Upcoming days
    DailyForecast(DailyForecastFrame),
    /// Nothing fetched successfully yet
    NoData(NoDataFrame),
}

impl RenderableFrame {
    pub fn is_no_data(&self) -> bool {
        matches!(self, RenderableFrame::NoData(_))
    }
}

/// Current-conditions projection.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentConditionsFrame {
    pub temperature: f64,
    pub feels_like: f64,
    /// Today's high
    pub high: f64,
    /// Today's low
    pub low: f64,
    /// Condition label, e.g. "Clouds"
    pub condition: String,
    /// Provider icon identifier, e.g. "04d"
    pub icon: String,
    /// Relative humidity, percent
    pub humidity: u8,
    pub wind_speed: f64,
    pub wind_direction: CardinalDirection,
    pub uv_index: f64,
    pub uv_band: UvBand,
    pub units: UnitsSystem,
    /// Seconds since the snapshot was fetched
    pub staleness_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HourlySlot {
    /// Compressed hour label, e.g. "2p"
    pub label: String,
    pub temperature: f64,
    pub condition: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HourlyForecastFrame {
    pub slots: Vec<HourlySlot>,
    pub units: UnitsSystem,
    pub staleness_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailySlot {
    /// Weekday label, e.g. "Mon"
    pub day: String,
    /// Short date, e.g. "6/14"
    pub date: String,
    pub high: f64,
    pub low: f64,
    pub condition: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyForecastFrame {
    pub slots: Vec<DailySlot>,
    pub units: UnitsSystem,
    pub staleness_secs: u64,
}

/// Placeholder frame shown until the first successful fetch.
#[derive(Debug, Clone, Serialize)]
pub struct NoDataFrame {
    pub message: String,
    /// Last fetch error, if one has occurred
    pub last_error: Option<String>,
}

impl Default for NoDataFrame {
    fn default() -> Self {
        Self {
            message: "No Weather Data".to_string(),
            last_error: None,
        }
    }
}

/// Eight-point compass direction for wind display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CardinalDirection {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl CardinalDirection {
    /// Nearest eight-point direction for a wind bearing in degrees.
    pub fn from_degrees(degrees: f64) -> Self {
        const DIRECTIONS: [CardinalDirection; 8] = [
            CardinalDirection::N,
            CardinalDirection::NE,
            CardinalDirection::E,
            CardinalDirection::SE,
            CardinalDirection::S,
            CardinalDirection::SW,
            CardinalDirection::W,
            CardinalDirection::NW,
        ];
        let index = (degrees.rem_euclid(360.0) / 45.0).round() as usize % 8;
        DIRECTIONS[index]
    }

    pub fn label(&self) -> &'static str {
        match self {
            CardinalDirection::N => "N",
            CardinalDirection::NE => "NE",
            CardinalDirection::E => "E",
            CardinalDirection::SE => "SE",
            CardinalDirection::S => "S",
            CardinalDirection::SW => "SW",
            CardinalDirection::W => "W",
            CardinalDirection::NW => "NW",
        }
    }
}

/// UV index severity band, so the host can pick a warning color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UvBand {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl UvBand {
    pub fn from_index(uv_index: f64) -> Self {
        if uv_index <= 2.0 {
            UvBand::Low
        } else if uv_index <= 5.0 {
            UvBand::Moderate
        } else if uv_index <= 7.0 {
            UvBand::High
        } else if uv_index <= 10.0 {
            UvBand::VeryHigh
        } else {
            UvBand::Extreme
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinal_from_degrees() {
        assert_eq!(CardinalDirection::from_degrees(0.0), CardinalDirection::N);
        assert_eq!(CardinalDirection::from_degrees(45.0), CardinalDirection::NE);
        assert_eq!(CardinalDirection::from_degrees(90.0), CardinalDirection::E);
        assert_eq!(CardinalDirection::from_degrees(180.0), CardinalDirection::S);
        assert_eq!(CardinalDirection::from_degrees(270.0), CardinalDirection::W);
        // Rounds to the nearest of the eight points
        assert_eq!(CardinalDirection::from_degrees(22.0), CardinalDirection::N);
        assert_eq!(CardinalDirection::from_degrees(23.0), CardinalDirection::NE);
        // Wraps back to north
        assert_eq!(CardinalDirection::from_degrees(350.0), CardinalDirection::N);
        assert_eq!(CardinalDirection::from_degrees(-10.0), CardinalDirection::N);
    }

    #[test]
    fn test_uv_bands() {
        assert_eq!(UvBand::from_index(0.0), UvBand::Low);
        assert_eq!(UvBand::from_index(2.0), UvBand::Low);
        assert_eq!(UvBand::from_index(3.0), UvBand::Moderate);
        assert_eq!(UvBand::from_index(5.0), UvBand::Moderate);
        assert_eq!(UvBand::from_index(6.5), UvBand::High);
        assert_eq!(UvBand::from_index(9.0), UvBand::VeryHigh);
        assert_eq!(UvBand::from_index(11.0), UvBand::Extreme);
    }

    #[test]
    fn test_frame_serializes_with_mode_tag() {
        let frame = RenderableFrame::NoData(NoDataFrame::default());
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["mode"], "no_data");
        assert_eq!(json["message"], "No Weather Data");
    }
}
