use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::overlay::OverlaySource;

/// Forecast returned by the weather service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Weather {
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastDay>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CurrentConditions {
    pub temp: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    /// Degrees clockwise from north the wind blows towards.
    pub wind_direction: f64,
    pub weather_icon: i32,
    pub weather_desc: String,
    pub sunrise: Option<DateTime<FixedOffset>>,
    pub sunset: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ForecastDay {
    pub day: Option<DateTime<FixedOffset>>,
    pub name: String,
    pub weather_icon: i32,
    pub weather_desc: String,
    pub temp_min: f64,
    pub temp_max: f64,
}

pub struct WeatherSource;

impl OverlaySource for WeatherSource {
    type Snapshot = Weather;
    const PATH: &'static str = "/weather/forecast";
    const SNAPSHOT_FILE: &'static str = "lastweather.json";
}
