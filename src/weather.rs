use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TEMPERATURE_F: f64 = 70.0;
pub const DEFAULT_WIND_SPEED_MPH: f64 = 0.0;
pub const DEFAULT_PRECIPITATION: f64 = 0.0;
pub const DEFAULT_HUMIDITY_PCT: f64 = 50.0;

/// Number of entries in the generated fallback forecast
const FALLBACK_ENTRIES: i64 = 8;

/// Spacing between fallback entries, matching the provider's 3-hour steps
const FALLBACK_STEP_HOURS: i64 = 3;

/// One hourly weather observation as supplied by the forecast provider.
///
/// Only `time` is required. Missing measurements resolve to fixed defaults
/// through [`WeatherSample::conditions`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSample {
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, alias = "wind_speed", skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
}

/// Weather values with defaults applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conditions {
    /// Degrees Fahrenheit
    pub temperature: f64,
    /// Miles per hour
    pub wind_speed: f64,
    pub precipitation: f64,
    /// Percent, 0-100
    pub humidity: f64,
}

impl WeatherSample {
    pub fn new(
        time: impl Into<String>,
        temperature: f64,
        wind_speed: f64,
        precipitation: f64,
        humidity: f64,
    ) -> Self {
        Self {
            time: time.into(),
            temperature: Some(temperature),
            wind_speed: Some(wind_speed),
            precipitation: Some(precipitation),
            humidity: Some(humidity),
        }
    }

    /// A sample carrying only its timestamp label
    pub fn empty(time: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            temperature: None,
            wind_speed: None,
            precipitation: None,
            humidity: None,
        }
    }

    pub fn conditions(&self) -> Conditions {
        Conditions {
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE_F),
            wind_speed: self.wind_speed.unwrap_or(DEFAULT_WIND_SPEED_MPH),
            precipitation: self.precipitation.unwrap_or(DEFAULT_PRECIPITATION),
            humidity: self.humidity.unwrap_or(DEFAULT_HUMIDITY_PCT),
        }
    }
}

/// Sample forecast used when the weather provider is unavailable.
///
/// Produces eight entries three hours apart starting at `start`, cooling
/// slowly while wind and humidity creep up. Never any rain.
pub fn fallback_forecast(start: NaiveDateTime) -> Vec<WeatherSample> {
    (0..FALLBACK_ENTRIES)
        .map(|i| {
            let time = start + TimeDelta::hours(i * FALLBACK_STEP_HOURS);
            let step = i as f64;
            WeatherSample::new(
                time.format("%Y-%m-%d %H:%M:%S").to_string(),
                72.0 - step * 2.0,
                8.0 + step * 0.5,
                0.0,
                65.0 + step * 2.0,
            )
        })
        .collect()
}
