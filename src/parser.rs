use crate::error::{AppError, Result};
use crate::weather::WeatherSample;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Default failure threshold - fail if more than 10% of entries fail to parse
const DEFAULT_FAILURE_THRESHOLD: f64 = 0.10;

#[derive(Debug, Clone, Default)]
pub struct ParseStats {
    pub total_entries: usize,
    pub parsed_successfully: usize,
    pub parse_failures: usize,
    pub failure_rate: f64,
}

impl ParseStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finalize(&mut self) {
        self.failure_rate = if self.total_entries > 0 {
            self.parse_failures as f64 / self.total_entries as f64
        } else {
            0.0
        };
    }

    pub fn exceeds_threshold(&self, threshold: f64) -> bool {
        self.failure_rate > threshold
    }
}

#[derive(Deserialize)]
struct ForecastEntry {
    dt_txt: String,
    main: MainReadings,
    wind: WindReadings,
    #[serde(default)]
    rain: Option<RainReadings>,
}

#[derive(Deserialize)]
struct MainReadings {
    temp: f64,
    humidity: f64,
}

#[derive(Deserialize)]
struct WindReadings {
    speed: f64,
}

#[derive(Deserialize)]
struct RainReadings {
    #[serde(rename = "3h", default)]
    three_hour: Option<f64>,
}

impl From<ForecastEntry> for WeatherSample {
    fn from(entry: ForecastEntry) -> Self {
        let precipitation = entry.rain.and_then(|r| r.three_hour).unwrap_or(0.0);
        WeatherSample::new(
            entry.dt_txt,
            entry.main.temp,
            entry.wind.speed,
            precipitation,
            entry.main.humidity,
        )
    }
}

pub struct Parser;

impl Parser {
    /// Parse an OpenWeather-style forecast document (imperial units) into
    /// weather samples with parse statistics
    pub fn parse_forecast(content: &str) -> Result<(Vec<WeatherSample>, ParseStats)> {
        Self::parse_forecast_with_threshold(content, DEFAULT_FAILURE_THRESHOLD)
    }

    /// Parse a forecast document with a custom failure threshold
    pub fn parse_forecast_with_threshold(
        content: &str,
        failure_threshold: f64,
    ) -> Result<(Vec<WeatherSample>, ParseStats)> {
        let document: Value = serde_json::from_str(content)?;
        let entries = document
            .get("list")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                AppError::InvalidData("Forecast document has no \"list\" array".to_string())
            })?;

        let mut samples = Vec::with_capacity(entries.len());
        let mut stats = ParseStats::new();

        for (index, entry) in entries.iter().enumerate() {
            stats.total_entries += 1;

            match ForecastEntry::deserialize(entry) {
                Ok(parsed) => {
                    samples.push(WeatherSample::from(parsed));
                    stats.parsed_successfully += 1;
                }
                Err(e) => {
                    stats.parse_failures += 1;
                    warn!(
                        "Failed to parse forecast entry {} (failure {}/{}): {}",
                        index + 1,
                        stats.parse_failures,
                        stats.total_entries,
                        e
                    );
                }
            }
        }

        stats.finalize();

        // Validate parse success rate
        if stats.exceeds_threshold(failure_threshold) {
            return Err(AppError::Parse(format!(
                "Parse failure rate {:.1}% exceeds threshold {:.1}%: {} failures out of {} entries",
                stats.failure_rate * 100.0,
                failure_threshold * 100.0,
                stats.parse_failures,
                stats.total_entries
            )));
        }

        if samples.is_empty() && stats.total_entries > 0 {
            return Err(AppError::Parse(
                "No weather samples successfully parsed from non-empty forecast".to_string(),
            ));
        }

        Ok((samples, stats))
    }
}
