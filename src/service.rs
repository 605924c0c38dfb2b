use crate::config::Config;
use crate::forecast::{AqiPrediction, JitterSource, Propagator, UniformJitter, WeatherImpact};
use crate::safety::{classify, find_best_worst, BestWorst, GroupVerdicts, HourlySafety, PopulationGroup};
use crate::weather::{fallback_forecast, WeatherSample};
use chrono::{Local, Timelike};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Inputs gathered by the caller from the station and weather providers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
    #[serde(default, alias = "current_aqi")]
    pub current_aqi: Option<f64>,
    #[serde(default)]
    pub weather: Vec<WeatherSample>,
    /// Negative values produce an empty forecast
    #[serde(default, alias = "hours_ahead")]
    pub hours_ahead: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResponse {
    pub current_aqi: f64,
    pub predictions: Vec<AqiPrediction>,
    pub impacts: Vec<WeatherImpact>,
}

/// Current and per-hour safety guidance for every population group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyReport {
    pub current_aqi: f64,
    pub current_safety: GroupVerdicts,
    pub forecast_safety: Vec<HourlySafety>,
    pub best_worst_times: BTreeMap<PopulationGroup, BestWorst>,
}

impl SafetyReport {
    pub fn build(current_aqi: f64, predictions: &[AqiPrediction]) -> Self {
        let forecast_safety: Vec<HourlySafety> = predictions
            .iter()
            .map(|p| HourlySafety::new(p.hour_offset, p.aqi))
            .collect();
        let best_worst_times = find_best_worst(&forecast_safety, current_aqi);

        Self {
            current_aqi,
            current_safety: classify(current_aqi),
            forecast_safety,
            best_worst_times,
        }
    }
}

/// Applies configured defaults around the propagator and classifier
pub struct ForecastService<J> {
    config: Config,
    propagator: Propagator<J>,
}

impl ForecastService<UniformJitter<StdRng>> {
    /// Uniform jitter, seeded when the configuration carries a seed
    pub fn from_config(config: Config) -> Self {
        let amplitude = config.forecast.jitter_amplitude;
        let jitter = match config.forecast.seed {
            Some(seed) => UniformJitter::seeded(seed, amplitude),
            None => UniformJitter::from_os_rng(amplitude),
        };
        Self::with_jitter(config, jitter)
    }
}

impl<J: JitterSource> ForecastService<J> {
    pub fn with_jitter(config: Config, jitter: J) -> Self {
        Self {
            config,
            propagator: Propagator::new(jitter),
        }
    }

    pub fn forecast(&mut self, request: &ForecastRequest) -> ForecastResponse {
        let current_aqi = self.current_aqi(request);
        let weather = self.weather(request);
        let hours_ahead = self.hours_ahead(request);
        let clock_hour = self.clock_hour();

        let forecast = self
            .propagator
            .propagate(current_aqi, &weather, hours_ahead, clock_hour);

        info!(
            "Forecast from AQI {} at hour {}: {} predictions, {} impacts",
            current_aqi,
            clock_hour,
            forecast.predictions.len(),
            forecast.impacts.len()
        );

        ForecastResponse {
            current_aqi,
            predictions: forecast.predictions,
            impacts: forecast.impacts,
        }
    }

    pub fn safety_report(&mut self, request: &ForecastRequest) -> SafetyReport {
        let response = self.forecast(request);
        SafetyReport::build(response.current_aqi, &response.predictions)
    }

    fn current_aqi(&self, request: &ForecastRequest) -> f64 {
        request.current_aqi.unwrap_or_else(|| {
            warn!(
                "No current AQI supplied, using default of {}",
                self.config.defaults.current_aqi
            );
            self.config.defaults.current_aqi
        })
    }

    fn weather<'a>(&self, request: &'a ForecastRequest) -> Cow<'a, [WeatherSample]> {
        if request.weather.is_empty() && self.config.defaults.fallback_weather {
            warn!("No weather forecast supplied, using fallback forecast");
            Cow::Owned(fallback_forecast(Local::now().naive_local()))
        } else {
            Cow::Borrowed(request.weather.as_slice())
        }
    }

    fn hours_ahead(&self, request: &ForecastRequest) -> usize {
        match request.hours_ahead {
            Some(hours) => usize::try_from(hours).unwrap_or(0),
            None => self.config.forecast.hours_ahead,
        }
    }

    fn clock_hour(&self) -> u32 {
        self.config
            .forecast
            .clock_hour
            .unwrap_or_else(|| Local::now().hour())
    }
}
