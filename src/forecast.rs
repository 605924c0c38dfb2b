use crate::aqi::AqiLevel;
use crate::weather::{Conditions, WeatherSample};
use chrono::{Local, Timelike};
use rand::distr::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default forecast horizon in hours
pub const DEFAULT_HOURS_AHEAD: usize = 6;

/// Default half-width of the uniform jitter added to every hour
pub const DEFAULT_JITTER_AMPLITUDE: f64 = 5.0;

/// Decay applied to the carried base between hours, pulling long
/// forecasts back toward moderate values
const BASE_DECAY: f64 = 0.9;

/// Source of the random term added to each predicted hour
pub trait JitterSource {
    fn next_jitter(&mut self) -> f64;
}

/// Uniformly distributed jitter in `[-amplitude, +amplitude]`.
///
/// Amplitudes that are not positive, or too large for a finite sampling
/// range, produce zero jitter.
pub struct UniformJitter<R> {
    rng: R,
    range: Option<Uniform<f64>>,
}

impl<R: Rng> UniformJitter<R> {
    pub fn new(rng: R, amplitude: f64) -> Self {
        let range = if amplitude > 0.0 {
            Uniform::new_inclusive(-amplitude, amplitude)
                .map_err(|e| warn!("Jitter amplitude {} disabled: {}", amplitude, e))
                .ok()
        } else {
            None
        };
        Self { rng, range }
    }
}

impl UniformJitter<StdRng> {
    /// Seeded from the operating system, non-reproducible
    pub fn from_os_rng(amplitude: f64) -> Self {
        Self::new(StdRng::from_os_rng(), amplitude)
    }

    /// Reproducible sequence for a given seed
    pub fn seeded(seed: u64, amplitude: f64) -> Self {
        Self::new(StdRng::seed_from_u64(seed), amplitude)
    }
}

impl<R: Rng> JitterSource for UniformJitter<R> {
    fn next_jitter(&mut self) -> f64 {
        match &self.range {
            Some(range) => range.sample(&mut self.rng),
            None => 0.0,
        }
    }
}

/// Jitter pinned to zero
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn next_jitter(&mut self) -> f64 {
        0.0
    }
}

/// Jitter pinned to a constant offset
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(pub f64);

impl JitterSource for FixedJitter {
    fn next_jitter(&mut self) -> f64 {
        self.0
    }
}

/// A weather or traffic condition that scales the predicted AQI for one hour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Factor {
    StrongWind,
    ModerateWind,
    LightBreeze,
    ExtremeHeat,
    Warmth,
    Rain,
    HighHumidity,
    RushHour,
    Night,
}

impl Factor {
    pub fn multiplier(self) -> f64 {
        match self {
            Factor::StrongWind => 0.75,
            Factor::ModerateWind => 0.85,
            Factor::LightBreeze => 0.92,
            Factor::ExtremeHeat => 1.20,
            Factor::Warmth => 1.10,
            Factor::Rain => 0.65,
            Factor::HighHumidity => 1.05,
            Factor::RushHour => 1.15,
            Factor::Night => 0.95,
        }
    }

    /// Explanation fragment used in the hourly reason. Humidity has none.
    pub fn phrase(self) -> Option<&'static str> {
        match self {
            Factor::StrongWind => Some("strong winds dispersing pollution"),
            Factor::ModerateWind => Some("moderate winds clearing the air"),
            Factor::LightBreeze => Some("a light breeze"),
            Factor::ExtremeHeat => Some("high heat accelerating ozone formation"),
            Factor::Warmth => Some("warm temperatures increasing ozone"),
            Factor::Rain => Some("rain washing out pollutants"),
            Factor::HighHumidity => None,
            Factor::RushHour => Some("rush hour traffic emissions"),
            Factor::Night => Some("reduced nighttime traffic"),
        }
    }
}

pub fn is_rush_hour(hour: u32) -> bool {
    (7..=9).contains(&hour) || (16..=19).contains(&hour)
}

pub fn is_night(hour: u32) -> bool {
    hour >= 22 || hour <= 5
}

fn wind_factor(wind_speed: f64) -> Option<Factor> {
    if wind_speed > 15.0 {
        Some(Factor::StrongWind)
    } else if wind_speed > 10.0 {
        Some(Factor::ModerateWind)
    } else if wind_speed > 5.0 {
        Some(Factor::LightBreeze)
    } else {
        None
    }
}

fn temperature_factor(temperature: f64) -> Option<Factor> {
    if temperature > 85.0 {
        Some(Factor::ExtremeHeat)
    } else if temperature > 75.0 {
        Some(Factor::Warmth)
    } else {
        None
    }
}

fn traffic_factor(hour: u32) -> Option<Factor> {
    if is_rush_hour(hour) {
        Some(Factor::RushHour)
    } else if is_night(hour) {
        Some(Factor::Night)
    } else {
        None
    }
}

/// Factors matched for one hour, in the order they are applied
pub fn hour_factors(conditions: &Conditions, hour: u32) -> Vec<Factor> {
    [
        wind_factor(conditions.wind_speed),
        temperature_factor(conditions.temperature),
        (conditions.precipitation > 0.0).then_some(Factor::Rain),
        (conditions.humidity > 80.0).then_some(Factor::HighHumidity),
        traffic_factor(hour),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Builds the human-readable reason for one hour by comparing the displayed
/// AQI against the base the hour started from.
pub fn explain(factors: &[Factor], final_aqi: u32, base_aqi: f64) -> String {
    let phrases: Vec<&str> = factors.iter().filter_map(|f| f.phrase()).collect();
    if phrases.is_empty() {
        return "Stable conditions".to_string();
    }

    let shown = f64::from(final_aqi);
    let prefix = if shown < base_aqi {
        "Improving due to "
    } else if shown > base_aqi {
        "Worsening due to "
    } else {
        "Stable with "
    };

    format!("{}{}", prefix, phrases.join(", "))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AqiPrediction {
    pub hour_offset: u32,
    pub time: String,
    pub aqi: u32,
    pub level: AqiLevel,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactDirection {
    Improving,
    Worsening,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherImpact {
    pub factor: String,
    pub direction: ImpactDirection,
    pub description: String,
}

impl WeatherImpact {
    fn new(factor: &str, direction: ImpactDirection, description: String) -> Self {
        Self {
            factor: factor.to_string(),
            direction,
            description,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub predictions: Vec<AqiPrediction>,
    pub impacts: Vec<WeatherImpact>,
}

/// Summarizes how the upcoming hour's weather and the current traffic period
/// push air quality. At most one entry per factor category.
pub fn weather_impacts(conditions: &Conditions, clock_hour: u32) -> Vec<WeatherImpact> {
    let mut impacts = Vec::new();

    if conditions.wind_speed > 10.0 {
        impacts.push(WeatherImpact::new(
            "Strong Winds",
            ImpactDirection::Improving,
            format!(
                "Winds of {} mph will help disperse pollutants",
                conditions.wind_speed.round()
            ),
        ));
    } else if conditions.wind_speed < 5.0 {
        impacts.push(WeatherImpact::new(
            "Stagnant Air",
            ImpactDirection::Worsening,
            format!(
                "Light winds of {} mph will let pollutants accumulate",
                conditions.wind_speed.round()
            ),
        ));
    }

    if conditions.temperature > 75.0 {
        impacts.push(WeatherImpact::new(
            "High Temperature",
            ImpactDirection::Worsening,
            format!(
                "Temperatures near {}°F will increase ozone formation",
                conditions.temperature.round()
            ),
        ));
    }

    if conditions.precipitation > 0.0 {
        impacts.push(WeatherImpact::new(
            "Rain",
            ImpactDirection::Improving,
            "Rainfall will wash pollutants out of the air".to_string(),
        ));
    }

    if conditions.humidity > 80.0 {
        impacts.push(WeatherImpact::new(
            "High Humidity",
            ImpactDirection::Worsening,
            format!(
                "Humidity of {}% can trap fine particles near the ground",
                conditions.humidity.round()
            ),
        ));
    }

    if is_rush_hour(clock_hour) {
        impacts.push(WeatherImpact::new(
            "Rush Hour",
            ImpactDirection::Worsening,
            "Rush hour traffic is adding vehicle emissions".to_string(),
        ));
    } else if is_night(clock_hour) {
        impacts.push(WeatherImpact::new(
            "Nighttime",
            ImpactDirection::Improving,
            "Lighter nighttime traffic means fewer emissions".to_string(),
        ));
    }

    impacts
}

/// Hour-by-hour AQI propagation over a weather outlook.
///
/// Each hour starts from the unrounded value carried from the previous hour,
/// applies the matched weather and traffic multipliers, adds jitter, and then
/// hands `predicted * 0.9` on to the next hour. The displayed AQI is the
/// floored prediction and is never fed back into the chain.
pub struct Propagator<J> {
    jitter: J,
}

impl<J: JitterSource> Propagator<J> {
    pub fn new(jitter: J) -> Self {
        Self { jitter }
    }

    /// Propagates `current_aqi` over at most `hours_ahead` weather samples.
    ///
    /// `clock_hour` is the wall-clock hour at evaluation time; values of 24 or
    /// more wrap around.
    pub fn propagate(
        &mut self,
        current_aqi: f64,
        weather: &[WeatherSample],
        hours_ahead: usize,
        clock_hour: u32,
    ) -> Forecast {
        let clock_hour = clock_hour % 24;
        let mut predictions = Vec::with_capacity(hours_ahead.min(weather.len()));
        let mut base_aqi = current_aqi;

        for (i, sample) in weather.iter().take(hours_ahead).enumerate() {
            let conditions = sample.conditions();
            let hour = (clock_hour + i as u32 + 1) % 24;
            let factors = hour_factors(&conditions, hour);

            let mut predicted = factors
                .iter()
                .fold(base_aqi, |aqi, factor| aqi * factor.multiplier());
            predicted += self.jitter.next_jitter();

            let aqi = predicted.floor().max(0.0) as u32;
            let reason = explain(&factors, aqi, base_aqi);

            predictions.push(AqiPrediction {
                hour_offset: i as u32 + 1,
                time: sample.time.clone(),
                aqi,
                level: AqiLevel::from_aqi(f64::from(aqi)),
                reason,
            });

            base_aqi = predicted * BASE_DECAY;
        }

        let impacts = weather
            .first()
            .map(|sample| weather_impacts(&sample.conditions(), clock_hour))
            .unwrap_or_default();

        debug!(
            "Propagated AQI {} over {} hours ({} samples supplied), {} impacts",
            current_aqi,
            predictions.len(),
            weather.len(),
            impacts.len()
        );

        Forecast {
            predictions,
            impacts,
        }
    }

    /// Same as [`Propagator::propagate`] using the local wall-clock hour
    pub fn propagate_now(
        &mut self,
        current_aqi: f64,
        weather: &[WeatherSample],
        hours_ahead: usize,
    ) -> Forecast {
        self.propagate(current_aqi, weather, hours_ahead, Local::now().hour())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calm(time: &str) -> WeatherSample {
        WeatherSample::new(time, 60.0, 0.0, 0.0, 50.0)
    }

    #[test]
    fn test_strong_wind_single_hour() {
        let weather = vec![WeatherSample::new("t0", 60.0, 20.0, 0.0, 50.0)];
        let forecast = Propagator::new(NoJitter).propagate(100.0, &weather, 6, 12);

        assert_eq!(forecast.predictions.len(), 1);
        let p = &forecast.predictions[0];
        assert_eq!(p.hour_offset, 1);
        assert_eq!(p.time, "t0");
        assert_eq!(p.aqi, 75);
        assert_eq!(p.level, AqiLevel::Moderate);
        assert!(p.reason.starts_with("Improving due to"));
        assert!(p.reason.contains("strong winds dispersing pollution"));
    }

    #[test]
    fn test_carried_base_is_unrounded() {
        let weather = vec![
            WeatherSample::new("t0", 60.0, 20.0, 0.0, 50.0),
            WeatherSample::new("t1", 60.0, 20.0, 0.0, 50.0),
        ];
        let forecast = Propagator::new(NoJitter).propagate(99.0, &weather, 6, 12);

        // 99 * 0.75 = 74.25, carried 66.825 * 0.75 = 50.11875
        // Carrying the displayed 74 instead would give 49.
        assert_eq!(forecast.predictions[0].aqi, 74);
        assert_eq!(forecast.predictions[1].aqi, 50);
    }

    #[test]
    fn test_decay_without_factors() {
        let weather = vec![calm("t0"), calm("t1"), calm("t2")];
        let forecast = Propagator::new(NoJitter).propagate(100.0, &weather, 6, 10);

        let aqis: Vec<u32> = forecast.predictions.iter().map(|p| p.aqi).collect();
        assert_eq!(aqis, vec![100, 90, 81]);
        assert!(forecast.predictions.iter().all(|p| p.reason == "Stable conditions"));
    }

    #[test]
    fn test_truncates_to_hours_ahead() {
        let weather: Vec<WeatherSample> = (0..8).map(|i| calm(&format!("t{}", i))).collect();
        let forecast = Propagator::new(NoJitter).propagate(80.0, &weather, 6, 12);
        assert_eq!(forecast.predictions.len(), 6);
        assert_eq!(forecast.predictions[5].hour_offset, 6);

        let forecast = Propagator::new(NoJitter).propagate(80.0, &weather[..3], 6, 12);
        assert_eq!(forecast.predictions.len(), 3);
    }

    #[test]
    fn test_zero_hours_ahead_yields_no_predictions() {
        let weather = vec![calm("t0")];
        let forecast = Propagator::new(NoJitter).propagate(80.0, &weather, 0, 12);
        assert!(forecast.predictions.is_empty());
    }

    #[test]
    fn test_empty_weather() {
        let forecast = Propagator::new(NoJitter).propagate(150.0, &[], 6, 12);
        assert_eq!(forecast, Forecast::default());
    }

    #[test]
    fn test_humidity_adjusts_without_phrase() {
        let weather = vec![WeatherSample::new("t0", 60.0, 0.0, 0.0, 90.0)];
        let forecast = Propagator::new(NoJitter).propagate(100.0, &weather, 6, 12);
        assert_eq!(forecast.predictions[0].aqi, 105);
        assert_eq!(forecast.predictions[0].reason, "Stable conditions");
    }

    #[test]
    fn test_rush_hour_and_night_use_forecast_hour() {
        let weather = vec![calm("t0")];

        // Clock at 7 means the first forecast hour is 8
        let forecast = Propagator::new(NoJitter).propagate(100.0, &weather, 6, 7);
        assert!(forecast.predictions[0].reason.starts_with("Worsening due to"));
        assert!(forecast.predictions[0].reason.contains("rush hour traffic emissions"));

        // Clock at 21 means the first forecast hour is 22
        let forecast = Propagator::new(NoJitter).propagate(100.0, &weather, 6, 21);
        assert!(forecast.predictions[0].reason.starts_with("Improving due to"));
        assert!(forecast.predictions[0].reason.contains("reduced nighttime traffic"));
    }

    #[test]
    fn test_clock_hour_wraps() {
        let weather = vec![calm("t0")];
        let a = Propagator::new(NoJitter).propagate(100.0, &weather, 6, 31);
        let b = Propagator::new(NoJitter).propagate(100.0, &weather, 6, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_reason_joins_phrases_in_order() {
        let weather = vec![WeatherSample::new("t0", 90.0, 12.0, 0.5, 50.0)];
        let forecast = Propagator::new(NoJitter).propagate(100.0, &weather, 6, 12);
        assert_eq!(
            forecast.predictions[0].reason,
            "Improving due to moderate winds clearing the air, \
             high heat accelerating ozone formation, rain washing out pollutants"
        );
    }

    #[test]
    fn test_explain_stable_prefix() {
        assert_eq!(
            explain(&[Factor::LightBreeze], 50, 50.0),
            "Stable with a light breeze"
        );
        assert_eq!(explain(&[Factor::HighHumidity], 60, 50.0), "Stable conditions");
        assert_eq!(explain(&[], 10, 50.0), "Stable conditions");
    }

    #[test]
    fn test_displayed_aqi_floored_at_zero() {
        let weather = vec![calm("t0")];
        let forecast = Propagator::new(FixedJitter(-5.0)).propagate(2.0, &weather, 6, 12);
        assert_eq!(forecast.predictions[0].aqi, 0);
        assert_eq!(forecast.predictions[0].level, AqiLevel::Good);
    }

    #[test]
    fn test_jitter_is_carried_in_base() {
        let weather = vec![calm("t0"), calm("t1")];
        let forecast = Propagator::new(FixedJitter(5.0)).propagate(100.0, &weather, 6, 12);
        // 105 then 105 * 0.9 + 5 = 99.5
        assert_eq!(forecast.predictions[0].aqi, 105);
        assert_eq!(forecast.predictions[1].aqi, 99);
    }

    #[test]
    fn test_impacts_from_first_hour_only() {
        let weather = vec![
            WeatherSample::new("t0", 88.0, 20.0, 0.2, 85.0),
            WeatherSample::new("t1", 60.0, 2.0, 0.0, 40.0),
        ];
        let forecast = Propagator::new(NoJitter).propagate(100.0, &weather, 6, 17);

        let summary: Vec<(&str, ImpactDirection)> = forecast
            .impacts
            .iter()
            .map(|i| (i.factor.as_str(), i.direction))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Strong Winds", ImpactDirection::Improving),
                ("High Temperature", ImpactDirection::Worsening),
                ("Rain", ImpactDirection::Improving),
                ("High Humidity", ImpactDirection::Worsening),
                ("Rush Hour", ImpactDirection::Worsening),
            ]
        );
        assert!(forecast.impacts[0].description.contains("20 mph"));
        assert!(forecast.impacts[1].description.contains("88°F"));
    }

    #[test]
    fn test_impacts_middle_band_wind_and_night() {
        let conditions = WeatherSample::new("t0", 70.0, 7.0, 0.0, 50.0).conditions();
        let impacts = weather_impacts(&conditions, 23);
        assert_eq!(impacts.len(), 1);
        assert_eq!(impacts[0].factor, "Nighttime");
        assert_eq!(impacts[0].direction, ImpactDirection::Improving);

        let calm_day = weather_impacts(&WeatherSample::empty("t0").conditions(), 12);
        assert_eq!(calm_day.len(), 1);
        assert_eq!(calm_day[0].factor, "Stagnant Air");
    }

    #[test]
    fn test_seeded_jitter_is_reproducible_and_bounded() {
        let mut a = UniformJitter::seeded(42, DEFAULT_JITTER_AMPLITUDE);
        let mut b = UniformJitter::seeded(42, DEFAULT_JITTER_AMPLITUDE);
        for _ in 0..100 {
            let x = a.next_jitter();
            assert_eq!(x, b.next_jitter());
            assert!((-5.0..=5.0).contains(&x));
        }
    }

    #[test]
    fn test_zero_amplitude_jitter() {
        let mut jitter = UniformJitter::seeded(7, 0.0);
        assert_eq!(jitter.next_jitter(), 0.0);
    }

    #[test]
    fn test_oversized_amplitude_yields_zero_jitter() {
        let mut jitter = UniformJitter::seeded(1, 1.0e308);
        assert_eq!(jitter.next_jitter(), 0.0);

        let mut jitter = UniformJitter::seeded(1, f64::NAN);
        assert_eq!(jitter.next_jitter(), 0.0);
    }

    #[test]
    fn test_propagate_now_uses_local_clock() {
        let weather = vec![calm("t0"), calm("t1"), calm("t2")];
        let forecast = Propagator::new(NoJitter).propagate_now(80.0, &weather, 2);

        assert_eq!(forecast.predictions.len(), 2);
        assert_eq!(forecast.predictions[1].hour_offset, 2);
        assert_eq!(forecast.impacts[0].factor, "Stagnant Air");
    }
}
