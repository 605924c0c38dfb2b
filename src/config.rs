use crate::error::{AppError, Result};
use crate::forecast::{DEFAULT_HOURS_AHEAD, DEFAULT_JITTER_AMPLITUDE};
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// Upper bound on the forecast horizon
const MAX_HOURS_AHEAD: usize = 48;

/// Upper bound on the jitter half-width, in AQI points
const MAX_JITTER_AMPLITUDE: f64 = 50.0;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastConfig {
    #[serde(default = "default_hours_ahead")]
    pub hours_ahead: usize,
    #[serde(default = "default_jitter_amplitude")]
    pub jitter_amplitude: f64,
    #[serde(default, deserialize_with = "deserialize_seed")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub clock_hour: Option<u32>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            hours_ahead: default_hours_ahead(),
            jitter_amplitude: default_jitter_amplitude(),
            seed: None,
            clock_hour: None,
        }
    }
}

fn default_hours_ahead() -> usize {
    DEFAULT_HOURS_AHEAD
}

fn default_jitter_amplitude() -> f64 {
    DEFAULT_JITTER_AMPLITUDE
}

#[derive(Debug, Deserialize, Clone)]
pub struct DefaultsConfig {
    /// Used when the ground-station provider has no reading
    #[serde(default = "default_current_aqi")]
    pub current_aqi: f64,
    /// Substitute the generated sample forecast when no weather is supplied
    #[serde(default = "default_fallback_weather")]
    pub fallback_weather: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            current_aqi: default_current_aqi(),
            fallback_weather: default_fallback_weather(),
        }
    }
}

fn default_current_aqi() -> f64 {
    65.0
}

fn default_fallback_weather() -> bool {
    true
}

/// Custom deserializer that handles the seed as a number, a string, or empty
///
/// Accepts:
/// - `seed: 42` (number)
/// - `seed: "42"` (string that parses to number)
/// - `seed: ""` or `seed: null` (no seed)
/// - `seed: ${AIRCAST_SEED}` (env var substituted to any of the above)
fn deserialize_seed<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SeedValue {
        Number(u64),
        String(String),
    }

    match Option::<SeedValue>::deserialize(deserializer)? {
        None => Ok(None),
        Some(SeedValue::Number(n)) => Ok(Some(n)),
        Some(SeedValue::String(s)) if s.trim().is_empty() => Ok(None),
        Some(SeedValue::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("Invalid seed: '{}'", s))),
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text, substituting `${VAR}` references
    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;

        let config: Config = serde_yaml::from_str(&expanded)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    ///
    /// Checks for:
    /// - Forecast horizon within 1..=48 hours
    /// - Finite jitter amplitude within 0..=50
    /// - Clock hour override within a day
    /// - Finite, non-negative fallback AQI
    fn validate(&self) -> Result<()> {
        if self.forecast.hours_ahead == 0 {
            return Err(AppError::Config(
                "Forecast hours_ahead must be greater than 0".to_string(),
            ));
        }

        if self.forecast.hours_ahead > MAX_HOURS_AHEAD {
            return Err(AppError::Config(format!(
                "Forecast hours_ahead {} exceeds maximum of {}",
                self.forecast.hours_ahead, MAX_HOURS_AHEAD
            )));
        }

        // Warn if the horizon is longer than providers usually cover
        if self.forecast.hours_ahead > 24 {
            tracing::warn!(
                "Forecast horizon of {} hours is long, predictions decay toward moderate values well before that",
                self.forecast.hours_ahead
            );
        }

        let amplitude = self.forecast.jitter_amplitude;
        if !amplitude.is_finite() || amplitude < 0.0 {
            return Err(AppError::Config(format!(
                "Forecast jitter_amplitude must be a non-negative number, got {}",
                amplitude
            )));
        }

        if amplitude > MAX_JITTER_AMPLITUDE {
            return Err(AppError::Config(format!(
                "Forecast jitter_amplitude {} exceeds maximum of {}",
                amplitude, MAX_JITTER_AMPLITUDE
            )));
        }

        if let Some(hour) = self.forecast.clock_hour {
            if hour > 23 {
                return Err(AppError::Config(format!(
                    "Forecast clock_hour {} must be between 0 and 23",
                    hour
                )));
            }
        }

        let aqi = self.defaults.current_aqi;
        if !aqi.is_finite() || aqi < 0.0 {
            return Err(AppError::Config(format!(
                "Default current_aqi must be a non-negative number, got {}",
                aqi
            )));
        }

        Ok(())
    }
}

fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = content.to_string();
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| AppError::Config(format!("Invalid substitution pattern: {}", e)))?;

    let mut missing_vars = Vec::new();

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(value) => {
                result = result.replace(&cap[0], &value);
            }
            Err(_) => {
                missing_vars.push(var_name.to_string());
            }
        }
    }

    if !missing_vars.is_empty() {
        return Err(AppError::Config(format!(
            "Missing required environment variable{}: {}\n\n\
             To fix this:\n\
             1. Create a .env file in the project root (copy .env.example)\n\
             2. Set the missing variable{}: export {}=<value>\n\
             3. Or set {} in your environment before running",
            if missing_vars.len() > 1 { "s" } else { "" },
            missing_vars.join(", "),
            if missing_vars.len() > 1 { "s" } else { "" },
            missing_vars[0],
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}
