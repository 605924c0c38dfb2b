use serde::{Deserialize, Serialize};
use std::fmt;

/// EPA Air Quality Index category. Upper bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AqiLevel {
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Moderate")]
    Moderate,
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    #[serde(rename = "Unhealthy")]
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    VeryUnhealthy,
    #[serde(rename = "Hazardous")]
    Hazardous,
}

impl AqiLevel {
    /// Categorize an AQI value.
    ///
    /// Total over all inputs: anything above 300 (and NaN, which fails every
    /// comparison) lands in `Hazardous`.
    pub fn from_aqi(aqi: f64) -> Self {
        if aqi <= 50.0 {
            AqiLevel::Good
        } else if aqi <= 100.0 {
            AqiLevel::Moderate
        } else if aqi <= 150.0 {
            AqiLevel::UnhealthyForSensitiveGroups
        } else if aqi <= 200.0 {
            AqiLevel::Unhealthy
        } else if aqi <= 300.0 {
            AqiLevel::VeryUnhealthy
        } else {
            AqiLevel::Hazardous
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiLevel::Good => "Good",
            AqiLevel::Moderate => "Moderate",
            AqiLevel::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiLevel::Unhealthy => "Unhealthy",
            AqiLevel::VeryUnhealthy => "Very Unhealthy",
            AqiLevel::Hazardous => "Hazardous",
        }
    }
}

/// AQI from a PM2.5 concentration in µg/m³.
///
/// Piecewise-linear over the EPA breakpoints, truncated toward zero and
/// capped at 200 above 150.4 µg/m³. Readings falling between two segments
/// (for example 12.05) interpolate on the upper segment. Negative and NaN
/// readings give 0.
pub fn from_pm25(pm25: f64) -> u32 {
    let aqi = if pm25 <= 12.0 {
        (50.0 / 12.0) * pm25
    } else if pm25 <= 35.4 {
        50.0 + ((100.0 - 50.0) / (35.4 - 12.1)) * (pm25 - 12.1)
    } else if pm25 <= 55.4 {
        100.0 + ((150.0 - 100.0) / (55.4 - 35.5)) * (pm25 - 35.5)
    } else if pm25 <= 150.4 {
        150.0 + ((200.0 - 150.0) / (150.4 - 55.5)) * (pm25 - 55.5)
    } else {
        200.0
    };
    truncate(aqi)
}

/// AQI estimate from a satellite tropospheric NO₂ column in molecules/cm².
///
/// The column is scaled to a surface concentration of `column / 1e15 * 50`
/// ppb, then mapped over 0..=53 and 53..=100 ppb. Above 100 ppb the estimate
/// climbs slowly and is capped at 250.
pub fn from_no2_column(column: f64) -> u32 {
    let surface_ppb = column / 1e15 * 50.0;

    let aqi = if surface_ppb <= 53.0 {
        surface_ppb * (50.0 / 53.0)
    } else if surface_ppb <= 100.0 {
        50.0 + (surface_ppb - 53.0) * 50.0 / (100.0 - 53.0)
    } else {
        100.0 + ((surface_ppb - 100.0) * 50.0 / 260.0).min(150.0)
    };
    truncate(aqi)
}

// `as` saturates: negatives and NaN become 0
fn truncate(aqi: f64) -> u32 {
    aqi.trunc() as u32
}

impl fmt::Display for AqiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
