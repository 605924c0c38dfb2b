use aircast_forecast::aqi;
use aircast_forecast::config::Config;
use aircast_forecast::parser::Parser;
use aircast_forecast::service::{ForecastRequest, ForecastService};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const USAGE: &str = "Usage: aircast <forecast|safety|openweather> <file> [current_aqi]\n\n\
                     forecast     run the AQI forecast for a request JSON file\n\
                     safety       build the population safety report for a request JSON file\n\
                     openweather  run the forecast on a provider forecast document\n\n\
                     current_aqi  an AQI value, pm25=<ug/m3> or no2=<molecules/cm2>";

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing on stderr so stdout carries only JSON
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,aircast_forecast=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let (command, input) = match (args.get(1), args.get(2)) {
        (Some(command), Some(input)) => (command.as_str(), input.as_str()),
        _ => return Err(anyhow::anyhow!(USAGE)),
    };

    let config = load_config()?;
    let mut service = ForecastService::from_config(config);

    let content = std::fs::read_to_string(input)
        .map_err(|e| anyhow::anyhow!("Failed to read input file {}: {}", input, e))?;

    let output = match command {
        "forecast" => {
            let request: ForecastRequest = serde_json::from_str(&content)?;
            serde_json::to_string_pretty(&service.forecast(&request))?
        }
        "safety" => {
            let request: ForecastRequest = serde_json::from_str(&content)?;
            serde_json::to_string_pretty(&service.safety_report(&request))?
        }
        "openweather" => {
            let (weather, stats) = Parser::parse_forecast(&content)?;
            info!(
                "Parsed {} weather samples from {} ({} failures)",
                stats.parsed_successfully, input, stats.parse_failures
            );
            let current_aqi = args.get(3).map(|v| parse_current_aqi(v)).transpose()?;
            let request = ForecastRequest {
                current_aqi,
                weather,
                hours_ahead: None,
            };
            serde_json::to_string_pretty(&service.forecast(&request))?
        }
        other => return Err(anyhow::anyhow!("Unknown command '{}'\n\n{}", other, USAGE)),
    };

    println!("{}", output);
    Ok(())
}

/// Accepts a bare AQI or a raw pollutant reading to convert
fn parse_current_aqi(value: &str) -> anyhow::Result<f64> {
    let parse = |raw: &str| {
        raw.parse::<f64>()
            .map_err(|e| anyhow::anyhow!("Invalid current AQI '{}': {}", value, e))
    };

    let aqi = match value.split_once('=') {
        Some(("pm25", raw)) => f64::from(aqi::from_pm25(parse(raw)?)),
        Some(("no2", raw)) => f64::from(aqi::from_no2_column(parse(raw)?)),
        Some((other, _)) => {
            return Err(anyhow::anyhow!(
                "Unknown pollutant '{}', expected pm25 or no2",
                other
            ))
        }
        None => parse(value)?,
    };
    info!("Current AQI {} from '{}'", aqi, value);

    Ok(aqi)
}

fn load_config() -> anyhow::Result<Config> {
    let path = std::env::var("AIRCAST_CONFIG").unwrap_or_else(|_| "config/config.yaml".to_string());

    if !Path::new(&path).exists() {
        warn!("No configuration found at {}, using defaults", path);
        return Ok(Config::default());
    }

    let config = Config::load(&path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to load configuration: {}\n\n\
             Make sure:\n\
             1. {} is valid YAML\n\
             2. All referenced environment variables are set (check .env.example)\n\
             3. Create a .env file if needed",
            e,
            path
        )
    })?;
    info!("Configuration loaded from {}", path);

    Ok(config)
}
