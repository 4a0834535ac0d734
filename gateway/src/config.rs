//! Gateway configuration from environment variables

use anyhow::{Context, Result};
use flood_assessment::AssessmentConfig;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 18700;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    /// Switches both providers to OpenWeatherMap when set
    pub openweather_api_key: Option<String>,
    /// JSON catalog replacing the built-in Bangladesh catalog
    pub catalog_path: Option<PathBuf>,
    pub assessment: AssessmentConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            openweather_api_key: None,
            catalog_path: None,
            assessment: AssessmentConfig::default(),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(port) = get("FLOOD_GATEWAY_PORT").or_else(|| get("PORT")) {
            config.port = port.parse().with_context(|| format!("invalid port: {}", port))?;
        }

        config.openweather_api_key = get("OPENWEATHER_API_KEY");
        config.catalog_path = get("FLOOD_CATALOG_PATH").map(PathBuf::from);

        let millis = |key: &str, target: &mut u64| -> Result<()> {
            if let Some(value) = get(key) {
                *target = value
                    .parse()
                    .with_context(|| format!("{} must be milliseconds, got {}", key, value))?;
            }
            Ok(())
        };
        let assessment = &mut config.assessment;
        millis("FLOOD_WEATHER_TIMEOUT_MS", &mut assessment.weather_timeout_ms)?;
        millis("FLOOD_FORECAST_TIMEOUT_MS", &mut assessment.forecast_timeout_ms)?;
        millis("FLOOD_GEOCODE_TIMEOUT_MS", &mut assessment.geocode_timeout_ms)?;
        millis("FLOOD_REQUEST_BUDGET_MS", &mut assessment.request_budget_ms)?;

        Ok(config)
    }
}
