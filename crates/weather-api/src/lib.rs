//! Upstream Providers
//!
//! Live weather and reverse-geocoding behind two object-safe traits.
//! Every failure is reported as an [`UpstreamError`]; callers decide how to
//! recover (the flood assessment substitutes synthetic data).
//!
//! # Usage
//!
//! ```rust,ignore
//! let api = WeatherApi::open_meteo()?;
//! let current = api.current(&Coordinate::new(24.45, 89.70)?).await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use geo_index::Coordinate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod geocode;
pub mod weather;

pub use geocode::{GeocodeApi, GeocodeApiConfig, GeocodeApiProvider};
pub use weather::{WeatherApi, WeatherApiConfig, WeatherApiProvider};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpstreamError {
    #[error("Upstream timed out after {0} ms")]
    Timeout(u64),
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),
    #[error("Malformed upstream payload: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, UpstreamError>;

impl UpstreamError {
    /// Classify a transport error
    pub(crate) fn from_request(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(timeout_ms)
        } else if err.is_decode() {
            UpstreamError::Malformed(err.to_string())
        } else {
            UpstreamError::Unavailable(err.to_string())
        }
    }
}

/// Current conditions at a coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    /// Recent precipitation (mm)
    pub precipitation_mm: f64,
    pub humidity_pct: f64,
    pub temperature_c: f64,
    pub wind_speed_kmh: f64,
    pub description: String,
}

/// One short-range forecast step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSlot {
    pub time: DateTime<Utc>,
    pub precipitation_mm: f64,
    pub temperature_c: f64,
    pub description: String,
}

/// Reverse-geocoded place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub location_name: String,
    pub country: String,
    pub region: String,
}

/// Weather data provider interface
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current conditions
    async fn current(&self, coordinate: &Coordinate) -> Result<CurrentWeather>;

    /// Next `slots` forecast steps
    async fn forecast(&self, coordinate: &Coordinate, slots: usize) -> Result<Vec<ForecastSlot>>;
}

/// Reverse geocoding interface
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    async fn reverse(&self, coordinate: &Coordinate) -> Result<Place>;
}

/// Provider that always fails, for deployments with no upstream configured
#[derive(Debug, Clone, Default)]
pub struct Offline;

#[async_trait]
impl WeatherProvider for Offline {
    async fn current(&self, _coordinate: &Coordinate) -> Result<CurrentWeather> {
        Err(UpstreamError::Unavailable("weather provider disabled".to_string()))
    }

    async fn forecast(&self, _coordinate: &Coordinate, _slots: usize) -> Result<Vec<ForecastSlot>> {
        Err(UpstreamError::Unavailable("weather provider disabled".to_string()))
    }
}

#[async_trait]
impl GeocodeProvider for Offline {
    async fn reverse(&self, _coordinate: &Coordinate) -> Result<Place> {
        Err(UpstreamError::Unavailable("geocode provider disabled".to_string()))
    }
}

/// WMO weather interpretation code to a short description
pub fn describe_wmo_code(code: i32) -> &'static str {
    match code {
        0 => "clear sky",
        1..=3 => "partly cloudy",
        45..=48 => "fog",
        51..=55 => "drizzle",
        56..=57 => "freezing drizzle",
        61 => "light rain",
        63 => "moderate rain",
        65 => "heavy rain",
        66..=67 => "freezing rain",
        71..=77 => "snow",
        80..=82 => "rain showers",
        85..=86 => "snow showers",
        95..=99 => "thunderstorm",
        _ => "unknown",
    }
}
