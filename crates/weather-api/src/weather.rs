//! Live weather client
//!
//! Uses Open-Meteo (free, no API key) by default; OpenWeatherMap when an
//! API key is configured.

use crate::{
    describe_wmo_code, CurrentWeather, ForecastSlot, Result, UpstreamError, WeatherProvider,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use geo_index::Coordinate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const OPEN_METEO_BASE: &str = "https://api.open-meteo.com";
const OPENWEATHERMAP_BASE: &str = "https://api.openweathermap.org";

/// Weather API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherApiConfig {
    pub provider: WeatherApiProvider,
    /// Transport timeout in milliseconds
    pub timeout_ms: u64,
    /// Description language passed to providers that support it
    pub lang: String,
    /// Scheme and host replacing the provider's public endpoint
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for WeatherApiConfig {
    fn default() -> Self {
        Self {
            provider: WeatherApiProvider::OpenMeteo,
            timeout_ms: 5000,
            lang: "en".to_string(),
            base_url: None,
        }
    }
}

/// Supported weather API providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WeatherApiProvider {
    /// Open-Meteo (free, no API key)
    OpenMeteo,
    /// OpenWeatherMap (requires API key)
    OpenWeatherMap { api_key: String },
}

/// Live weather API client
pub struct WeatherApi {
    config: WeatherApiConfig,
    client: reqwest::Client,
}

impl WeatherApi {
    /// Open-Meteo client with default settings
    pub fn open_meteo() -> Result<Self> {
        Self::new(WeatherApiConfig::default())
    }

    pub fn new(config: WeatherApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| UpstreamError::Unavailable(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn provider_name(&self) -> &'static str {
        match self.config.provider {
            WeatherApiProvider::OpenMeteo => "open-meteo",
            WeatherApiProvider::OpenWeatherMap { .. } => "openweathermap",
        }
    }

    fn endpoint(&self, path_and_query: &str) -> String {
        let base = self.config.base_url.as_deref().unwrap_or(match self.config.provider {
            WeatherApiProvider::OpenMeteo => OPEN_METEO_BASE,
            WeatherApiProvider::OpenWeatherMap { .. } => OPENWEATHERMAP_BASE,
        });
        format!("{}{}", base.trim_end_matches('/'), path_and_query)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::from_request(e, self.config.timeout_ms))?;

        if !response.status().is_success() {
            return Err(UpstreamError::Unavailable(format!(
                "{} returned status: {}",
                self.provider_name(),
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::from_request(e, self.config.timeout_ms))?;
        serde_json::from_str(&body).map_err(|e| UpstreamError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl WeatherProvider for WeatherApi {
    async fn current(&self, coordinate: &Coordinate) -> Result<CurrentWeather> {
        let weather: CurrentWeather = match &self.config.provider {
            WeatherApiProvider::OpenMeteo => {
                let url = self.endpoint(&format!(
                    "/v1/forecast?latitude={:.6}&longitude={:.6}&current=precipitation,rain,\
                     wind_speed_10m,temperature_2m,relative_humidity_2m,weather_code&timezone=auto",
                    coordinate.latitude, coordinate.longitude
                ));
                let data: OpenMeteoResponse = self.get_json(&url).await?;
                data.current.into()
            }
            WeatherApiProvider::OpenWeatherMap { api_key } => {
                let url = self.endpoint(&format!(
                    "/data/2.5/weather?lat={:.6}&lon={:.6}&appid={}&units=metric&lang={}",
                    coordinate.latitude, coordinate.longitude, api_key, self.config.lang
                ));
                let data: OwmCurrent = self.get_json(&url).await?;
                data.into()
            }
        };

        debug!(
            "{} current at {:.4},{:.4}: {:.1} mm, {:.0}%",
            self.provider_name(),
            coordinate.latitude,
            coordinate.longitude,
            weather.precipitation_mm,
            weather.humidity_pct
        );
        Ok(weather)
    }

    async fn forecast(&self, coordinate: &Coordinate, slots: usize) -> Result<Vec<ForecastSlot>> {
        match &self.config.provider {
            WeatherApiProvider::OpenMeteo => {
                let url = self.endpoint(&format!(
                    "/v1/forecast?latitude={:.6}&longitude={:.6}\
                     &hourly=temperature_2m,precipitation,weather_code\
                     &forecast_hours={}&timezone=GMT",
                    coordinate.latitude, coordinate.longitude, slots
                ));
                let data: OpenMeteoForecastResponse = self.get_json(&url).await?;
                data.hourly.into_slots(slots)
            }
            WeatherApiProvider::OpenWeatherMap { api_key } => {
                let url = self.endpoint(&format!(
                    "/data/2.5/forecast?lat={:.6}&lon={:.6}&appid={}&units=metric&lang={}&cnt={}",
                    coordinate.latitude, coordinate.longitude, api_key, self.config.lang, slots
                ));
                let data: OwmForecast = self.get_json(&url).await?;
                data.into_slots(slots)
            }
        }
    }
}

// ---- Open-Meteo wire types ----

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    current: OpenMeteoCurrent,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoCurrent {
    #[serde(default)]
    precipitation: f64,
    #[serde(default)]
    rain: Option<f64>,
    /// km/h by default
    wind_speed_10m: f64,
    temperature_2m: f64,
    relative_humidity_2m: f64,
    #[serde(default)]
    weather_code: i32,
}

impl From<OpenMeteoCurrent> for CurrentWeather {
    fn from(c: OpenMeteoCurrent) -> Self {
        // `precipitation` already includes rain; `rain` covers older payloads without it
        let precipitation_mm = if c.precipitation > 0.0 {
            c.precipitation
        } else {
            c.rain.unwrap_or(0.0)
        };

        Self {
            precipitation_mm,
            humidity_pct: c.relative_humidity_2m,
            temperature_c: c.temperature_2m,
            wind_speed_kmh: c.wind_speed_10m,
            description: describe_wmo_code(c.weather_code).to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenMeteoForecastResponse {
    hourly: OpenMeteoHourly,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoHourly {
    time: Vec<String>,
    temperature_2m: Vec<f64>,
    precipitation: Vec<f64>,
    #[serde(default)]
    weather_code: Vec<i32>,
}

impl OpenMeteoHourly {
    fn into_slots(self, slots: usize) -> Result<Vec<ForecastSlot>> {
        let n = self
            .time
            .len()
            .min(self.temperature_2m.len())
            .min(self.precipitation.len())
            .min(slots);

        (0..n)
            .map(|i| {
                let time = NaiveDateTime::parse_from_str(&self.time[i], "%Y-%m-%dT%H:%M")
                    .map_err(|e| {
                        UpstreamError::Malformed(format!("forecast time {:?}: {}", self.time[i], e))
                    })?
                    .and_utc();
                let code = self.weather_code.get(i).copied().unwrap_or(-1);
                Ok(ForecastSlot {
                    time,
                    precipitation_mm: self.precipitation[i],
                    temperature_c: self.temperature_2m[i],
                    description: describe_wmo_code(code).to_string(),
                })
            })
            .collect()
    }
}

// ---- OpenWeatherMap wire types ----

#[derive(Debug, Deserialize)]
struct OwmCurrent {
    main: OwmMain,
    wind: OwmWind,
    rain: Option<OwmRain>,
    #[serde(default)]
    weather: Vec<OwmWeather>,
}

/// Humidity is required: a reading without it is malformed, not dry air
#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmForecastMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    /// m/s with units=metric
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwmRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hour: Option<f64>,
}

impl OwmRain {
    fn amount(&self) -> f64 {
        self.one_hour.or(self.three_hour).unwrap_or(0.0)
    }
}

#[derive(Debug, Deserialize)]
struct OwmWeather {
    description: String,
}

impl From<OwmCurrent> for CurrentWeather {
    fn from(data: OwmCurrent) -> Self {
        Self {
            precipitation_mm: data.rain.as_ref().map(OwmRain::amount).unwrap_or(0.0),
            humidity_pct: data.main.humidity,
            temperature_c: data.main.temp,
            wind_speed_kmh: data.wind.speed * 3.6,
            description: data
                .weather
                .into_iter()
                .next()
                .map(|w| w.description)
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwmForecast {
    list: Vec<OwmForecastItem>,
}

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    dt: i64,
    main: OwmForecastMain,
    rain: Option<OwmRain>,
    #[serde(default)]
    weather: Vec<OwmWeather>,
}

impl OwmForecast {
    fn into_slots(self, slots: usize) -> Result<Vec<ForecastSlot>> {
        self.list
            .into_iter()
            .take(slots)
            .map(|item| {
                let time = DateTime::<Utc>::from_timestamp(item.dt, 0)
                    .ok_or_else(|| UpstreamError::Malformed(format!("forecast dt {}", item.dt)))?;
                Ok(ForecastSlot {
                    time,
                    precipitation_mm: item.rain.as_ref().map(OwmRain::amount).unwrap_or(0.0),
                    temperature_c: item.main.temp,
                    description: item
                        .weather
                        .into_iter()
                        .next()
                        .map(|w| w.description)
                        .unwrap_or_default(),
                })
            })
            .collect()
    }
}
