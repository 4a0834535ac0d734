//! Reverse geocoding client
//!
//! Nominatim (OpenStreetMap) by default, OpenWeatherMap Geo when an API key
//! is configured. Lookups are cached per coordinate rounded to 2 decimals.

use crate::{GeocodeProvider, Place, Result, UpstreamError};
use async_trait::async_trait;
use geo_index::Coordinate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

const USER_AGENT: &str = concat!("jolbondhu-flood-gateway/", env!("CARGO_PKG_VERSION"));
const NOMINATIM_BASE: &str = "https://nominatim.openstreetmap.org";
const OPENWEATHERMAP_BASE: &str = "https://api.openweathermap.org";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeApiConfig {
    pub provider: GeocodeApiProvider,
    /// Cache TTL in seconds (default: 3600 = 1 hour)
    pub cache_ttl_sec: u64,
    /// Transport timeout in milliseconds
    pub timeout_ms: u64,
    /// Preferred place-name language
    pub lang: String,
    /// Scheme and host replacing the provider's public endpoint
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for GeocodeApiConfig {
    fn default() -> Self {
        Self {
            provider: GeocodeApiProvider::Nominatim,
            cache_ttl_sec: 3600,
            timeout_ms: 3000,
            lang: "en".to_string(),
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GeocodeApiProvider {
    /// OpenStreetMap Nominatim (free, needs a User-Agent)
    Nominatim,
    /// OpenWeatherMap Geo API (requires API key)
    OpenWeatherMap { api_key: String },
}

struct CacheEntry {
    place: Place,
    expires_at: Instant,
}

pub struct GeocodeApi {
    config: GeocodeApiConfig,
    client: reqwest::Client,
    cache: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl GeocodeApi {
    pub fn nominatim() -> Result<Self> {
        Self::new(GeocodeApiConfig::default())
    }

    pub fn new(config: GeocodeApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| UpstreamError::Unavailable(format!("HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    fn cache_key(coordinate: &Coordinate) -> String {
        format!("{:.2},{:.2}", coordinate.latitude, coordinate.longitude)
    }

    /// (total, unexpired) entries
    pub async fn cache_stats(&self) -> (usize, usize) {
        let cache = self.cache.read().await;
        let now = Instant::now();
        let valid = cache.values().filter(|e| e.expires_at > now).count();
        (cache.len(), valid)
    }

    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }

    async fn fetch(&self, coordinate: &Coordinate) -> Result<Place> {
        let (default_base, path_and_query) = match &self.config.provider {
            GeocodeApiProvider::Nominatim => (
                NOMINATIM_BASE,
                format!(
                    "/reverse?format=jsonv2&lat={:.6}&lon={:.6}&accept-language={}",
                    coordinate.latitude, coordinate.longitude, self.config.lang
                ),
            ),
            GeocodeApiProvider::OpenWeatherMap { api_key } => (
                OPENWEATHERMAP_BASE,
                format!(
                    "/geo/1.0/reverse?lat={:.6}&lon={:.6}&limit=1&appid={}",
                    coordinate.latitude, coordinate.longitude, api_key
                ),
            ),
        };
        let base = self.config.base_url.as_deref().unwrap_or(default_base);
        let url = format!("{}{}", base.trim_end_matches('/'), path_and_query);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| UpstreamError::from_request(e, self.config.timeout_ms))?;

        if !response.status().is_success() {
            return Err(UpstreamError::Unavailable(format!(
                "geocoder returned status: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::from_request(e, self.config.timeout_ms))?;

        match &self.config.provider {
            GeocodeApiProvider::Nominatim => parse_nominatim(&body),
            GeocodeApiProvider::OpenWeatherMap { .. } => parse_owm_geo(&body),
        }
    }
}

#[async_trait]
impl GeocodeProvider for GeocodeApi {
    async fn reverse(&self, coordinate: &Coordinate) -> Result<Place> {
        let key = Self::cache_key(coordinate);

        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(&key) {
                if entry.expires_at > Instant::now() {
                    return Ok(entry.place.clone());
                }
            }
        }

        let place = self.fetch(coordinate).await?;
        debug!("Reverse geocoded {} -> {}", key, place.location_name);

        {
            let mut cache = self.cache.write().await;
            let now = Instant::now();
            // Entries past their TTL are evicted on every insert
            cache.retain(|_, entry| entry.expires_at > now);
            cache.insert(
                key,
                CacheEntry {
                    place: place.clone(),
                    expires_at: now + Duration::from_secs(self.config.cache_ttl_sec),
                },
            );
        }

        Ok(place)
    }
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<NominatimAddress>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    county: Option<String>,
    district: Option<String>,
    state_district: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    country_code: Option<String>,
}

fn parse_nominatim(body: &str) -> Result<Place> {
    let data: NominatimResponse =
        serde_json::from_str(body).map_err(|e| UpstreamError::Malformed(e.to_string()))?;

    if let Some(error) = data.error {
        return Err(UpstreamError::Malformed(error));
    }

    let address = data.address.unwrap_or_default();
    let location_name = address
        .county
        .or(address.district)
        .or(address.state_district)
        .or(address.city)
        .or(address.town)
        .or(address.village)
        .or(data.name)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| UpstreamError::Malformed("no place name in response".to_string()))?;

    Ok(Place {
        location_name,
        country: address.country_code.unwrap_or_default().to_uppercase(),
        region: address.state.unwrap_or_default(),
    })
}

#[derive(Debug, Deserialize)]
struct OwmGeoItem {
    name: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    state: String,
}

fn parse_owm_geo(body: &str) -> Result<Place> {
    let items: Vec<OwmGeoItem> =
        serde_json::from_str(body).map_err(|e| UpstreamError::Malformed(e.to_string()))?;

    let item = items
        .into_iter()
        .next()
        .ok_or_else(|| UpstreamError::Malformed("empty geocode result".to_string()))?;

    Ok(Place {
        location_name: item.name,
        country: item.country,
        region: item.state,
    })
}
