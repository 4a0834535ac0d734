use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flood_assessment::FloodRiskService;
use geo_index::{Catalog, Category, GeoIndex};
use weather_api::{
    GeocodeApi, GeocodeApiConfig, GeocodeApiProvider, GeocodeProvider, WeatherApi, WeatherApiConfig,
    WeatherApiProvider, WeatherProvider,
};

mod config;
mod routes;

use config::GatewayConfig;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FloodRiskService>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "flood_gateway=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env()?;

    let index = load_index(config.catalog_path.as_deref())?;
    tracing::info!(
        "   Catalog: {} rivers, {} districts, {} facilities",
        index.points(Category::River).count(),
        index.points(Category::District).count(),
        index.points(Category::Facility).count()
    );

    let (weather, geocode) = build_providers(&config)?;

    let service =
        FloodRiskService::new(Arc::new(index), weather, geocode, config.assessment.clone());
    let app = routes::router(AppState {
        service: Arc::new(service),
    });

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("🌊 Flood Gateway starting on {}", addr);
    tracing::info!(
        "   Timeouts: weather {} ms, forecast {} ms, geocode {} ms, budget {} ms",
        config.assessment.weather_timeout_ms,
        config.assessment.forecast_timeout_ms,
        config.assessment.geocode_timeout_ms,
        config.assessment.request_budget_ms
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Built-in catalog unless a JSON catalog path is configured
fn load_index(path: Option<&Path>) -> Result<GeoIndex> {
    let catalog = match path {
        Some(path) => Catalog::from_json_file(path)
            .with_context(|| format!("failed to load catalog from {}", path.display()))?,
        None => Catalog::bangladesh(),
    };
    GeoIndex::new(catalog).context("catalog rejected")
}

/// OpenWeatherMap for both when a key is set, Open-Meteo + Nominatim otherwise
fn build_providers(
    config: &GatewayConfig,
) -> Result<(Arc<dyn WeatherProvider>, Arc<dyn GeocodeProvider>)> {
    let weather_provider = match &config.openweather_api_key {
        Some(api_key) => WeatherApiProvider::OpenWeatherMap {
            api_key: api_key.clone(),
        },
        None => WeatherApiProvider::OpenMeteo,
    };
    let geocode_provider = match &config.openweather_api_key {
        Some(api_key) => GeocodeApiProvider::OpenWeatherMap {
            api_key: api_key.clone(),
        },
        None => GeocodeApiProvider::Nominatim,
    };

    let weather = WeatherApi::new(WeatherApiConfig {
        provider: weather_provider,
        timeout_ms: config.assessment.weather_timeout_ms,
        ..Default::default()
    })?;
    let geocode = GeocodeApi::new(GeocodeApiConfig {
        provider: geocode_provider,
        timeout_ms: config.assessment.geocode_timeout_ms,
        ..Default::default()
    })?;

    tracing::info!("   Weather provider: {}", weather.provider_name());
    Ok((Arc::new(weather), Arc::new(geocode)))
}
