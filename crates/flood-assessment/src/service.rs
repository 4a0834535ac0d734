//! Per-request assessment pipeline

use crate::synthesis::{
    fallback_assessment, fallback_confidence, synthesize_elevation, synthesize_factors,
    synthesize_river_level, BoundedRandom,
};
use crate::{
    AssessmentFactors, AssessmentRequest, DataSource, Result, RiskAssessment, SourceKind,
};
use chrono::{DateTime, Datelike, Duration as ChronoDuration, Utc};
use geo_index::{Category, GeoIndex};
use risk_scoring::{EnvironmentalFactors, Language, LIVE_CONFIDENCE_PCT};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use weather_api::{
    CurrentWeather, ForecastSlot, GeocodeProvider, UpstreamError, WeatherProvider,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentConfig {
    /// Primary weather call
    pub weather_timeout_ms: u64,
    /// Best-effort forecast call
    pub forecast_timeout_ms: u64,
    pub geocode_timeout_ms: u64,
    /// Whole-request ceiling before the last-resort record is returned
    pub request_budget_ms: u64,
    pub forecast_slots: usize,
    /// Offset used to pick the calendar month (Bangladesh: UTC+6)
    pub utc_offset_hours: i64,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            weather_timeout_ms: 5000,
            forecast_timeout_ms: 2000,
            geocode_timeout_ms: 3000,
            request_budget_ms: 8000,
            forecast_slots: 3,
            utc_offset_hours: 6,
        }
    }
}

/// Flood-risk service shared by all requests
pub struct FloodRiskService {
    index: Arc<GeoIndex>,
    weather: Arc<dyn WeatherProvider>,
    geocode: Arc<dyn GeocodeProvider>,
    config: AssessmentConfig,
}

impl FloodRiskService {
    pub fn new(
        index: Arc<GeoIndex>,
        weather: Arc<dyn WeatherProvider>,
        geocode: Arc<dyn GeocodeProvider>,
        config: AssessmentConfig,
    ) -> Self {
        Self {
            index,
            weather,
            geocode,
            config,
        }
    }

    pub fn index(&self) -> &GeoIndex {
        &self.index
    }

    pub fn config(&self) -> &AssessmentConfig {
        &self.config
    }

    /// Calendar month at the configured local offset
    pub fn local_month(&self, now: DateTime<Utc>) -> u32 {
        (now + ChronoDuration::hours(self.config.utc_offset_hours)).month()
    }

    /// Assess flood risk at the requested coordinate.
    ///
    /// Only invalid input is returned as an error, and it is detected before
    /// any provider is called. Provider failures are replaced with synthetic
    /// values; a weather substitution lowers the reported confidence.
    pub async fn assess<R>(
        &self,
        request: &AssessmentRequest,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<RiskAssessment>
    where
        R: BoundedRandom + Send + ?Sized,
    {
        let coordinate = request.coordinate()?;
        let language = request.language();
        let month = self.local_month(now);

        let (current, forecast, place) = tokio::join!(
            bounded(self.config.weather_timeout_ms, self.weather.current(&coordinate)),
            bounded(
                self.config.forecast_timeout_ms,
                self.weather.forecast(&coordinate, self.config.forecast_slots)
            ),
            bounded(self.config.geocode_timeout_ms, self.geocode.reverse(&coordinate)),
        );

        let (environment, weather_source) = match current.and_then(live_factors) {
            Ok(environment) => (environment, SourceKind::Live),
            Err(err) => {
                warn!("Weather fallback at {:?}: {}", coordinate, err);
                (synthesize_factors(rng, language), SourceKind::Synthetic)
            }
        };

        let outlook = match forecast {
            Ok(mut slots) => {
                slots.truncate(self.config.forecast_slots);
                slots
            }
            Err(err) => {
                debug!("Forecast unavailable at {:?}: {}", coordinate, err);
                Vec::<ForecastSlot>::new()
            }
        };

        let (river, river_distance_km) =
            self.index.nearest_with_distance(&coordinate, Category::River);
        let district = self.index.nearest(&coordinate, Category::District);
        let prefer_local = language.is_local();

        let (location_name, location_source) = match place {
            Ok(place) => (place.location_name, SourceKind::Live),
            Err(err) => {
                warn!("Geocode fallback at {:?}: {}", coordinate, err);
                let name = match request.district_hint() {
                    Some(hint) => hint.to_string(),
                    None => format!(
                        "{}, {}",
                        district.display_name(prefer_local),
                        country_name(language)
                    ),
                };
                (name, SourceKind::Synthetic)
            }
        };

        let elevation_m = synthesize_elevation(rng);
        let river_level_m = synthesize_river_level(rng, month);

        let scored = match risk_scoring::score(&environment, elevation_m, month, language) {
            Ok(scored) => scored,
            Err(err) => {
                warn!("Scoring failed at {:?}, returning last-resort record: {}", coordinate, err);
                return Ok(fallback_assessment(rng, now, language));
            }
        };

        let data_source = DataSource {
            weather: weather_source,
            location: location_source,
            last_resort: false,
        };
        // Confidence follows the factor data; a substituted place name does not lower it
        let confidence_pct = if weather_source == SourceKind::Live {
            LIVE_CONFIDENCE_PCT
        } else {
            fallback_confidence(rng)
        };

        info!(
            "Assessed {} ({:?}) at {:.4},{:.4} near {} [weather={:?}, location={:?}]",
            scored.score,
            scored.level,
            coordinate.latitude,
            coordinate.longitude,
            river.name,
            weather_source,
            location_source
        );

        Ok(RiskAssessment {
            risk_level: scored.level,
            risk_label: scored.level.label(language).to_string(),
            risk_color: scored.level.color().to_string(),
            risk_score: scored.score,
            confidence_pct,
            location_name,
            nearest_river: river.display_name(prefer_local).to_string(),
            river_distance_km,
            nearest_district: district.display_name(prefer_local).to_string(),
            elevation_m,
            factors: AssessmentFactors::new(environment, river_level_m),
            breakdown: Some(scored.breakdown),
            recommendations: scored.recommendations,
            warnings: scored.warnings,
            outlook,
            data_source,
            language,
            generated_at: now,
            next_update_at: now + ChronoDuration::hours(1),
        })
    }

    /// [`assess`](Self::assess) under the overall request budget. When the
    /// budget runs out the last-resort record is returned instead.
    pub async fn assess_within_budget<R>(
        &self,
        request: &AssessmentRequest,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<RiskAssessment>
    where
        R: BoundedRandom + Send + ?Sized,
    {
        request.coordinate()?;

        let budget = Duration::from_millis(self.config.request_budget_ms);
        let outcome = tokio::time::timeout(budget, self.assess(request, now, rng)).await;

        match outcome {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Assessment exceeded {} ms budget, returning last-resort record",
                    self.config.request_budget_ms
                );
                Ok(fallback_assessment(rng, now, request.language()))
            }
        }
    }
}

/// Provider call with a hard deadline
async fn bounded<T>(
    timeout_ms: u64,
    call: impl Future<Output = weather_api::Result<T>>,
) -> weather_api::Result<T> {
    match tokio::time::timeout(Duration::from_millis(timeout_ms), call).await {
        Ok(result) => result,
        Err(_) => Err(UpstreamError::Timeout(timeout_ms)),
    }
}

/// Live reading to scoring input; out-of-range values count as malformed
fn live_factors(weather: CurrentWeather) -> weather_api::Result<EnvironmentalFactors> {
    let factors = EnvironmentalFactors {
        precipitation_mm: weather.precipitation_mm,
        humidity_pct: weather.humidity_pct,
        temperature_c: weather.temperature_c,
        wind_speed_kmh: weather.wind_speed_kmh,
        forecast_text: weather.description,
    };
    factors
        .validate()
        .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
    Ok(factors)
}

fn country_name(language: Language) -> &'static str {
    match language {
        Language::En => "Bangladesh",
        Language::Bn => "বাংলাদেশ",
    }
}
