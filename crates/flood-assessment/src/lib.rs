//! Flood Risk Assessment
//!
//! Composes the geo index, the scoring engine and the upstream providers
//! into a single per-request operation that always yields a complete
//! [`RiskAssessment`] for a valid coordinate.
//!
//! Upstream failures never reach the caller. A failed weather call is
//! replaced by synthesized readings and the normal scoring path continues;
//! a failed geocode call is replaced by the nearest catalog district.
//! Confidence drops below the live value whenever anything was substituted.

use chrono::{DateTime, Utc};
use geo_index::Coordinate;
use risk_scoring::{EnvironmentalFactors, Language, RiskLevel, ScoreBreakdown};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use weather_api::ForecastSlot;

pub mod proximity;
pub mod service;
pub mod synthesis;

pub use proximity::{
    emergency_assistance, nearest_river, EmergencyAssistance, PointMatch, EMERGENCY_NUMBERS,
};
pub use service::{AssessmentConfig, FloodRiskService};
pub use synthesis::{fallback_assessment, BoundedRandom, FixedRandom, SeededRandom};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssessmentError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, AssessmentError>;

/// Inbound request. Field names follow the dashboard (`lat`/`lon`);
/// `latitude`/`longitude` are accepted as aliases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessmentRequest {
    #[serde(default, alias = "latitude")]
    pub lat: Option<f64>,
    #[serde(default, alias = "longitude")]
    pub lon: Option<f64>,
    /// Free-text district hint from the caller, e.g. "Sirajganj"
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub lang: Option<Language>,
}

impl AssessmentRequest {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat: Some(lat),
            lon: Some(lon),
            ..Default::default()
        }
    }

    /// Required, finite, in-range coordinate
    pub fn coordinate(&self) -> Result<Coordinate> {
        let (lat, lon) = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => (lat, lon),
            (None, _) => {
                return Err(AssessmentError::InvalidInput("latitude is required".to_string()))
            }
            (_, None) => {
                return Err(AssessmentError::InvalidInput("longitude is required".to_string()))
            }
        };
        Coordinate::new(lat, lon).map_err(|e| AssessmentError::InvalidInput(e.to_string()))
    }

    pub fn language(&self) -> Language {
        self.lang.unwrap_or_default()
    }

    pub fn district_hint(&self) -> Option<&str> {
        self.district.as_deref().map(str::trim).filter(|d| !d.is_empty())
    }
}

/// Where an input came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Live,
    Synthetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    pub weather: SourceKind,
    pub location: SourceKind,
    /// Whole record synthesized without running the scoring engine
    pub last_resort: bool,
}

impl DataSource {
    pub fn is_live(&self) -> bool {
        self.weather == SourceKind::Live && self.location == SourceKind::Live && !self.last_resort
    }
}

/// Environmental factors plus the derived hydrological readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentFactors {
    #[serde(flatten)]
    pub environment: EnvironmentalFactors,
    pub river_level_m: f64,
    pub soil_moisture_pct: f64,
    pub upstream_flow: f64,
}

/// Multiplier from river level (m) to the upstream flow index
pub const UPSTREAM_FLOW_PER_M: f64 = 50.0;

impl AssessmentFactors {
    pub fn new(environment: EnvironmentalFactors, river_level_m: f64) -> Self {
        Self {
            soil_moisture_pct: environment.soil_moisture_pct(),
            upstream_flow: river_level_m * UPSTREAM_FLOW_PER_M,
            river_level_m,
            environment,
        }
    }
}

/// Per-request flood risk record; never mutated after construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    /// Level in the requested language
    pub risk_label: String,
    pub risk_color: String,
    pub risk_score: u8,
    pub confidence_pct: f64,
    pub location_name: String,
    pub nearest_river: String,
    pub river_distance_km: f64,
    pub nearest_district: String,
    pub elevation_m: f64,
    pub factors: AssessmentFactors,
    /// Absent for last-resort records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
    pub outlook: Vec<ForecastSlot>,
    pub data_source: DataSource,
    pub language: Language,
    pub generated_at: DateTime<Utc>,
    pub next_update_at: DateTime<Utc>,
}
