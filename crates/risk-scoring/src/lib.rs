//! Flood Risk Scoring Engine
//!
//! Converts environmental readings into a bounded 0-100 risk score, a
//! categorical level, and rule-based recommendations and warnings.
//!
//! # Scoring Model (additive, each term capped before summing)
//!
//! | Term          | Points | Rule |
//! |---------------|--------|------|
//! | Precipitation | 0-40   | `min(precip_mm * 10, 40)` |
//! | Humidity      | 0/10/20| `>60` / `>80` % |
//! | Elevation     | 0/10/20| `<50` / `<10` m |
//! | Soil moisture | 0/10/20| `min(humidity + precip*5, 100)` `>60` / `>80` |
//! | Monsoon       | 0/15   | June-September |
//!
//! The sum is clamped to `[0, 100]`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod advice;
pub mod scorer;

pub use advice::{generate_recommendations, generate_warnings, Language, MAX_RECOMMENDATIONS};
pub use scorer::{score, RiskScore, ScoreBreakdown};

/// Confidence reported when factors come from live provider data
pub const LIVE_CONFIDENCE_PCT: f64 = 85.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FactorError {
    #[error("{field} is not a finite number")]
    NotFinite { field: &'static str },
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("Invalid month: {0}")]
    InvalidMonth(u32),
}

pub type Result<T> = std::result::Result<T, FactorError>;

/// Weather readings feeding the score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalFactors {
    /// Precipitation (mm), >= 0
    pub precipitation_mm: f64,
    /// Relative humidity (0-100)
    pub humidity_pct: f64,
    pub temperature_c: f64,
    /// Wind speed (km/h), >= 0
    pub wind_speed_kmh: f64,
    /// Provider weather description, e.g. "moderate rain"
    pub forecast_text: String,
}

impl EnvironmentalFactors {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("precipitation_mm", self.precipitation_mm),
            ("humidity_pct", self.humidity_pct),
            ("temperature_c", self.temperature_c),
            ("wind_speed_kmh", self.wind_speed_kmh),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(FactorError::NotFinite { field });
            }
        }

        if self.precipitation_mm < 0.0 {
            return Err(FactorError::OutOfRange {
                field: "precipitation_mm",
                value: self.precipitation_mm,
            });
        }
        if !(0.0..=100.0).contains(&self.humidity_pct) {
            return Err(FactorError::OutOfRange {
                field: "humidity_pct",
                value: self.humidity_pct,
            });
        }
        if self.wind_speed_kmh < 0.0 {
            return Err(FactorError::OutOfRange {
                field: "wind_speed_kmh",
                value: self.wind_speed_kmh,
            });
        }
        Ok(())
    }

    /// Simulated soil saturation (0-100)
    pub fn soil_moisture_pct(&self) -> f64 {
        (self.humidity_pct + self.precipitation_mm * 5.0).min(100.0)
    }
}

/// Categorical risk bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Severe,
}

impl RiskLevel {
    pub const SEVERE_MIN: u8 = 80;
    pub const HIGH_MIN: u8 = 60;
    pub const MEDIUM_MIN: u8 = 30;

    /// Lower bound of each band is inclusive
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= Self::SEVERE_MIN => RiskLevel::Severe,
            s if s >= Self::HIGH_MIN => RiskLevel::High,
            s if s >= Self::MEDIUM_MIN => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    pub fn is_elevated(&self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Severe)
    }

    pub fn label(&self, language: Language) -> &'static str {
        match (self, language) {
            (RiskLevel::Low, Language::En) => "Low",
            (RiskLevel::Medium, Language::En) => "Medium",
            (RiskLevel::High, Language::En) => "High",
            (RiskLevel::Severe, Language::En) => "Severe",
            (RiskLevel::Low, Language::Bn) => "নিম্ন",
            (RiskLevel::Medium, Language::Bn) => "মধ্যম",
            (RiskLevel::High, Language::Bn) => "উচ্চ",
            (RiskLevel::Severe, Language::Bn) => "অতি উচ্চ",
        }
    }

    /// Dashboard colour for the level badge
    pub fn color(&self) -> &'static str {
        match self {
            RiskLevel::Low => "#22c55e",
            RiskLevel::Medium => "#eab308",
            RiskLevel::High => "#f97316",
            RiskLevel::Severe => "#ef4444",
        }
    }
}

/// June through September
pub fn is_monsoon(month: u32) -> bool {
    (6..=9).contains(&month)
}
