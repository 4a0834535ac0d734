//! Additive score computation

use crate::advice::{generate_recommendations, generate_warnings, Language};
use crate::{is_monsoon, EnvironmentalFactors, FactorError, Result, RiskLevel};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cap on the precipitation term
pub const PRECIPITATION_CAP: f64 = 40.0;
/// Points per mm of precipitation
pub const PRECIPITATION_WEIGHT: f64 = 10.0;
pub const MONSOON_BONUS: f64 = 15.0;

/// Per-term contribution to a score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub precipitation: f64,
    pub humidity: f64,
    pub elevation: f64,
    pub soil_moisture: f64,
    pub seasonal: f64,
}

impl ScoreBreakdown {
    pub fn compute(factors: &EnvironmentalFactors, elevation_m: f64, month: u32) -> Self {
        let precipitation =
            (factors.precipitation_mm * PRECIPITATION_WEIGHT).min(PRECIPITATION_CAP);

        let humidity = match factors.humidity_pct {
            h if h > 80.0 => 20.0,
            h if h > 60.0 => 10.0,
            _ => 0.0,
        };

        let elevation = match elevation_m {
            e if e < 10.0 => 20.0,
            e if e < 50.0 => 10.0,
            _ => 0.0,
        };

        let soil_moisture = match factors.soil_moisture_pct() {
            s if s > 80.0 => 20.0,
            s if s > 60.0 => 10.0,
            _ => 0.0,
        };

        let seasonal = if is_monsoon(month) { MONSOON_BONUS } else { 0.0 };

        Self {
            precipitation,
            humidity,
            elevation,
            soil_moisture,
            seasonal,
        }
    }

    /// Unclamped sum of all terms
    pub fn raw_total(&self) -> f64 {
        self.precipitation + self.humidity + self.elevation + self.soil_moisture + self.seasonal
    }

    /// Sum clamped to [0, 100] and rounded
    pub fn score(&self) -> u8 {
        self.raw_total().clamp(0.0, 100.0).round() as u8
    }
}

/// Engine output for one set of inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub score: u8,
    pub level: RiskLevel,
    pub breakdown: ScoreBreakdown,
    pub soil_moisture_pct: f64,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
}

/// Score a set of factors. Pure: identical inputs give identical output.
pub fn score(
    factors: &EnvironmentalFactors,
    elevation_m: f64,
    month: u32,
    language: Language,
) -> Result<RiskScore> {
    if !(1..=12).contains(&month) {
        return Err(FactorError::InvalidMonth(month));
    }
    if !elevation_m.is_finite() {
        return Err(FactorError::NotFinite { field: "elevation_m" });
    }
    factors.validate()?;

    let breakdown = ScoreBreakdown::compute(factors, elevation_m, month);
    let score = breakdown.score();
    let level = RiskLevel::from_score(score);

    debug!(
        "Scored {} ({:?}): precip={:.1}, hum={:.0}, elev={:.0}, soil={:.0}, season={:.0}",
        score,
        level,
        breakdown.precipitation,
        breakdown.humidity,
        breakdown.elevation,
        breakdown.soil_moisture,
        breakdown.seasonal
    );

    Ok(RiskScore {
        score,
        level,
        soil_moisture_pct: factors.soil_moisture_pct(),
        recommendations: generate_recommendations(
            level,
            factors.precipitation_mm,
            elevation_m,
            language,
        ),
        warnings: generate_warnings(level, factors.precipitation_mm, language),
        breakdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_RECOMMENDATIONS;
    use proptest::prelude::*;

    const JANUARY: u32 = 1;
    const JULY: u32 = 7;

    fn factors(precip: f64, humidity: f64) -> EnvironmentalFactors {
        EnvironmentalFactors {
            precipitation_mm: precip,
            humidity_pct: humidity,
            temperature_c: 31.0,
            wind_speed_kmh: 12.0,
            forecast_text: "rain".to_string(),
        }
    }

    #[test]
    fn test_monsoon_downpour_is_severe() {
        let result = score(&factors(45.0, 85.0), 8.0, JULY, Language::En).unwrap();

        assert_eq!(
            result.breakdown,
            ScoreBreakdown {
                precipitation: 40.0,
                humidity: 20.0,
                elevation: 20.0,
                soil_moisture: 20.0,
                seasonal: 15.0,
            }
        );
        assert_eq!(result.breakdown.raw_total(), 115.0);
        assert_eq!(result.score, 100);
        assert_eq!(result.level, RiskLevel::Severe);

        // 4 urgent + 2 drainage, truncated before asset items
        assert_eq!(result.recommendations.len(), MAX_RECOMMENDATIONS);
        assert_eq!(result.recommendations[0], "Harvest mature crops immediately");
        assert_eq!(result.recommendations[4], "Check field drainage channels");

        // 2 evacuation + heavy rain (45 mm is below the flash-flood threshold)
        assert_eq!(result.warnings.len(), 3);
    }

    #[test]
    fn test_dry_winter_upland_is_medium() {
        let result = score(&factors(5.0, 50.0), 60.0, JANUARY, Language::En).unwrap();
        assert_eq!(result.breakdown.precipitation, 40.0);
        assert_eq!(result.breakdown.humidity, 0.0);
        assert_eq!(result.breakdown.elevation, 0.0);
        // 50 + 25 = 75 soil moisture
        assert_eq!(result.breakdown.soil_moisture, 10.0);
        assert_eq!(result.breakdown.seasonal, 0.0);
        assert_eq!(result.score, 50);
        assert_eq!(result.level, RiskLevel::Medium);
        assert_eq!(result.recommendations.len(), 3);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_no_rain_is_low() {
        let result = score(&factors(0.0, 40.0), 80.0, JANUARY, Language::En).unwrap();
        assert_eq!(result.score, 0);
        assert_eq!(result.level, RiskLevel::Low);
        assert_eq!(result.recommendations[0], "Continue normal farming activities");
    }

    #[test]
    fn test_fractional_precipitation_rounds() {
        // 2.26 mm -> 22.6 points
        let result = score(&factors(2.26, 40.0), 80.0, JANUARY, Language::En).unwrap();
        assert_eq!(result.score, 23);
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        assert_eq!(
            score(&factors(5.0, 50.0), 20.0, 13, Language::En),
            Err(FactorError::InvalidMonth(13))
        );
        assert_eq!(
            score(&factors(5.0, 50.0), 20.0, 0, Language::En),
            Err(FactorError::InvalidMonth(0))
        );
        assert!(score(&factors(5.0, 50.0), f64::NAN, JULY, Language::En).is_err());
        assert!(score(&factors(-5.0, 50.0), 20.0, JULY, Language::En).is_err());
    }

    #[test]
    fn test_bangla_output() {
        let result = score(&factors(45.0, 85.0), 8.0, JULY, Language::Bn).unwrap();
        assert_eq!(result.recommendations[0], "ফসল দ্রুত উঠিয়ে ফেলুন");
    }

    fn valid_factors() -> impl Strategy<Value = EnvironmentalFactors> {
        (0.0..500.0f64, 0.0..=100.0f64, -10.0..50.0f64, 0.0..200.0f64).prop_map(
            |(precip, humidity, temp, wind)| EnvironmentalFactors {
                precipitation_mm: precip,
                humidity_pct: humidity,
                temperature_c: temp,
                wind_speed_kmh: wind,
                forecast_text: String::new(),
            },
        )
    }

    proptest! {
        #[test]
        fn prop_score_is_bounded(
            f in valid_factors(),
            elev in -50.0..3000.0f64,
            month in 1u32..=12,
        ) {
            let result = score(&f, elev, month, Language::En).unwrap();
            prop_assert!(result.score <= 100);
            prop_assert_eq!(result.level, RiskLevel::from_score(result.score));
        }

        #[test]
        fn prop_recommendations_bounded_and_non_empty(
            f in valid_factors(),
            elev in -50.0..3000.0f64,
            month in 1u32..=12,
        ) {
            let result = score(&f, elev, month, Language::En).unwrap();
            prop_assert!(!result.recommendations.is_empty());
            prop_assert!(result.recommendations.len() <= MAX_RECOMMENDATIONS);
        }

        #[test]
        fn prop_scoring_is_deterministic(
            f in valid_factors(),
            elev in -50.0..3000.0f64,
            month in 1u32..=12,
        ) {
            let a = score(&f, elev, month, Language::En).unwrap();
            let b = score(&f, elev, month, Language::En).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_more_rain_never_lowers_score(
            f in valid_factors(),
            extra in 0.0..100.0f64,
            elev in -50.0..3000.0f64,
            month in 1u32..=12,
        ) {
            let mut wetter = f.clone();
            wetter.precipitation_mm += extra;
            let base = score(&f, elev, month, Language::En).unwrap();
            let more = score(&wetter, elev, month, Language::En).unwrap();
            prop_assert!(more.score >= base.score);
        }
    }
}
