//! Synthetic readings
//!
//! Plausible Bangladesh-monsoon values used whenever live data is missing.
//! All randomness goes through [`BoundedRandom`] so tests can pin outputs.

use crate::{AssessmentFactors, DataSource, RiskAssessment, SourceKind};
use chrono::{DateTime, Duration, Utc};
use geo_index::Coordinate;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use risk_scoring::advice::{moderate_flood_notice, synthetic_forecast_text};
use risk_scoring::{
    generate_recommendations, generate_warnings, is_monsoon, EnvironmentalFactors, Language,
    RiskLevel, LIVE_CONFIDENCE_PCT,
};

pub const PRECIPITATION_MM: (f64, f64) = (15.0, 35.0);
pub const TEMPERATURE_C: (f64, f64) = (28.0, 35.0);
pub const HUMIDITY_PCT: (f64, f64) = (70.0, 90.0);
pub const WIND_SPEED_KMH: (f64, f64) = (5.0, 15.0);
pub const ELEVATION_M: (f64, f64) = (15.0, 100.0);
pub const MONSOON_RIVER_BASE_M: f64 = 6.5;
pub const DRY_RIVER_BASE_M: f64 = 4.5;
pub const RIVER_JITTER_M: f64 = 3.0;

/// Confidence range whenever any input was synthesized; strictly below live
pub const FALLBACK_CONFIDENCE_PCT: (f64, f64) = (75.0, 85.0);

/// Last-resort record ranges
pub const LAST_RESORT_SCORE: (f64, f64) = (45.0, 85.0);
pub const LAST_RESORT_RIVER_LEVEL_M: (f64, f64) = (4.0, 10.0);
pub const LAST_RESORT_ELEVATION_M: (f64, f64) = (10.0, 50.0);

/// Source of bounded uniform samples
pub trait BoundedRandom {
    /// Uniform sample in `[min, max)`; returns `min` when the range is empty
    fn uniform(&mut self, min: f64, max: f64) -> f64;
}

/// ChaCha8-backed generator
pub struct SeededRandom(ChaCha8Rng);

impl SeededRandom {
    pub fn from_entropy() -> Self {
        Self(ChaCha8Rng::from_entropy())
    }

    pub fn from_seed_u64(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl BoundedRandom for SeededRandom {
    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        self.0.gen_range(min..max)
    }
}

/// Always returns the same fraction of the requested range
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom {
    fraction: f64,
}

impl FixedRandom {
    /// `fraction` is clamped into `[0, 1)`
    pub fn new(fraction: f64) -> Self {
        Self {
            fraction: fraction.clamp(0.0, 1.0 - f64::EPSILON),
        }
    }

    pub fn low() -> Self {
        Self::new(0.0)
    }

    pub fn mid() -> Self {
        Self::new(0.5)
    }
}

impl BoundedRandom for FixedRandom {
    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        // min + span * fraction can round up to max
        (min + (max - min) * self.fraction).min(just_below(max))
    }
}

/// Largest f64 strictly less than `value`
fn just_below(value: f64) -> f64 {
    if value > 0.0 {
        f64::from_bits(value.to_bits() - 1)
    } else if value < 0.0 {
        f64::from_bits(value.to_bits() + 1)
    } else {
        -f64::from_bits(1)
    }
}

fn sample<R: BoundedRandom + ?Sized>(rng: &mut R, range: (f64, f64)) -> f64 {
    rng.uniform(range.0, range.1)
}

/// Synthetic weather within regional monsoon bounds; never fails
pub fn synthesize_factors<R: BoundedRandom + ?Sized>(
    rng: &mut R,
    language: Language,
) -> EnvironmentalFactors {
    EnvironmentalFactors {
        precipitation_mm: sample(rng, PRECIPITATION_MM),
        temperature_c: sample(rng, TEMPERATURE_C),
        humidity_pct: sample(rng, HUMIDITY_PCT),
        wind_speed_kmh: sample(rng, WIND_SPEED_KMH),
        forecast_text: synthetic_forecast_text(language),
    }
}

/// 15-100 m, squared draw so low-lying values dominate
pub fn synthesize_elevation<R: BoundedRandom + ?Sized>(rng: &mut R) -> f64 {
    let u = rng.uniform(0.0, 1.0);
    ELEVATION_M.0 + (ELEVATION_M.1 - ELEVATION_M.0) * u * u
}

/// Seasonal baseline plus up to 3 m of jitter
pub fn synthesize_river_level<R: BoundedRandom + ?Sized>(rng: &mut R, month: u32) -> f64 {
    let base = if is_monsoon(month) {
        MONSOON_RIVER_BASE_M
    } else {
        DRY_RIVER_BASE_M
    };
    base + rng.uniform(0.0, RIVER_JITTER_M)
}

/// Always strictly below the live confidence, whatever the generator returns
pub fn fallback_confidence<R: BoundedRandom + ?Sized>(rng: &mut R) -> f64 {
    sample(rng, FALLBACK_CONFIDENCE_PCT)
        .clamp(FALLBACK_CONFIDENCE_PCT.0, just_below(LIVE_CONFIDENCE_PCT))
}

// Last-resort location: Sirajganj on the Jamuna
const FALLBACK_DISTRICT: (&str, &str) = ("Sirajganj", "সিরাজগঞ্জ");
const FALLBACK_LOCATION: (&str, &str) = ("Sirajganj, Bangladesh", "সিরাজগঞ্জ, বাংলাদেশ");
const FALLBACK_RIVER: (&str, &str) = ("Jamuna River", "যমুনা নদী");
const FALLBACK_DISTRICT_COORD: Coordinate = Coordinate { latitude: 24.4539, longitude: 89.7083 };
const FALLBACK_RIVER_COORD: Coordinate = Coordinate { latitude: 24.5, longitude: 89.8 };

fn localized(text: (&str, &str), language: Language) -> String {
    match language {
        Language::En => text.0.to_string(),
        Language::Bn => text.1.to_string(),
    }
}

/// Complete synthetic record produced without the scoring engine.
///
/// Every field is populated and mutually consistent: the level matches the
/// score band and the advisories follow the same rules as a scored record.
pub fn fallback_assessment<R: BoundedRandom + ?Sized>(
    rng: &mut R,
    now: DateTime<Utc>,
    language: Language,
) -> RiskAssessment {
    let risk_score = sample(rng, LAST_RESORT_SCORE).round().clamp(0.0, 100.0) as u8;
    let risk_level = RiskLevel::from_score(risk_score);

    let environment = synthesize_factors(rng, language);
    let river_level_m = sample(rng, LAST_RESORT_RIVER_LEVEL_M);
    let elevation_m = sample(rng, LAST_RESORT_ELEVATION_M);
    let confidence_pct = fallback_confidence(rng);

    let recommendations =
        generate_recommendations(risk_level, environment.precipitation_mm, elevation_m, language);
    let mut warnings = generate_warnings(risk_level, environment.precipitation_mm, language);
    if warnings.is_empty() {
        warnings.push(moderate_flood_notice(language));
    }

    RiskAssessment {
        risk_level,
        risk_label: risk_level.label(language).to_string(),
        risk_color: risk_level.color().to_string(),
        risk_score,
        confidence_pct,
        location_name: localized(FALLBACK_LOCATION, language),
        nearest_river: localized(FALLBACK_RIVER, language),
        river_distance_km: FALLBACK_DISTRICT_COORD.haversine_km(&FALLBACK_RIVER_COORD),
        nearest_district: localized(FALLBACK_DISTRICT, language),
        elevation_m,
        factors: AssessmentFactors::new(environment, river_level_m),
        breakdown: None,
        recommendations,
        warnings,
        outlook: Vec::new(),
        data_source: DataSource {
            weather: SourceKind::Synthetic,
            location: SourceKind::Synthetic,
            last_resort: true,
        },
        language,
        generated_at: now,
        next_update_at: now + Duration::hours(1),
    }
}
