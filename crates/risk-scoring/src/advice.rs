//! Farmer advisories
//!
//! Recommendations and warnings are rule-based and additive. Rules fire in
//! a fixed order so output order is stable for a given input.

use crate::RiskLevel;
use serde::{Deserialize, Serialize};

pub const MAX_RECOMMENDATIONS: usize = 6;

/// Rain above this (mm) triggers drainage advice
pub const DRAINAGE_PRECIP_MM: f64 = 20.0;
/// Land below this (m) triggers asset relocation advice
pub const LOW_LYING_ELEVATION_M: f64 = 20.0;
/// Rain above this (mm) suspends outdoor work and raises a heavy-rain warning
pub const HEAVY_RAIN_MM: f64 = 30.0;
/// Rain above this (mm) raises a flash-flood warning
pub const FLASH_FLOOD_MM: f64 = 50.0;

/// Output language for all human-readable strings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Bn,
}

impl Language {
    pub fn is_local(&self) -> bool {
        matches!(self, Language::Bn)
    }
}

/// (English, Bangla)
type Text = (&'static str, &'static str);

const URGENT: [Text; 4] = [
    ("Harvest mature crops immediately", "ফসল দ্রুত উঠিয়ে ফেলুন"),
    ("Move livestock to higher ground", "গবাদি পশু নিরাপদ স্থানে নিয়ে যান"),
    ("Keep emergency contact numbers at hand", "জরুরি যোগাযোগ নম্বর হাতে রাখুন"),
    ("Learn the route to the nearest safe shelter", "নিকটস্থ নিরাপদ আশ্রয়ের পথ চিনে রাখুন"),
];

const DRAINAGE: [Text; 2] = [
    ("Check field drainage channels", "জমিতে জল নিষ্কাশন ব্যবস্থা পরীক্ষা করুন"),
    ("Clear the drains around your home", "বাড়ির চারপাশের ড্রেন পরিষ্কার করুন"),
];

const ASSETS: [Text; 2] = [
    ("Move valuables to higher ground", "উঁচু জায়গায় সম্পদ সরিয়ে ফেলুন"),
    ("Move stored produce to a safe place", "গুদামজাত পণ্য নিরাপদ স্থানে নিন"),
];

const OUTDOOR: [Text; 2] = [
    ("Suspend outdoor work", "বাহিরের কাজ বন্ধ রাখুন"),
    ("Keep electrical equipment raised off the floor", "বৈদ্যুতিক সরঞ্জাম উঁচু স্থানে রাখুন"),
];

const BUSINESS_AS_USUAL: [Text; 3] = [
    ("Continue normal farming activities", "স্বাভাবিক কৃষিকাজ চালিয়ে যান"),
    ("Check the weather forecast regularly", "আবহাওয়ার পূর্বাভাস নিয়মিত দেখুন"),
    ("Prepare an emergency plan", "জরুরি প্রস্তুতি পরিকল্পনা তৈরি করুন"),
];

const EVACUATE: [Text; 2] = [
    ("🚨 Move to a safe shelter immediately", "🚨 অবিলম্বে নিরাপদ আশ্রয়ে যান"),
    (
        "🔴 Follow instructions from local authorities",
        "🔴 স্থানীয় কর্তৃপক্ষের নির্দেশনা অনুসরণ করুন",
    ),
];

const PREPARE: [Text; 2] = [
    ("⚠️ Start preparations now", "⚠️ তাৎক্ষণিক প্রস্তুতি গ্রহণ করুন"),
    ("📢 Alert your family members", "📢 পরিবারের সদস্যদের সতর্ক করুন"),
];

const HEAVY_RAIN: Text = (
    "🌧️ Heavy rain likely - stay alert",
    "🌧️ ভারী বৃষ্টির সম্ভাবনা - সতর্ক থাকুন",
);

const FLASH_FLOOD: Text = (
    "💧 Very heavy rain - flash flooding possible",
    "💧 অতি ভারী বৃষ্টি - আকস্মিক বন্যার সম্ভাবনা",
);

const MODERATE_FLOOD: Text = ("Moderate flood risk possible", "মাঝারি বন্যার সম্ভাবনা");

const MODERATE_RAIN: Text = ("Moderate rain", "মাঝারি বৃষ্টি");

fn pick(text: Text, language: Language) -> String {
    match language {
        Language::En => text.0.to_string(),
        Language::Bn => text.1.to_string(),
    }
}

fn extend(out: &mut Vec<String>, texts: &[Text], language: Language) {
    out.extend(texts.iter().map(|t| pick(*t, language)));
}

/// Ordered recommendations, never empty, at most `MAX_RECOMMENDATIONS`
pub fn generate_recommendations(
    level: RiskLevel,
    precipitation_mm: f64,
    elevation_m: f64,
    language: Language,
) -> Vec<String> {
    let mut recommendations = Vec::with_capacity(10);

    if level.is_elevated() {
        extend(&mut recommendations, &URGENT, language);
    }
    if precipitation_mm > DRAINAGE_PRECIP_MM {
        extend(&mut recommendations, &DRAINAGE, language);
    }
    if elevation_m < LOW_LYING_ELEVATION_M {
        extend(&mut recommendations, &ASSETS, language);
    }
    if precipitation_mm > HEAVY_RAIN_MM {
        extend(&mut recommendations, &OUTDOOR, language);
    }
    if recommendations.is_empty() {
        extend(&mut recommendations, &BUSINESS_AS_USUAL, language);
    }

    recommendations.truncate(MAX_RECOMMENDATIONS);
    recommendations
}

/// Ordered warnings; may be empty, never truncated
pub fn generate_warnings(
    level: RiskLevel,
    precipitation_mm: f64,
    language: Language,
) -> Vec<String> {
    let mut warnings = Vec::new();

    match level {
        RiskLevel::Severe => extend(&mut warnings, &EVACUATE, language),
        RiskLevel::High => extend(&mut warnings, &PREPARE, language),
        RiskLevel::Medium | RiskLevel::Low => {}
    }
    if precipitation_mm > HEAVY_RAIN_MM {
        warnings.push(pick(HEAVY_RAIN, language));
    }
    if precipitation_mm > FLASH_FLOOD_MM {
        warnings.push(pick(FLASH_FLOOD, language));
    }

    warnings
}

/// Generic notice used when a synthetic record has no rule-driven warning
pub fn moderate_flood_notice(language: Language) -> String {
    pick(MODERATE_FLOOD, language)
}

/// Forecast text attached to synthesized weather
pub fn synthetic_forecast_text(language: Language) -> String {
    pick(MODERATE_RAIN, language)
}
