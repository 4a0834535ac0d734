//! Nearest river and emergency facility lookups

use geo_index::catalog::{FACILITY_HOSPITAL, FACILITY_SHELTER};
use geo_index::{Category, Coordinate, FacilityDetails, GeoIndex, NamedPoint};
use risk_scoring::Language;
use serde::{Deserialize, Serialize};

/// National emergency, disaster and women/child helplines
pub const EMERGENCY_NUMBERS: [&str; 3] = ["999", "1090", "106"];

/// A catalog point with its distance from the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointMatch {
    pub name: String,
    pub category: Category,
    pub coordinate: Coordinate,
    pub distance_km: f64,
    /// Distance rendered for display, e.g. "3.2 km" or "৩.২ কি.মি."
    pub distance_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility: Option<FacilityDetails>,
}

impl PointMatch {
    fn new(point: &NamedPoint, distance_km: f64, language: Language) -> Self {
        Self {
            name: point.display_name(language.is_local()).to_string(),
            category: point.category,
            coordinate: point.coordinate,
            distance_km,
            distance_text: format_distance(distance_km, language),
            facility: point.facility.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyAssistance {
    pub nearest_hospital: Option<PointMatch>,
    pub nearest_shelter: Option<PointMatch>,
    pub emergency_numbers: Vec<String>,
}

pub fn nearest_river(index: &GeoIndex, coordinate: &Coordinate, language: Language) -> PointMatch {
    let (river, km) = index.nearest_with_distance(coordinate, Category::River);
    PointMatch::new(river, km, language)
}

/// Nearest hospital and shelter plus the hotline numbers.
/// A facility type missing from the catalog yields `None`.
pub fn emergency_assistance(
    index: &GeoIndex,
    coordinate: &Coordinate,
    language: Language,
) -> EmergencyAssistance {
    let lookup = |facility_type: &str| {
        index
            .nearest_facility(coordinate, facility_type)
            .map(|(point, km)| PointMatch::new(point, km, language))
    };

    EmergencyAssistance {
        nearest_hospital: lookup(FACILITY_HOSPITAL),
        nearest_shelter: lookup(FACILITY_SHELTER),
        emergency_numbers: EMERGENCY_NUMBERS.iter().map(|n| n.to_string()).collect(),
    }
}

pub fn format_distance(km: f64, language: Language) -> String {
    match language {
        Language::En => format!("{:.1} km", km),
        Language::Bn => format!("{} কি.মি.", to_bengali_digits(&format!("{:.1}", km))),
    }
}

fn to_bengali_digits(text: &str) -> String {
    text.chars()
        .map(|c| c.to_digit(10).and_then(|d| char::from_u32(0x09E6 + d)).unwrap_or(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> GeoIndex {
        GeoIndex::bangladesh().unwrap()
    }

    #[test]
    fn test_nearest_river_sirajganj() {
        let here = Coordinate::new(24.4539, 89.7083).unwrap();
        let river = nearest_river(&index(), &here, Language::En);
        assert_eq!(river.name, "Jamuna River");
        assert_eq!(river.category, Category::River);
        assert!(river.distance_km < 20.0);
        assert!(river.distance_text.ends_with(" km"));
    }

    #[test]
    fn test_nearest_river_bangla() {
        let here = Coordinate::new(24.4539, 89.7083).unwrap();
        let river = nearest_river(&index(), &here, Language::Bn);
        assert_eq!(river.name, "যমুনা নদী");
        assert!(river.distance_text.ends_with("কি.মি."));
        assert!(!river.distance_text.chars().any(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_emergency_assistance_dhaka() {
        let dhaka = Coordinate::new(23.7261, 90.3977).unwrap();
        let help = emergency_assistance(&index(), &dhaka, Language::En);

        let hospital = help.nearest_hospital.unwrap();
        assert_eq!(hospital.facility.unwrap().facility_type, FACILITY_HOSPITAL);
        assert!(hospital.distance_km < 10.0);

        let shelter = help.nearest_shelter.unwrap();
        assert_eq!(shelter.facility.unwrap().facility_type, FACILITY_SHELTER);
        assert_eq!(help.emergency_numbers, vec!["999", "1090", "106"]);
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(3.24, Language::En), "3.2 km");
        assert_eq!(format_distance(12.0, Language::Bn), "১২.০ কি.মি.");
        assert_eq!(to_bengali_digits("a1-9"), "a১-৯");
    }
}
