//! Nearest-point index over a validated catalog

use crate::{Catalog, Category, Coordinate, NamedPoint, Result};
use tracing::info;

/// Read-only index, built once at startup and shared across requests.
///
/// Each category layer is non-empty (checked in `new`), so queries never fail.
#[derive(Debug, Clone)]
pub struct GeoIndex {
    rivers: Vec<NamedPoint>,
    facilities: Vec<NamedPoint>,
    districts: Vec<NamedPoint>,
}

impl GeoIndex {
    pub fn new(catalog: Catalog) -> Result<Self> {
        catalog.validate()?;

        let mut index = Self {
            rivers: Vec::new(),
            facilities: Vec::new(),
            districts: Vec::new(),
        };
        for point in catalog.points {
            match point.category {
                Category::River => index.rivers.push(point),
                Category::Facility => index.facilities.push(point),
                Category::District => index.districts.push(point),
            }
        }

        info!(
            "Geo index ready: {} rivers, {} facilities, {} districts",
            index.rivers.len(),
            index.facilities.len(),
            index.districts.len()
        );
        Ok(index)
    }

    pub fn bangladesh() -> Result<Self> {
        Self::new(Catalog::bangladesh())
    }

    fn layer(&self, category: Category) -> &[NamedPoint] {
        match category {
            Category::River => &self.rivers,
            Category::Facility => &self.facilities,
            Category::District => &self.districts,
        }
    }

    pub fn points(&self, category: Category) -> impl Iterator<Item = &NamedPoint> {
        self.layer(category).iter()
    }

    /// Nearest point of `category` by planar degree distance.
    /// Ties keep the earlier catalog entry.
    pub fn nearest(&self, coordinate: &Coordinate, category: Category) -> &NamedPoint {
        let layer = self.layer(category);
        nearest_in(layer.iter(), coordinate).unwrap_or(&layer[0])
    }

    /// Nearest point plus its great-circle distance in km
    pub fn nearest_with_distance(
        &self,
        coordinate: &Coordinate,
        category: Category,
    ) -> (&NamedPoint, f64) {
        let point = self.nearest(coordinate, category);
        (point, point.coordinate.haversine_km(coordinate))
    }

    /// Nearest facility of the given type ("hospital", "shelter", ...)
    pub fn nearest_facility(
        &self,
        coordinate: &Coordinate,
        facility_type: &str,
    ) -> Option<(&NamedPoint, f64)> {
        let matching = self
            .facilities
            .iter()
            .filter(|p| p.facility_type().is_some_and(|t| t.eq_ignore_ascii_case(facility_type)));

        nearest_in(matching, coordinate).map(|p| (p, p.coordinate.haversine_km(coordinate)))
    }
}

/// Linear scan with a strict less-than update
fn nearest_in<'a>(
    points: impl Iterator<Item = &'a NamedPoint>,
    coordinate: &Coordinate,
) -> Option<&'a NamedPoint> {
    let mut best: Option<(&NamedPoint, f64)> = None;
    for point in points {
        let dist = coordinate.planar_distance_sq(&point.coordinate);
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((point, dist)),
        }
    }
    best.map(|(p, _)| p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FACILITY_HOSPITAL, FACILITY_SHELTER};
    use crate::FacilityDetails;

    fn index() -> GeoIndex {
        GeoIndex::bangladesh().unwrap()
    }

    fn shelter(name: &str, lat: f64, lon: f64) -> NamedPoint {
        NamedPoint::facility(
            name,
            name,
            lat,
            lon,
            FacilityDetails {
                facility_type: FACILITY_SHELTER.to_string(),
                capacity: "100 people".to_string(),
                contact: "1090".to_string(),
                address: "test".to_string(),
            },
        )
    }

    #[test]
    fn test_exact_match_returns_entry_with_zero_distance() {
        let index = index();
        for category in Category::ALL {
            for point in index.points(category) {
                let (nearest, km) = index.nearest_with_distance(&point.coordinate, category);
                assert_eq!(nearest.coordinate, point.coordinate);
                assert!(km.abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_nearest_river() {
        let index = index();
        // Sirajganj sits on the Jamuna
        let sirajganj = Coordinate::new(24.4539, 89.7083).unwrap();
        assert_eq!(index.nearest(&sirajganj, Category::River).name, "Jamuna River");

        // Old Dhaka is closest to the Buriganga
        let dhaka = Coordinate::new(23.71, 90.41).unwrap();
        assert_eq!(index.nearest(&dhaka, Category::River).name, "Buriganga River");
    }

    #[test]
    fn test_nearest_is_minimum_planar_distance() {
        let index = index();
        let query = Coordinate::new(24.1, 90.9).unwrap();
        let nearest = index.nearest(&query, Category::District);
        let best = index
            .points(Category::District)
            .map(|p| query.planar_distance_sq(&p.coordinate))
            .fold(f64::INFINITY, f64::min);
        assert_eq!(query.planar_distance_sq(&nearest.coordinate), best);
    }

    #[test]
    fn test_tie_keeps_first_declared() {
        let catalog = Catalog::new(vec![
            NamedPoint::river("West", "West", 24.0, 89.0),
            NamedPoint::river("East", "East", 24.0, 91.0),
            NamedPoint::district("Mid", "Mid", 24.0, 90.0),
            shelter("Shelter", 24.0, 90.0),
        ]);
        let index = GeoIndex::new(catalog).unwrap();
        let midpoint = Coordinate::new(24.0, 90.0).unwrap();
        assert_eq!(index.nearest(&midpoint, Category::River).name, "West");
    }

    #[test]
    fn test_empty_category_fails_at_construction() {
        let catalog = Catalog::new(vec![NamedPoint::river("Padma River", "পদ্মা নদী", 23.5, 90.0)]);
        assert!(GeoIndex::new(catalog).is_err());
    }

    #[test]
    fn test_nearest_facility_by_type() {
        let index = index();
        let dhaka = Coordinate::new(23.75, 90.38).unwrap();

        let (hospital, hospital_km) = index.nearest_facility(&dhaka, FACILITY_HOSPITAL).unwrap();
        assert_eq!(hospital.name, "Dhaka Medical College Hospital");
        assert!(hospital_km < 10.0);

        let (shelter, _) = index.nearest_facility(&dhaka, "Shelter").unwrap();
        assert_eq!(shelter.facility_type(), Some(FACILITY_SHELTER));
        assert_eq!(shelter.name, "Mohammadpur Cyclone Shelter");

        assert!(index.nearest_facility(&dhaka, "school").is_none());
    }
}
