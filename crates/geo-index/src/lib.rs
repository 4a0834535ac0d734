//! Geospatial Index
//!
//! Read-only catalog of named points (rivers, emergency facilities,
//! district centroids) with nearest-point and great-circle distance queries.
//!
//! Nearest-point selection uses squared planar distance on raw degrees.
//! Reported distances use the haversine formula. The two are not
//! proportional at Bangladesh latitudes; the planar search is kept as a
//! known approximation over a small country-sized bounding box.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

pub mod catalog;
pub mod index;

pub use catalog::Catalog;
pub use index::GeoIndex;

/// Mean Earth radius in km
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Invalid coordinate: lat={latitude}, lon={longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
    #[error("Catalog has no {0:?} entries")]
    EmptyCategory(Category),
    #[error("Catalog entry {name:?} is invalid: {reason}")]
    InvalidEntry { name: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GeoError>;

/// WGS84 coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Validated constructor. Rejects non-finite and out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let coordinate = Self { latitude, longitude };
        if coordinate.is_valid() {
            Ok(coordinate)
        } else {
            Err(GeoError::InvalidCoordinate { latitude, longitude })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Squared Euclidean distance in degree-space
    pub fn planar_distance_sq(&self, other: &Coordinate) -> f64 {
        (self.latitude - other.latitude).powi(2) + (self.longitude - other.longitude).powi(2)
    }

    /// Great-circle distance in km
    pub fn haversine_km(&self, other: &Coordinate) -> f64 {
        haversine_km(self, other)
    }
}

/// Catalog layer a point belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    River,
    Facility,
    District,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::River, Category::Facility, Category::District];
}

/// Extra attributes carried by emergency facilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityDetails {
    /// e.g. "hospital", "shelter"
    pub facility_type: String,
    pub capacity: String,
    pub contact: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPoint {
    pub name: String,
    /// Bangla name, when the catalog has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
    pub coordinate: Coordinate,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility: Option<FacilityDetails>,
}

impl NamedPoint {
    pub fn river(name: &str, local_name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.to_string(),
            local_name: Some(local_name.to_string()),
            coordinate: Coordinate { latitude, longitude },
            category: Category::River,
            facility: None,
        }
    }

    pub fn district(name: &str, local_name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.to_string(),
            local_name: Some(local_name.to_string()),
            coordinate: Coordinate { latitude, longitude },
            category: Category::District,
            facility: None,
        }
    }

    pub fn facility(
        name: &str,
        local_name: &str,
        latitude: f64,
        longitude: f64,
        details: FacilityDetails,
    ) -> Self {
        Self {
            name: name.to_string(),
            local_name: Some(local_name.to_string()),
            coordinate: Coordinate { latitude, longitude },
            category: Category::Facility,
            facility: Some(details),
        }
    }

    /// Local name when requested and available, English name otherwise
    pub fn display_name(&self, prefer_local: bool) -> &str {
        match (&self.local_name, prefer_local) {
            (Some(local), true) => local,
            _ => &self.name,
        }
    }

    pub fn facility_type(&self) -> Option<&str> {
        self.facility.as_ref().map(|f| f.facility_type.as_str())
    }
}

/// Haversine distance between two coordinates in km
pub fn haversine_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1_rad = a.latitude * PI / 180.0;
    let lat2_rad = b.latitude * PI / 180.0;
    let dlat = (b.latitude - a.latitude) * PI / 180.0;
    let dlon = (b.longitude - a.longitude) * PI / 180.0;

    let h = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}
