//! Static point catalog
//!
//! The built-in catalog covers the major Bangladesh river systems, the
//! flood-prone district headquarters and a set of shelters and hospitals.
//! An alternative catalog can be loaded from JSON at startup.

use crate::{Category, Coordinate, FacilityDetails, GeoError, NamedPoint, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

pub const FACILITY_HOSPITAL: &str = "hospital";
pub const FACILITY_SHELTER: &str = "shelter";

/// Ordered list of catalog points. Declaration order is significant:
/// the first of several equidistant points wins a nearest-point query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub points: Vec<NamedPoint>,
}

impl Catalog {
    pub fn new(points: Vec<NamedPoint>) -> Self {
        Self { points }
    }

    /// Built-in Bangladesh catalog
    pub fn bangladesh() -> Self {
        let mut points = Vec::with_capacity(64);

        let rivers = [
            ("Padma River", "পদ্মা নদী", 23.5, 90.0),
            ("Jamuna River", "যমুনা নদী", 24.5, 89.8),
            ("Meghna River", "মেঘনা নদী", 23.0, 90.7),
            ("Brahmaputra River", "ব্রহ্মপুত্র নদ", 25.0, 90.0),
            ("Buriganga River", "বুরিগঙ্গা নদী", 23.7, 90.4),
            ("Teesta River", "তিস্তা নদী", 25.8, 88.9),
            ("Madhumati River", "মধুমতি নদী", 23.1, 89.9),
            ("Karnaphuli River", "কর্ণফুলী নদী", 22.3, 91.8),
            ("Surma River", "সুরমা নদী", 24.9, 91.9),
            ("Atrai River", "আত্রাই নদী", 24.3, 88.5),
            ("Feni River", "ফেনী নদী", 22.8, 91.9),
            ("Halda River", "হালদা নদী", 22.9, 91.9),
            ("Shitalakshya River", "শীতলক্ষ্যা নদী", 23.9, 90.5),
        ];
        for (name, local, lat, lon) in rivers {
            points.push(NamedPoint::river(name, local, lat, lon));
        }

        let districts = [
            ("Sirajganj", "সিরাজগঞ্জ", 24.4539, 89.7083),
            ("Kurigram", "কুড়িগ্রাম", 25.8054, 89.6362),
            ("Gaibandha", "গাইবান্ধা", 25.3287, 89.5281),
            ("Bogura", "বগুড়া", 24.8465, 89.3773),
            ("Jamalpur", "জামালপুর", 24.9375, 89.9373),
            ("Sunamganj", "সুনামগঞ্জ", 25.0659, 91.3950),
            ("Sylhet", "সিলেট", 24.8918, 91.8830),
            ("Netrokona", "নেত্রকোণা", 24.8859, 90.7290),
            ("Kishoreganj", "কিশোরগঞ্জ", 24.4448, 90.7826),
            ("Munshiganj", "মুন্সীগঞ্জ", 23.5483, 90.5250),
            ("Shariatpur", "শরীয়তপুর", 23.2064, 90.3478),
            ("Rangpur", "রংপুর", 25.7439, 89.2752),
            ("Nilphamari", "নীলফামারী", 25.9667, 88.9500),
            ("Lalmonirhat", "লালমনিরহাট", 25.9167, 89.4500),
            ("Dinajpur", "দিনাজপুর", 25.6217, 88.6354),
            ("Thakurgaon", "ঠাকুরগাঁও", 26.0333, 88.4667),
            ("Tangail", "টাঙ্গাইল", 24.2641, 89.9180),
            ("Mymensingh", "ময়মনসিংহ", 24.7471, 90.4203),
            ("Sherpur", "শেরপুর", 25.0205, 90.0179),
            ("Narsingdi", "নরসিংদী", 23.9321, 90.7150),
            ("Narayanganj", "নারায়ণগঞ্জ", 23.6238, 90.5000),
            ("Dhaka", "ঢাকা", 23.8103, 90.4125),
            ("Chattogram", "চট্টগ্রাম", 22.3569, 91.7832),
            ("Rajshahi", "রাজশাহী", 24.3745, 88.6042),
            ("Khulna", "খুলনা", 22.8456, 89.5403),
            ("Barishal", "বরিশাল", 22.7010, 90.3535),
        ];
        for (name, local, lat, lon) in districts {
            points.push(NamedPoint::district(name, local, lat, lon));
        }

        // (name, local name, lat, lon, type, capacity, address)
        let facilities = [
            ("Dhaka Medical College Hospital", "ঢাকা মেডিকেল কলেজ হাসপাতাল", 23.7257, 90.3976,
                FACILITY_HOSPITAL, "2600 beds", "Secretariat Road, Dhaka"),
            ("Mohammadpur Cyclone Shelter", "মোহাম্মদপুর সাইক্লোন শেল্টার", 23.7639, 90.3589,
                FACILITY_SHELTER, "500 people", "Mohammadpur, Dhaka"),
            ("Sirajganj 250-Bed General Hospital", "সিরাজগঞ্জ ২৫০ শয্যা জেনারেল হাসপাতাল",
                24.4575, 89.7070,
                FACILITY_HOSPITAL, "250 beds", "Hospital Road, Sirajganj"),
            ("Kazipur Flood Shelter", "কাজীপুর বন্যা আশ্রয়কেন্দ্র", 24.6400, 89.6500,
                FACILITY_SHELTER, "800 people", "Kazipur, Sirajganj"),
            ("Kurigram General Hospital", "কুড়িগ্রাম জেনারেল হাসপাতাল", 25.8103, 89.6487,
                FACILITY_HOSPITAL, "250 beds", "Kurigram Sadar"),
            ("Chilmari Char Flood Shelter", "চিলমারী চর বন্যা আশ্রয়কেন্দ্র", 25.5600, 89.6800,
                FACILITY_SHELTER, "600 people", "Chilmari, Kurigram"),
            ("Gaibandha Flood Shelter", "গাইবান্ধা বন্যা আশ্রয়কেন্দ্র", 25.3300, 89.5400,
                FACILITY_SHELTER, "400 people", "Fulchhari, Gaibandha"),
            ("Sylhet MAG Osmani Medical College Hospital",
                "সিলেট এম এ জি ওসমানী মেডিকেল কলেজ হাসপাতাল", 24.9000, 91.8540,
                FACILITY_HOSPITAL, "1200 beds", "Medical College Road, Sylhet"),
            ("Sunamganj Flood Shelter", "সুনামগঞ্জ বন্যা আশ্রয়কেন্দ্র", 25.0700, 91.4000,
                FACILITY_SHELTER, "700 people", "Sunamganj Sadar"),
            ("Chattogram Medical College Hospital", "চট্টগ্রাম মেডিকেল কলেজ হাসপাতাল",
                22.3590, 91.8310,
                FACILITY_HOSPITAL, "2200 beds", "K.B. Fazlul Kader Road, Chattogram"),
            ("Patenga Cyclone Shelter", "পতেঙ্গা সাইক্লোন শেল্টার", 22.2400, 91.7900,
                FACILITY_SHELTER, "1000 people", "Patenga, Chattogram"),
        ];
        for (name, local, lat, lon, facility_type, capacity, address) in facilities {
            let contact = if facility_type == FACILITY_HOSPITAL { "999" } else { "1090" };
            points.push(NamedPoint::facility(
                name,
                local,
                lat,
                lon,
                FacilityDetails {
                    facility_type: facility_type.to_string(),
                    capacity: capacity.to_string(),
                    contact: contact.to_string(),
                    address: address.to_string(),
                },
            ));
        }

        Self { points }
    }

    /// Load a catalog from a JSON file of the form `{"points": [...]}`
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading point catalog from {:?}", path);

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let catalog: Catalog = serde_json::from_reader(reader)?;
        catalog.validate()?;

        info!("Loaded {} catalog points", catalog.points.len());
        Ok(catalog)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Every category populated, every coordinate in range, every
    /// facility carries its details.
    pub fn validate(&self) -> Result<()> {
        for point in &self.points {
            if point.name.trim().is_empty() {
                return Err(GeoError::InvalidEntry {
                    name: point.name.clone(),
                    reason: "empty name".to_string(),
                });
            }
            if !point.coordinate.is_valid() {
                return Err(GeoError::InvalidEntry {
                    name: point.name.clone(),
                    reason: format!(
                        "coordinate out of range: {}, {}",
                        point.coordinate.latitude, point.coordinate.longitude
                    ),
                });
            }
            if point.category == Category::Facility && point.facility.is_none() {
                return Err(GeoError::InvalidEntry {
                    name: point.name.clone(),
                    reason: "facility without details".to_string(),
                });
            }
        }

        for category in Category::ALL {
            if !self.points.iter().any(|p| p.category == category) {
                return Err(GeoError::EmptyCategory(category));
            }
        }

        Ok(())
    }

    pub fn count(&self, category: Category) -> usize {
        self.points.iter().filter(|p| p.category == category).count()
    }

    pub fn find(&self, name: &str) -> Option<&NamedPoint> {
        self.points.iter().find(|p| {
            p.name.eq_ignore_ascii_case(name) || p.local_name.as_deref() == Some(name)
        })
    }

    pub fn coordinate_of(&self, name: &str) -> Option<Coordinate> {
        self.find(name).map(|p| p.coordinate)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::bangladesh()
    }
}
