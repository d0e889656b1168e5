//! Bus-stop catalog: name search and demo bus locations.
//!
//! The catalog is static. Only a handful of stops carry a mock bus
//! assignment until live driver positions are wired in.

use serde::Serialize;

/// Every stop served, deduplicated, in route order.
pub const BUS_STOPS: &[&str] = &[
    "Clock Tower",
    "Darshanlal Chowk",
    "Saharanpur Chowk",
    "ISBT",
    "Geu",
    "Asley Hall",
    "Matawala Bagh",
    "Daudwala",
    "Mathurawala",
    "Vishnupuram",
    "Bangali Kothi",
    "Kargi Chowk",
    "Raipur Chowk",
    "Dobhal Chowk",
    "6 No. Pulia",
    "Ring Road",
    "Post Office Nehru Gram",
    "Jogiwala",
    "Rispana",
    "Gehu",
    "Ranipokhri",
    "Doiwala",
    "Lachiwala",
    "Kuanwala",
    "Harawala",
    "Miawala",
    "Mokampur",
    "Gujraunwala",
    "Hathibadkala",
    "Garhi Cant",
    "Vijay Coloney",
    "Chir Bagh",
    "CM House",
    "ONGC Chowk",
    "Ballupur Chowk",
    "GMS Road",
    "Rajender Nagar",
    "Yamuna Coloney",
    "Bindal Pul",
    "Kishan Nagar",
    "Blood Bank",
    "Supply",
    "IT Park",
    "Nala Paani Chowk",
    "Shastdhara Crossing",
    "Ladpur",
    "Fountain Chowk",
    "Nehru Colony",
    "Nakrounda More",
    "Kulhal",
    "VikasNagar",
    "Tehsil",
    "Harbatpur Chowk",
    "Langa Road",
    "Shaspur",
    "Selaqui",
    "Sudhowala",
    "Nanda Ki Chowki",
    "Premnagar",
    "Panditwari",
    "Vasant Vihar",
    "Baliwala Chowk",
    "Badowala",
    "Telpur",
    "Mehuwala",
    "Race Course",
    "Dharampur",
    "Mata Mandir",
    "Araghar",
    "Survey Chowk",
    "Dwarka Store",
    "Nanni Bakery",
    "Dilaram Bazar",
    "Great Value",
    "Prem Nagar",
    "Balliwalachowk",
];

const MAP_ZOOM: u8 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Bus currently assigned to a stop and where its driver is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BusLocation {
    pub bus_number: u32,
    pub driver_location: Coordinates,
}

const MOCK_LOCATIONS: &[(&str, BusLocation)] = &[
    ("Clock Tower", mock(18, 30.3256, 78.0437)),
    ("Darshanlal Chowk", mock(24, 30.3242, 78.0431)),
    ("Saharanpur Chowk", mock(42, 30.3200, 78.0400)),
    ("ISBT", mock(11, 30.3150, 78.0320)),
    ("Geu", mock(9, 30.3100, 78.0300)),
];

const fn mock(bus_number: u32, latitude: f64, longitude: f64) -> BusLocation {
    BusLocation { bus_number, driver_location: Coordinates { latitude, longitude } }
}

/// Stops whose name contains `query`, ignoring case. An empty query
/// returns the whole catalog.
#[must_use]
pub fn search(query: &str) -> Vec<&'static str> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return BUS_STOPS.to_vec();
    }
    BUS_STOPS
        .iter()
        .copied()
        .filter(|stop| stop.to_lowercase().contains(&needle))
        .collect()
}

/// Mock bus assignment for an exact stop name.
#[must_use]
pub fn locate(stop: &str) -> Option<BusLocation> {
    MOCK_LOCATIONS
        .iter()
        .find(|(name, _)| *name == stop)
        .map(|(_, location)| *location)
}

/// Embeddable map URL centred on the given point.
#[must_use]
pub fn map_embed_url(at: Coordinates) -> String {
    format!(
        "https://maps.google.com/maps?q={},{}&z={MAP_ZOOM}&output=embed",
        at.latitude, at.longitude
    )
}

#[cfg(test)]
#[path = "stops_test.rs"]
mod tests;
