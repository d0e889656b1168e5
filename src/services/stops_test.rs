use super::*;
use std::collections::HashSet;

#[test]
fn catalog_has_no_duplicates() {
    let unique: HashSet<&str> = BUS_STOPS.iter().copied().collect();
    assert_eq!(unique.len(), BUS_STOPS.len());
}

#[test]
fn empty_query_returns_everything() {
    assert_eq!(search("").len(), BUS_STOPS.len());
}

#[test]
fn search_is_case_insensitive_substring() {
    let hits = search("chowk");
    assert!(hits.contains(&"Darshanlal Chowk"));
    assert!(hits.contains(&"ONGC Chowk"));
    assert!(!hits.contains(&"Clock Tower"));
    assert!(hits.iter().all(|s| s.to_lowercase().contains("chowk")));
}

#[test]
fn search_keeps_catalog_order() {
    assert_eq!(search("nagar"), vec!["Rajender Nagar", "Kishan Nagar", "VikasNagar", "Premnagar", "Prem Nagar"]);
}

#[test]
fn search_without_match_is_empty() {
    assert!(search("zzz").is_empty());
}

#[test]
fn locate_known_stop() {
    let location = locate("Clock Tower").unwrap();
    assert_eq!(location.bus_number, 18);
    assert_eq!(location.driver_location, Coordinates { latitude: 30.3256, longitude: 78.0437 });
}

#[test]
fn locate_requires_exact_name() {
    assert!(locate("clock tower").is_none());
    assert!(locate("Rispana").is_none());
}

#[test]
fn every_mock_location_is_a_catalog_stop() {
    for (name, _) in MOCK_LOCATIONS {
        assert!(BUS_STOPS.contains(name), "{name} missing from catalog");
    }
}

#[test]
fn map_embed_url_format() {
    let url = map_embed_url(Coordinates { latitude: 30.315, longitude: 78.032 });
    assert_eq!(url, "https://maps.google.com/maps?q=30.315,78.032&z=15&output=embed");
}
