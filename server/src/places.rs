//! Well-known places used when live geocoding is unavailable.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::cache::keys::normalize_place;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeocodeResult {
    pub city: String,
    pub state: Option<String>,
    pub country: Option<String>,
    pub country_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
    /// True when the static table answered instead of the live geocoder.
    pub fallback: bool,
}

struct Place {
    city: &'static str,
    state: Option<(&'static str, &'static str)>,
    country: &'static str,
    country_code: &'static str,
    latitude: f64,
    longitude: f64,
}

const PLACES: &[Place] = &[
    Place { city: "Fairbanks", state: Some(("Alaska", "AK")), country: "United States", country_code: "US", latitude: 64.8378, longitude: -147.7164 },
    Place { city: "Anchorage", state: Some(("Alaska", "AK")), country: "United States", country_code: "US", latitude: 61.2181, longitude: -149.9003 },
    Place { city: "Brentwood", state: Some(("Tennessee", "TN")), country: "United States", country_code: "US", latitude: 36.0331, longitude: -86.7828 },
    Place { city: "Nashville", state: Some(("Tennessee", "TN")), country: "United States", country_code: "US", latitude: 36.1627, longitude: -86.7816 },
    Place { city: "New York", state: Some(("New York", "NY")), country: "United States", country_code: "US", latitude: 40.7128, longitude: -74.0060 },
    Place { city: "Los Angeles", state: Some(("California", "CA")), country: "United States", country_code: "US", latitude: 34.0522, longitude: -118.2437 },
    Place { city: "San Francisco", state: Some(("California", "CA")), country: "United States", country_code: "US", latitude: 37.7749, longitude: -122.4194 },
    Place { city: "Chicago", state: Some(("Illinois", "IL")), country: "United States", country_code: "US", latitude: 41.8781, longitude: -87.6298 },
    Place { city: "Houston", state: Some(("Texas", "TX")), country: "United States", country_code: "US", latitude: 29.7604, longitude: -95.3698 },
    Place { city: "Denver", state: Some(("Colorado", "CO")), country: "United States", country_code: "US", latitude: 39.7392, longitude: -104.9903 },
    Place { city: "Seattle", state: Some(("Washington", "WA")), country: "United States", country_code: "US", latitude: 47.6062, longitude: -122.3321 },
    Place { city: "Miami", state: Some(("Florida", "FL")), country: "United States", country_code: "US", latitude: 25.7617, longitude: -80.1918 },
    Place { city: "Honolulu", state: Some(("Hawaii", "HI")), country: "United States", country_code: "US", latitude: 21.3069, longitude: -157.8583 },
    Place { city: "Tucson", state: Some(("Arizona", "AZ")), country: "United States", country_code: "US", latitude: 32.2226, longitude: -110.9747 },
    Place { city: "Flagstaff", state: Some(("Arizona", "AZ")), country: "United States", country_code: "US", latitude: 35.1983, longitude: -111.6513 },
    Place { city: "London", state: None, country: "United Kingdom", country_code: "GB", latitude: 51.5074, longitude: -0.1278 },
    Place { city: "Reykjavik", state: None, country: "Iceland", country_code: "IS", latitude: 64.1466, longitude: -21.9426 },
    Place { city: "Tromso", state: None, country: "Norway", country_code: "NO", latitude: 69.6492, longitude: 18.9553 },
    Place { city: "Sydney", state: Some(("New South Wales", "NSW")), country: "Australia", country_code: "AU", latitude: -33.8688, longitude: 151.2093 },
    Place { city: "Tokyo", state: None, country: "Japan", country_code: "JP", latitude: 35.6762, longitude: 139.6503 },
];

/// Splits `"City, State"` into its parts when no separate state was given.
pub fn split_city_state<'a>(city: &'a str, state: Option<&'a str>) -> (&'a str, Option<&'a str>) {
    match (state, city.split_once(',')) {
        (None, Some((c, s))) if !s.trim().is_empty() => (c.trim(), Some(s.trim())),
        _ => (
            city.trim().trim_end_matches(',').trim_end(),
            state.map(str::trim).filter(|s| !s.is_empty()),
        ),
    }
}

/// Looks a place up in the static table. State may be a full name or its
/// abbreviation; country may be a name or ISO code.
pub fn lookup(city: &str, state: Option<&str>, country: &str) -> Option<GeocodeResult> {
    let (city, state) = split_city_state(city, state);
    let city = normalize_place(city);
    let state = state.map(normalize_place);
    let country = normalize_place(country);

    PLACES
        .iter()
        .filter(|p| normalize_place(p.city) == city)
        .filter(|p| {
            country.is_empty()
                || normalize_place(p.country_code) == country
                || normalize_place(p.country) == country
        })
        .find(|p| match (&state, p.state) {
            (None, _) => true,
            (Some(wanted), Some((name, code))) => {
                normalize_place(name) == *wanted || normalize_place(code) == *wanted
            }
            (Some(_), None) => false,
        })
        .map(|p| {
            let state_name = p.state.map(|(name, _)| name);
            let display_name = match state_name {
                Some(s) => format!("{}, {}, {}", p.city, s, p.country),
                None => format!("{}, {}", p.city, p.country),
            };
            GeocodeResult {
                city: p.city.to_string(),
                state: state_name.map(str::to_string),
                country: Some(p.country.to_string()),
                country_code: p.country_code.to_string(),
                latitude: p.latitude,
                longitude: p.longitude,
                display_name,
                fallback: true,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fairbanks_by_name_and_abbreviation() {
        let by_name = lookup("Fairbanks", Some("Alaska"), "US").unwrap();
        let by_code = lookup("  fairbanks ", Some("ak"), "us").unwrap();
        assert_eq!(by_name.latitude, 64.8378);
        assert_eq!(by_name.longitude, -147.7164);
        assert_eq!(by_code.display_name, "Fairbanks, Alaska, United States");
        assert!(by_code.fallback);
    }

    #[test]
    fn test_city_with_embedded_state() {
        let place = lookup("Brentwood, TN", None, "US").unwrap();
        assert_eq!(place.latitude, 36.0331);
        assert_eq!(place.state.as_deref(), Some("Tennessee"));
    }

    #[test]
    fn test_mismatched_state_or_country() {
        assert!(lookup("Fairbanks", Some("Texas"), "US").is_none());
        assert!(lookup("London", None, "US").is_none());
        assert_eq!(lookup("London", None, "GB").unwrap().country_code, "GB");
        assert!(lookup("Atlantis", None, "US").is_none());
    }

    #[test]
    fn test_split_city_state() {
        assert_eq!(split_city_state("Fairbanks, Alaska", None), ("Fairbanks", Some("Alaska")));
        assert_eq!(split_city_state("Fairbanks", Some(" AK ")), ("Fairbanks", Some("AK")));
        assert_eq!(split_city_state("Paris,", None), ("Paris", None));
    }
}
