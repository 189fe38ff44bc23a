use std::time::Duration;

use super::types::{NominatimAddress, NominatimPlace};
use super::{endpoint, HttpClient, UpstreamError};
use crate::places::GeocodeResult;

pub struct NominatimClient {
    http: HttpClient,
    base_url: String,
}

impl NominatimClient {
    pub fn new(base_url: String, timeout: Duration, max_retries: u32) -> reqwest::Result<Self> {
        Ok(Self {
            http: HttpClient::new("Nominatim", timeout, max_retries)?,
            base_url,
        })
    }

    /// Best match for a free-form "city, state, country" query.
    pub async fn search(
        &self,
        city: &str,
        state: Option<&str>,
        country: &str,
    ) -> Result<GeocodeResult, UpstreamError> {
        let query = search_query(city, state, country);
        let url = endpoint(&self.base_url, "/search");
        let params = [
            ("q", query.as_str()),
            ("format", "json"),
            ("limit", "1"),
            ("addressdetails", "1"),
        ];

        let results: Vec<NominatimPlace> = self.http.get_json(&url, &params).await?;
        let place = results.into_iter().next().ok_or_else(|| UpstreamError::NotFound {
            service: self.http.service(),
            what: format!("Location not found: {}", query),
        })?;

        reshape(city, place).map_err(|detail| UpstreamError::malformed(self.http.service(), detail))
    }
}

fn search_query(city: &str, state: Option<&str>, country: &str) -> String {
    let mut parts = vec![city.trim()];
    if let Some(s) = state.map(str::trim).filter(|s| !s.is_empty()) {
        parts.push(s);
    }
    if !country.trim().is_empty() {
        parts.push(country.trim());
    }
    parts.join(", ")
}

fn reshape(requested_city: &str, place: NominatimPlace) -> Result<GeocodeResult, String> {
    let latitude: f64 = place
        .lat
        .parse()
        .map_err(|_| format!("latitude '{}' is not a number", place.lat))?;
    let longitude: f64 = place
        .lon
        .parse()
        .map_err(|_| format!("longitude '{}' is not a number", place.lon))?;

    let address = place.address.unwrap_or_default();
    let NominatimAddress {
        city,
        town,
        village,
        state,
        country,
        country_code,
    } = address;

    Ok(GeocodeResult {
        city: city
            .or(town)
            .or(village)
            .unwrap_or_else(|| requested_city.trim().to_string()),
        state,
        country,
        country_code: country_code.unwrap_or_default().to_uppercase(),
        latitude,
        longitude,
        display_name: place.display_name,
        fallback: false,
    })
}
