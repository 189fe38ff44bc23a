use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

use super::types::OpenMeteoResponse;
use super::{endpoint, HttpClient, UpstreamError};
use crate::units::{celsius_to_fahrenheit, degrees_to_cardinal, kph_to_mph, whole};

const CURRENT_FIELDS: &str =
    "temperature_2m,wind_speed_10m,wind_direction_10m,weather_code,is_day,cloud_cover";

// Open-Meteo has no visibility field in the current block.
const DEFAULT_VISIBILITY_MILES: i64 = 10;
const DEFAULT_VISIBILITY_KM: i64 = 16;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WeatherReport {
    pub latitude: f64,
    pub longitude: f64,
    pub temperature_f: i64,
    pub temperature_c: i64,
    pub wind_speed_mph: i64,
    pub wind_speed_kph: i64,
    pub wind_direction_degrees: i64,
    pub wind_direction_cardinal: String,
    pub weather_code: i32,
    pub weather_description: String,
    pub is_day: bool,
    pub cloud_cover_percent: i64,
    pub visibility_miles: i64,
    pub visibility_km: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<String>,
    pub timestamp: String,
}

pub struct OpenMeteoClient {
    http: HttpClient,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(base_url: String, timeout: Duration, max_retries: u32) -> reqwest::Result<Self> {
        Ok(Self {
            http: HttpClient::new("Open-Meteo", timeout, max_retries)?,
            base_url,
        })
    }

    /// Current conditions at a coordinate.
    pub async fn current(&self, lat: f64, lon: f64) -> Result<WeatherReport, UpstreamError> {
        let url = endpoint(&self.base_url, "/v1/forecast");
        let lat_str = lat.to_string();
        let lon_str = lon.to_string();
        let params = [
            ("latitude", lat_str.as_str()),
            ("longitude", lon_str.as_str()),
            ("current", CURRENT_FIELDS),
            ("temperature_unit", "celsius"),
            ("wind_speed_unit", "kmh"),
            ("timezone", "UTC"),
        ];

        tracing::debug!("fetching current weather for {:.2}, {:.2}", lat, lon);
        let response: OpenMeteoResponse = self.http.get_json(&url, &params).await?;
        Ok(reshape(lat, lon, response))
    }
}

fn reshape(lat: f64, lon: f64, response: OpenMeteoResponse) -> WeatherReport {
    let current = response.current;
    WeatherReport {
        latitude: lat,
        longitude: lon,
        temperature_f: whole(celsius_to_fahrenheit(current.temperature_2m)),
        temperature_c: whole(current.temperature_2m),
        wind_speed_mph: whole(kph_to_mph(current.wind_speed_10m)),
        wind_speed_kph: whole(current.wind_speed_10m),
        wind_direction_degrees: whole(current.wind_direction_10m),
        wind_direction_cardinal: degrees_to_cardinal(current.wind_direction_10m).to_string(),
        weather_code: current.weather_code,
        weather_description: weather_description(current.weather_code).to_string(),
        is_day: current.is_day == 1,
        cloud_cover_percent: whole(current.cloud_cover.unwrap_or(0.0)),
        visibility_miles: DEFAULT_VISIBILITY_MILES,
        visibility_km: DEFAULT_VISIBILITY_KM,
        observed_at: current.time,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

/// Text for a WMO weather interpretation code.
pub fn weather_description(code: i32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow",
        73 => "Moderate snow",
        75 => "Heavy snow",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::types::OpenMeteoCurrent;

    fn sample(temp_c: f64, wind_kph: f64, direction: f64, code: i32) -> OpenMeteoResponse {
        OpenMeteoResponse {
            latitude: 36.0,
            longitude: -86.75,
            current: OpenMeteoCurrent {
                time: Some("2025-01-14T12:00".to_string()),
                temperature_2m: temp_c,
                wind_speed_10m: wind_kph,
                wind_direction_10m: direction,
                weather_code: code,
                is_day: 1,
                cloud_cover: Some(42.4),
            },
        }
    }

    #[test]
    fn test_reshape_converts_units() {
        let report = reshape(36.0331, -86.7828, sample(20.0, 16.1, 225.0, 2));
        assert_eq!(report.latitude, 36.0331);
        assert_eq!(report.temperature_f, 68);
        assert_eq!(report.temperature_c, 20);
        assert_eq!(report.wind_speed_mph, 10);
        assert_eq!(report.wind_speed_kph, 16);
        assert_eq!(report.wind_direction_cardinal, "SW");
        assert_eq!(report.weather_description, "Partly cloudy");
        assert!(report.is_day);
        assert_eq!(report.cloud_cover_percent, 42);
        assert_eq!(report.visibility_miles, 10);
    }

    #[test]
    fn test_unknown_weather_code() {
        assert_eq!(weather_description(0), "Clear sky");
        assert_eq!(weather_description(99), "Thunderstorm with heavy hail");
        assert_eq!(weather_description(42), "Unknown");
    }
}
