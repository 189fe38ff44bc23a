//! Raw upstream response bodies, as the services send them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenMeteoResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub current: OpenMeteoCurrent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenMeteoCurrent {
    pub time: Option<String>,
    pub temperature_2m: f64,
    pub wind_speed_10m: f64,
    pub wind_direction_10m: f64,
    pub weather_code: i32,
    pub is_day: i32,
    pub cloud_cover: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub velocity: f64,
    pub visibility: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApodResponse {
    pub title: String,
    pub date: String,
    pub explanation: String,
    pub media_type: String,
    pub url: Option<String>,
    pub hdurl: Option<String>,
    pub copyright: Option<String>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpicImage {
    pub image: String,
    pub caption: Option<String>,
    pub date: String,
    pub centroid_coordinates: EpicCoordinates,
    pub dscovr_j2000_position: Option<EpicPosition>,
    pub sun_j2000_position: Option<EpicPosition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpicCoordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpicPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// JPL close-approach data. Rows are positional; `fields` names the columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadResponse {
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub data: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NominatimPlace {
    pub lat: String,
    pub lon: String,
    pub display_name: String,
    pub address: Option<NominatimAddress>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NominatimAddress {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpGeoResponse {
    pub ip: String,
    pub city: Option<String>,
    pub state_prov: Option<String>,
    pub country_name: Option<String>,
    pub country_code2: Option<String>,
    pub latitude: String,
    pub longitude: String,
    pub time_zone: Option<IpGeoTimeZone>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpGeoTimeZone {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsnoResponse {
    pub properties: UsnoProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsnoProperties {
    pub data: UsnoData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsnoData {
    #[serde(default)]
    pub moondata: Vec<UsnoPhenomenon>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsnoPhenomenon {
    pub phen: String,
    pub time: String,
}
