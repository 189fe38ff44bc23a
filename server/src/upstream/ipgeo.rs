use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

use super::types::IpGeoResponse;
use super::{endpoint, HttpClient, UpstreamError};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IpLocation {
    pub ip: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Option<String>,
}

pub struct IpGeoClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl IpGeoClient {
    pub fn new(
        base_url: String,
        api_key: String,
        timeout: Duration,
        max_retries: u32,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            http: HttpClient::new("ipgeolocation", timeout, max_retries)?,
            base_url,
            api_key,
        })
    }

    /// Approximate location of `ip`. The address is always sent; without it
    /// the service would locate this server instead of the client.
    pub async fn locate(&self, ip: &str) -> Result<IpLocation, UpstreamError> {
        let url = endpoint(&self.base_url, "/ipgeo");
        let params = [("apiKey", self.api_key.as_str()), ("ip", ip)];

        let raw: IpGeoResponse = self.http.get_json(&url, &params).await?;
        reshape(raw).map_err(|detail| UpstreamError::malformed(self.http.service(), detail))
    }
}

fn reshape(raw: IpGeoResponse) -> Result<IpLocation, String> {
    let coord = |value: &str, name: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("{} '{}' is not a number", name, value))
    };

    Ok(IpLocation {
        latitude: coord(&raw.latitude, "latitude")?,
        longitude: coord(&raw.longitude, "longitude")?,
        ip: raw.ip,
        city: raw.city.filter(|c| !c.is_empty()),
        state: raw.state_prov.filter(|s| !s.is_empty()),
        country: raw.country_name,
        country_code: raw.country_code2,
        timezone: raw.time_zone.and_then(|tz| tz.name),
    })
}
