use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

use super::types::IssResponse;
use super::{endpoint, HttpClient, UpstreamError};
use crate::units::{km_to_miles, round_to_decimals, whole};

/// NORAD catalog number of the ISS.
const ISS_NORAD_ID: u32 = 25544;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_km: f64,
    pub altitude_miles: i64,
    pub velocity_kmh: f64,
    pub velocity_mph: i64,
    pub visibility: Option<String>,
    pub timestamp: String,
}

pub struct IssClient {
    http: HttpClient,
    base_url: String,
}

impl IssClient {
    pub fn new(base_url: String, timeout: Duration, max_retries: u32) -> reqwest::Result<Self> {
        Ok(Self {
            http: HttpClient::new("Where The ISS At", timeout, max_retries)?,
            base_url,
        })
    }

    pub async fn position(&self) -> Result<IssPosition, UpstreamError> {
        let url = endpoint(&self.base_url, &format!("/v1/satellites/{}", ISS_NORAD_ID));
        let response: IssResponse = self.http.get_json(&url, &[]).await?;
        reshape(response).ok_or_else(|| {
            UpstreamError::malformed(self.http.service(), "timestamp out of range")
        })
    }
}

fn reshape(raw: IssResponse) -> Option<IssPosition> {
    let observed = DateTime::from_timestamp(raw.timestamp, 0)?;
    Some(IssPosition {
        latitude: round_to_decimals(raw.latitude, 4),
        longitude: round_to_decimals(raw.longitude, 4),
        altitude_km: round_to_decimals(raw.altitude, 1),
        altitude_miles: whole(km_to_miles(raw.altitude)),
        velocity_kmh: round_to_decimals(raw.velocity, 1),
        velocity_mph: whole(km_to_miles(raw.velocity)),
        visibility: raw.visibility,
        timestamp: observed.to_rfc3339_opts(SecondsFormat::Secs, true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reshape_rounds_and_converts() {
        let raw = IssResponse {
            latitude: 50.11496269845,
            longitude: 118.07900427317,
            altitude: 408.05526028199,
            velocity: 27635.971970874,
            visibility: Some("daylight".to_string()),
            timestamp: 1_364_069_476,
        };

        let position = reshape(raw).unwrap();
        assert_eq!(position.latitude, 50.115);
        assert_eq!(position.longitude, 118.079);
        assert_eq!(position.altitude_km, 408.1);
        assert_eq!(position.altitude_miles, 254);
        assert_eq!(position.velocity_kmh, 27636.0);
        assert_eq!(position.velocity_mph, 17172);
        assert_eq!(position.timestamp, "2013-03-23T20:11:16Z");
    }
}
