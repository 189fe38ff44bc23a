use chrono::NaiveDate;
use std::time::Duration;

use super::types::UsnoResponse;
use super::{endpoint, HttpClient, UpstreamError};

/// Moon rise and set for one UTC day, as `HH:MM`. Either may be absent on
/// days when the event does not occur.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoonTimes {
    pub moonrise: Option<String>,
    pub moonset: Option<String>,
}

pub struct UsnoClient {
    http: HttpClient,
    base_url: String,
}

impl UsnoClient {
    pub fn new(base_url: String, timeout: Duration, max_retries: u32) -> reqwest::Result<Self> {
        Ok(Self {
            http: HttpClient::new("USNO", timeout, max_retries)?,
            base_url,
        })
    }

    pub async fn moon_times(
        &self,
        date: NaiveDate,
        lat: f64,
        lon: f64,
    ) -> Result<MoonTimes, UpstreamError> {
        let url = endpoint(&self.base_url, "/api/rstt/oneday");
        let date_str = date.format("%Y-%m-%d").to_string();
        let coords = format!("{:.4},{:.4}", lat, lon);
        let params = [
            ("date", date_str.as_str()),
            ("coords", coords.as_str()),
            ("tz", "0"),
        ];

        let raw: UsnoResponse = self.http.get_json(&url, &params).await?;
        Ok(extract(&raw))
    }
}

fn extract(raw: &UsnoResponse) -> MoonTimes {
    let find = |phen: &str| {
        raw.properties
            .data
            .moondata
            .iter()
            .find(|p| p.phen.eq_ignore_ascii_case(phen))
            .map(|p| p.time.chars().take(5).collect::<String>())
    };

    MoonTimes {
        moonrise: find("Rise"),
        moonset: find("Set"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_rise_and_set() {
        let raw: UsnoResponse = serde_json::from_value(serde_json::json!({
            "properties": { "data": { "moondata": [
                { "phen": "Set", "time": "03:12" },
                { "phen": "Upper Transit", "time": "21:40 ST" },
                { "phen": "Rise", "time": "14:05 ST" }
            ]}}
        }))
        .unwrap();

        let times = extract(&raw);
        assert_eq!(times.moonrise.as_deref(), Some("14:05"));
        assert_eq!(times.moonset.as_deref(), Some("03:12"));
    }

    #[test]
    fn test_missing_events() {
        let raw: UsnoResponse = serde_json::from_value(serde_json::json!({
            "properties": { "data": { "moondata": [ { "phen": "Rise", "time": "05:00" } ] } }
        }))
        .unwrap();
        assert_eq!(
            extract(&raw),
            MoonTimes { moonrise: Some("05:00".to_string()), moonset: None }
        );
    }
}
