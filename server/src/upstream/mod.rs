pub mod ipgeo;
pub mod iss;
pub mod jpl;
pub mod nasa;
pub mod nominatim;
pub mod openmeteo;
pub mod types;
pub mod usno;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

pub const USER_AGENT: &str = "AstraAstronomyApp/2.0";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpstreamError {
    #[error("{service} timed out")]
    Timeout { service: &'static str },
    #[error("{service} rate limited the request")]
    RateLimited { service: &'static str },
    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },
    #[error("{service} request failed: {detail}")]
    Transport { service: &'static str, detail: String },
    #[error("{service} response malformed: {detail}")]
    Malformed { service: &'static str, detail: String },
    #[error("{what}")]
    NotFound { service: &'static str, what: String },
}

impl UpstreamError {
    pub fn malformed(service: &'static str, detail: impl Into<String>) -> Self {
        UpstreamError::Malformed {
            service,
            detail: detail.into(),
        }
    }

    fn from_reqwest(service: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout { service }
        } else if err.is_decode() {
            UpstreamError::malformed(service, err.to_string())
        } else {
            UpstreamError::Transport {
                service,
                detail: err.to_string(),
            }
        }
    }
}

/// HTTP client for one upstream service: fixed timeout, shared connection
/// pool, and retry with backoff when the upstream answers 429.
pub struct HttpClient {
    client: Client,
    service: &'static str,
    max_retries: u32,
    initial_backoff: Duration,
}

impl HttpClient {
    pub fn new(service: &'static str, timeout: Duration, max_retries: u32) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            service,
            max_retries,
            initial_backoff: Duration::from_millis(500),
        })
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<T, UpstreamError> {
        let value = self.get_value(url, params).await?;
        serde_json::from_value(value).map_err(|e| UpstreamError::malformed(self.service, e.to_string()))
    }

    async fn get_value(&self, url: &str, params: &[(&str, &str)]) -> Result<Value, UpstreamError> {
        let service = self.service;
        let mut retry_count = 0;
        let mut delay = self.initial_backoff;

        loop {
            let response = self
                .client
                .get(url)
                .query(params)
                .send()
                .await
                .map_err(|e| UpstreamError::from_reqwest(service, e))?;

            let status = response.status();
            if status.is_success() {
                return response
                    .json::<Value>()
                    .await
                    .map_err(|e| UpstreamError::from_reqwest(service, e));
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if retry_count >= self.max_retries {
                    return Err(UpstreamError::RateLimited { service });
                }

                tracing::warn!(
                    service,
                    "rate limited, retrying in {}ms",
                    delay.as_millis()
                );

                sleep(delay).await;
                delay = delay.mul_f32(2.0 + fastrand::f32() * 0.5); // exponential backoff with jitter
                retry_count += 1;
                continue;
            }

            tracing::warn!(service, status = status.as_u16(), url, "upstream returned an error status");
            return Err(UpstreamError::Status {
                service,
                status: status.as_u16(),
            });
        }
    }
}

/// Joins a base URL and a path without doubling the slash.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
