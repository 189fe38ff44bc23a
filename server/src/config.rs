use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::ttl;

pub const NASA_DEMO_KEY: &str = "DEMO_KEY";

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub nasa_api_key: String,
    pub ipgeolocation_api_key: Option<String>,
    pub open_meteo_base_url: String,
    pub iss_base_url: String,
    pub nasa_base_url: String,
    pub epic_archive_base_url: String,
    pub jpl_base_url: String,
    pub nominatim_base_url: String,
    pub ipgeolocation_base_url: String,
    pub usno_base_url: String,
    pub weather_timeout: Duration,
    pub geocode_timeout: Duration,
    pub iss_timeout: Duration,
    pub nasa_timeout: Duration,
    pub jpl_timeout: Duration,
    pub usno_timeout: Duration,
    pub ipgeolocation_timeout: Duration,
    pub upstream_max_retries: u32,
    pub cache_max_entries: u64,
    pub degraded_ttl: Duration,
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            port: parse_var("PORT", 8000)?,
            nasa_api_key: env::var("NASA_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty())
                .unwrap_or_else(|| NASA_DEMO_KEY.to_string()),
            ipgeolocation_api_key: env::var("IPGEOLOCATION_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            open_meteo_base_url: env::var("OPEN_METEO_BASE_URL")
                .unwrap_or_else(|_| "https://api.open-meteo.com".to_string()),
            iss_base_url: env::var("ISS_BASE_URL")
                .unwrap_or_else(|_| "https://api.wheretheiss.at".to_string()),
            nasa_base_url: env::var("NASA_BASE_URL")
                .unwrap_or_else(|_| "https://api.nasa.gov".to_string()),
            epic_archive_base_url: env::var("EPIC_ARCHIVE_BASE_URL")
                .unwrap_or_else(|_| "https://epic.gsfc.nasa.gov/archive".to_string()),
            jpl_base_url: env::var("JPL_BASE_URL")
                .unwrap_or_else(|_| "https://ssd-api.jpl.nasa.gov".to_string()),
            nominatim_base_url: env::var("NOMINATIM_BASE_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),
            ipgeolocation_base_url: env::var("IPGEOLOCATION_BASE_URL")
                .unwrap_or_else(|_| "https://api.ipgeolocation.io".to_string()),
            usno_base_url: env::var("USNO_BASE_URL")
                .unwrap_or_else(|_| "https://aa.usno.navy.mil".to_string()),
            weather_timeout: parse_secs("WEATHER_TIMEOUT_SECS", 5)?,
            geocode_timeout: parse_secs("GEOCODE_TIMEOUT_SECS", 4)?,
            iss_timeout: parse_secs("ISS_TIMEOUT_SECS", 10)?,
            nasa_timeout: parse_secs("NASA_TIMEOUT_SECS", 8)?,
            jpl_timeout: parse_secs("JPL_TIMEOUT_SECS", 10)?,
            usno_timeout: parse_secs("USNO_TIMEOUT_SECS", 8)?,
            ipgeolocation_timeout: parse_secs("IPGEOLOCATION_TIMEOUT_SECS", 5)?,
            upstream_max_retries: parse_var("UPSTREAM_MAX_RETRIES", 2)?,
            cache_max_entries: parse_var("CACHE_MAX_ENTRIES", 10_000)?,
            degraded_ttl: parse_secs("CACHE_DEGRADED_TTL_SECS", ttl::DEGRADED.as_secs())?,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|raw| split_origins(&raw))
                .unwrap_or_else(|_| {
                    vec![
                        "https://chat.openai.com".to_string(),
                        "https://chatgpt.com".to_string(),
                    ]
                }),
        })
    }

    /// Defaults with every upstream pointed at `base_url`. Used by tests
    /// that stand up a local fake upstream.
    #[cfg(test)]
    pub fn for_upstream(base_url: &str) -> Self {
        Config {
            port: 0,
            nasa_api_key: NASA_DEMO_KEY.to_string(),
            ipgeolocation_api_key: Some("test-key".to_string()),
            open_meteo_base_url: base_url.to_string(),
            iss_base_url: base_url.to_string(),
            nasa_base_url: base_url.to_string(),
            epic_archive_base_url: format!("{}/archive", base_url),
            jpl_base_url: base_url.to_string(),
            nominatim_base_url: base_url.to_string(),
            ipgeolocation_base_url: base_url.to_string(),
            usno_base_url: base_url.to_string(),
            weather_timeout: Duration::from_secs(5),
            geocode_timeout: Duration::from_secs(4),
            iss_timeout: Duration::from_secs(10),
            nasa_timeout: Duration::from_secs(8),
            jpl_timeout: Duration::from_secs(10),
            usno_timeout: Duration::from_secs(8),
            ipgeolocation_timeout: Duration::from_secs(5),
            upstream_max_retries: 0,
            cache_max_entries: 1_000,
            degraded_ttl: ttl::DEGRADED,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} is not valid: {}", name, e)),
        _ => Ok(default),
    }
}

fn parse_secs(name: &str, default: u64) -> anyhow::Result<Duration> {
    let secs: u64 = parse_var(name, default)?;
    if secs == 0 {
        anyhow::bail!("{} must be at least 1 second", name);
    }
    Ok(Duration::from_secs(secs))
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_origins() {
        assert_eq!(
            split_origins(" https://a.example , ,https://b.example"),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(split_origins("").is_empty());
    }

    #[test]
    fn test_parse_var_falls_back_when_unset() {
        let port: u16 = parse_var("ASTRA_TEST_UNSET_PORT", 8123).unwrap();
        assert_eq!(port, 8123);
    }
}
