use std::time::Duration;

/// Data categories with their own freshness requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Weather,
    Moon,
    IssPosition,
    Apod,
    EarthImage,
    Geocode,
    IpLocation,
    CloseApproach,
}

impl Category {
    /// Namespace prefix used in cache keys.
    pub fn prefix(self) -> &'static str {
        match self {
            Category::Weather => "weather",
            Category::Moon => "moon",
            Category::IssPosition => "iss",
            Category::Apod => "apod",
            Category::EarthImage => "earth",
            Category::Geocode => "geocode",
            Category::IpLocation => "ipgeo",
            Category::CloseApproach => "asteroids",
        }
    }

    pub fn ttl(self) -> Duration {
        match self {
            Category::Weather => Duration::from_secs(5 * 60),
            Category::Moon => Duration::from_secs(24 * 60 * 60),
            Category::IssPosition => Duration::from_secs(60),
            Category::Apod => Duration::from_secs(24 * 60 * 60),
            Category::EarthImage => Duration::from_secs(2 * 60 * 60),
            Category::Geocode => Duration::from_secs(30 * 24 * 60 * 60),
            Category::IpLocation => Duration::from_secs(24 * 60 * 60),
            Category::CloseApproach => Duration::from_secs(12 * 60 * 60),
        }
    }
}

/// Lifetime of a response assembled while an optional upstream failed.
pub const DEGRADED: Duration = Duration::from_secs(60);
