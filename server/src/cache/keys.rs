//! Cache key derivation. Logically equivalent requests must map to the same
//! key: coordinates are rounded, place names normalized, and omitted dates
//! replaced by a sentinel.

use super::ttl::Category;

/// Decimal places kept for weather and moon coordinates (~1 km).
pub const COORD_DECIMALS: u32 = 2;

pub const TODAY: &str = "today";
pub const LATEST: &str = "latest";

/// Rounds to `decimals` places and renders it, folding `-0.00` into `0.00`.
pub fn round_coord(value: f64, decimals: u32) -> String {
    let multiplier = 10_f64.powi(decimals as i32);
    let mut rounded = (value * multiplier).round() / multiplier;
    if rounded == 0.0 {
        rounded = 0.0;
    }
    format!("{:.*}", decimals as usize, rounded)
}

/// Coordinates snapped to the key precision. Upstreams are queried with
/// these so a shared entry describes the point its key names.
pub fn snap(lat: f64, lon: f64) -> (f64, f64) {
    let multiplier = 10_f64.powi(COORD_DECIMALS as i32);
    let round = |v: f64| {
        let r = (v * multiplier).round() / multiplier;
        if r == 0.0 {
            0.0
        } else {
            r
        }
    };
    (round(lat), round(lon))
}

/// Lower-cases, trims, and collapses inner whitespace.
pub fn normalize_place(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn date_or(date: Option<&str>, sentinel: &str) -> String {
    match date.map(str::trim) {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => sentinel.to_string(),
    }
}

fn coords(lat: f64, lon: f64) -> String {
    format!(
        "{}:{}",
        round_coord(lat, COORD_DECIMALS),
        round_coord(lon, COORD_DECIMALS)
    )
}

pub fn weather(lat: f64, lon: f64) -> String {
    format!("{}:{}", Category::Weather.prefix(), coords(lat, lon))
}

pub fn moon(date: Option<&str>, location: Option<(f64, f64)>) -> String {
    let place = match location {
        Some((lat, lon)) => coords(lat, lon),
        None => "-".to_string(),
    };
    format!("{}:{}:{}", Category::Moon.prefix(), date_or(date, TODAY), place)
}

pub fn iss() -> String {
    format!("{}:current", Category::IssPosition.prefix())
}

pub fn apod(date: Option<&str>) -> String {
    format!("{}:{}", Category::Apod.prefix(), date_or(date, TODAY))
}

pub fn earth_image(date: Option<&str>, image_type: &str) -> String {
    format!(
        "{}:{}:{}",
        Category::EarthImage.prefix(),
        date_or(date, LATEST),
        image_type
    )
}

pub fn asteroids(days_ahead: u32, max_distance_ld: f64) -> String {
    format!(
        "{}:{}:{}",
        Category::CloseApproach.prefix(),
        days_ahead,
        round_coord(max_distance_ld, 3)
    )
}

pub fn geocode(city: &str, state: Option<&str>, country: &str) -> String {
    format!(
        "{}:{}:{}:{}",
        Category::Geocode.prefix(),
        normalize_place(city),
        state.map(normalize_place).unwrap_or_default(),
        normalize_place(country)
    )
}

pub fn ip_location(ip: &str) -> String {
    format!("{}:{}", Category::IpLocation.prefix(), ip.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_coord() {
        assert_eq!(round_coord(36.0331, 2), "36.03");
        assert_eq!(round_coord(-86.7828, 2), "-86.78");
        assert_eq!(round_coord(64.8378, 4), "64.8378");
        assert_eq!(round_coord(-0.001, 2), "0.00");
    }

    #[test]
    fn test_nearby_coordinates_share_a_key() {
        assert_eq!(weather(36.0331, -86.7828), weather(36.0349, -86.7791));
        assert_ne!(weather(36.0331, -86.7828), weather(36.0451, -86.7828));
    }

    #[test]
    fn test_snap_matches_key_precision() {
        assert_eq!(snap(36.0349, -86.7801), (36.03, -86.78));
        assert_eq!(snap(-0.001, 0.004), (0.0, 0.0));
        let (lat, lon) = snap(36.0331, -86.7828);
        assert_eq!(weather(lat, lon), weather(36.0331, -86.7828));
    }

    #[test]
    fn test_place_names_normalize() {
        assert_eq!(normalize_place("  Fairbanks   "), "fairbanks");
        assert_eq!(
            geocode("  FAIRBANKS ", Some("Alaska"), "us"),
            geocode("fairbanks", Some("  alaska"), "US")
        );
        assert_eq!(geocode("New  York", None, "US"), "geocode:new york::us");
    }

    #[test]
    fn test_omitted_dates_share_a_sentinel() {
        assert_eq!(apod(None), "apod:today");
        assert_eq!(apod(Some("")), apod(None));
        assert_eq!(apod(Some("2024-04-08")), "apod:2024-04-08");
        assert_eq!(earth_image(None, "natural"), "earth:latest:natural");
    }

    #[test]
    fn test_moon_key_includes_location_only_when_given() {
        assert_eq!(moon(None, None), "moon:today:-");
        assert_eq!(
            moon(Some("2025-01-13"), Some((64.8378, -147.7164))),
            "moon:2025-01-13:64.84:-147.72"
        );
    }

    #[test]
    fn test_misc_keys() {
        assert_eq!(iss(), "iss:current");
        assert_eq!(asteroids(30, 10.0), "asteroids:30:10.000");
        assert_eq!(ip_location(" 8.8.8.8 "), "ipgeo:8.8.8.8");
        assert_ne!(ip_location("8.8.8.8"), ip_location("1.1.1.1"));
    }
}
