//! Request parameter checks, run before any upstream call.

use chrono::NaiveDate;
use std::net::IpAddr;

use crate::error::ApiError;

/// First day of the APOD archive.
pub const APOD_FIRST_DAY: (i32, u32, u32) = (1995, 6, 16);

pub const MAX_DAYS_AHEAD: u32 = 365;

pub fn coordinates(lat: f64, lon: f64) -> Result<(f64, f64), ApiError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(ApiError::invalid(format!(
            "latitude must be between -90 and 90, got {}",
            lat
        )));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(ApiError::invalid(format!(
            "longitude must be between -180 and 180, got {}",
            lon
        )));
    }
    Ok((lat, lon))
}

/// Both coordinates or neither.
pub fn optional_coordinates(
    lat: Option<f64>,
    lon: Option<f64>,
) -> Result<Option<(f64, f64)>, ApiError> {
    match (lat, lon) {
        (Some(lat), Some(lon)) => coordinates(lat, lon).map(Some),
        (None, None) => Ok(None),
        _ => Err(ApiError::invalid(
            "latitude and longitude must be given together",
        )),
    }
}

/// Strict `YYYY-MM-DD`.
pub fn date(raw: &str) -> Result<NaiveDate, ApiError> {
    let raw = raw.trim();
    let well_formed = raw.len() == 10
        && raw
            .char_indices()
            .all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() });

    if !well_formed {
        return Err(ApiError::invalid(format!(
            "date must be YYYY-MM-DD, got '{}'",
            raw
        )));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::invalid(format!("'{}' is not a calendar date", raw)))
}

pub fn optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    raw.filter(|d| !d.trim().is_empty()).map(date).transpose()
}

pub fn not_in_future(day: NaiveDate, today: NaiveDate) -> Result<NaiveDate, ApiError> {
    if day > today {
        return Err(ApiError::invalid(format!(
            "{} is in the future",
            day
        )));
    }
    Ok(day)
}

pub fn apod_date(day: NaiveDate, today: NaiveDate) -> Result<NaiveDate, ApiError> {
    let (y, m, d) = APOD_FIRST_DAY;
    if NaiveDate::from_ymd_opt(y, m, d).map_or(false, |first| day < first) {
        return Err(ApiError::invalid("APOD started on June 16, 1995"));
    }
    not_in_future(day, today)
        .map_err(|_| ApiError::invalid("Cannot retrieve APOD for future dates"))
}

pub fn days_ahead(days: u32) -> Result<u32, ApiError> {
    if !(1..=MAX_DAYS_AHEAD).contains(&days) {
        return Err(ApiError::invalid(format!(
            "days_ahead must be between 1 and {}, got {}",
            MAX_DAYS_AHEAD, days
        )));
    }
    Ok(days)
}

pub fn max_distance_ld(ld: f64) -> Result<f64, ApiError> {
    if !ld.is_finite() || ld <= 0.0 {
        return Err(ApiError::invalid(format!(
            "max_distance_ld must be greater than 0, got {}",
            ld
        )));
    }
    Ok(ld)
}

pub fn ip_address(raw: &str) -> Result<IpAddr, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::invalid(format!("'{}' is not an IP address", raw.trim())))
}

/// Whether `ip` could locate a client. Loopback, private, link-local and
/// unspecified addresses only describe the local network.
pub fn is_public(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast())
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_public(&IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            let unique_local = first & 0xfe00 == 0xfc00;
            let link_local = first & 0xffc0 == 0xfe80;
            !(v6.is_loopback() || v6.is_unspecified() || unique_local || link_local)
        }
    }
}

pub fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::invalid(format!("{} is required", name)))
}
