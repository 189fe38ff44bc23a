//! Approximate moon phase from the mean synodic month.
//!
//! Accuracy is within roughly half a day of the true lunation, which is
//! enough for naming the phase. Rise and set times come from USNO.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::units::{km_to_miles, round_to_decimals, whole, KM_PER_LUNAR_DISTANCE};

pub const SYNODIC_MONTH_DAYS: f64 = 29.530588853;

/// Unix time of the new moon of 2000-01-06 18:14 UTC.
const REFERENCE_NEW_MOON: i64 = 947_182_440;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Fraction of the current lunation elapsed at `at`, in [0, 1).
/// 0 is new moon, 0.5 is full moon.
pub fn phase_fraction(at: DateTime<Utc>) -> f64 {
    let days = (at.timestamp() - REFERENCE_NEW_MOON) as f64 / SECONDS_PER_DAY;
    (days / SYNODIC_MONTH_DAYS).rem_euclid(1.0)
}

/// Phase name for a lunation fraction. Fractions are cyclic, so 1.0 reads
/// the same as 0.0.
pub fn phase_name(fraction: f64) -> &'static str {
    let f = fraction.rem_euclid(1.0);
    if f < 0.03 {
        "New Moon"
    } else if f < 0.22 {
        "Waxing Crescent"
    } else if f < 0.28 {
        "First Quarter"
    } else if f < 0.47 {
        "Waxing Gibbous"
    } else if f < 0.53 {
        "Full Moon"
    } else if f < 0.72 {
        "Waning Gibbous"
    } else if f < 0.78 {
        "Last Quarter"
    } else if f < 0.97 {
        "Waning Crescent"
    } else {
        "New Moon"
    }
}

/// Illuminated fraction of the disc, 0.0 at new moon and 1.0 at full.
pub fn illumination(fraction: f64) -> f64 {
    (1.0 - (2.0 * std::f64::consts::PI * fraction).cos()) / 2.0
}

fn days_until(fraction: f64, target: f64) -> f64 {
    (target - fraction).rem_euclid(1.0) * SYNODIC_MONTH_DAYS
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MoonReport {
    pub date: NaiveDate,
    pub phase: f64,
    pub phase_name: String,
    pub illumination_percent: f64,
    pub age_days: f64,
    pub next_new_moon: NaiveDate,
    pub next_full_moon: NaiveDate,
    pub distance_km: i64,
    pub distance_miles: i64,
    pub angular_diameter_arcminutes: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moonrise_utc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moonset_utc: Option<String>,
}

impl MoonReport {
    /// Phase state at noon UTC on `date`.
    pub fn for_date(date: NaiveDate) -> Self {
        let noon = date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default());
        let at = DateTime::<Utc>::from_naive_utc_and_offset(noon, Utc);
        let fraction = phase_fraction(at);

        let next = |target: f64| {
            let secs = days_until(fraction, target) * SECONDS_PER_DAY;
            (at + Duration::seconds(secs.round() as i64)).date_naive()
        };

        Self {
            date,
            phase: round_to_decimals(fraction, 3),
            phase_name: phase_name(fraction).to_string(),
            illumination_percent: round_to_decimals(illumination(fraction) * 100.0, 1),
            age_days: round_to_decimals(fraction * SYNODIC_MONTH_DAYS, 1),
            next_new_moon: next(0.0),
            next_full_moon: next(0.5),
            distance_km: whole(KM_PER_LUNAR_DISTANCE),
            distance_miles: whole(km_to_miles(KM_PER_LUNAR_DISTANCE)),
            angular_diameter_arcminutes: 31.1,
            moonrise_utc: None,
            moonset_utc: None,
        }
    }
}
