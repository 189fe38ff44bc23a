//! Unit conversions used when reshaping upstream payloads.

pub const MILES_PER_KM: f64 = 0.621371;
pub const FEET_PER_METER: f64 = 3.28084;
pub const KM_PER_AU: f64 = 149_597_870.7;
pub const KM_PER_LUNAR_DISTANCE: f64 = 384_400.0;
pub const MPH_PER_KMS: f64 = 2236.94;

const CARDINALS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn kph_to_mph(kph: f64) -> f64 {
    kph * MILES_PER_KM
}

pub fn km_to_miles(km: f64) -> f64 {
    km * MILES_PER_KM
}

pub fn meters_to_feet(meters: f64) -> f64 {
    meters * FEET_PER_METER
}

pub fn au_to_km(au: f64) -> f64 {
    au * KM_PER_AU
}

pub fn au_to_lunar_distances(au: f64) -> f64 {
    au_to_km(au) / KM_PER_LUNAR_DISTANCE
}

pub fn kms_to_mph(kms: f64) -> f64 {
    kms * MPH_PER_KMS
}

/// 16-point compass direction for a bearing in degrees. Any real bearing is
/// accepted; it is wrapped into [0, 360).
pub fn degrees_to_cardinal(degrees: f64) -> &'static str {
    let index = (degrees.rem_euclid(360.0) / 22.5).round() as usize % CARDINALS.len();
    CARDINALS[index]
}

/// Round to specified decimal places
pub fn round_to_decimals(value: f64, decimals: u32) -> f64 {
    let multiplier = 10_f64.powi(decimals as i32);
    (value * multiplier).round() / multiplier
}

/// Round to the nearest whole number for display fields.
pub fn whole(value: f64) -> i64 {
    value.round() as i64
}
