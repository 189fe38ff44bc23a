//! Static table of solar and lunar eclipses, 2024-2030.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EclipseKind {
    Solar,
    Lunar,
}

impl std::str::FromStr for EclipseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solar" => Ok(EclipseKind::Solar),
            "lunar" => Ok(EclipseKind::Lunar),
            other => Err(format!("kind must be 'solar' or 'lunar', got '{}'", other)),
        }
    }
}

struct Row {
    date: (i32, u32, u32),
    kind: EclipseKind,
    subtype: &'static str,
    visibility: &'static str,
}

const TABLE: &[Row] = &[
    Row { date: (2024, 3, 25), kind: EclipseKind::Lunar, subtype: "penumbral", visibility: "Americas, western Europe, Africa" },
    Row { date: (2024, 4, 8), kind: EclipseKind::Solar, subtype: "total", visibility: "Mexico, central and eastern United States, eastern Canada" },
    Row { date: (2024, 9, 18), kind: EclipseKind::Lunar, subtype: "partial", visibility: "Americas, Europe, Africa" },
    Row { date: (2024, 10, 2), kind: EclipseKind::Solar, subtype: "annular", visibility: "southern Chile and Argentina, Pacific" },
    Row { date: (2025, 3, 14), kind: EclipseKind::Lunar, subtype: "total", visibility: "Americas, Pacific, western Europe and Africa" },
    Row { date: (2025, 3, 29), kind: EclipseKind::Solar, subtype: "partial", visibility: "Europe, northwest Africa, northeastern North America" },
    Row { date: (2025, 9, 7), kind: EclipseKind::Lunar, subtype: "total", visibility: "Asia, Australia, Europe, Africa" },
    Row { date: (2025, 9, 21), kind: EclipseKind::Solar, subtype: "partial", visibility: "New Zealand, Antarctica, south Pacific" },
    Row { date: (2026, 2, 17), kind: EclipseKind::Solar, subtype: "annular", visibility: "Antarctica" },
    Row { date: (2026, 3, 3), kind: EclipseKind::Lunar, subtype: "total", visibility: "East Asia, Australia, Pacific, Americas" },
    Row { date: (2026, 8, 12), kind: EclipseKind::Solar, subtype: "total", visibility: "Greenland, Iceland, Spain" },
    Row { date: (2026, 8, 28), kind: EclipseKind::Lunar, subtype: "partial", visibility: "Americas, Europe, Africa, east Pacific" },
    Row { date: (2027, 2, 6), kind: EclipseKind::Solar, subtype: "annular", visibility: "Chile, Argentina, Atlantic, west Africa" },
    Row { date: (2027, 2, 20), kind: EclipseKind::Lunar, subtype: "penumbral", visibility: "Americas, Europe, Africa, Asia" },
    Row { date: (2027, 7, 18), kind: EclipseKind::Lunar, subtype: "penumbral", visibility: "Asia, Australia, Pacific" },
    Row { date: (2027, 8, 2), kind: EclipseKind::Solar, subtype: "total", visibility: "Spain, north Africa, Middle East" },
    Row { date: (2027, 8, 17), kind: EclipseKind::Lunar, subtype: "penumbral", visibility: "Pacific, Americas" },
    Row { date: (2028, 1, 12), kind: EclipseKind::Lunar, subtype: "partial", visibility: "Americas, Europe, Africa" },
    Row { date: (2028, 1, 26), kind: EclipseKind::Solar, subtype: "annular", visibility: "Ecuador, Peru, Brazil, Spain, Portugal" },
    Row { date: (2028, 7, 6), kind: EclipseKind::Lunar, subtype: "partial", visibility: "Europe, Africa, Asia, Australia" },
    Row { date: (2028, 7, 22), kind: EclipseKind::Solar, subtype: "total", visibility: "Australia, New Zealand" },
    Row { date: (2028, 12, 31), kind: EclipseKind::Lunar, subtype: "total", visibility: "Europe, Africa, Asia, Australia" },
    Row { date: (2029, 1, 14), kind: EclipseKind::Solar, subtype: "partial", visibility: "North America, Central America" },
    Row { date: (2029, 6, 12), kind: EclipseKind::Solar, subtype: "partial", visibility: "Arctic, Scandinavia, Alaska, northern Asia" },
    Row { date: (2029, 6, 26), kind: EclipseKind::Lunar, subtype: "total", visibility: "Americas, Europe, Africa, Middle East" },
    Row { date: (2029, 7, 11), kind: EclipseKind::Solar, subtype: "partial", visibility: "southern Chile and Argentina" },
    Row { date: (2029, 12, 5), kind: EclipseKind::Solar, subtype: "partial", visibility: "southern Argentina and Chile, Antarctica" },
    Row { date: (2029, 12, 20), kind: EclipseKind::Lunar, subtype: "total", visibility: "Americas, Europe, Africa, Asia" },
    Row { date: (2030, 6, 1), kind: EclipseKind::Solar, subtype: "annular", visibility: "Algeria, Tunisia, Greece, Turkey, Russia, Japan" },
    Row { date: (2030, 6, 15), kind: EclipseKind::Lunar, subtype: "partial", visibility: "Europe, Africa, Asia, Australia" },
    Row { date: (2030, 11, 25), kind: EclipseKind::Solar, subtype: "total", visibility: "southern Africa, Indian Ocean, Australia" },
    Row { date: (2030, 12, 9), kind: EclipseKind::Lunar, subtype: "penumbral", visibility: "Americas, Europe, Africa, Asia" },
];

pub const FIRST_YEAR: i32 = 2024;
pub const LAST_YEAR: i32 = 2030;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Eclipse {
    pub date: NaiveDate,
    pub kind: EclipseKind,
    #[serde(rename = "type")]
    pub subtype: String,
    pub visibility: String,
}

/// Eclipses filtered by year and kind, in date order.
pub fn lookup(year: Option<i32>, kind: Option<EclipseKind>) -> Vec<Eclipse> {
    TABLE
        .iter()
        .filter(|row| year.map_or(true, |y| row.date.0 == y))
        .filter(|row| kind.map_or(true, |k| row.kind == k))
        .filter_map(|row| {
            let (y, m, d) = row.date;
            Some(Eclipse {
                date: NaiveDate::from_ymd_opt(y, m, d)?,
                kind: row.kind,
                subtype: row.subtype.to_string(),
                visibility: row.visibility.to_string(),
            })
        })
        .collect()
}

/// The next eclipses on or after `from`.
pub fn upcoming(from: NaiveDate, kind: Option<EclipseKind>, limit: usize) -> Vec<Eclipse> {
    lookup(None, kind)
        .into_iter()
        .filter(|eclipse| eclipse.date >= from)
        .take(limit)
        .collect()
}
