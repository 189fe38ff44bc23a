use chrono::{Duration as Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

use super::types::CadResponse;
use super::{endpoint, HttpClient, UpstreamError};
use crate::units::{
    au_to_km, au_to_lunar_distances, km_to_miles, kms_to_mph, meters_to_feet, round_to_decimals,
    whole,
};

/// Geometric albedo assumed when estimating size from absolute magnitude.
const ASSUMED_ALBEDO: f64 = 0.14;

const HAZARD_DISTANCE_LD: f64 = 0.05;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CloseApproach {
    pub designation: String,
    pub name: String,
    pub close_approach_date: String,
    pub distance_ld: f64,
    pub distance_km: i64,
    pub distance_miles: i64,
    pub velocity_kms: f64,
    pub velocity_mph: i64,
    pub diameter_meters: Option<i64>,
    pub diameter_feet: Option<i64>,
    pub is_potentially_hazardous: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CloseApproachQuery {
    pub days_ahead: u32,
    pub max_distance_ld: f64,
    pub date_range: DateRange,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CloseApproaches {
    pub query: CloseApproachQuery,
    pub count: usize,
    pub close_approaches: Vec<CloseApproach>,
}

pub struct JplClient {
    http: HttpClient,
    base_url: String,
}

impl JplClient {
    pub fn new(base_url: String, timeout: Duration, max_retries: u32) -> reqwest::Result<Self> {
        Ok(Self {
            http: HttpClient::new("JPL SBDB", timeout, max_retries)?,
            base_url,
        })
    }

    /// Close approaches to Earth from today through `days_ahead` days,
    /// nearest first.
    pub async fn close_approaches(
        &self,
        days_ahead: u32,
        max_distance_ld: f64,
    ) -> Result<CloseApproaches, UpstreamError> {
        let start = Utc::now().date_naive();
        let end = start + Days::days(i64::from(days_ahead));

        let url = endpoint(&self.base_url, "/cad.api");
        let date_min = start.format("%Y-%m-%d").to_string();
        let date_max = end.format("%Y-%m-%d").to_string();
        let dist_max = format!("{}LD", max_distance_ld);
        let params = [
            ("date-min", date_min.as_str()),
            ("date-max", date_max.as_str()),
            ("dist-max", dist_max.as_str()),
            ("sort", "dist"),
            ("fullname", "true"),
        ];

        let raw: CadResponse = self.http.get_json(&url, &params).await?;
        let close_approaches =
            parse_rows(&raw).map_err(|detail| UpstreamError::malformed(self.http.service(), detail))?;

        tracing::debug!("JPL returned {} close approaches", close_approaches.len());

        Ok(CloseApproaches {
            query: CloseApproachQuery {
                days_ahead,
                max_distance_ld,
                date_range: DateRange { start, end },
            },
            count: close_approaches.len(),
            close_approaches,
        })
    }
}

/// Estimated diameter in meters from absolute magnitude `h`.
pub fn estimated_diameter_m(h: f64) -> f64 {
    1329.0 / ASSUMED_ALBEDO.sqrt() * 10_f64.powf(-0.2 * h) * 1000.0
}

struct Columns {
    des: usize,
    fullname: Option<usize>,
    cd: usize,
    dist: usize,
    v_rel: usize,
    h: Option<usize>,
}

impl Columns {
    fn locate(fields: &[String]) -> Result<Self, String> {
        let find = |name: &str| fields.iter().position(|f| f == name);
        let require = |name: &str| find(name).ok_or_else(|| format!("missing '{}' column", name));
        Ok(Self {
            des: require("des")?,
            fullname: find("fullname"),
            cd: require("cd")?,
            dist: require("dist")?,
            v_rel: require("v_rel")?,
            h: find("h"),
        })
    }
}

fn parse_rows(raw: &CadResponse) -> Result<Vec<CloseApproach>, String> {
    if raw.fields.is_empty() || raw.data.is_empty() {
        return Ok(Vec::new());
    }

    let cols = Columns::locate(&raw.fields)?;
    raw.data.iter().map(|row| parse_row(&cols, row)).collect()
}

fn parse_row(cols: &Columns, row: &[Option<String>]) -> Result<CloseApproach, String> {
    let text = |idx: usize| row.get(idx).and_then(|v| v.as_deref());
    let number = |idx: usize, name: &str| {
        text(idx)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .ok_or_else(|| format!("'{}' is missing or not a number", name))
    };

    let designation = text(cols.des).ok_or("'des' is missing")?.to_string();
    let name = cols
        .fullname
        .and_then(text)
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| designation.clone());
    let close_approach_date = text(cols.cd).ok_or("'cd' is missing")?.to_string();
    let dist_au = number(cols.dist, "dist")?;
    let velocity_kms = number(cols.v_rel, "v_rel")?;
    let diameter_m = cols
        .h
        .and_then(text)
        .and_then(|h| h.trim().parse::<f64>().ok())
        .map(estimated_diameter_m);

    let distance_ld = au_to_lunar_distances(dist_au);
    let distance_km = au_to_km(dist_au);

    Ok(CloseApproach {
        designation,
        name,
        close_approach_date,
        distance_ld: round_to_decimals(distance_ld, 2),
        distance_km: whole(distance_km),
        distance_miles: whole(km_to_miles(distance_km)),
        velocity_kms: round_to_decimals(velocity_kms, 1),
        velocity_mph: whole(kms_to_mph(velocity_kms)),
        diameter_meters: diameter_m.map(whole),
        diameter_feet: diameter_m.map(|m| whole(meters_to_feet(m))),
        is_potentially_hazardous: distance_ld < HAZARD_DISTANCE_LD,
    })
}
