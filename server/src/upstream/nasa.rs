//! NASA APOD and EPIC, both served from api.nasa.gov with the same key.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

use super::types::{ApodResponse, EpicImage, EpicPosition};
use super::{endpoint, HttpClient, UpstreamError};

const DEFAULT_EPIC_CAPTION: &str = "This image was taken by NASA's EPIC camera";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Apod {
    pub title: String,
    pub date: String,
    pub explanation: String,
    pub media_type: String,
    pub url: Option<String>,
    pub hdurl: Option<String>,
    pub copyright: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EpicImageType {
    Natural,
    Enhanced,
}

impl EpicImageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpicImageType::Natural => "natural",
            EpicImageType::Enhanced => "enhanced",
        }
    }
}

impl std::str::FromStr for EpicImageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "natural" => Ok(EpicImageType::Natural),
            "enhanced" => Ok(EpicImageType::Enhanced),
            other => Err(format!("image_type must be 'natural' or 'enhanced', got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct J2000Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<EpicPosition> for J2000Position {
    fn from(p: EpicPosition) -> Self {
        Self { x: p.x, y: p.y, z: p.z }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EarthImage {
    pub identifier: String,
    pub caption: String,
    pub image_url: String,
    pub thumbnail_url: String,
    pub date_time: String,
    pub centroid_coordinates: Coordinates,
    pub sun_j2000_position: Option<J2000Position>,
    pub dscovr_j2000_position: Option<J2000Position>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EarthImages {
    pub date: String,
    pub image_type: EpicImageType,
    pub images: Vec<EarthImage>,
    pub images_available: usize,
}

pub struct NasaClient {
    apod_http: HttpClient,
    epic_http: HttpClient,
    base_url: String,
    archive_base_url: String,
    api_key: String,
}

impl NasaClient {
    pub fn new(
        base_url: String,
        archive_base_url: String,
        api_key: String,
        timeout: Duration,
        max_retries: u32,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            apod_http: HttpClient::new("NASA APOD", timeout, max_retries)?,
            epic_http: HttpClient::new("NASA EPIC", timeout, max_retries)?,
            base_url,
            archive_base_url,
            api_key,
        })
    }

    /// Astronomy Picture of the Day; today's when `date` is `None`.
    pub async fn apod(&self, date: Option<NaiveDate>) -> Result<Apod, UpstreamError> {
        let url = endpoint(&self.base_url, "/planetary/apod");
        let date_str = date.map(|d| d.format("%Y-%m-%d").to_string());

        let mut params = vec![("api_key", self.api_key.as_str()), ("thumbs", "true")];
        if let Some(d) = date_str.as_deref() {
            params.push(("date", d));
        }

        let raw: ApodResponse = self.apod_http.get_json(&url, &params).await?;
        Ok(Apod {
            title: raw.title,
            date: raw.date,
            explanation: raw.explanation,
            media_type: raw.media_type,
            url: raw.url,
            hdurl: raw.hdurl,
            copyright: raw.copyright.map(|c| c.trim().to_string()),
            thumbnail_url: raw.thumbnail_url,
        })
    }

    /// EPIC full-disc Earth images; the most recent set when `date` is `None`.
    pub async fn earth_images(
        &self,
        date: Option<NaiveDate>,
        image_type: EpicImageType,
    ) -> Result<EarthImages, UpstreamError> {
        let path = match date {
            Some(d) => format!("/EPIC/api/{}/date/{}", image_type.as_str(), d.format("%Y-%m-%d")),
            None => format!("/EPIC/api/{}", image_type.as_str()),
        };
        let url = endpoint(&self.base_url, &path);

        let raw: Vec<EpicImage> = self
            .epic_http
            .get_json(&url, &[("api_key", self.api_key.as_str())])
            .await?;

        if raw.is_empty() {
            return Err(UpstreamError::NotFound {
                service: self.epic_http.service(),
                what: "No images available for specified date".to_string(),
            });
        }

        let images = raw
            .into_iter()
            .map(|img| self.reshape_epic(img, image_type))
            .collect::<Result<Vec<_>, _>>()?;

        let first_date = images[0]
            .date_time
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();

        Ok(EarthImages {
            date: first_date,
            image_type,
            images_available: images.len(),
            images,
        })
    }

    fn reshape_epic(&self, img: EpicImage, image_type: EpicImageType) -> Result<EarthImage, UpstreamError> {
        let day = img
            .date
            .split_whitespace()
            .next()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .ok_or_else(|| {
                UpstreamError::malformed(self.epic_http.service(), format!("bad image date '{}'", img.date))
            })?;

        let base = endpoint(
            &self.archive_base_url,
            &format!("{}/{}", image_type.as_str(), day.format("%Y/%m/%d")),
        );

        Ok(EarthImage {
            image_url: format!("{}/png/{}.png", base, img.image),
            thumbnail_url: format!("{}/thumbs/{}.jpg", base, img.image),
            identifier: img.image,
            caption: img
                .caption
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_EPIC_CAPTION.to_string()),
            date_time: img.date,
            centroid_coordinates: Coordinates {
                lat: img.centroid_coordinates.lat,
                lon: img.centroid_coordinates.lon,
            },
            sun_j2000_position: img.sun_j2000_position.map(Into::into),
            dscovr_j2000_position: img.dscovr_j2000_position.map(Into::into),
        })
    }
}
