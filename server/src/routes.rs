use axum::{
    extract::{rejection::QueryRejection, ConnectInfo, Query, State},
    http::{HeaderMap, Uri},
    response::Json,
    routing::get,
    Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::{
    cache::{keys, ttl::Category, CacheStats, Lookup, TtlCache},
    config::Config,
    eclipses::{self, Eclipse, EclipseKind},
    error::{ApiError, ErrorBody, ErrorDetail},
    lunar::MoonReport,
    places::{self, GeocodeResult},
    upstream::{
        ipgeo::{IpGeoClient, IpLocation},
        iss::{IssClient, IssPosition},
        jpl::{CloseApproach, CloseApproachQuery, CloseApproaches, DateRange, JplClient},
        nasa::{Apod, Coordinates, EarthImage, EarthImages, EpicImageType, J2000Position, NasaClient},
        nominatim::NominatimClient,
        openmeteo::{OpenMeteoClient, WeatherReport},
        usno::UsnoClient,
    },
    validate,
};

const UPCOMING_ECLIPSES: usize = 10;

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub cache: TtlCache<Value>,
    pub weather_client: Arc<OpenMeteoClient>,
    pub iss_client: Arc<IssClient>,
    pub nasa_client: Arc<NasaClient>,
    pub jpl_client: Arc<JplClient>,
    pub geocoder: Arc<NominatimClient>,
    pub ip_client: Option<Arc<IpGeoClient>>,
    pub usno_client: Arc<UsnoClient>,
    /// Lifetime of responses built while an optional upstream was down.
    pub degraded_ttl: Duration,
}

impl AppState {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let retries = config.upstream_max_retries;

        let weather_client = OpenMeteoClient::new(
            config.open_meteo_base_url.clone(),
            config.weather_timeout,
            retries,
        )?;
        let iss_client = IssClient::new(config.iss_base_url.clone(), config.iss_timeout, retries)?;
        let nasa_client = NasaClient::new(
            config.nasa_base_url.clone(),
            config.epic_archive_base_url.clone(),
            config.nasa_api_key.clone(),
            config.nasa_timeout,
            retries,
        )?;
        let jpl_client = JplClient::new(config.jpl_base_url.clone(), config.jpl_timeout, retries)?;
        let geocoder = NominatimClient::new(
            config.nominatim_base_url.clone(),
            config.geocode_timeout,
            retries,
        )?;
        let usno_client = UsnoClient::new(config.usno_base_url.clone(), config.usno_timeout, retries)?;
        let ip_client = match &config.ipgeolocation_api_key {
            Some(key) => Some(Arc::new(IpGeoClient::new(
                config.ipgeolocation_base_url.clone(),
                key.clone(),
                config.ipgeolocation_timeout,
                retries,
            )?)),
            None => {
                tracing::warn!("IPGEOLOCATION_API_KEY not set, /v1/geocode/ip is disabled");
                None
            }
        };

        Ok(Self {
            cache: TtlCache::new(config.cache_max_entries),
            weather_client: Arc::new(weather_client),
            iss_client: Arc::new(iss_client),
            nasa_client: Arc::new(nasa_client),
            jpl_client: Arc::new(jpl_client),
            geocoder: Arc::new(geocoder),
            ip_client,
            usno_client: Arc::new(usno_client),
            degraded_ttl: config.degraded_ttl,
        })
    }
}

// Request/Response types
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WeatherQuery {
    /// Latitude in degrees (alias `lat`)
    #[serde(alias = "lat")]
    pub latitude: Option<f64>,
    /// Longitude in degrees (alias `lon`)
    #[serde(alias = "lon")]
    pub longitude: Option<f64>,
    /// City name, used when coordinates are omitted. May be "City, State".
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MoonQuery {
    /// YYYY-MM-DD, default today (UTC)
    pub date: Option<String>,
    /// Latitude for rise/set times
    #[serde(alias = "lat")]
    pub latitude: Option<f64>,
    /// Longitude for rise/set times
    #[serde(alias = "lon")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateQuery {
    /// YYYY-MM-DD
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EarthImageQuery {
    /// YYYY-MM-DD, default latest
    pub date: Option<String>,
    /// `natural` or `enhanced`
    pub image_type: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AsteroidQuery {
    /// Days to look ahead, 1-365 (default 30)
    pub days_ahead: Option<u32>,
    /// Maximum distance in lunar distances (default 10)
    pub max_distance_ld: Option<f64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GeocodeQuery {
    pub city: Option<String>,
    /// State code (US) or name
    pub state: Option<String>,
    /// Country code or name (default US)
    pub country: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IpQuery {
    /// IPv4 or IPv6 address. When omitted, the first `X-Forwarded-For` hop
    /// or else the peer address, which must be publicly routable.
    pub ip: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EclipseQuery {
    pub year: Option<i32>,
    /// `solar` or `lunar`
    pub kind: Option<String>,
}

/// Success envelope shared by every data endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct Envelope {
    pub status: String,
    #[schema(value_type = Object)]
    pub data: Value,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub timestamp: String,
}

impl Envelope {
    fn success(data: Value, cached: bool, source: Option<&str>) -> Json<Self> {
        Json(Self {
            status: "success".to_string(),
            data,
            cached,
            source: source.map(str::to_string),
            timestamp: now_rfc3339(),
        })
    }

    fn from_lookup(lookup: Lookup<Value>, source: &str) -> Json<Self> {
        Self::success(lookup.value, lookup.cached, Some(source))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub service: String,
    pub cache: CacheStats,
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Serves `key` from cache or runs `fetch` once for all concurrent callers.
async fn cached_fetch<T, F>(state: &AppState, key: &str, fetch: F) -> Result<Lookup<Value>, ApiError>
where
    T: Serialize,
    F: Future<Output = Result<(T, Duration), ApiError>>,
{
    state
        .cache
        .get_or_fetch(key, async move {
            let (payload, ttl) = fetch.await?;
            let value = serde_json::to_value(payload)
                .map_err(|e| ApiError::Internal(format!("failed to encode payload: {}", e)))?;
            Ok((value, ttl))
        })
        .await
}

/// Live geocoding with the static table as a fallback. Fallback answers are
/// returned uncached.
async fn resolve_place(
    state: &AppState,
    city: &str,
    region: Option<&str>,
    country: &str,
) -> Result<(GeocodeResult, bool), ApiError> {
    let (city, region) = places::split_city_state(city, region);
    if city.is_empty() {
        return Err(ApiError::invalid("city must not be empty"));
    }

    let key = keys::geocode(city, region, country);
    let geocoder = Arc::clone(&state.geocoder);
    let (q_city, q_region, q_country) = (
        city.to_string(),
        region.map(str::to_string),
        country.to_string(),
    );

    let live = cached_fetch(state, &key, async move {
        let place = geocoder
            .search(&q_city, q_region.as_deref(), &q_country)
            .await?;
        Ok((place, Category::Geocode.ttl()))
    })
    .await;

    match live {
        Ok(lookup) => {
            let place = serde_json::from_value(lookup.value)
                .map_err(|e| ApiError::Internal(format!("cached geocode unreadable: {}", e)))?;
            Ok((place, lookup.cached))
        }
        Err(err) => match places::lookup(city, region, country) {
            Some(place) => {
                tracing::warn!("geocoding '{}' fell back to static table: {}", city, err);
                Ok((place, false))
            }
            None => Err(err),
        },
    }
}

// Route handlers
pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "Astra Astronomy API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Real-time astronomical data backend for Astra companion",
        "documentation": "/openapi.json",
        "health": "/health",
        "endpoints": {
            "weather": "/v1/weather",
            "moon": "/v1/moon",
            "iss": "/v1/iss",
            "apod": "/v1/apod",
            "asteroids": "/v1/asteroids",
            "earth_image": "/v1/earth-image",
            "eclipses": "/v1/eclipses",
            "geocode": "/v1/geocode",
            "geocode_ip": "/v1/geocode/ip",
            "cache_stats": "/v1/cache/stats"
        }
    }))
}

#[utoipa::path(get, path = "/health", responses((status = 200, description = "Success", body = HealthResponse)))]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: now_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: "astra-api".to_string(),
        cache: state.cache.stats().await,
    })
}

#[utoipa::path(
    get,
    path = "/v1/weather",
    params(WeatherQuery),
    responses(
        (status = 200, description = "Current conditions in the success envelope", body = WeatherReport),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 504, description = "Upstream timed out", body = ErrorBody)
    )
)]
pub async fn get_weather(
    State(state): State<AppState>,
    query: Result<Query<WeatherQuery>, QueryRejection>,
) -> Result<Json<Envelope>, ApiError> {
    let Query(params) = query?;

    let (lat, lon, place) = match (params.latitude, params.longitude, params.city.as_deref()) {
        (Some(lat), Some(lon), _) => (lat, lon, None),
        (None, None, Some(city)) => {
            let country = params.country.as_deref().unwrap_or("US");
            let (place, _) = resolve_place(&state, city, params.state.as_deref(), country).await?;
            (place.latitude, place.longitude, Some(place))
        }
        _ => {
            return Err(ApiError::invalid(
                "provide latitude and longitude, or a city",
            ))
        }
    };
    let (lat, lon) = validate::coordinates(lat, lon)?;
    let (lat, lon) = keys::snap(lat, lon);

    let key = keys::weather(lat, lon);
    let client = Arc::clone(&state.weather_client);
    let mut lookup = cached_fetch(&state, &key, async move {
        let report = client.current(lat, lon).await?;
        Ok((report, Category::Weather.ttl()))
    })
    .await?;

    if let (Some(place), Value::Object(data)) = (place, &mut lookup.value) {
        let location = serde_json::to_value(place)
            .map_err(|e| ApiError::Internal(format!("failed to encode location: {}", e)))?;
        data.insert("location".to_string(), location);
    }

    Ok(Envelope::from_lookup(lookup, "Open-Meteo"))
}

#[utoipa::path(
    get,
    path = "/v1/moon",
    params(MoonQuery),
    responses(
        (status = 200, description = "Success", body = MoonReport),
        (status = 400, description = "Invalid input", body = ErrorBody)
    )
)]
pub async fn get_moon(
    State(state): State<AppState>,
    query: Result<Query<MoonQuery>, QueryRejection>,
) -> Result<Json<Envelope>, ApiError> {
    let Query(params) = query?;
    let date = validate::optional_date(params.date.as_deref())?;
    let location = validate::optional_coordinates(params.latitude, params.longitude)?
        .map(|(lat, lon)| keys::snap(lat, lon));

    let date_key = date.map(|d| d.to_string());
    let key = keys::moon(date_key.as_deref(), location);
    let usno = Arc::clone(&state.usno_client);
    let degraded_ttl = state.degraded_ttl;

    let lookup = cached_fetch(&state, &key, async move {
        let day = date.unwrap_or_else(|| Utc::now().date_naive());
        let mut report = MoonReport::for_date(day);
        let mut keep_for = Category::Moon.ttl();

        if let Some((lat, lon)) = location {
            match usno.moon_times(day, lat, lon).await {
                Ok(times) => {
                    report.moonrise_utc = times.moonrise;
                    report.moonset_utc = times.moonset;
                }
                Err(e) => {
                    tracing::warn!("moon rise/set unavailable, serving phase only: {}", e);
                    keep_for = degraded_ttl;
                }
            }
        }
        Ok((report, keep_for))
    })
    .await?;

    let source = if location.is_some() { "local + USNO" } else { "local" };
    Ok(Envelope::from_lookup(lookup, source))
}

#[utoipa::path(
    get,
    path = "/v1/iss",
    responses(
        (status = 200, description = "Success", body = IssPosition),
        (status = 503, description = "Upstream unavailable", body = ErrorBody)
    )
)]
pub async fn get_iss(State(state): State<AppState>) -> Result<Json<Envelope>, ApiError> {
    let client = Arc::clone(&state.iss_client);
    let lookup = cached_fetch(&state, &keys::iss(), async move {
        let position = client.position().await?;
        Ok((position, Category::IssPosition.ttl()))
    })
    .await?;

    Ok(Envelope::from_lookup(lookup, "Where The ISS At"))
}

#[utoipa::path(
    get,
    path = "/v1/apod",
    params(DateQuery),
    responses(
        (status = 200, description = "Success", body = Apod),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 429, description = "Upstream rate limit", body = ErrorBody)
    )
)]
pub async fn get_apod(
    State(state): State<AppState>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<Envelope>, ApiError> {
    let Query(params) = query?;
    let today = Utc::now().date_naive();
    let date = validate::optional_date(params.date.as_deref())?
        .map(|d| validate::apod_date(d, today))
        .transpose()?;

    let date_key = date.map(|d| d.to_string());
    let client = Arc::clone(&state.nasa_client);
    let lookup = cached_fetch(&state, &keys::apod(date_key.as_deref()), async move {
        let apod = client.apod(date).await?;
        Ok((apod, Category::Apod.ttl()))
    })
    .await?;

    Ok(Envelope::from_lookup(lookup, "NASA APOD"))
}

#[utoipa::path(
    get,
    path = "/v1/earth-image",
    params(EarthImageQuery),
    responses(
        (status = 200, description = "Success", body = EarthImages),
        (status = 404, description = "Nothing found", body = ErrorBody)
    )
)]
pub async fn get_earth_image(
    State(state): State<AppState>,
    query: Result<Query<EarthImageQuery>, QueryRejection>,
) -> Result<Json<Envelope>, ApiError> {
    let Query(params) = query?;
    let image_type: EpicImageType = params
        .image_type
        .as_deref()
        .unwrap_or("natural")
        .parse()
        .map_err(ApiError::InvalidInput)?;
    let date = validate::optional_date(params.date.as_deref())?
        .map(|d| validate::not_in_future(d, Utc::now().date_naive()))
        .transpose()?;

    let date_key = date.map(|d| d.to_string());
    let key = keys::earth_image(date_key.as_deref(), image_type.as_str());
    let client = Arc::clone(&state.nasa_client);
    let lookup = cached_fetch(&state, &key, async move {
        let images = client.earth_images(date, image_type).await?;
        Ok((images, Category::EarthImage.ttl()))
    })
    .await?;

    Ok(Envelope::from_lookup(lookup, "NASA EPIC"))
}

#[utoipa::path(
    get,
    path = "/v1/asteroids",
    params(AsteroidQuery),
    responses(
        (status = 200, description = "Success", body = CloseApproaches),
        (status = 400, description = "Invalid input", body = ErrorBody)
    )
)]
pub async fn get_asteroids(
    State(state): State<AppState>,
    query: Result<Query<AsteroidQuery>, QueryRejection>,
) -> Result<Json<Envelope>, ApiError> {
    let Query(params) = query?;
    let days_ahead = validate::days_ahead(params.days_ahead.unwrap_or(30))?;
    let max_distance_ld = validate::max_distance_ld(params.max_distance_ld.unwrap_or(10.0))?;

    let client = Arc::clone(&state.jpl_client);
    let key = keys::asteroids(days_ahead, max_distance_ld);
    let lookup = cached_fetch(&state, &key, async move {
        let approaches = client.close_approaches(days_ahead, max_distance_ld).await?;
        Ok((approaches, Category::CloseApproach.ttl()))
    })
    .await?;

    Ok(Envelope::from_lookup(lookup, "JPL SBDB Close Approach Data"))
}

#[utoipa::path(
    get,
    path = "/v1/geocode",
    params(GeocodeQuery),
    responses(
        (status = 200, description = "Success", body = GeocodeResult),
        (status = 404, description = "Nothing found", body = ErrorBody)
    )
)]
pub async fn geocode(
    State(state): State<AppState>,
    query: Result<Query<GeocodeQuery>, QueryRejection>,
) -> Result<Json<Envelope>, ApiError> {
    let Query(params) = query?;
    let city = validate::required(params.city.as_deref(), "city")?;
    let country = params.country.as_deref().unwrap_or("US");

    let (place, cached) = resolve_place(&state, city, params.state.as_deref(), country).await?;
    let source = if place.fallback { "static fallback" } else { "Nominatim" };
    let data = serde_json::to_value(place)
        .map_err(|e| ApiError::Internal(format!("failed to encode place: {}", e)))?;

    Ok(Envelope::success(data, cached, Some(source)))
}

#[utoipa::path(
    get,
    path = "/v1/geocode/ip",
    params(IpQuery),
    responses(
        (status = 200, description = "Success", body = IpLocation),
        (status = 500, description = "Not configured", body = ErrorBody)
    )
)]
pub async fn geocode_ip(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    query: Result<Query<IpQuery>, QueryRejection>,
) -> Result<Json<Envelope>, ApiError> {
    let Query(params) = query?;
    let client = state
        .ip_client
        .clone()
        .ok_or_else(|| ApiError::Internal("IP geolocation is not configured".to_string()))?;

    let ip = match params.ip.as_deref().filter(|ip| !ip.trim().is_empty()) {
        Some(raw) => validate::ip_address(raw)?,
        None => caller_address(&headers, peer.map(|ConnectInfo(addr)| addr))
            .filter(validate::is_public)
            .ok_or_else(|| {
                ApiError::invalid("no public client address found, pass ip explicitly")
            })?,
    }
    .to_string();

    let key = keys::ip_location(&ip);
    let lookup = cached_fetch(&state, &key, async move {
        let location = client.locate(&ip).await?;
        Ok((location, Category::IpLocation.ttl()))
    })
    .await?;

    Ok(Envelope::from_lookup(lookup, "ipgeolocation"))
}

/// First `X-Forwarded-For` hop, else the socket peer.
fn caller_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|hop| hop.trim().parse().ok())
        .or_else(|| peer.map(|addr| addr.ip()))
}

#[utoipa::path(
    get,
    path = "/v1/eclipses",
    params(EclipseQuery),
    responses(
        (status = 200, description = "Success", body = [Eclipse]),
        (status = 400, description = "Invalid input", body = ErrorBody)
    )
)]
pub async fn get_eclipses(
    query: Result<Query<EclipseQuery>, QueryRejection>,
) -> Result<Json<Envelope>, ApiError> {
    let Query(params) = query?;
    let kind = params
        .kind
        .as_deref()
        .map(str::parse::<EclipseKind>)
        .transpose()
        .map_err(ApiError::InvalidInput)?;

    let list = match params.year {
        Some(year) if (eclipses::FIRST_YEAR..=eclipses::LAST_YEAR).contains(&year) => {
            eclipses::lookup(Some(year), kind)
        }
        Some(year) => {
            return Err(ApiError::invalid(format!(
                "year must be between {} and {}, got {}",
                eclipses::FIRST_YEAR,
                eclipses::LAST_YEAR,
                year
            )))
        }
        None => eclipses::upcoming(Utc::now().date_naive(), kind, UPCOMING_ECLIPSES),
    };

    let data = json!({ "count": list.len(), "eclipses": list });
    Ok(Envelope::success(data, false, Some("static table")))
}

#[utoipa::path(get, path = "/v1/cache/stats", responses((status = 200, description = "Success", body = CacheStats)))]
pub async fn cache_stats(State(state): State<AppState>) -> Result<Json<Envelope>, ApiError> {
    let stats = serde_json::to_value(state.cache.stats().await)
        .map_err(|e| ApiError::Internal(format!("failed to encode stats: {}", e)))?;
    Ok(Envelope::success(stats, false, None))
}

pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {}", uri.path()))
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Astra Astronomy API", description = "Real-time astronomical data backend"),
    paths(
        health,
        get_weather,
        get_moon,
        get_iss,
        get_apod,
        get_earth_image,
        get_asteroids,
        geocode,
        geocode_ip,
        get_eclipses,
        cache_stats
    ),
    components(schemas(
        Envelope,
        ErrorBody,
        ErrorDetail,
        HealthResponse,
        CacheStats,
        WeatherReport,
        MoonReport,
        IssPosition,
        Apod,
        EarthImages,
        EarthImage,
        EpicImageType,
        Coordinates,
        J2000Position,
        CloseApproaches,
        CloseApproach,
        CloseApproachQuery,
        DateRange,
        GeocodeResult,
        IpLocation,
        Eclipse,
        EclipseKind
    ))
)]
pub struct ApiDoc;

// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/openapi.json", get(openapi))
        .route("/v1/weather", get(get_weather))
        .route("/v1/moon", get(get_moon))
        .route("/v1/iss", get(get_iss))
        .route("/v1/apod", get(get_apod))
        .route("/v1/earth-image", get(get_earth_image))
        .route("/v1/asteroids", get(get_asteroids))
        .route("/v1/geocode", get(geocode))
        .route("/v1/geocode/ip", get(geocode_ip))
        .route("/v1/eclipses", get(get_eclipses))
        .route("/v1/cache/stats", get(cache_stats))
        .fallback(not_found)
        .with_state(state)
}
