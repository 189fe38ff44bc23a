//! In-process fake of every upstream service, for HTTP-level tests.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .expect("test server");
    });
    format!("http://{}", addr)
}

#[derive(Default, Debug)]
pub struct Hits {
    pub weather: AtomicUsize,
    pub geocode: AtomicUsize,
    pub iss: AtomicUsize,
    pub apod: AtomicUsize,
    pub epic: AtomicUsize,
    pub cad: AtomicUsize,
    pub ipgeo: AtomicUsize,
    pub usno: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct FakeUpstream {
    pub hits: Arc<Hits>,
    weather_delay: Duration,
    weather_failures: usize,
    weather_garbled: bool,
    geocode_empty: bool,
    usno_down: bool,
    epic_empty: bool,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every forecast response is held back by `delay`.
    pub fn weather_delay(mut self, delay: Duration) -> Self {
        self.weather_delay = delay;
        self
    }

    /// The first `n` forecast requests answer HTTP 500.
    pub fn weather_failures(mut self, n: usize) -> Self {
        self.weather_failures = n;
        self
    }

    /// Forecast requests answer 200 with an HTML page.
    pub fn weather_garbled(mut self) -> Self {
        self.weather_garbled = true;
        self
    }

    /// Geocoding searches find nothing.
    pub fn geocode_empty(mut self) -> Self {
        self.geocode_empty = true;
        self
    }

    pub fn usno_down(mut self) -> Self {
        self.usno_down = true;
        self
    }

    pub fn epic_empty(mut self) -> Self {
        self.epic_empty = true;
        self
    }

    pub async fn start(self) -> (String, Arc<Hits>) {
        let hits = Arc::clone(&self.hits);
        let router = Router::new()
            .route("/v1/forecast", get(forecast))
            .route("/search", get(search))
            .route("/v1/satellites/:id", get(satellite))
            .route("/planetary/apod", get(apod))
            .route("/EPIC/api/:kind", get(epic))
            .route("/EPIC/api/:kind/date/:date", get(epic))
            .route("/cad.api", get(cad))
            .route("/ipgeo", get(ipgeo))
            .route("/api/rstt/oneday", get(rstt))
            .with_state(self);
        (spawn(router).await, hits)
    }
}

type Params = Query<HashMap<String, String>>;

fn param_f64(params: &HashMap<String, String>, name: &str) -> f64 {
    params.get(name).and_then(|v| v.parse().ok()).unwrap_or(0.0)
}

async fn forecast(State(fake): State<FakeUpstream>, Query(params): Params) -> Response {
    let n = fake.hits.weather.fetch_add(1, Ordering::SeqCst);
    if !fake.weather_delay.is_zero() {
        sleep(fake.weather_delay).await;
    }
    if n < fake.weather_failures {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    if fake.weather_garbled {
        return "<html>oops</html>".into_response();
    }
    // Held long enough for concurrent callers to pile up on one key.
    sleep(Duration::from_millis(200)).await;

    Json(json!({
        "latitude": param_f64(&params, "latitude"),
        "longitude": param_f64(&params, "longitude"),
        "current": {
            "time": "2025-01-14T12:00",
            "temperature_2m": 20.0,
            "wind_speed_10m": 16.1,
            "wind_direction_10m": 225.0,
            "weather_code": 2,
            "is_day": 1,
            "cloud_cover": 40.0
        }
    }))
    .into_response()
}

async fn search(State(fake): State<FakeUpstream>, Query(params): Params) -> Response {
    fake.hits.geocode.fetch_add(1, Ordering::SeqCst);
    if fake.geocode_empty {
        return Json(json!([])).into_response();
    }
    let q = params.get("q").cloned().unwrap_or_default();
    Json(json!([{
        "lat": "36.0331",
        "lon": "-86.7828",
        "display_name": q,
        "address": {
            "town": "Brentwood",
            "state": "Tennessee",
            "country": "United States",
            "country_code": "us"
        }
    }]))
    .into_response()
}

async fn satellite(State(fake): State<FakeUpstream>, Path(_id): Path<u32>) -> Response {
    fake.hits.iss.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "name": "iss",
        "id": 25544,
        "latitude": 50.11496269845,
        "longitude": 118.07900427317,
        "altitude": 408.05526028199,
        "velocity": 27635.971970874,
        "visibility": "daylight",
        "timestamp": 1364069476
    }))
    .into_response()
}

async fn apod(State(fake): State<FakeUpstream>, Query(params): Params) -> Response {
    fake.hits.apod.fetch_add(1, Ordering::SeqCst);
    let date = params.get("date").cloned().unwrap_or_else(|| "2025-01-14".to_string());
    Json(json!({
        "title": "The Wolf Moon",
        "date": date,
        "explanation": "A full moon rises over the hills.",
        "media_type": "image",
        "url": "https://apod.nasa.gov/apod/image/wolf.jpg",
        "hdurl": "https://apod.nasa.gov/apod/image/wolf_big.jpg",
        "copyright": "\nA. Photographer\n",
        "service_version": "v1"
    }))
    .into_response()
}

async fn epic(State(fake): State<FakeUpstream>) -> Response {
    fake.hits.epic.fetch_add(1, Ordering::SeqCst);
    if fake.epic_empty {
        return Json(json!([])).into_response();
    }
    Json(json!([{
        "identifier": "20240101001751",
        "caption": "",
        "image": "epic_1b_20240101001751",
        "date": "2024-01-01 00:13:03",
        "centroid_coordinates": { "lat": -20.5, "lon": 160.2 },
        "dscovr_j2000_position": { "x": 1.0, "y": 2.0, "z": 3.0 },
        "sun_j2000_position": { "x": 4.0, "y": 5.0, "z": 6.0 }
    }]))
    .into_response()
}

async fn cad(State(fake): State<FakeUpstream>) -> Response {
    fake.hits.cad.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "signature": { "version": "1.5", "source": "NASA/JPL SBDB Close Approach Data API" },
        "count": "1",
        "fields": ["des", "orbit_id", "jd", "cd", "dist", "dist_min", "dist_max", "v_rel", "v_inf", "t_sigma_f", "h", "fullname"],
        "data": [[
            "2025 AB", "5", "2460700.5", "2025-Feb-01 12:00", "0.00257", "0.00256", "0.00258",
            "7.5", "7.4", "< 00:01", "22.0", "       (2025 AB)"
        ]]
    }))
    .into_response()
}

async fn ipgeo(State(fake): State<FakeUpstream>, Query(params): Params) -> Response {
    fake.hits.ipgeo.fetch_add(1, Ordering::SeqCst);
    if params.get("apiKey").map_or(true, |k| k.is_empty()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let ip = params.get("ip").cloned().unwrap_or_else(|| "203.0.113.7".to_string());
    Json(json!({
        "ip": ip,
        "city": "Fairbanks",
        "state_prov": "Alaska",
        "country_name": "United States",
        "country_code2": "US",
        "latitude": "64.83780",
        "longitude": "-147.71640",
        "time_zone": { "name": "America/Anchorage", "offset": -9 }
    }))
    .into_response()
}

async fn rstt(State(fake): State<FakeUpstream>) -> Response {
    fake.hits.usno.fetch_add(1, Ordering::SeqCst);
    if fake.usno_down {
        return StatusCode::BAD_GATEWAY.into_response();
    }
    Json(json!({
        "apiversion": "4.0.1",
        "properties": { "data": { "moondata": [
            { "phen": "Rise", "time": "14:05" },
            { "phen": "Upper Transit", "time": "21:40" },
            { "phen": "Set", "time": "03:12" }
        ]}}
    }))
    .into_response()
}
