#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Json;
use axum::Router;
use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use usb_photo_frame::config::{Configuration, ProviderKind, Resolution};
use usb_photo_frame::platform::connectivity::Reachability;

pub const PEXELS_KEY: &str = "test-key";

/// In-process stand-in for the galleries and overlay services.
#[derive(Default)]
pub struct FakeUpstream {
    /// Every manifest or image request, as `kind:detail`.
    pub requests: Mutex<Vec<String>>,
    /// When set, every JSON endpoint answers 503.
    pub manifests_down: AtomicBool,
    pub bing_ids: Mutex<Vec<String>>,
    pub natgeo_first: Mutex<Vec<String>>,
    pub natgeo_previous: Mutex<Vec<String>>,
    pub pexels_ids: Mutex<Vec<u64>>,
    /// Image names served as undecodable bytes.
    pub corrupt: Mutex<HashSet<String>>,
    pub calendar_down: AtomicBool,
}

impl FakeUpstream {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_bing(&self, ids: &[&str]) {
        *self.bing_ids.lock().unwrap() = ids.iter().map(|s| s.to_string()).collect();
    }

    pub fn set_natgeo(&self, first: &[&str], previous: &[&str]) {
        *self.natgeo_first.lock().unwrap() = first.iter().map(|s| s.to_string()).collect();
        *self.natgeo_previous.lock().unwrap() = previous.iter().map(|s| s.to_string()).collect();
    }

    pub fn set_pexels(&self, ids: &[u64]) {
        *self.pexels_ids.lock().unwrap() = ids.to_vec();
    }

    pub fn corrupt(&self, name: &str) {
        self.corrupt.lock().unwrap().insert(name.to_string());
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn hit(&self, what: String) {
        self.requests.lock().unwrap().push(what);
    }

    fn manifests_down(&self) -> bool {
        self.manifests_down.load(Ordering::SeqCst)
    }
}

/// Serve `upstream` on an ephemeral port and return its base URL.
pub async fn spawn_upstream(upstream: Arc<FakeUpstream>) -> String {
    let router = Router::new()
        .route("/HPImageArchive.aspx", get(bing_archive))
        .route("/th", get(bing_image))
        .route(
            "/photography/photo-of-the-day/_jcr_content/.gallery.json",
            get(natgeo_first),
        )
        .route("/natgeo-previous.json", get(natgeo_previous))
        .route("/ngimg/{name}", get(natgeo_image))
        .route("/v1/curated", get(pexels_curated))
        .route("/photos/{id}/{file}", get(pexels_image))
        .route("/picsum/{w}/{h}/", get(picsum_image))
        .route("/weather/forecast", get(weather))
        .route("/moon/get", get(moon))
        .route("/calendar/get/4", get(calendar_events))
        .route("/calendar/get", get(calendar_names))
        .route("/forecast/get", get(loadshed))
        .with_state(upstream);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

type Shared = State<Arc<FakeUpstream>>;

pub fn jpeg_bytes(width: u32, height: u32, shade: u8) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([shade, 128, 255 - shade]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Jpeg).unwrap();
    out.into_inner()
}

fn image_response(upstream: &FakeUpstream, name: &str) -> Response {
    upstream.hit(format!("image:{name}"));
    if upstream.corrupt.lock().unwrap().contains(name) {
        return ([(header::CONTENT_TYPE, "image/jpeg")], b"not really a jpeg".to_vec())
            .into_response();
    }
    (
        [(header::CONTENT_TYPE, "image/jpeg")],
        jpeg_bytes(320, 200, (name.len() as u8).wrapping_mul(10)),
    )
        .into_response()
}

fn unavailable() -> Response {
    StatusCode::SERVICE_UNAVAILABLE.into_response()
}

async fn bing_archive(State(up): Shared, Query(q): Query<HashMap<String, String>>) -> Response {
    up.hit(format!("manifest:bing:n={}", q.get("n").cloned().unwrap_or_default()));
    if up.manifests_down() {
        return unavailable();
    }
    let images: Vec<Value> = up
        .bing_ids
        .lock()
        .unwrap()
        .iter()
        .map(|id| {
            json!({
                "url": format!("/th?id={id}_1920x1080.jpg"),
                "urlbase": format!("/th?id={id}"),
                "copyright": format!("{id} (c) Someone"),
            })
        })
        .collect();
    Json(json!({ "images": images })).into_response()
}

async fn bing_image(State(up): Shared, Query(q): Query<HashMap<String, String>>) -> Response {
    let id = q.get("id").cloned().unwrap_or_default();
    let name = id.trim_end_matches("_1920x1080.jpg").to_string();
    image_response(&up, &name)
}

fn natgeo_page(base_items: &[String], previous: &str) -> Value {
    let items: Vec<Value> = base_items
        .iter()
        .map(|name| {
            json!({
                "image": {
                    "title": format!("Title {name}"),
                    "credit": "Photographer",
                    "uri": format!("{{BASE}}/ngimg/{name}"),
                    "aspectRatio": 1.5
                }
            })
        })
        .collect();
    json!({ "galleryTitle": "Photo of the Day", "previousEndpoint": previous, "items": items })
}

fn with_base(value: Value, headers: &HeaderMap) -> Value {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("127.0.0.1");
    let text = value.to_string().replace("{BASE}", &format!("http://{host}"));
    serde_json::from_str(&text).unwrap()
}

async fn natgeo_first(State(up): Shared, headers: HeaderMap) -> Response {
    up.hit("manifest:natgeo".to_string());
    if up.manifests_down() {
        return unavailable();
    }
    let page = natgeo_page(&up.natgeo_first.lock().unwrap(), "/natgeo-previous.json");
    Json(with_base(page, &headers)).into_response()
}

async fn natgeo_previous(State(up): Shared, headers: HeaderMap) -> Response {
    up.hit("manifest:natgeo-previous".to_string());
    if up.manifests_down() {
        return unavailable();
    }
    let page = natgeo_page(&up.natgeo_previous.lock().unwrap(), "");
    Json(with_base(page, &headers)).into_response()
}

async fn natgeo_image(State(up): Shared, UrlPath(name): UrlPath<String>) -> Response {
    image_response(&up, &name)
}

async fn pexels_curated(
    State(up): Shared,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    up.hit(format!(
        "manifest:pexels:per_page={}",
        q.get("per_page").cloned().unwrap_or_default()
    ));
    if up.manifests_down() {
        return unavailable();
    }
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(PEXELS_KEY);
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let photos: Vec<Value> = up
        .pexels_ids
        .lock()
        .unwrap()
        .iter()
        .map(|id| json!({ "id": id, "width": 4000, "height": 3000, "photographer": format!("P{id}") }))
        .collect();
    Json(json!({ "page": 1, "per_page": photos.len(), "photos": photos })).into_response()
}

async fn pexels_image(
    State(up): Shared,
    UrlPath((id, _file)): UrlPath<(String, String)>,
) -> Response {
    image_response(&up, &id)
}

async fn picsum_image(State(up): Shared, UrlPath((w, h)): UrlPath<(u32, u32)>) -> Response {
    up.hit(format!("image:picsum:{w}x{h}"));
    if up.manifests_down() {
        return unavailable();
    }
    ([(header::CONTENT_TYPE, "image/jpeg")], jpeg_bytes(w, h, 77)).into_response()
}

async fn weather(State(up): Shared) -> Response {
    up.hit("overlay:weather".to_string());
    if up.manifests_down() {
        return unavailable();
    }
    Json(json!({
        "Current": {
            "Temp": 21.4, "Humidity": 63, "Pressure": 1017.2,
            "WindSpeed": 3.4, "WindDirection": 45,
            "WeatherIcon": 2, "WeatherDesc": "Partly cloudy",
            "Sunrise": "2024-03-01T06:12:00+02:00",
            "Sunset": "2024-03-01T18:47:00+02:00"
        },
        "Forecast": [
            {"Day": "2099-03-02T00:00:00+02:00", "Name": "Saturday", "WeatherIcon": 6,
             "WeatherDesc": "Rain", "TempMin": 12.2, "TempMax": 19.8}
        ]
    }))
    .into_response()
}

async fn moon(State(up): Shared) -> Response {
    up.hit("overlay:moon".to_string());
    if up.manifests_down() {
        return unavailable();
    }
    Json(json!({
        "Date": "2024-03-01T20:00:00+02:00", "Age": 19.7, "Phase": 0.66,
        "PhaseName": "Waning Gibbous", "Illumination": 0.8
    }))
    .into_response()
}

async fn calendar_events(State(up): Shared) -> Response {
    up.hit("overlay:calendar-events".to_string());
    if up.manifests_down() || up.calendar_down.load(Ordering::SeqCst) {
        return unavailable();
    }
    Json(json!([
        {"id": "1", "name": "Family", "start": "2099-03-02T09:30:00+02:00",
         "end": "2099-03-02T10:30:00+02:00", "dayName": "Monday", "time": "09:30",
         "duration": "1h", "summary": "Swimming", "location": "", "description": "",
         "colour": "SkyBlue"}
    ]))
    .into_response()
}

async fn calendar_names(State(up): Shared) -> Response {
    up.hit("overlay:calendar-names".to_string());
    if up.manifests_down() {
        return unavailable();
    }
    Json(json!([{ "name": "Family", "colour": "SkyBlue" }])).into_response()
}

async fn loadshed(State(up): Shared) -> Response {
    up.hit("overlay:loadshed".to_string());
    if up.manifests_down() {
        return unavailable();
    }
    Json(json!({
        "name": "Area 7", "region": "City", "stage": 2,
        "Events": [
            {"start": "2099-03-01T14:00:00+02:00", "end": "2099-03-01T16:30:00+02:00",
             "day": "Fri", "note": "14:00-16:30", "stage": 2}
        ]
    }))
    .into_response()
}

/// Configuration with every path inside `root` and every endpoint pointing at `base`.
pub fn test_config(root: &Path, base: &str, provider: ProviderKind) -> Configuration {
    let mut cfg = Configuration {
        provider,
        image_count: 3,
        resolution: Resolution {
            width: 80,
            height: 48,
        },
        weather_url: base.to_string(),
        calendar_url: base.to_string(),
        loadshed_url: base.to_string(),
        cache_root: root.join("img"),
        local_folder: root.join("img/filefolder"),
        render_path: root.join("img/display"),
        state_dir: root.join("state"),
        ..Configuration::default()
    };
    cfg.publish.path = root.join("usb_share");
    cfg.assets.icon_dir = root.join("icons");
    cfg.assets.font_path = None;
    cfg.endpoints.bing = base.to_string();
    cfg.endpoints.natgeo = base.to_string();
    cfg.endpoints.pexels_api = base.to_string();
    cfg.endpoints.pexels_images = base.to_string();
    cfg.endpoints.pexels_api_key = PEXELS_KEY.to_string();
    cfg.endpoints.picsum = format!("{base}/picsum");
    cfg.http_timeout = Duration::from_secs(5);
    cfg.connectivity.attempts = 1;
    cfg.connectivity.interval = Duration::from_millis(1);
    cfg.usb_gadget.detach_command = vec!["true".to_string()];
    cfg.usb_gadget.attach_command = vec!["true".to_string()];
    cfg.usb_gadget.settle_delay = Duration::from_millis(1);
    cfg
}

pub struct AlwaysUp;

#[async_trait]
impl Reachability for AlwaysUp {
    async fn is_reachable(&self) -> bool {
        true
    }
}

/// Sorted file names in `dir`.
pub fn names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
