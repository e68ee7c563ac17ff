use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use thermoscan_api::config::ServerConfig;
use thermoscan_api::router::build_app_router;
use thermoscan_api::state::AppState;
use thermoscan_core::config::AnalysisConfig;
use thermoscan_pipeline::ReportAggregator;
use thermoscan_store::FsCaptureStore;

/// Capture file prefixes in phase order: pre, post, recovery.
pub const PREFIXES: [&str; 3] = ["PREWORKOUT", "POSTWORKOUT", "RECOVERY48HR"];

/// Build a test `ServerConfig` serving captures from `images_dir`.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config(images_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        images_dir: images_dir.to_path_buf(),
        images_base_url: "/images".to_string(),
        frontend_dir: None,
        analysis_config: None,
        analysis_concurrency: Some(2),
    }
}

/// Build the full application router over a filesystem store rooted at
/// `images_dir`, with the same middleware stack production uses.
pub fn build_test_app(images_dir: &Path) -> Router {
    let config = test_config(images_dir);
    let analysis = AnalysisConfig::default();
    let store = FsCaptureStore::new(images_dir, "/images", analysis.skin_range);
    let aggregator = ReportAggregator::new(Arc::new(store), analysis)
        .unwrap()
        .with_concurrency(2);

    let state = AppState { aggregator };
    build_app_router(state, &config)
}

/// CSV text of a 40x20 grid with two legs on a 22°C background; the left
/// leg runs `offset` °C hotter than the right one.
pub fn legs_csv(offset: f64) -> String {
    let mut csv = String::new();
    for _ in 0..20 {
        let row: Vec<String> = (0..40)
            .map(|col| {
                let t = match col {
                    8..=15 => 31.0 + offset,
                    24..=31 => 31.0,
                    _ => 22.0,
                };
                format!("{t:.2}℃")
            })
            .collect();
        csv.push_str(&row.join(","));
        csv.push('\n');
    }
    csv
}

/// Write the captures of one view. `None` leaves that phase missing.
pub fn write_view(root: &Path, session: &str, view: &str, offsets: [Option<f64>; 3]) {
    let dir = root.join(session);
    std::fs::create_dir_all(&dir).unwrap();
    for (prefix, offset) in PREFIXES.iter().zip(offsets) {
        if let Some(offset) = offset {
            std::fs::write(dir.join(format!("{prefix}_{view}.csv")), legs_csv(offset)).unwrap();
            std::fs::write(
                dir.join(format!("{prefix}_{view}.json")),
                r#"{"ambient_c": 22.0}"#,
            )
            .unwrap();
        }
    }
}

/// Send a GET request through the router.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
