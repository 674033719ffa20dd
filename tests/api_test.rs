use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt; // for `collect`
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt; // for `oneshot`

use ytgrab::config::Config;
use ytgrab::models::{RawFormat, VideoMetadata};
use ytgrab::resolver::{FetchOutcome, MediaResolver};
use ytgrab::AppState;

/// Scripted stand-in for yt-dlp so the handlers run without a network
/// connection or an installed binary.
#[derive(Default)]
struct MockResolver {
    metadata: Option<VideoMetadata>,
    metadata_error: Option<String>,
    fetch_error: Option<String>,
    fetch_title: String,
    fetch_path: Option<PathBuf>,
    seen_selectors: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl MediaResolver for MockResolver {
    async fn resolve_metadata(&self, _url: &str) -> anyhow::Result<VideoMetadata> {
        if let Some(message) = &self.metadata_error {
            anyhow::bail!("{}", message);
        }
        Ok(self.metadata.clone().expect("mock metadata not configured"))
    }

    async fn fetch(
        &self,
        _url: &str,
        format_selector: &str,
        _output_template: &str,
        _merge_format: &str,
    ) -> anyhow::Result<FetchOutcome> {
        self.seen_selectors
            .lock()
            .unwrap()
            .push(format_selector.to_string());
        if let Some(message) = &self.fetch_error {
            anyhow::bail!("{}", message);
        }
        Ok(FetchOutcome {
            title: self.fetch_title.clone(),
            output_path: self.fetch_path.clone(),
        })
    }
}

fn video_format(id: &str, height: u32, filesize: Option<f64>, tbr: Option<f64>) -> RawFormat {
    RawFormat {
        format_id: id.to_string(),
        ext: "mp4".to_string(),
        height: Some(height),
        vcodec: Some("avc1.64001f".to_string()),
        filesize,
        filesize_approx: None,
        tbr,
    }
}

/// Builds the real router around a mock resolver and an isolated scratch dir.
fn test_app(resolver: Arc<MockResolver>, scratch: &std::path::Path) -> Router {
    let state = AppState {
        config: Arc::new(Config {
            temp_download_directory: scratch.to_string_lossy().to_string(),
        }),
        resolver,
    };
    ytgrab::app(state)
}

async fn post_json(app: Router, uri: &str, body: Value) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ===================================================================
//                          PAGE ROUTES
// ===================================================================

#[tokio::test]
async fn index_and_contact_pages_render() {
    for uri in ["/", "/contact"] {
        let scratch = TempDir::new().unwrap();
        let app = test_app(Arc::new(MockResolver::default()), scratch.path());
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "route {}", uri);
    }
}

// ===================================================================
//                          GET-FORMATS ROUTE
// ===================================================================

#[tokio::test]
async fn get_formats_requires_a_url() {
    let scratch = TempDir::new().unwrap();
    let app = test_app(Arc::new(MockResolver::default()), scratch.path());

    let response = post_json(app, "/api/get-formats", json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({ "error": "URL is required." }));
}

#[tokio::test]
async fn get_formats_rejects_an_empty_url() {
    let scratch = TempDir::new().unwrap();
    let app = test_app(Arc::new(MockResolver::default()), scratch.path());

    let response = post_json(app, "/api/get-formats", json!({ "url": "" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({ "error": "URL is required." }));
}

#[tokio::test]
async fn get_formats_surfaces_resolver_failures() {
    let scratch = TempDir::new().unwrap();
    let resolver = Arc::new(MockResolver {
        metadata_error: Some("Video unavailable".to_string()),
        ..Default::default()
    });
    let app = test_app(resolver, scratch.path());

    let response = post_json(app, "/api/get-formats", json!({ "url": "https://example.com/v" })).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({ "error": "Video unavailable" }));
}

#[tokio::test]
async fn get_formats_returns_curated_descending_list() {
    let scratch = TempDir::new().unwrap();
    let mut audio_only = video_format("140", 0, Some(3_000_000.0), Some(128.0));
    audio_only.height = None;
    audio_only.vcodec = Some("none".to_string());

    let resolver = Arc::new(MockResolver {
        metadata: Some(VideoMetadata {
            title: "Some Video".to_string(),
            thumbnail: Some("https://example.com/thumb.jpg".to_string()),
            formats: vec![
                audio_only,
                video_format("1080-nosize", 1080, None, Some(8000.0)),
                video_format("1080-sized", 1080, Some(80.0 * 1024.0 * 1024.0), Some(4000.0)),
                video_format("720", 720, Some(1536.0), Some(2500.0)),
                video_format("480", 480, None, Some(1200.0)),
            ],
        }),
        ..Default::default()
    });
    let app = test_app(resolver, scratch.path());

    let response = post_json(app, "/api/get-formats", json!({ "url": "https://example.com/v" })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["thumbnail_url"], "https://example.com/thumb.jpg");
    assert_eq!(
        body["formats"],
        json!([
            { "format_id": "1080-sized", "resolution": 1080, "ext": "mp4", "filesize": "80.00 MB" },
            { "format_id": "720", "resolution": 720, "ext": "mp4", "filesize": "1.50 KB" },
            { "format_id": "480", "resolution": 480, "ext": "mp4", "filesize": "N/A" },
        ])
    );
}

#[tokio::test]
async fn get_formats_with_no_video_formats_is_an_empty_list() {
    let scratch = TempDir::new().unwrap();
    let resolver = Arc::new(MockResolver {
        metadata: Some(VideoMetadata {
            title: "Audio Only".to_string(),
            thumbnail: None,
            formats: vec![],
        }),
        ..Default::default()
    });
    let app = test_app(resolver, scratch.path());

    let response = post_json(app, "/api/get-formats", json!({ "url": "https://example.com/v" })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["formats"], json!([]));
    assert_eq!(body["thumbnail_url"], Value::Null);
}

// ===================================================================
//                          DOWNLOAD ROUTE
// ===================================================================

#[tokio::test]
async fn download_requires_url_and_resolution() {
    let expected = json!({ "error": "URL and resolution are required." });
    for body in [
        json!({}),
        json!({ "url": "https://example.com/v" }),
        json!({ "resolution": 720 }),
        json!({ "url": "https://example.com/v", "resolution": "" }),
    ] {
        let scratch = TempDir::new().unwrap();
        let app = test_app(Arc::new(MockResolver::default()), scratch.path());
        let response = post_json(app, "/api/download-selected-format", body.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {}", body);
        assert_eq!(body_json(response).await, expected);
    }
}

#[tokio::test]
async fn download_constrains_the_selector_to_the_requested_height() {
    let media_dir = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let file_path = media_dir.path().join("clip.mp4");
    std::fs::write(&file_path, b"data").unwrap();

    let resolver = Arc::new(MockResolver {
        fetch_title: "clip".to_string(),
        fetch_path: Some(file_path),
        ..Default::default()
    });
    let app = test_app(resolver.clone(), scratch.path());

    let response = post_json(
        app,
        "/api/download-selected-format",
        json!({ "url": "https://example.com/v", "resolution": 720 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let selectors = resolver.seen_selectors.lock().unwrap();
    assert_eq!(selectors.len(), 1);
    assert_eq!(selectors[0], "bestvideo[height<=720]+bestaudio/best[height<=720]");
}

#[tokio::test]
async fn download_streams_the_file_and_deletes_it_afterwards() {
    let media_dir = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let file_path = media_dir.path().join("served.mp4");
    std::fs::write(&file_path, b"fake mp4 payload").unwrap();

    let resolver = Arc::new(MockResolver {
        fetch_title: "My: Video?".to_string(),
        fetch_path: Some(file_path.clone()),
        ..Default::default()
    });
    let app = test_app(resolver, scratch.path());

    let response = post_json(
        app,
        "/api/download-selected-format",
        json!({ "url": "https://example.com/v", "resolution": "1080" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"), "{}", disposition);
    assert!(
        disposition.contains("filename=\"My Video.mp4\""),
        "illegal characters must be stripped from the filename: {}",
        disposition
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.as_ref(), b"fake mp4 payload");

    // Once the body has been fully consumed and released, the temp file is gone.
    assert!(
        !file_path.exists(),
        "temporary file should be deleted after the response completes"
    );
}

#[tokio::test]
async fn download_reports_failure_when_no_file_materializes() {
    let scratch = TempDir::new().unwrap();
    let resolver = Arc::new(MockResolver {
        fetch_title: "ghost".to_string(),
        fetch_path: Some(PathBuf::from("nowhere/ghost.mp4")),
        ..Default::default()
    });
    let app = test_app(resolver, scratch.path());

    let response = post_json(
        app,
        "/api/download-selected-format",
        json!({ "url": "https://example.com/v", "resolution": 480 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Failed to download the video file to the server." })
    );
}

#[tokio::test]
async fn download_surfaces_fetch_failures() {
    let scratch = TempDir::new().unwrap();
    let resolver = Arc::new(MockResolver {
        fetch_error: Some("ERROR: unable to download video data".to_string()),
        ..Default::default()
    });
    let app = test_app(resolver, scratch.path());

    let response = post_json(
        app,
        "/api/download-selected-format",
        json!({ "url": "https://example.com/v", "resolution": 720 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "ERROR: unable to download video data" })
    );
}
