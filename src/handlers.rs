use crate::{
    curation::curate_formats,
    error::AppError,
    models::{CuratedFormat, DownloadRequest, FormatsRequest, FormatsResponse},
    util::{format_filesize, sanitize_filename},
    AppState,
};
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::path::PathBuf;
use tokio_stream::StreamExt;
use tokio_util::io::ReaderStream;

// ===================================================================
//                          PAGE HANDLERS
// ===================================================================

/// # GET / - Serves the main HTML page.
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../templates/index.html"))
}

/// # GET /contact - Serves the contact page.
pub async fn contact() -> Html<&'static str> {
    Html(include_str!("../templates/contact.html"))
}

// ===================================================================
//                          FORMATS HANDLER
// ===================================================================

/// # POST /api/get-formats - Lists curated quality options for a video URL.
pub async fn get_formats(
    State(state): State<AppState>,
    Json(payload): Json<FormatsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let url = match payload.url {
        Some(url) if !url.is_empty() => url,
        _ => return Err(AppError::Validation("URL is required.".to_string())),
    };

    tracing::info!("Fetching formats for: {}", url);
    let info = state
        .resolver
        .resolve_metadata(&url)
        .await
        .map_err(|e| AppError::Resolver(e.to_string()))?;

    let formats: Vec<CuratedFormat> = curate_formats(&info.formats)
        .into_iter()
        .map(|f| CuratedFormat {
            resolution: f.height.unwrap_or(0),
            filesize: format_filesize(f.known_filesize()),
            format_id: f.format_id,
            ext: f.ext,
        })
        .collect();

    tracing::info!("Curated {} quality options for '{}'", formats.len(), info.title);
    Ok((
        StatusCode::OK,
        Json(FormatsResponse {
            formats,
            thumbnail_url: info.thumbnail,
        }),
    ))
}

// ===================================================================
//                          DOWNLOAD HANDLER
// ===================================================================

/// Deletes the temporary file when dropped. The guard travels with the
/// response body, so deletion runs once the transport releases the stream,
/// on every exit path including a mid-transfer disconnect.
struct TempFileGuard {
    path: PathBuf,
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        tracing::info!("Cleaning up temporary file: {}", self.path.display());
        if let Err(e) = std::fs::remove_file(&self.path) {
            // Never surfaces to the client; the response is already in flight.
            tracing::warn!("Error during cleanup of {}: {}", self.path.display(), e);
        }
    }
}

/// # POST /api/download-selected-format - Fetches the best streams for the
/// requested resolution ceiling and sends the muxed file as an attachment.
pub async fn download_selected_format(
    State(state): State<AppState>,
    Json(payload): Json<DownloadRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (url, resolution) = match (payload.url, payload.resolution) {
        (Some(url), Some(resolution)) if !url.is_empty() && !resolution.is_unset() => {
            (url, resolution)
        }
        _ => {
            return Err(AppError::Validation(
                "URL and resolution are required.".to_string(),
            ))
        }
    };

    let temp_dir = PathBuf::from(&state.config.temp_download_directory);
    tokio::fs::create_dir_all(&temp_dir).await?;
    let output_template = temp_dir
        .join("%(title)s.%(ext)s")
        .to_string_lossy()
        .to_string();

    // Best video capped at the requested height, merged with the best audio.
    let selector = format!(
        "bestvideo[height<={res}]+bestaudio/best[height<={res}]",
        res = resolution
    );

    tracing::info!("Downloading best video for resolution '{}p' to server...", resolution);
    let outcome = state
        .resolver
        .fetch(&url, &selector, &output_template, "mp4")
        .await
        .map_err(|e| AppError::Resolver(e.to_string()))?;

    let temp_filepath = match outcome.output_path {
        Some(path) if tokio::fs::try_exists(&path).await.unwrap_or(false) => path,
        _ => return Err(AppError::DownloadFailure),
    };

    let title = if outcome.title.is_empty() {
        "video".to_string()
    } else {
        outcome.title
    };
    let final_filename = format!("{}.mp4", sanitize_filename(&title));

    // The guard owns the path from here on: any early return below, a
    // finished transfer, or an aborted one all end in exactly one deletion.
    let guard = TempFileGuard {
        path: temp_filepath.clone(),
    };

    let file = tokio::fs::File::open(&temp_filepath).await?;
    let stream = ReaderStream::new(file).map(move |chunk| {
        let _keep_until_stream_ends = &guard;
        chunk
    });
    let body = Body::from_stream(stream);

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("video/mp4"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&content_disposition(&final_filename))?,
    );

    tracing::info!("Sending '{}' to user.", final_filename);
    Ok((headers, body))
}

/// Builds an attachment disposition with an ASCII fallback plus the RFC 5987
/// encoded variant, so non-ASCII titles survive proxies and browsers.
fn content_disposition(filename: &str) -> String {
    let ascii: String = filename.chars().filter(char::is_ascii).collect();
    let encoded = utf8_percent_encode(filename, NON_ALPHANUMERIC);
    format!("attachment; filename=\"{}\"; filename*=UTF-8''{}", ascii, encoded)
}
