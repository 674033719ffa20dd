use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;

// Define our custom error type
pub enum AppError {
    /// A required request field is missing or empty.
    Validation(String),
    /// The media resolution service failed (metadata lookup or fetch).
    Resolver(String),
    /// The fetch reported success but no file materialized on disk.
    DownloadFailure,
    /// Anything else: IO, header construction, config access.
    Internal(anyhow::Error),
}

// This implementation allows us to convert our AppError into a valid HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Resolver(message) => {
                tracing::error!("media resolution failed: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            AppError::DownloadFailure => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to download the video file to the server.".to_string(),
            ),
            AppError::Internal(e) => {
                // Log the full error chain for debugging
                tracing::error!("Internal server error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

// This allows us to use the `?` operator to automatically convert
// any error that implements `std::error::Error` into our `AppError::Internal`.
impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}
