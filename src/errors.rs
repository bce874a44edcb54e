use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error; // Use thiserror for cleaner error definitions

// --- Domain/Infrastructure Errors ---

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Template source request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Template source returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("Template source reported failure: {0}")]
    Api(String),

    #[error("Template source response could not be decoded: {0}")]
    Decode(String),

    #[error("Premium endpoints require Imgflip credentials")]
    PremiumNotConfigured,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Local storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Local storage value for key '{key}' is not valid JSON: {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to fetch memes: {0}")]
    Fetch(#[source] SourceError),

    #[error("{0}")]
    Validation(String),

    #[error("No user profile is loaded yet")]
    UserNotReady,

    #[error("Could not persist state")]
    Storage(#[from] StorageError),
}

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        StoreError::Validation(msg.into())
    }
}

// --- Web Layer Error ---

#[derive(Error, Debug)]
pub enum AppError {
    // Input validation / request parsing errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Error processing multipart form data: {0}")]
    MultipartError(#[from] axum::extract::multipart::MultipartError),

    #[error("Meme not found with ID: {0}")]
    MemeNotFound(String),
    #[error("No user profile is loaded")]
    UserNotReady,

    // Domain/Service level errors (mapped from StoreError)
    #[error("Could not fetch memes")]
    FetchError(#[source] SourceError),
    #[error("Could not perform local storage operation")]
    StorageError(#[source] StorageError),
}

// --- Conversions from Domain Errors to AppError ---

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Fetch(e) => AppError::FetchError(e),
            StoreError::Validation(msg) => AppError::InvalidInput(msg),
            StoreError::UserNotReady => AppError::UserNotReady,
            StoreError::Storage(e) => AppError::StorageError(e),
        }
    }
}

// --- Axum Response Implementation ---

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            // 4xx Client Errors
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::MultipartError(e) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid multipart form data: {}", e),
            ),
            AppError::MemeNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Meme not found with ID: {}", id),
            ),
            AppError::UserNotReady => (
                StatusCode::CONFLICT,
                "User profile is not loaded yet".to_string(),
            ),

            AppError::FetchError(SourceError::PremiumNotConfigured) => {
                (StatusCode::NOT_IMPLEMENTED, "Premium features are not enabled".to_string())
            }

            // 5xx Server Errors
            AppError::FetchError(e) => {
                tracing::error!(error.source = ?e, "Template source error occurred");
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to fetch memes, please try again later".to_string(),
                )
            }
            AppError::StorageError(e) => {
                tracing::error!(error.source = ?e, "Local storage error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "Local storage operation failed".to_string())
            }
        };

        tracing::warn!(
            error.message = %error_message,
            error.detail = %self,
            "Responding with error"
        );

        let body = Json(serde_json::json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_web_errors() {
        let app: AppError =
            StoreError::validation("Please provide a title and select an image").into();
        assert!(matches!(app, AppError::InvalidInput(ref msg) if msg.contains("title")));

        let app: AppError = StoreError::Fetch(SourceError::Api("boom".into())).into();
        assert_eq!(app.into_response().status(), StatusCode::BAD_GATEWAY);

        let app: AppError = StoreError::Fetch(SourceError::PremiumNotConfigured).into();
        assert_eq!(app.into_response().status(), StatusCode::NOT_IMPLEMENTED);

        let app: AppError = StoreError::UserNotReady.into();
        assert_eq!(app.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn missing_meme_is_not_found() {
        let resp = AppError::MemeNotFound("meme-1".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
