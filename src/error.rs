//! Error kinds for the review source, the fetch loop and the HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Failure talking to the review gateway.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("App \"{0}\" not found")]
    NotFound(String),

    #[error("Review source rate limit hit (429)")]
    RateLimited,

    #[error("Review source returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Review source request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// A paginated review fetch that aborted. No partial result survives it.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct FetchError {
    /// Zero-based index of the batch that failed.
    pub batch: usize,
    #[source]
    pub source: SourceError,
}

/// JSON error body shared by every endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "appId is required")]
    pub error: String,
}

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("appId is required")]
    MissingAppId,

    #[error("No reviews found for {0}")]
    NoReviews(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Raw listing failures keep the upstream distinction between
    /// "not found", "rate limited" and everything else.
    #[error("{1}")]
    Listing(String, SourceError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingAppId => StatusCode::BAD_REQUEST,
            ApiError::NoReviews(_) => StatusCode::NOT_FOUND,
            ApiError::Fetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Listing(_, SourceError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Listing(_, SourceError::RateLimited) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Listing(_, _) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Listing(app_id, SourceError::NotFound(_)) => {
                format!("App \"{}\" not found on Google Play.", app_id)
            }
            ApiError::Listing(_, SourceError::RateLimited) => {
                "Google Play rate limit hit. Please wait a moment and try again.".to_string()
            }
            ApiError::Listing(_, e) => format!("Failed to fetch reviews. {}", e),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("🔥 {}", self);
        }
        (status, Json(ErrorBody { error: self.message() })).into_response()
    }
}
