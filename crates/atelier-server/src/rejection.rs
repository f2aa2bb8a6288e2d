//! Request-level errors and their JSON responses
//!
//! Only malformed requests end up here. Pipeline failures travel as error
//! events on the progress stream.

use serde::Serialize;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Malformed multipart body: {0}")]
    Multipart(String),

    #[error("Unsupported image type `{content_type}` for {field}; expected JPEG or PNG")]
    UnsupportedImageType { field: String, content_type: String },

    #[error("The {field} image exceeds the {limit_mib} MiB limit")]
    ImageTooLarge { field: String, limit_mib: usize },
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Multipart(_) | Self::UnsupportedImageType { .. } => StatusCode::BAD_REQUEST,
            Self::ImageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl warp::reject::Reject for ApiError {}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Turn any rejection into a JSON `{ "error": ... }` response
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(e) = err.find::<ApiError>() {
        (e.status(), e.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Request body is too large".to_string())
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "Content-Length is required".to_string())
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected a multipart/form-data body".to_string(),
        )
    } else if let Some(e) = err.find::<warp::reject::MissingHeader>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidHeader>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        tracing::error!(rejection = ?err, "Unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
    };

    if status.is_server_error() {
        tracing::error!(%status, %message, "Request failed");
    } else {
        tracing::debug!(%status, %message, "Request rejected");
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody { error: message }),
        status,
    ))
}
