use crate::envelope::Envelope;
use axum::{
    extract::{rejection::BytesRejection, Request},
    http::{header, HeaderValue, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use logpaste_core::content::SUPPORTED_ENCODINGS;
use logpaste_core::{AnalysisError, ContentError, IdentifierError, StorageError};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Method not allowed. Only {allowed} requests are allowed for this endpoint.")]
    MethodNotAllowed { allowed: String },

    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("{0}")]
    EmptyContent(String),

    #[error("Request body exceeds the maximum upload size of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Configuration(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Storage operation failed")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Maps a failure to read the request body, `limit` being the configured upload cap.
    pub fn from_body_rejection(rejection: BytesRejection, limit: usize) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge { limit }
        } else {
            AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            AppError::InvalidIdentifier(_) | AppError::EmptyContent(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Analysis(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            AppError::Configuration(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ContentError> for AppError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::UnsupportedMediaType(_) => AppError::UnsupportedMediaType(err.to_string()),
            ContentError::Empty => AppError::EmptyContent(err.to_string()),
            ContentError::Malformed(_) => AppError::BadRequest(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("Failed to encode response JSON: {}", err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            AppError::Storage(e) => error!("Storage error: {}", e),
            _ if status.is_server_error() => error!("Request failed: {}", self),
            _ => warn!("Request rejected: {}", self),
        }
        Envelope::error(self.to_string(), status).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

// 404 handler
pub async fn handle_404(uri: Uri) -> Envelope {
    Envelope::json_with_status(
        json!({
            "error": "Endpoint not found",
            "uri": uri.to_string(),
            "message": "Please check the available endpoints at /"
        }),
        StatusCode::NOT_FOUND,
    )
}

// Same list as logpaste_core::content::SUPPORTED_ENCODINGS
const ACCEPT_ENCODING_VALUE: &str = "gzip,deflate,br";

/// Advertises the request body encodings the API can decompress.
pub async fn advertise_encodings(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::ACCEPT_ENCODING,
        HeaderValue::from_static(ACCEPT_ENCODING_VALUE),
    );
    response
}

/// Wraps the bare 415 that request decompression answers for an unknown
/// `Content-Encoding` in the error envelope.
pub async fn envelope_encoding_rejections(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status() == StatusCode::UNSUPPORTED_MEDIA_TYPE
        && !response.headers().contains_key(header::CONTENT_TYPE)
    {
        return AppError::UnsupportedMediaType(format!(
            "Unsupported Content-Encoding. Expected: {}",
            SUPPORTED_ENCODINGS.join(", ")
        ))
        .into_response();
    }
    response
}

// Middleware for request tracing
pub async fn trace_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let trace_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(
        trace_id = %trace_id,
        method = %method,
        uri = %uri,
        "Request started"
    );

    let response = next.run(request).await;

    let status = response.status();
    let duration = start.elapsed();

    tracing::info!(
        trace_id = %trace_id,
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}
