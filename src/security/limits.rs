//! Request size limits.
//!
//! # Responsibilities
//! - Reject requests whose declared `Content-Length` exceeds the limit
//!
//! # Design Decisions
//! - Checked before the body is read (early rejection)
//! - Bodies without a declared length are capped by `DefaultBodyLimit`
//!   when the JSON extractor buffers them

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::http::error::ApiError;
use crate::http::request::RequestIdExt;

/// Maximum accepted body size in bytes.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit(pub usize);

pub async fn enforce_content_length(
    State(BodyLimit(max)): State<BodyLimit>,
    request: Request,
    next: Next,
) -> Response {
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    match declared {
        Some(length) if length > max => {
            tracing::warn!(
                request_id = %request.request_id(),
                content_length = length,
                max_body_size = max,
                "Request body too large"
            );
            ApiError::rejected(StatusCode::PAYLOAD_TOO_LARGE, "Request entity too large").into_response()
        }
        _ => next.run(request).await,
    }
}
