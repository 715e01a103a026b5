//! Error normalization.
//!
//! # Responsibilities
//! - Define [`ApiError`], the single failure type handlers and extractors return
//! - Decide the HTTP status for every failure kind
//! - Render every failure into the standard [`Envelope`], including panics,
//!   timeouts, unknown routes and framework rejections
//! - Wrap failure responses produced outside [`ApiError`]
//! - Log each failure once with request context
//!
//! # Data Flow
//! ```text
//! handler / extractor / middleware
//!     → ApiError::into_response (status + ErrorSlot extension, empty body)
//!     → normalize_errors (renders envelope, logs)
//!     → client
//! ```
//!
//! # Design Decisions
//! - Only [`normalize_errors`] writes failure bodies
//! - In production, messages of unexpected failures are replaced with a
//!   generic one; expected failures keep their message

use std::any::Any;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{MatchedPath, Request, State};
use axum::http::{header, Method, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::config::Environment;
use crate::domain::DomainError;
use crate::http::request::RequestIdExt;
use crate::http::response::{respond, Envelope};
use crate::observability::metrics;
use crate::security::rate_limit::client_key;
use crate::validation::ValidationError;

const GENERIC_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The validation gate rejected the input.
    #[error("Validation failed")]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Rejected by the framework or a protective middleware.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// Anything nobody anticipated. `origin` says where it surfaced.
    #[error("{message}")]
    Unexpected { message: String, origin: &'static str },
}

impl ApiError {
    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Domain(DomainError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Domain(DomainError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Domain(DomainError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Domain(DomainError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Rejected { status, .. } => *status,
            ApiError::Unexpected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_expected(&self) -> bool {
        !matches!(
            self,
            ApiError::Unexpected { .. } | ApiError::Domain(DomainError::Internal(_))
        )
    }

    /// The envelope a client sees for this failure.
    pub fn envelope(&self, environment: Environment) -> Envelope {
        let status = self.status();
        match self {
            ApiError::Validation(errors) => Envelope::validation(errors.clone()),
            _ if !self.is_expected() && environment.is_production() => {
                Envelope::failure(GENERIC_MESSAGE, status)
            }
            _ => Envelope::failure(self.to_string(), status),
        }
    }
}

/// Response extension carrying the failure to [`normalize_errors`].
#[derive(Debug, Clone)]
pub struct ErrorSlot(pub Arc<ApiError>);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = self.status().into_response();
        response.extensions_mut().insert(ErrorSlot(Arc::new(self)));
        response
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match &rejection {
            JsonRejection::MissingJsonContentType(_) => {
                "Content-Type must be application/json".to_string()
            }
            JsonRejection::BytesRejection(_) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                "Request entity too large".to_string()
            }
            _ => rejection.body_text(),
        };
        ApiError::rejected(rejection.status(), message)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::rejected(rejection.status(), rejection.body_text())
    }
}

/// Middleware rendering every failure response into an envelope.
pub async fn normalize_errors(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let request_id = request.request_id().to_owned();
    let client = client_key(&request);
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| path.clone());

    let response = next.run(request).await;

    let error = match response.extensions().get::<ErrorSlot>() {
        Some(ErrorSlot(error)) => error.clone(),
        None if is_unrendered_failure(&response) => Arc::new(ApiError::rejected(
            response.status(),
            fallback_message(response.status()),
        )),
        None => return response,
    };

    let status = error.status();
    if status.is_server_error() {
        tracing::error!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            error = %error,
            origin = unexpected_origin(&error),
            "Request failed"
        );
    } else if let ApiError::Validation(errors) = error.as_ref() {
        tracing::warn!(
            request_id = %request_id,
            method = %method,
            path = %path,
            ip = %client,
            status = status.as_u16(),
            errors = %field_errors(errors),
            "Validation failed"
        );
        metrics::record_validation_failure(&route, errors.len());
    } else {
        tracing::warn!(
            request_id = %request_id,
            method = %method,
            path = %path,
            ip = %client,
            status = status.as_u16(),
            error = %error,
            "Request rejected"
        );
    }

    let mut rendered = respond(status, &error.envelope(environment));
    // Keep headers set by inner layers (rate-limit counters, Allow, ...).
    let (parts, _) = response.into_parts();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            rendered.headers_mut().entry(name).or_insert_with(|| value.clone());
        }
    }
    rendered
}

/// Field errors as a JSON array for the log line. Secret values are
/// already redacted by the rules.
fn field_errors(errors: &[ValidationError]) -> String {
    serde_json::to_string(errors).unwrap_or_default()
}

/// A failure status produced outside [`ApiError`], e.g. by `TimeoutLayer`
/// or an axum extractor we do not wrap.
fn is_unrendered_failure(response: &Response) -> bool {
    let status = response.status();
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    (status.is_client_error() || status.is_server_error()) && !is_json
}

fn fallback_message(status: StatusCode) -> String {
    match status {
        StatusCode::REQUEST_TIMEOUT => "Request timeout".to_string(),
        other => other.canonical_reason().unwrap_or("Request failed").to_string(),
    }
}

fn unexpected_origin(error: &ApiError) -> &'static str {
    match error {
        ApiError::Unexpected { origin, .. } => *origin,
        _ => "domain",
    }
}

/// `CatchPanicLayer` handler turning a panic into an unexpected failure.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };

    ApiError::Unexpected {
        message,
        origin: "panic",
    }
    .into_response()
}

/// Router fallback for unknown paths.
pub async fn route_not_found(method: Method, uri: Uri) -> ApiError {
    DomainError::NotFound(format!("Route not found: {method} {}", uri.path())).into()
}

/// Router fallback for known paths called with an unsupported method.
pub async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::rejected(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("Method {method} not allowed for {}", uri.path()),
    )
}
