//! Response envelope.
//!
//! Every body the service writes, success or failure, has the same shape:
//!
//! ```json
//! { "success": true, "data": {...}, "message": "...", "statusCode": 200 }
//! { "success": false, "error": "...", "errors": [...], "statusCode": 400 }
//! ```
//!
//! Optional members are omitted rather than serialized as `null`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validation::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T = Value> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    pub status_code: u16,
}

impl<T> Envelope<T> {
    pub fn success(data: T, message: Option<String>, status: StatusCode) -> Self {
        Self {
            success: true,
            data: Some(data),
            message,
            error: None,
            errors: None,
            pagination: None,
            status_code: status.as_u16(),
        }
    }
}

impl Envelope {
    pub fn failure(error: impl Into<String>, status: StatusCode) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
            errors: None,
            pagination: None,
            status_code: status.as_u16(),
        }
    }

    pub fn validation(errors: Vec<ValidationError>) -> Self {
        Self {
            errors: Some(errors),
            ..Self::failure("Validation failed", StatusCode::BAD_REQUEST)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub total_pages: usize,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub const DEFAULT_LIMIT: u32 = 10;

    pub fn new(page: u32, limit: u32, total: usize) -> Self {
        let limit = limit.max(1);
        let page = page.max(1);
        let total_pages = total.div_ceil(limit as usize);
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next_page: (page as usize) < total_pages,
            has_prev_page: page > 1,
        }
    }

    fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }
}

/// Slice `items` into one page.
///
/// Without a `page` or `limit` the list is returned whole and unpaginated.
pub fn paginate<T>(items: Vec<T>, page: Option<u32>, limit: Option<u32>) -> (Vec<T>, Option<Pagination>) {
    if page.is_none() && limit.is_none() {
        return (items, None);
    }

    let pagination = Pagination::new(
        page.unwrap_or(1),
        limit.unwrap_or(Pagination::DEFAULT_LIMIT),
        items.len(),
    );
    let slice = items
        .into_iter()
        .skip(pagination.offset())
        .take(pagination.limit as usize)
        .collect();
    (slice, Some(pagination))
}

/// Successful response with a typed payload.
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    envelope: Envelope<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, data, message)
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::CREATED, data, message)
    }

    fn with_status(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status,
            envelope: Envelope::success(data, Some(message.into()), status),
        }
    }

    pub fn paginated(mut self, pagination: Option<Pagination>) -> Self {
        self.envelope.pagination = pagination;
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        respond(self.status, &self.envelope)
    }
}

/// Serialize an envelope with its status.
pub fn respond<T: Serialize>(status: StatusCode, envelope: &Envelope<T>) -> Response {
    tracing::debug!(
        status = status.as_u16(),
        success = envelope.success,
        "Writing response envelope"
    );
    (status, Json(envelope)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_omits_absent_members() {
        let envelope = Envelope::success(json!({"id": 1}), Some("done".into()), StatusCode::CREATED);
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"success": true, "data": {"id": 1}, "message": "done", "statusCode": 201})
        );
    }

    #[test]
    fn test_validation_envelope() {
        let envelope = Envelope::validation(vec![ValidationError::new("stock", "Stock cannot be negative", json!(-1))]);
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "Validation failed");
        assert_eq!(value["statusCode"], 400);
        assert_eq!(value["errors"][0]["rejectedValue"], -1);
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_pagination_meta() {
        let (page, meta) = paginate((1..=25).collect::<Vec<_>>(), Some(3), Some(10));
        assert_eq!(page, vec![21, 22, 23, 24, 25]);
        let meta = meta.unwrap();
        assert_eq!(meta.total_pages, 3);
        assert!(!meta.has_next_page);
        assert!(meta.has_prev_page);

        let value = serde_json::to_value(meta).unwrap();
        assert_eq!(value["totalPages"], 3);
        assert_eq!(value["hasPrevPage"], true);
    }

    #[test]
    fn test_unpaginated_and_out_of_range() {
        let (all, meta) = paginate(vec![1, 2, 3], None, None);
        assert_eq!(all.len(), 3);
        assert!(meta.is_none());

        let (empty, meta) = paginate(vec![1, 2, 3], Some(5), None);
        assert!(empty.is_empty());
        assert_eq!(meta.unwrap().total_pages, 1);
    }
}
