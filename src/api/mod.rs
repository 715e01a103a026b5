//! REST endpoints.
//!
//! Each submodule owns its routes, its typed inputs and the static rule
//! sets those inputs are validated against.

pub mod health;
pub mod products;
pub mod users;

use axum::Router;

use crate::http::error::{method_not_allowed, route_not_found};
use crate::http::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(users::routes())
        .merge(products::routes())
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
}

/// Shared rule for `page`/`limit` query parameters.
pub(crate) mod paging {
    use crate::validation::FieldRule;

    pub fn page() -> FieldRule {
        FieldRule::integer("page")
            .mismatch("Page must be a positive integer")
            .range(1.0, 10_000.0, "Page must be a positive integer between 1 and 10000")
    }

    pub fn limit() -> FieldRule {
        FieldRule::integer("limit")
            .mismatch("Limit must be a positive integer")
            .range(1.0, 100.0, "Limit must be between 1 and 100")
    }
}
