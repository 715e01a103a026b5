//! `/api/users` endpoints.

use std::sync::LazyLock;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::api::paging;
use crate::domain::{parse_id, NewUser, User, UserChanges};
use crate::http::error::ApiError;
use crate::http::response::{paginate, ApiResponse};
use crate::http::server::AppState;
use crate::validation::{FieldRule, RuleSet, Validate, ValidatedJson, ValidatedQuery};

static NO_ANGLE_BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^<>]*$").expect("name pattern compiles"));

fn name_rule() -> FieldRule {
    FieldRule::text("name")
        .length(2, 100, "Name must be between 2 and 100 characters")
        .pattern(NO_ANGLE_BRACKETS.clone(), "Name contains invalid characters")
}

fn email_rule() -> FieldRule {
    FieldRule::email("email")
        .valid_email("Valid email is required")
        .max_length(255, "Email must not exceed 255 characters")
}

/// Lower and upper case letter, digit and one of `@$!%*?&`.
fn is_strong_password(value: &Value) -> bool {
    value.as_str().is_some_and(|p| {
        p.chars().any(|c| c.is_ascii_lowercase())
            && p.chars().any(|c| c.is_ascii_uppercase())
            && p.chars().any(|c| c.is_ascii_digit())
            && p.chars().any(|c| "@$!%*?&".contains(c))
    })
}

fn password_rule() -> FieldRule {
    FieldRule::secret("password")
        .min_length(8, "Password must be at least 8 characters long")
        .custom(
            is_strong_password,
            "Password must contain at least one lowercase letter, one uppercase letter, one number and one special character",
        )
}

static CREATE_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new()
        .field(name_rule().required("Name is required"))
        .field(email_rule().required("Email is required"))
        .field(password_rule())
});

static UPDATE_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new()
        .field(name_rule())
        .field(email_rule())
        .field(password_rule())
        .require_any(&["name", "email"], "At least one field (name or email) is required for update")
});

static LIST_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new()
        .field(paging::page())
        .field(paging::limit())
        .field(
            FieldRule::text("search")
                .escape_markup()
                .length(1, 100, "Search term must be between 1 and 100 characters"),
        )
});

/// Body of `POST /api/users`. A password, when given, is validated but never stored.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
}

impl Validate for CreateUser {
    fn rules() -> &'static RuleSet {
        &CREATE_RULES
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Validate for UpdateUser {
    fn rules() -> &'static RuleSet {
        &UPDATE_RULES
    }
}

#[derive(Debug, Deserialize)]
pub struct ListUsers {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

impl Validate for ListUsers {
    fn rules() -> &'static RuleSet {
        &LIST_RULES
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/{id}",
            get(get_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user),
        )
}

async fn list_users(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ListUsers>,
) -> ApiResponse<Vec<User>> {
    let users = state.users.list(query.search.as_deref());
    let (page, pagination) = paginate(users, query.page, query.limit);
    ApiResponse::ok(page, "Users retrieved successfully").paginated(pagination)
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<User>, ApiError> {
    let user = state.users.get(parse_id(&id, "user")?)?;
    Ok(ApiResponse::ok(user, "User retrieved successfully"))
}

async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CreateUser>,
) -> Result<ApiResponse<User>, ApiError> {
    let user = state.users.create(NewUser {
        name: body.name,
        email: body.email,
    })?;
    Ok(ApiResponse::created(user, "User created successfully"))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateUser>,
) -> Result<ApiResponse<User>, ApiError> {
    let id = parse_id(&id, "user")?;
    let user = state.users.update(
        id,
        UserChanges {
            name: body.name,
            email: body.email,
        },
    )?;
    Ok(ApiResponse::ok(user, "User updated successfully"))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<User>, ApiError> {
    let user = state.users.delete(parse_id(&id, "user")?)?;
    Ok(ApiResponse::ok(user, "User deleted successfully"))
}
