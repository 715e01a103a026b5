//! `/api/products` endpoints.

use std::sync::LazyLock;

use axum::extract::{Path, State};
use axum::routing::{get, patch};
use axum::Router;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::api::paging;
use crate::domain::{
    parse_id, NewProduct, Product, ProductChanges, ProductFilter, SortField, SortOrder,
};
use crate::http::error::ApiError;
use crate::http::response::{paginate, ApiResponse};
use crate::http::server::AppState;
use crate::validation::{guard, FieldRule, RuleSet, Validate, ValidatedJson, ValidatedQuery};

const MAX_PRICE: f64 = 999_999.99;
const MAX_STOCK: f64 = 999_999.0;

static PRODUCT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9\s\-_.,&()]+$").expect("product name pattern compiles")
});

fn name_rule() -> FieldRule {
    FieldRule::text("name")
        .escape_markup()
        .length(3, 100, "Product name must be between 3 and 100 characters")
        .pattern(PRODUCT_NAME.clone(), "Product name contains invalid characters")
}

fn description_rule() -> FieldRule {
    FieldRule::text("description")
        .escape_markup()
        .max_length(500, "Description must not exceed 500 characters")
}

fn price_rule() -> FieldRule {
    FieldRule::decimal("price")
        .mismatch("Price must be a number")
        .range(0.01, MAX_PRICE, "Price must be a positive number between 0.01 and 999999.99")
        .decimal_places(2, "Price cannot have more than 2 decimal places")
}

fn category_rule() -> FieldRule {
    FieldRule::text("category")
        .escape_markup()
        .length(2, 50, "Category must be between 2 and 50 characters")
}

fn stock_rule() -> FieldRule {
    FieldRule::integer("stock")
        .mismatch("Stock must be an integer")
        .min(0.0, "Stock cannot be negative")
        .max(MAX_STOCK, "Stock cannot exceed 999999")
}

fn not_below(max: &Value, min: &Value) -> bool {
    match (max.as_f64(), min.as_f64()) {
        (Some(max), Some(min)) => max >= min,
        _ => true,
    }
}

static CREATE_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new()
        .field(name_rule().required("Product name is required"))
        .field(description_rule())
        .field(price_rule().required("Price is required"))
        .field(category_rule())
        .field(stock_rule())
});

static UPDATE_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new()
        .field(name_rule())
        .field(description_rule())
        .field(price_rule())
        .field(category_rule())
        .field(stock_rule())
        .require_any(
            &["name", "description", "price", "category", "stock"],
            "At least one field is required for update",
        )
});

static STOCK_RULES: LazyLock<RuleSet> =
    LazyLock::new(|| RuleSet::new().field(stock_rule().required("Stock is required")));

static LIST_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new()
        .field(paging::page())
        .field(paging::limit())
        .field(category_rule())
        .field(
            FieldRule::decimal("minPrice")
                .mismatch("Minimum price must be a number")
                .min(0.0, "Minimum price must be a non-negative number"),
        )
        .field(
            FieldRule::decimal("maxPrice")
                .mismatch("Maximum price must be a number")
                .min(0.0, "Maximum price must be a non-negative number"),
        )
        .field(
            FieldRule::text("search")
                .escape_markup()
                .length(1, 100, "Search term must be between 1 and 100 characters"),
        )
        .field(FieldRule::text("sortBy").one_of(
            SortField::NAMES,
            "Sort field must be one of: name, price, stock, createdAt, updatedAt",
        ))
        .field(FieldRule::text("order").one_of(SortOrder::NAMES, "Order must be either asc or desc"))
        .compare(
            "maxPrice",
            "minPrice",
            not_below,
            "Maximum price must be greater than or equal to minimum price",
        )
});

static IN_STOCK_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new().field(
        FieldRule::integer("minStock")
            .mismatch("Minimum stock must be an integer")
            .min(0.0, "Minimum stock cannot be negative")
            .max(MAX_STOCK, "Minimum stock cannot exceed 999999"),
    )
});

static CATEGORY_PATH_RULES: LazyLock<RuleSet> =
    LazyLock::new(|| RuleSet::new().field(category_rule().required("Category is required")));

#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: Option<String>,
    pub stock: Option<u32>,
}

impl Validate for CreateProduct {
    fn rules() -> &'static RuleSet {
        &CREATE_RULES
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub stock: Option<u32>,
}

impl Validate for UpdateProduct {
    fn rules() -> &'static RuleSet {
        &UPDATE_RULES
    }
}

#[derive(Debug, Deserialize)]
pub struct StockUpdate {
    pub stock: u32,
}

impl Validate for StockUpdate {
    fn rules() -> &'static RuleSet {
        &STOCK_RULES
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProducts {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
    pub sort_by: Option<SortField>,
    pub order: Option<SortOrder>,
}

impl Validate for ListProducts {
    fn rules() -> &'static RuleSet {
        &LIST_RULES
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InStockQuery {
    pub min_stock: Option<u32>,
}

impl Validate for InStockQuery {
    fn rules() -> &'static RuleSet {
        &IN_STOCK_RULES
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/in-stock", get(in_stock))
        .route("/api/products/category/{category}", get(by_category))
        .route(
            "/api/products/{id}",
            get(get_product)
                .put(update_product)
                .patch(update_product)
                .delete(delete_product),
        )
        .route("/api/products/{id}/stock", patch(update_stock))
}

async fn list_products(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ListProducts>,
) -> ApiResponse<Vec<Product>> {
    let filter = ProductFilter {
        category: query.category,
        min_price: query.min_price,
        max_price: query.max_price,
        search: query.search,
        sort_by: query.sort_by,
        order: query.order.unwrap_or_default(),
    };
    let products = state.products.list(&filter);
    let (page, pagination) = paginate(products, query.page, query.limit);
    ApiResponse::ok(page, "Products retrieved successfully").paginated(pagination)
}

async fn in_stock(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<InStockQuery>,
) -> ApiResponse<Vec<Product>> {
    let products = state.products.in_stock(query.min_stock.unwrap_or(1));
    ApiResponse::ok(products, "In-stock products retrieved successfully")
}

async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<ApiResponse<Vec<Product>>, ApiError> {
    let mut input = Map::new();
    input.insert("category".into(), Value::String(category));

    guard(&CATEGORY_PATH_RULES, input, |canonical| {
        let category = canonical["category"].as_str().unwrap_or_default();
        let products = state.products.by_category(category);
        Ok(ApiResponse::ok(products, "Products retrieved successfully"))
    })
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Product>, ApiError> {
    let product = state.products.get(parse_id(&id, "product")?)?;
    Ok(ApiResponse::ok(product, "Product retrieved successfully"))
}

async fn create_product(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CreateProduct>,
) -> Result<ApiResponse<Product>, ApiError> {
    let product = state.products.create(NewProduct {
        name: body.name,
        description: body.description,
        price: body.price,
        category: body.category,
        stock: body.stock.unwrap_or(0),
    })?;
    Ok(ApiResponse::created(product, "Product created successfully"))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateProduct>,
) -> Result<ApiResponse<Product>, ApiError> {
    let id = parse_id(&id, "product")?;
    let product = state.products.update(
        id,
        ProductChanges {
            name: body.name,
            description: body.description,
            price: body.price,
            category: body.category,
            stock: body.stock,
        },
    )?;
    Ok(ApiResponse::ok(product, "Product updated successfully"))
}

async fn update_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<StockUpdate>,
) -> Result<ApiResponse<Product>, ApiError> {
    let product = state
        .products
        .update_stock(parse_id(&id, "product")?, body.stock)?;
    Ok(ApiResponse::ok(product, "Stock updated successfully"))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Product>, ApiError> {
    let product = state.products.delete(parse_id(&id, "product")?)?;
    Ok(ApiResponse::ok(product, "Product deleted successfully"))
}
