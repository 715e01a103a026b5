mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{app, error_fields, get, send, send_json};
use serde_json::json;

fn widget() -> serde_json::Value {
    json!({
        "name": "Widget",
        "description": "A useful widget",
        "price": 19.99,
        "category": "Tools",
        "stock": 5
    })
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let response = get(&app(), "/api/products/999999").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["statusCode"], 404);
    assert_eq!(response.body["error"], "Product not found");
}

#[tokio::test]
async fn test_negative_stock_never_reaches_the_store() {
    let app = app();
    let response = send_json(
        &app,
        "POST",
        "/api/products",
        Some(json!({"name": "Widget", "price": 9.99, "stock": -1})),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Validation failed");
    assert_eq!(error_fields(&response.body), vec!["stock"]);
    assert!(response.body["errors"][0]["message"]
        .as_str()
        .unwrap()
        .contains("negative"));

    let listed = get(&app, "/api/products").await;
    assert_eq!(listed.body["data"], json!([]));
}

#[tokio::test]
async fn test_ids_increase_and_skip_rejections() {
    let app = app();

    let first = send_json(&app, "POST", "/api/products", Some(widget())).await;
    let rejected = send_json(&app, "POST", "/api/products", Some(json!({"name": "x"}))).await;
    let second = send_json(&app, "POST", "/api/products", Some(widget())).await;

    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
    assert_eq!(first.body["data"]["id"], 1);
    assert_eq!(second.body["data"]["id"], 2);
}

#[tokio::test]
async fn test_create_then_read_round_trip() {
    let app = app();
    let created = send_json(
        &app,
        "POST",
        "/api/products",
        Some(json!({"name": "  Desk Lamp ", "price": "24.5"})),
    )
    .await;

    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["data"]["name"], "Desk Lamp");
    assert_eq!(created.body["data"]["price"], 24.5);
    assert_eq!(created.body["data"]["stock"], 0);

    let fetched = get(&app, "/api/products/1").await;
    assert_eq!(fetched.body["data"], created.body["data"]);
}

#[tokio::test]
async fn test_failed_update_leaves_record_unchanged() {
    let app = app();
    let created = send_json(&app, "POST", "/api/products", Some(widget())).await;

    let rejected = send_json(
        &app,
        "PUT",
        "/api/products/1",
        Some(json!({"name": "Renamed", "price": -5})),
    )
    .await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&rejected.body), vec!["price"]);

    let fetched = get(&app, "/api/products/1").await;
    assert_eq!(fetched.body["data"], created.body["data"]);
}

#[tokio::test]
async fn test_update_with_negative_stock() {
    let app = app();
    send_json(&app, "POST", "/api/products", Some(widget())).await;

    let response = send_json(&app, "PUT", "/api/products/1", Some(json!({"stock": -1}))).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["errors"][0]["field"], "stock");
    assert_eq!(response.body["errors"][0]["message"], "Stock cannot be negative");
    assert_eq!(get(&app, "/api/products/1").await.body["data"]["stock"], 5);
}

#[tokio::test]
async fn test_update_and_stock_patch() {
    let app = app();
    send_json(&app, "POST", "/api/products", Some(widget())).await;

    let updated = send_json(&app, "PATCH", "/api/products/1", Some(json!({"price": 25}))).await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["data"]["price"], 25.0);
    assert_eq!(updated.body["data"]["name"], "Widget");

    let restocked = send_json(&app, "PATCH", "/api/products/1/stock", Some(json!({"stock": "40"}))).await;
    assert_eq!(restocked.status, StatusCode::OK);
    assert_eq!(restocked.body["data"]["stock"], 40);

    let missing = send_json(&app, "PATCH", "/api/products/1/stock", Some(json!({}))).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["errors"][0]["message"], "Stock is required");
}

#[tokio::test]
async fn test_category_and_in_stock_listings() {
    let app = app();
    send_json(&app, "POST", "/api/products", Some(widget())).await;
    send_json(
        &app,
        "POST",
        "/api/products",
        Some(json!({"name": "Hammer", "price": 12, "category": "tools", "stock": 0})),
    )
    .await;
    send_json(
        &app,
        "POST",
        "/api/products",
        Some(json!({"name": "Chair", "price": 80, "category": "Furniture", "stock": 9})),
    )
    .await;

    let tools = get(&app, "/api/products/category/TOOLS").await;
    assert_eq!(tools.body["data"].as_array().unwrap().len(), 2);

    let in_stock = get(&app, "/api/products/in-stock").await;
    assert_eq!(in_stock.body["data"].as_array().unwrap().len(), 2);

    let plenty = get(&app, "/api/products/in-stock?minStock=6").await;
    assert_eq!(plenty.body["data"][0]["name"], "Chair");

    let short = get(&app, "/api/products/category/x").await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_filters_and_sorting() {
    let app = app();
    for (name, price) in [("Alpha", 30), ("Bravo", 10), ("Charlie", 20)] {
        send_json(&app, "POST", "/api/products", Some(json!({"name": name, "price": price}))).await;
    }

    let sorted = get(&app, "/api/products?sortBy=price&order=desc&minPrice=15").await;
    let names: Vec<_> = sorted.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Alpha", "Charlie"]);

    let inverted = get(&app, "/api/products?minPrice=50&maxPrice=10").await;
    assert_eq!(inverted.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&inverted.body), vec!["maxPrice"]);

    let bad_sort = get(&app, "/api/products?sortBy=colour").await;
    assert_eq!(bad_sort.status, StatusCode::BAD_REQUEST);

    let both = get(&app, "/api/products?minPrice=50&maxPrice=10&sortBy=colour").await;
    assert_eq!(error_fields(&both.body), vec!["maxPrice", "sortBy"]);
}

#[tokio::test]
async fn test_out_of_range_min_stock_is_a_field_error() {
    let response = get(&app(), "/api/products/in-stock?minStock=5000000000").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Validation failed");
    assert_eq!(error_fields(&response.body), vec!["minStock"]);
    assert_eq!(
        response.body["errors"][0]["message"],
        "Minimum stock cannot exceed 999999"
    );
}

#[tokio::test]
async fn test_markup_is_escaped_before_storage() {
    let app = app();
    let created = send_json(
        &app,
        "POST",
        "/api/products",
        Some(json!({
            "name": "Widget",
            "price": 5,
            "description": "<script>alert(1)</script>",
            "category": "<img onerror=x>"
        })),
    )
    .await;

    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(
        created.body["data"]["description"],
        "&lt;script&gt;alert(1)&lt;/script&gt;"
    );
    assert_eq!(created.body["data"]["category"], "&lt;img onerror=x&gt;");

    let named = send_json(
        &app,
        "POST",
        "/api/products",
        Some(json!({"name": "<b>Bold</b>", "price": 5})),
    )
    .await;
    assert_eq!(named.status, StatusCode::BAD_REQUEST);
    assert_eq!(named.body["errors"][0]["message"], "Product name contains invalid characters");

    // Search terms are escaped the same way, so they still find stored text.
    let searched = get(&app, "/api/products?search=%3Cscript%3E").await;
    assert_eq!(searched.status, StatusCode::OK);
    assert_eq!(searched.body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_malformed_bodies() {
    let app = app();

    let broken = send(
        &app,
        Request::post("/api/products")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\": "))
            .unwrap(),
    )
    .await;
    assert_eq!(broken.status, StatusCode::BAD_REQUEST);
    assert_eq!(broken.body["success"], false);
    assert_eq!(broken.body["statusCode"], 400);

    let untyped = send(
        &app,
        Request::post("/api/products")
            .body(Body::from(widget().to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(untyped.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(untyped.body["error"], "Content-Type must be application/json");

    let array = send_json(&app, "POST", "/api/products", Some(json!([1, 2]))).await;
    assert_eq!(array.status, StatusCode::BAD_REQUEST);
    assert_eq!(array.body["error"], "Request body must be a JSON object");
}

#[tokio::test]
async fn test_delete_product() {
    let app = app();
    send_json(&app, "POST", "/api/products", Some(widget())).await;

    let deleted = send_json(&app, "DELETE", "/api/products/1", None).await;
    assert_eq!(deleted.status, StatusCode::OK);

    let again = send_json(&app, "DELETE", "/api/products/1", None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}
