//! Integration tests for the parts, locations and partners catalog endpoints.

mod common;

use axum::http::Method;
use common::{response_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn create_and_fetch_part() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/parts",
            Some(json!({
                "name": "drive belt",
                "alternate_name": "belt, drive",
                "description": "rubber, 40cm"
            })),
        )
        .await;
    assert_eq!(response.status(), 201);

    let body = response_json(response).await;
    assert_eq!(body["success"], json!(true));
    let part = &body["data"];
    assert_eq!(part["name"], json!("drive belt"));
    assert_eq!(part["total_qty"], json!(0));
    assert_eq!(part["available_qty"], json!(0));
    assert_eq!(part["loan_qty"], json!(0));
    assert_eq!(part["sell"], json!(0));

    let id = part["id"].as_i64().expect("part id");
    let fetched = app
        .request(Method::GET, &format!("/api/v1/parts/{id}"), None)
        .await;
    assert_eq!(fetched.status(), 200);
    let fetched = response_json(fetched).await;
    assert_eq!(fetched["data"]["name"], json!("drive belt"));
}

#[tokio::test]
async fn duplicate_part_name_is_a_conflict() {
    let app = TestApp::new().await;
    app.seed_part("fan motor").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/parts",
            Some(json!({ "name": "fan motor" })),
        )
        .await;
    assert_eq!(response.status(), 409);

    let body = response_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert!(
        body["message"].as_str().unwrap_or_default().contains("fan motor"),
        "conflict message should name the part: {body}"
    );
    assert!(body["errorMessages"].is_array());
}

#[tokio::test]
async fn part_name_is_required() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::POST, "/api/v1/parts", Some(json!({ "name": "" })))
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn missing_part_returns_not_found_envelope() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/parts/9999", None).await;
    assert_eq!(response.status(), 404);

    let body = response_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].as_str().unwrap_or_default().contains("9999"));
}

#[tokio::test]
async fn update_part_touches_names_but_not_counters() {
    let app = TestApp::new().await;
    let (part, _inventory) = app.seed_stock("compressor", "A-01", "2024-03", 5).await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/parts/{}", part.id),
            Some(json!({ "alternate_name": "comp." })),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    assert_eq!(body["data"]["alternate_name"], json!("comp."));
    assert_eq!(body["data"]["name"], json!("compressor"));
    assert_eq!(body["data"]["total_qty"], json!(5));
    assert_eq!(body["data"]["available_qty"], json!(5));
}

#[tokio::test]
async fn part_search_matches_name_and_alternate_name() {
    let app = TestApp::new().await;

    app.request(
        Method::POST,
        "/api/v1/parts",
        Some(json!({ "name": "drive belt" })),
    )
    .await;
    app.request(
        Method::POST,
        "/api/v1/parts",
        Some(json!({ "name": "fan assembly", "alternate_name": "belt housing" })),
    )
    .await;
    app.request(
        Method::POST,
        "/api/v1/parts",
        Some(json!({ "name": "thermostat" })),
    )
    .await;

    let response = app
        .request(Method::GET, "/api/v1/parts?search=belt", None)
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], json!(2));
    let names: Vec<&str> = body["data"]["items"]
        .as_array()
        .expect("items array")
        .iter()
        .filter_map(|item| item["name"].as_str())
        .collect();
    assert_eq!(names, vec!["drive belt", "fan assembly"]);
}

#[tokio::test]
async fn pagination_clamps_limit_and_defaults_page() {
    let app = TestApp::new().await;
    for i in 0..5 {
        app.seed_part(&format!("part-{i}")).await;
    }

    // Limit above the configured maximum gets capped
    let response = app
        .request(Method::GET, "/api/v1/parts?limit=500", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["limit"], json!(100));
    assert_eq!(body["data"]["page"], json!(1));
    assert_eq!(body["data"]["total"], json!(5));

    // Default page size applies when no limit is given
    let response = app.request(Method::GET, "/api/v1/parts", None).await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["limit"], json!(20));
    assert_eq!(body["data"]["total_pages"], json!(1));

    // Second page of two-item windows
    let response = app
        .request(Method::GET, "/api/v1/parts?page=2&limit=2", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["data"]["total_pages"], json!(3));
}

#[tokio::test]
async fn part_cascade_delete_reports_removed_rows() {
    let app = TestApp::new().await;
    let (part, _inventory) = app.seed_stock("evaporator", "B-01", "2024-01", 4).await;

    // A second lot of the same part on another rack
    let other_rack = app.seed_location("B-02").await;
    app.state
        .services
        .inventory
        .receive(partstock_api::services::inventory::ReceiveStock {
            part_id: part.id,
            location_id: other_rack.id,
            poll: "2024-02".to_string(),
            qty: 3,
            event_no: None,
            remarks: None,
        })
        .await
        .expect("receive second lot");

    // One write-off against the part
    app.request(
        Method::POST,
        "/api/v1/scrap",
        Some(json!({ "part_id": part.id, "qty": 1 })),
    )
    .await;

    let response = app
        .request(Method::DELETE, &format!("/api/v1/parts/{}", part.id), None)
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    assert_eq!(body["data"]["inventories"], json!(2));
    assert_eq!(body["data"]["inventory_logs"], json!(2));
    assert_eq!(body["data"]["scraps"], json!(1));
    assert_eq!(body["data"]["order_parts"], json!(0));

    let gone = app
        .request(Method::GET, &format!("/api/v1/parts/{}", part.id), None)
        .await;
    assert_eq!(gone.status(), 404);
}

#[tokio::test]
async fn location_create_and_duplicate_rack() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/locations",
            Some(json!({ "rack": "C-07" })),
        )
        .await;
    assert_eq!(response.status(), 201);

    let duplicate = app
        .request(
            Method::POST,
            "/api/v1/locations",
            Some(json!({ "rack": "C-07" })),
        )
        .await;
    assert_eq!(duplicate.status(), 409);
}

#[tokio::test]
async fn bulk_locations_returns_existing_and_new_rows() {
    let app = TestApp::new().await;
    app.seed_location("D-01").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/locations/bulk",
            Some(json!({ "racks": ["D-01", "D-02", "D-03"] })),
        )
        .await;
    assert_eq!(response.status(), 201);

    let body = response_json(response).await;
    let racks: Vec<&str> = body["data"]
        .as_array()
        .expect("location rows")
        .iter()
        .filter_map(|row| row["rack"].as_str())
        .collect();
    assert_eq!(racks.len(), 3);
    assert!(racks.contains(&"D-01"));
    assert!(racks.contains(&"D-03"));

    // Total rows in the table: the pre-existing rack was not duplicated
    let list = app.request(Method::GET, "/api/v1/locations", None).await;
    let list = response_json(list).await;
    assert_eq!(list["data"]["total"], json!(3));
}

#[tokio::test]
async fn partner_create_get_and_duplicate_email() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/partners",
            Some(json!({ "name": "Coolfix Service", "email": "ops@coolfix.example" })),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body = response_json(response).await;
    let id = body["data"]["id"].as_i64().expect("partner id");

    let fetched = app
        .request(Method::GET, &format!("/api/v1/partners/{id}"), None)
        .await;
    assert_eq!(fetched.status(), 200);

    let duplicate = app
        .request(
            Method::POST,
            "/api/v1/partners",
            Some(json!({ "name": "Other Name", "email": "ops@coolfix.example" })),
        )
        .await;
    assert_eq!(duplicate.status(), 409);
}
