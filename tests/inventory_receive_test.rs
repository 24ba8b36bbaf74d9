//! Integration tests for single and bulk stock receipts.

mod common;

use axum::http::Method;
use common::{response_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn receive_updates_counters_and_writes_a_log() {
    let app = TestApp::new().await;
    let part = app.seed_part("fan blade").await;
    let location = app.seed_location("A-11").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/receive",
            Some(json!({
                "part_id": part.id,
                "location_id": location.id,
                "poll": "2024-06",
                "qty": 12,
                "event_no": "GRN-445",
                "remarks": "first delivery"
            })),
        )
        .await;
    assert_eq!(response.status(), 201);

    let body = response_json(response).await;
    assert_eq!(body["data"]["part"]["total_qty"], json!(12));
    assert_eq!(body["data"]["part"]["available_qty"], json!(12));
    assert_eq!(body["data"]["part"]["loan_qty"], json!(0));
    assert_eq!(body["data"]["inventory"]["qty"], json!(12));
    assert_eq!(body["data"]["inventory"]["poll"], json!("2024-06"));
    assert_eq!(body["data"]["log"]["added_qty"], json!(12));
    assert_eq!(body["data"]["log"]["event_no"], json!("GRN-445"));
}

#[tokio::test]
async fn receiving_the_same_lot_twice_accumulates() {
    let app = TestApp::new().await;
    let (part, inventory) = app.seed_stock("filter", "A-12", "2024-05", 4).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/receive",
            Some(json!({
                "part_id": part.id,
                "location_id": inventory.location_id,
                "poll": "2024-05",
                "qty": 6
            })),
        )
        .await;
    assert_eq!(response.status(), 201);

    let body = response_json(response).await;
    // Same (part, location, poll) means the same inventory row
    assert_eq!(body["data"]["inventory"]["id"], json!(inventory.id));
    assert_eq!(body["data"]["inventory"]["qty"], json!(10));
    assert_eq!(body["data"]["part"]["total_qty"], json!(10));

    let detail = app
        .request(
            Method::GET,
            &format!("/api/v1/inventory/{}", inventory.id),
            None,
        )
        .await;
    let detail = response_json(detail).await;
    assert_eq!(detail["data"]["logs"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn receive_for_missing_part_or_location_is_not_found() {
    let app = TestApp::new().await;
    let part = app.seed_part("gasket").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/receive",
            Some(json!({
                "part_id": 9999,
                "location_id": 1,
                "poll": "2024-01",
                "qty": 1
            })),
        )
        .await;
    assert_eq!(response.status(), 404);

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/receive",
            Some(json!({
                "part_id": part.id,
                "location_id": 9999,
                "poll": "2024-01",
                "qty": 1
            })),
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn receive_rejects_non_positive_qty() {
    let app = TestApp::new().await;
    let part = app.seed_part("bearing").await;
    let location = app.seed_location("A-13").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/receive",
            Some(json!({
                "part_id": part.id,
                "location_id": location.id,
                "poll": "2024-01",
                "qty": 0
            })),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn bulk_receive_creates_parts_and_locations_on_the_fly() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/receive/bulk",
            Some(json!({
                "items": [
                    { "part_name": "hose clamp", "rack": "E-01", "poll": "2024-07", "qty": 20 },
                    { "part_name": "o-ring",     "rack": "E-02", "poll": "2024-07", "qty": 50 }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    assert_eq!(body["data"]["received"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["data"]["failures"].as_array().map(Vec::len), Some(0));

    let parts = app
        .request(Method::GET, "/api/v1/parts?search=hose+clamp", None)
        .await;
    let parts = response_json(parts).await;
    assert_eq!(parts["data"]["total"], json!(1));
    assert_eq!(parts["data"]["items"][0]["available_qty"], json!(20));

    let locations = app.request(Method::GET, "/api/v1/locations", None).await;
    let locations = response_json(locations).await;
    assert_eq!(locations["data"]["total"], json!(2));
}

#[tokio::test]
async fn bulk_receive_accumulates_a_part_repeated_within_a_batch() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/receive/bulk",
            Some(json!({
                "items": [
                    { "part_name": "relay", "rack": "F-01", "poll": "2024-08", "qty": 5 },
                    { "part_name": "relay", "rack": "F-01", "poll": "2024-08", "qty": 7 }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    let received = body["data"]["received"].as_array().expect("receipts");
    assert_eq!(received.len(), 2);

    // Both receipts landed on the same inventory row
    assert_eq!(
        received[0]["inventory"]["id"],
        received[1]["inventory"]["id"]
    );
    // The second receipt sees the accumulated state
    assert_eq!(received[1]["inventory"]["qty"], json!(12));
    assert_eq!(received[1]["part"]["total_qty"], json!(12));
}

#[tokio::test]
async fn whole_batch_mode_rejects_everything_on_an_invalid_item() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/receive/bulk",
            Some(json!({
                "atomicity": "whole-batch",
                "items": [
                    { "part_name": "condenser", "rack": "G-01", "poll": "2024-09", "qty": 3 },
                    { "part_name": "bad item",  "rack": "G-02", "poll": "2024-09", "qty": 0 }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), 400);

    // Nothing from the batch was written
    let parts = app.request(Method::GET, "/api/v1/parts", None).await;
    let parts = response_json(parts).await;
    assert_eq!(parts["data"]["total"], json!(0));
    let locations = app.request(Method::GET, "/api/v1/locations", None).await;
    let locations = response_json(locations).await;
    assert_eq!(locations["data"]["total"], json!(0));
}

#[tokio::test]
async fn per_item_mode_keeps_good_items_and_reports_bad_ones() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/receive/bulk",
            Some(json!({
                "atomicity": "per-item",
                "items": [
                    { "part_name": "capacitor", "rack": "H-01", "poll": "2024-10", "qty": 9 },
                    { "part_name": "broken",    "rack": "H-02", "poll": "2024-10", "qty": -4 },
                    { "part_name": "fuse",      "rack": "H-03", "poll": "2024-10", "qty": 30 }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    assert_eq!(body["data"]["received"].as_array().map(Vec::len), Some(2));

    let failures = body["data"]["failures"].as_array().expect("failures");
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["index"], json!(1));
    assert_eq!(failures[0]["part_name"], json!("broken"));

    // The invalid item created nothing
    let parts = app
        .request(Method::GET, "/api/v1/parts?search=broken", None)
        .await;
    let parts = response_json(parts).await;
    assert_eq!(parts["data"]["total"], json!(0));

    // The valid items are fully applied
    let parts = app
        .request(Method::GET, "/api/v1/parts?search=fuse", None)
        .await;
    let parts = response_json(parts).await;
    assert_eq!(parts["data"]["items"][0]["available_qty"], json!(30));
}

#[tokio::test]
async fn inventory_list_filters_by_part_and_location() {
    let app = TestApp::new().await;
    let (part_a, inv_a) = app.seed_stock("widget-a", "K-01", "2024-01", 5).await;
    let (_part_b, _inv_b) = app.seed_stock("widget-b", "K-02", "2024-01", 8).await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/inventory?part_id={}", part_a.id),
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], json!(1));
    assert_eq!(body["data"]["items"][0]["id"], json!(inv_a.id));

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/inventory?location_id={}", inv_a.location_id),
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], json!(1));

    let response = app.request(Method::GET, "/api/v1/inventory", None).await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], json!(2));
}
