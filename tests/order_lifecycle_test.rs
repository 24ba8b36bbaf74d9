//! Integration tests for order creation, status transitions, part line
//! edits, and deletion.

mod common;

use axum::http::Method;
use common::{response_json, TestApp};
use rstest::rstest;
use serde_json::json;

#[tokio::test]
async fn create_order_loans_stock_and_opens_an_approved_request() {
    let app = TestApp::new().await;
    let (part, inventory) = app.seed_stock("compressor", "A-01", "2024-03", 10).await;
    let partner = app.seed_partner("Coolfix", "ops@coolfix.example").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "partner_id": partner.id,
                "part_id": part.id,
                "location_id": inventory.location_id,
                "poll": "2024-03",
                "qty": 4,
                "case_id": "CASE-77"
            })),
        )
        .await;
    assert_eq!(response.status(), 201);

    let body = response_json(response).await;
    let order = &body["data"]["order"];
    assert_eq!(order["status"], json!("open"));
    assert_eq!(order["qty"], json!(4));
    assert_eq!(order["invoice_id"], json!("BD-NEC-00001"));
    assert_eq!(order["case_id"], json!("CASE-77"));
    assert!(order["close_date"].is_null());

    let request = &body["data"]["request"];
    assert_eq!(request["status"], json!("approved"));
    assert_eq!(request["order_id"], order["id"]);

    let line = &body["data"]["part_line"];
    assert_eq!(line["qty"], json!(4));
    assert_eq!(line["part_id"], json!(part.id));

    let part_row = app.part(part.id).await;
    assert_eq!(part_row.total_qty, 10);
    assert_eq!(part_row.available_qty, 6);
    assert_eq!(part_row.loan_qty, 4);
    assert_eq!(part_row.sell, 4);
    assert_eq!(app.inventory(inventory.id).await.qty, 6);
}

#[tokio::test]
async fn order_bigger_than_the_lot_is_rejected_without_side_effects() {
    let app = TestApp::new().await;
    let (part, inventory) = app.seed_stock("fan motor", "A-02", "2024-03", 3).await;
    let partner = app.seed_partner("Coolfix", "ops@coolfix.example").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "partner_id": partner.id,
                "part_id": part.id,
                "location_id": inventory.location_id,
                "poll": "2024-03",
                "qty": 5
            })),
        )
        .await;
    assert_eq!(response.status(), 422);

    let part_row = app.part(part.id).await;
    assert_eq!(part_row.available_qty, 3);
    assert_eq!(part_row.loan_qty, 0);
    assert_eq!(part_row.sell, 0);
    assert_eq!(app.inventory(inventory.id).await.qty, 3);

    let orders = app.request(Method::GET, "/api/v1/orders", None).await;
    let orders = response_json(orders).await;
    assert_eq!(orders["data"]["total"], json!(0));
    let requests = app.request(Method::GET, "/api/v1/requests", None).await;
    let requests = response_json(requests).await;
    assert_eq!(requests["data"]["total"], json!(0));
}

#[tokio::test]
async fn order_against_an_unknown_lot_is_rejected() {
    let app = TestApp::new().await;
    let (part, inventory) = app.seed_stock("fan motor", "A-02", "2024-03", 3).await;
    let partner = app.seed_partner("Coolfix", "ops@coolfix.example").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "partner_id": partner.id,
                "part_id": part.id,
                "location_id": inventory.location_id,
                "poll": "2019-12",
                "qty": 1
            })),
        )
        .await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn invoice_sequence_follows_the_latest_order() {
    let app = TestApp::new().await;
    let (part, inventory) = app.seed_stock("belt", "A-03", "2024-01", 50).await;
    let partner = app.seed_partner("Coolfix", "ops@coolfix.example").await;

    let mut ids = Vec::new();
    for _ in 0..2 {
        let response = app
            .request(
                Method::POST,
                "/api/v1/orders",
                Some(json!({
                    "partner_id": partner.id,
                    "part_id": part.id,
                    "location_id": inventory.location_id,
                    "poll": "2024-01",
                    "qty": 1
                })),
            )
            .await;
        let body = response_json(response).await;
        ids.push((
            body["data"]["order"]["id"].as_i64().expect("order id"),
            body["data"]["order"]["invoice_id"]
                .as_str()
                .expect("invoice id")
                .to_string(),
        ));
    }
    assert_eq!(ids[0].1, "BD-NEC-00001");
    assert_eq!(ids[1].1, "BD-NEC-00002");

    // The sequence continues from the latest remaining order
    app.request(
        Method::DELETE,
        &format!("/api/v1/orders/{}", ids[1].0),
        None,
    )
    .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "partner_id": partner.id,
                "part_id": part.id,
                "location_id": inventory.location_id,
                "poll": "2024-01",
                "qty": 1
            })),
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["order"]["invoice_id"], json!("BD-NEC-00002"));
}

#[rstest]
#[case::returned("returned")]
#[case::defective("defective")]
#[case::closed("closed")]
#[tokio::test]
async fn leaving_transit_for_a_returned_status_puts_stock_back(#[case] wire_name: &str) {
    let app = TestApp::new().await;
    let (part, inventory) = app.seed_stock("evaporator", "B-01", "2024-02", 10).await;
    let partner = app.seed_partner("Coolfix", "ops@coolfix.example").await;

    let created = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "partner_id": partner.id,
                "part_id": part.id,
                "location_id": inventory.location_id,
                "poll": "2024-02",
                "qty": 4
            })),
        )
        .await;
    let created = response_json(created).await;
    let order_id = created["data"]["order"]["id"].as_i64().expect("order id");

    // Open -> InTransit is a pass-through edge: no stock movement
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{order_id}/status"),
            Some(json!({ "status": "in_transit" })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let part_row = app.part(part.id).await;
    assert_eq!(part_row.available_qty, 6);
    assert_eq!(part_row.loan_qty, 4);

    // InTransit -> returned-family status puts the loan back on the shelf
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{order_id}/status"),
            Some(json!({ "status": wire_name })),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    assert_eq!(body["data"]["order"]["status"], json!(wire_name));
    assert!(!body["data"]["order"]["close_date"].is_null());

    let part_row = app.part(part.id).await;
    assert_eq!(part_row.total_qty, 10);
    assert_eq!(part_row.available_qty, 10);
    assert_eq!(part_row.loan_qty, 0);
    // The sale stays counted; only edit and delete walk it back
    assert_eq!(part_row.sell, 4);
    assert_eq!(app.inventory(inventory.id).await.qty, 10);
}

#[tokio::test]
async fn transit_round_trip_is_the_identity_on_counters() {
    let app = TestApp::new().await;
    let (part, inventory) = app.seed_stock("condenser", "B-02", "2024-02", 10).await;
    let partner = app.seed_partner("Coolfix", "ops@coolfix.example").await;

    let created = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "partner_id": partner.id,
                "part_id": part.id,
                "location_id": inventory.location_id,
                "poll": "2024-02",
                "qty": 4
            })),
        )
        .await;
    let created = response_json(created).await;
    let order_id = created["data"]["order"]["id"].as_i64().expect("order id");

    for status in ["in_transit", "returned", "in_transit"] {
        let response = app
            .request(
                Method::PUT,
                &format!("/api/v1/orders/{order_id}/status"),
                Some(json!({ "status": status })),
            )
            .await;
        assert_eq!(response.status(), 200, "transition to {status}");
    }

    // Back in transit: same counters as after creation
    let part_row = app.part(part.id).await;
    assert_eq!(part_row.total_qty, 10);
    assert_eq!(part_row.available_qty, 6);
    assert_eq!(part_row.loan_qty, 4);
    assert_eq!(part_row.sell, 4);
    assert_eq!(app.inventory(inventory.id).await.qty, 6);

    // Re-entering transit cleared the close date
    let detail = app
        .request(Method::GET, &format!("/api/v1/orders/{order_id}"), None)
        .await;
    let detail = response_json(detail).await;
    assert!(detail["data"]["order"]["close_date"].is_null());
}

#[tokio::test]
async fn status_change_can_update_the_linked_request_until_it_is_final() {
    let app = TestApp::new().await;
    let (part, inventory) = app.seed_stock("heater", "B-03", "2024-02", 10).await;
    let partner = app.seed_partner("Coolfix", "ops@coolfix.example").await;

    let created = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "partner_id": partner.id,
                "part_id": part.id,
                "location_id": inventory.location_id,
                "poll": "2024-02",
                "qty": 2
            })),
        )
        .await;
    let created = response_json(created).await;
    let order_id = created["data"]["order"]["id"].as_i64().expect("order id");
    let request_id = created["data"]["request"]["id"].as_i64().expect("request id");

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{order_id}/status"),
            Some(json!({ "status": "in_transit", "customer_status": "closed" })),
        )
        .await;
    assert_eq!(response.status(), 200);

    let request = app
        .request(Method::GET, &format!("/api/v1/requests/{request_id}"), None)
        .await;
    let request = response_json(request).await;
    assert_eq!(request["data"]["request"]["status"], json!("closed"));

    // The request is final now; further customer status updates are refused
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{order_id}/status"),
            Some(json!({ "status": "returned", "customer_status": "approved" })),
        )
        .await;
    assert_eq!(response.status(), 409);

    // And the refused transition rolled back the order status change too
    let detail = app
        .request(Method::GET, &format!("/api/v1/orders/{order_id}"), None)
        .await;
    let detail = response_json(detail).await;
    assert_eq!(detail["data"]["order"]["status"], json!("in_transit"));
}

#[tokio::test]
async fn cancelling_stamps_the_close_date() {
    let app = TestApp::new().await;
    let (part, inventory) = app.seed_stock("pump", "B-04", "2024-02", 5).await;
    let partner = app.seed_partner("Coolfix", "ops@coolfix.example").await;

    let created = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "partner_id": partner.id,
                "part_id": part.id,
                "location_id": inventory.location_id,
                "poll": "2024-02",
                "qty": 1
            })),
        )
        .await;
    let created = response_json(created).await;
    let order_id = created["data"]["order"]["id"].as_i64().expect("order id");

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{order_id}/status"),
            Some(json!({ "status": "cancelled" })),
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["order"]["status"], json!("cancelled"));
    assert!(!body["data"]["order"]["close_date"].is_null());

    // Cancellation from open is a pass-through edge: the loan stays booked
    let part_row = app.part(part.id).await;
    assert_eq!(part_row.loan_qty, 1);
}

#[tokio::test]
async fn editing_the_part_line_rebooks_the_loan() {
    let app = TestApp::new().await;
    let (part, inventory) = app.seed_stock("filter drier", "C-01", "2024-04", 10).await;
    let partner = app.seed_partner("Coolfix", "ops@coolfix.example").await;

    let created = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "partner_id": partner.id,
                "part_id": part.id,
                "location_id": inventory.location_id,
                "poll": "2024-04",
                "qty": 3
            })),
        )
        .await;
    let created = response_json(created).await;
    let order_id = created["data"]["order"]["id"].as_i64().expect("order id");

    // Same lot, bigger quantity
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{order_id}/part"),
            Some(json!({
                "part_id": part.id,
                "location_id": inventory.location_id,
                "poll": "2024-04",
                "qty": 5
            })),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    assert_eq!(body["data"]["order"]["qty"], json!(5));
    assert_eq!(body["data"]["part_line"]["qty"], json!(5));

    let part_row = app.part(part.id).await;
    assert_eq!(part_row.available_qty, 5);
    assert_eq!(part_row.loan_qty, 5);
    assert_eq!(part_row.sell, 5);
    assert_eq!(app.inventory(inventory.id).await.qty, 5);
}

#[tokio::test]
async fn editing_the_part_line_across_parts_restores_the_old_one() {
    let app = TestApp::new().await;
    let (part_a, inv_a) = app.seed_stock("fan blade", "C-02", "2024-04", 10).await;
    let (part_b, inv_b) = app.seed_stock("fan guard", "C-03", "2024-04", 8).await;
    let partner = app.seed_partner("Coolfix", "ops@coolfix.example").await;

    let created = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "partner_id": partner.id,
                "part_id": part_a.id,
                "location_id": inv_a.location_id,
                "poll": "2024-04",
                "qty": 2
            })),
        )
        .await;
    let created = response_json(created).await;
    let order_id = created["data"]["order"]["id"].as_i64().expect("order id");

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{order_id}/part"),
            Some(json!({
                "part_id": part_b.id,
                "location_id": inv_b.location_id,
                "poll": "2024-04",
                "qty": 4
            })),
        )
        .await;
    assert_eq!(response.status(), 200);

    let a = app.part(part_a.id).await;
    assert_eq!((a.available_qty, a.loan_qty, a.sell), (10, 0, 0));
    assert_eq!(app.inventory(inv_a.id).await.qty, 10);

    let b = app.part(part_b.id).await;
    assert_eq!((b.available_qty, b.loan_qty, b.sell), (4, 4, 4));
    assert_eq!(app.inventory(inv_b.id).await.qty, 4);

    let body = response_json(response).await;
    assert_eq!(body["data"]["part_line"]["part_id"], json!(part_b.id));
}

#[tokio::test]
async fn editing_beyond_available_stock_rolls_back() {
    let app = TestApp::new().await;
    let (part, inventory) = app.seed_stock("coil", "C-04", "2024-04", 6).await;
    let partner = app.seed_partner("Coolfix", "ops@coolfix.example").await;

    let created = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "partner_id": partner.id,
                "part_id": part.id,
                "location_id": inventory.location_id,
                "poll": "2024-04",
                "qty": 2
            })),
        )
        .await;
    let created = response_json(created).await;
    let order_id = created["data"]["order"]["id"].as_i64().expect("order id");

    // 9 > 6 on-hand even after the old 2 come back
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{order_id}/part"),
            Some(json!({
                "part_id": part.id,
                "location_id": inventory.location_id,
                "poll": "2024-04",
                "qty": 9
            })),
        )
        .await;
    assert_eq!(response.status(), 422);

    // Unwind of the old line did not leak out of the failed transaction
    let part_row = app.part(part.id).await;
    assert_eq!(part_row.available_qty, 4);
    assert_eq!(part_row.loan_qty, 2);
    assert_eq!(part_row.sell, 2);
    assert_eq!(app.inventory(inventory.id).await.qty, 4);
}

#[tokio::test]
async fn deleting_a_live_order_reverses_the_loan() {
    let app = TestApp::new().await;
    let (part, inventory) = app.seed_stock("motor mount", "D-01", "2024-05", 10).await;
    let partner = app.seed_partner("Coolfix", "ops@coolfix.example").await;

    let created = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "partner_id": partner.id,
                "part_id": part.id,
                "location_id": inventory.location_id,
                "poll": "2024-05",
                "qty": 4
            })),
        )
        .await;
    let created = response_json(created).await;
    let order_id = created["data"]["order"]["id"].as_i64().expect("order id");
    let request_id = created["data"]["request"]["id"].as_i64().expect("request id");

    let response = app
        .request(Method::DELETE, &format!("/api/v1/orders/{order_id}"), None)
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    assert_eq!(body["data"]["stock_reversed"], json!(true));

    let part_row = app.part(part.id).await;
    assert_eq!((part_row.available_qty, part_row.loan_qty, part_row.sell), (10, 0, 0));
    assert_eq!(app.inventory(inventory.id).await.qty, 10);

    // The customer request survives, unlinked from the deleted order
    let request = app
        .request(Method::GET, &format!("/api/v1/requests/{request_id}"), None)
        .await;
    assert_eq!(request.status(), 200);
    let request = response_json(request).await;
    assert!(request["data"]["request"]["order_id"].is_null());

    let gone = app
        .request(Method::GET, &format!("/api/v1/orders/{order_id}"), None)
        .await;
    assert_eq!(gone.status(), 404);
}

#[tokio::test]
async fn deleting_a_reconciled_order_leaves_counters_alone() {
    let app = TestApp::new().await;
    let (part, inventory) = app.seed_stock("shroud", "D-02", "2024-05", 10).await;
    let partner = app.seed_partner("Coolfix", "ops@coolfix.example").await;

    let created = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "partner_id": partner.id,
                "part_id": part.id,
                "location_id": inventory.location_id,
                "poll": "2024-05",
                "qty": 4
            })),
        )
        .await;
    let created = response_json(created).await;
    let order_id = created["data"]["order"]["id"].as_i64().expect("order id");

    for status in ["in_transit", "returned"] {
        app.request(
            Method::PUT,
            &format!("/api/v1/orders/{order_id}/status"),
            Some(json!({ "status": status })),
        )
        .await;
    }

    let response = app
        .request(Method::DELETE, &format!("/api/v1/orders/{order_id}"), None)
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["stock_reversed"], json!(false));

    // Stock already came back on the returned transition; the delete only
    // removed rows
    let part_row = app.part(part.id).await;
    assert_eq!(part_row.total_qty, 10);
    assert_eq!(part_row.available_qty, 10);
    assert_eq!(part_row.loan_qty, 0);
    assert_eq!(part_row.sell, 4);
    assert_eq!(app.inventory(inventory.id).await.qty, 10);
}

#[tokio::test]
async fn order_list_filters_by_status_and_partner() {
    let app = TestApp::new().await;
    let (part, inventory) = app.seed_stock("capillary", "D-03", "2024-05", 20).await;
    let partner_a = app.seed_partner("Alpha", "alpha@example.com").await;
    let partner_b = app.seed_partner("Beta", "beta@example.com").await;

    for partner_id in [partner_a.id, partner_b.id] {
        app.request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "partner_id": partner_id,
                "part_id": part.id,
                "location_id": inventory.location_id,
                "poll": "2024-05",
                "qty": 1
            })),
        )
        .await;
    }

    let orders = app.request(Method::GET, "/api/v1/orders", None).await;
    let orders = response_json(orders).await;
    let first_id = orders["data"]["items"][0]["id"].as_i64().expect("order id");

    app.request(
        Method::PUT,
        &format!("/api/v1/orders/{first_id}/status"),
        Some(json!({ "status": "cancelled" })),
    )
    .await;

    let open = app
        .request(Method::GET, "/api/v1/orders?status=open", None)
        .await;
    let open = response_json(open).await;
    assert_eq!(open["data"]["total"], json!(1));

    let by_partner = app
        .request(
            Method::GET,
            &format!("/api/v1/orders?partner_id={}", partner_b.id),
            None,
        )
        .await;
    let by_partner = response_json(by_partner).await;
    assert_eq!(by_partner["data"]["total"], json!(1));
    assert_eq!(
        by_partner["data"]["items"][0]["partner_id"],
        json!(partner_b.id)
    );
}
