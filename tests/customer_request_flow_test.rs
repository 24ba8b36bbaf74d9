//! Integration tests for the ask-first path: submitting, approving, and
//! rejecting customer requests.

mod common;

use assert_matches::assert_matches;
use axum::http::Method;
use common::{response_json, TestApp};
use partstock_api::errors::ServiceError;
use partstock_api::services::customer_requests::ApproveRequest;
use serde_json::json;

#[tokio::test]
async fn submitting_a_request_records_it_pending_without_moving_stock() {
    let app = TestApp::new().await;
    let (part, inventory) = app.seed_stock("thermostat", "A-01", "2024-06", 8).await;
    let partner = app.seed_partner("Chillserv", "parts@chillserv.example").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/requests",
            Some(json!({
                "partner_id": partner.id,
                "part_id": part.id,
                "qty": 3,
                "case_id": "CASE-12",
                "description": "Front-desk unit blows warm"
            })),
        )
        .await;
    assert_eq!(response.status(), 201);

    let body = response_json(response).await;
    assert_eq!(body["data"]["request"]["status"], json!("pending"));
    assert_eq!(body["data"]["request"]["case_id"], json!("CASE-12"));
    assert!(body["data"]["request"]["order_id"].is_null());
    assert_eq!(body["data"]["requested_part"]["qty"], json!(3));
    assert_eq!(body["data"]["requested_part"]["part_id"], json!(part.id));

    let part_row = app.part(part.id).await;
    assert_eq!(part_row.available_qty, 8);
    assert_eq!(part_row.loan_qty, 0);
    assert_eq!(app.inventory(inventory.id).await.qty, 8);
}

#[tokio::test]
async fn submitting_for_an_unknown_partner_or_part_fails() {
    let app = TestApp::new().await;
    let part = app.seed_part("relay").await;
    let partner = app.seed_partner("Chillserv", "parts@chillserv.example").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/requests",
            Some(json!({ "partner_id": 9999, "part_id": part.id, "qty": 1 })),
        )
        .await;
    assert_eq!(response.status(), 404);

    let response = app
        .request(
            Method::POST,
            "/api/v1/requests",
            Some(json!({ "partner_id": partner.id, "part_id": 9999, "qty": 1 })),
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn approving_a_request_loans_stock_and_mints_an_order() {
    let app = TestApp::new().await;
    let (part, inventory) = app.seed_stock("solenoid", "A-02", "2024-06", 10).await;
    let partner = app.seed_partner("Chillserv", "parts@chillserv.example").await;

    let submitted = app
        .request(
            Method::POST,
            "/api/v1/requests",
            Some(json!({ "partner_id": partner.id, "part_id": part.id, "qty": 4 })),
        )
        .await;
    let submitted = response_json(submitted).await;
    let request_id = submitted["data"]["request"]["id"].as_i64().expect("request id");

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/requests/{request_id}/approve"),
            Some(json!({ "location_id": inventory.location_id, "poll": "2024-06" })),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    assert_eq!(body["data"]["request"]["status"], json!("approved"));
    assert_eq!(body["data"]["request"]["order_id"], body["data"]["order"]["id"]);
    assert_eq!(body["data"]["order"]["status"], json!("open"));
    assert_eq!(body["data"]["order"]["invoice_id"], json!("BD-NEC-00001"));
    assert_eq!(body["data"]["order"]["qty"], json!(4));
    assert_eq!(body["data"]["part_line"]["qty"], json!(4));
    assert_eq!(body["data"]["part_line"]["inventory_id"], json!(inventory.id));

    let part_row = app.part(part.id).await;
    assert_eq!(part_row.total_qty, 10);
    assert_eq!(part_row.available_qty, 6);
    assert_eq!(part_row.loan_qty, 4);
    assert_eq!(part_row.sell, 4);
    assert_eq!(app.inventory(inventory.id).await.qty, 6);
}

#[tokio::test]
async fn approving_twice_is_a_conflict() {
    let app = TestApp::new().await;
    let (part, inventory) = app.seed_stock("gasket", "A-03", "2024-06", 10).await;
    let partner = app.seed_partner("Chillserv", "parts@chillserv.example").await;

    let submitted = app
        .request(
            Method::POST,
            "/api/v1/requests",
            Some(json!({ "partner_id": partner.id, "part_id": part.id, "qty": 2 })),
        )
        .await;
    let submitted = response_json(submitted).await;
    let request_id = submitted["data"]["request"]["id"].as_i64().expect("request id") as i32;

    let approve = ApproveRequest {
        location_id: inventory.location_id,
        poll: "2024-06".to_string(),
    };
    app.state
        .services
        .customer_requests
        .approve_request(request_id, approve.clone())
        .await
        .expect("first approval");

    let err = app
        .state
        .services
        .customer_requests
        .approve_request(request_id, approve)
        .await
        .expect_err("second approval must fail");
    assert_matches!(err, ServiceError::Conflict(msg) if msg.contains("already approved"));

    // The second attempt moved nothing
    let part_row = app.part(part.id).await;
    assert_eq!(part_row.loan_qty, 2);
}

#[tokio::test]
async fn approving_more_than_the_lot_holds_leaves_the_request_pending() {
    let app = TestApp::new().await;
    let (part, inventory) = app.seed_stock("drier core", "A-04", "2024-06", 3).await;
    let partner = app.seed_partner("Chillserv", "parts@chillserv.example").await;

    let submitted = app
        .request(
            Method::POST,
            "/api/v1/requests",
            Some(json!({ "partner_id": partner.id, "part_id": part.id, "qty": 5 })),
        )
        .await;
    let submitted = response_json(submitted).await;
    let request_id = submitted["data"]["request"]["id"].as_i64().expect("request id") as i32;

    let err = app
        .state
        .services
        .customer_requests
        .approve_request(
            request_id,
            ApproveRequest {
                location_id: inventory.location_id,
                poll: "2024-06".to_string(),
            },
        )
        .await
        .expect_err("approval beyond stock must fail");
    assert_matches!(err, ServiceError::InsufficientStock(_));

    // Rolled back whole: request still pending, no order minted
    let request = app
        .request(Method::GET, &format!("/api/v1/requests/{request_id}"), None)
        .await;
    let request = response_json(request).await;
    assert_eq!(request["data"]["request"]["status"], json!("pending"));
    assert!(request["data"]["request"]["order_id"].is_null());

    let orders = app.request(Method::GET, "/api/v1/orders", None).await;
    let orders = response_json(orders).await;
    assert_eq!(orders["data"]["total"], json!(0));
    assert_eq!(app.part(part.id).await.available_qty, 3);
}

#[tokio::test]
async fn approving_against_a_lot_that_does_not_exist_is_rejected() {
    let app = TestApp::new().await;
    let (part, inventory) = app.seed_stock("bearing", "A-05", "2024-06", 5).await;
    let partner = app.seed_partner("Chillserv", "parts@chillserv.example").await;

    let submitted = app
        .request(
            Method::POST,
            "/api/v1/requests",
            Some(json!({ "partner_id": partner.id, "part_id": part.id, "qty": 1 })),
        )
        .await;
    let submitted = response_json(submitted).await;
    let request_id = submitted["data"]["request"]["id"].as_i64().expect("request id");

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/requests/{request_id}/approve"),
            Some(json!({ "location_id": inventory.location_id, "poll": "1999-01" })),
        )
        .await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn rejecting_finalizes_the_request() {
    let app = TestApp::new().await;
    let part = app.seed_part("contactor").await;
    let partner = app.seed_partner("Chillserv", "parts@chillserv.example").await;

    let submitted = app
        .request(
            Method::POST,
            "/api/v1/requests",
            Some(json!({ "partner_id": partner.id, "part_id": part.id, "qty": 1 })),
        )
        .await;
    let submitted = response_json(submitted).await;
    let request_id = submitted["data"]["request"]["id"].as_i64().expect("request id");

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/requests/{request_id}/reject"),
            None,
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], json!("rejected"));

    // Rejected is final: neither a second reject nor an approval goes
    // through
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/requests/{request_id}/reject"),
            None,
        )
        .await;
    assert_eq!(response.status(), 409);

    let err = app
        .state
        .services
        .customer_requests
        .approve_request(
            request_id as i32,
            ApproveRequest {
                location_id: 1,
                poll: "2024-06".to_string(),
            },
        )
        .await
        .expect_err("approval of a rejected request must fail");
    assert_matches!(err, ServiceError::Conflict(msg) if msg.contains("rejected"));
}

#[tokio::test]
async fn request_list_filters_by_status() {
    let app = TestApp::new().await;
    let part = app.seed_part("valve").await;
    let partner = app.seed_partner("Chillserv", "parts@chillserv.example").await;

    let mut request_ids = Vec::new();
    for _ in 0..3 {
        let submitted = app
            .request(
                Method::POST,
                "/api/v1/requests",
                Some(json!({ "partner_id": partner.id, "part_id": part.id, "qty": 1 })),
            )
            .await;
        let submitted = response_json(submitted).await;
        request_ids.push(submitted["data"]["request"]["id"].as_i64().expect("request id"));
    }

    app.request(
        Method::POST,
        &format!("/api/v1/requests/{}/reject", request_ids[1]),
        None,
    )
    .await;

    let pending = app
        .request(Method::GET, "/api/v1/requests?status=pending", None)
        .await;
    let pending = response_json(pending).await;
    assert_eq!(pending["data"]["total"], json!(2));

    let rejected = app
        .request(Method::GET, "/api/v1/requests?status=rejected", None)
        .await;
    let rejected = response_json(rejected).await;
    assert_eq!(rejected["data"]["total"], json!(1));
    assert_eq!(
        rejected["data"]["items"][0]["id"],
        json!(request_ids[1])
    );
}
