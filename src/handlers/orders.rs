use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use crate::entities::order::{self, OrderStatus};
use crate::services::orders::{
    EditOrderPart, NewOrder, OrderCreation, OrderDeletion, OrderDetail, StatusChange,
};
use crate::{errors::ServiceError, ApiResponse, AppState, PaginatedResponse};

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<OrderStatus>,
    pub partner_id: Option<i32>,
}

/// List orders with optional status and partner filters
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    summary = "List orders",
    tag = "Orders",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
        ("status" = Option<OrderStatus>, Query, description = "Filter by order status"),
        ("partner_id" = Option<i32>, Query, description = "Filter by partner"),
    ),
    responses(
        (status = 200, description = "Orders retrieved successfully", body = ApiResponse<PaginatedResponse<order::Model>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<order::Model>>>, ServiceError> {
    let (page, limit) = state.page_window(query.page, query.limit);
    let (items, total) = state
        .services
        .orders
        .list_orders(page, limit, query.status, query.partner_id)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

/// Create an order, loaning stock out of a chosen lot
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    summary = "Create order",
    tag = "Orders",
    description = "Loans the quantity out of the chosen lot, issues the next invoice id, and records a pre-approved customer request alongside",
    request_body = NewOrder,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderCreation>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Partner or part not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock in the chosen lot", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<NewOrder>,
) -> Result<(StatusCode, Json<ApiResponse<OrderCreation>>), ServiceError> {
    let creation = state.services.orders.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(creation))))
}

/// Get an order with its part line
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    summary = "Get order",
    tag = "Orders",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order retrieved successfully", body = ApiResponse<OrderDetail>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<OrderDetail>>, ServiceError> {
    let detail = state.services.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// Change an order's status
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    summary = "Change order status",
    tag = "Orders",
    description = "Transitions the order; stock moves only on the edges between in_transit and the returned-class statuses. Optionally moves the linked customer request as well",
    params(("id" = i32, Path, description = "Order id")),
    request_body = StatusChange,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<OrderDetail>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Linked request already finalized", body = crate::errors::ErrorResponse),
        (status = 422, description = "Stock movement would drive a counter negative", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn change_order_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<StatusChange>,
) -> Result<Json<ApiResponse<OrderDetail>>, ServiceError> {
    let detail = state.services.orders.change_status(id, request).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// Repoint an order's part line
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/part",
    summary = "Edit order part line",
    tag = "Orders",
    description = "Unwinds the current loan and takes out a new one against the requested part, lot and quantity",
    params(("id" = i32, Path, description = "Order id")),
    request_body = EditOrderPart,
    responses(
        (status = 200, description = "Part line updated", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order, line or part not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock in the new lot", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn edit_order_part(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<EditOrderPart>,
) -> Result<Json<ApiResponse<OrderDetail>>, ServiceError> {
    let detail = state.services.orders.edit_order_part(id, request).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// Delete an order
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    summary = "Delete order",
    tag = "Orders",
    description = "Removes the order and its part line. Orders not yet reconciled have their loan reversed first; the linked customer request survives, unlinked",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order deleted", body = ApiResponse<OrderDeletion>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Loan reversal would drive a counter negative", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<OrderDeletion>>, ServiceError> {
    let deletion = state.services.orders.delete_order(id).await?;
    Ok(Json(ApiResponse::success(deletion)))
}
