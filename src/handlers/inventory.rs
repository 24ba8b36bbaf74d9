use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use crate::entities::inventory;
use crate::services::inventory::{
    BulkReceive, BulkReceiveReport, InventoryDetail, InventoryUpdate, LogCorrection, ReceiveStock,
    SetQuantity, StockReceipt, UpdateLog,
};
use crate::{errors::ServiceError, ApiResponse, AppState, PaginatedResponse};

#[derive(Debug, Deserialize)]
pub struct InventoryListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub part_id: Option<i32>,
    pub location_id: Option<i32>,
}

/// Receive stock into a lot
#[utoipa::path(
    post,
    path = "/api/v1/inventory/receive",
    summary = "Receive stock",
    tag = "Inventory",
    description = "Add quantity to a part at a location/lot, creating the inventory row if needed and appending a receipt log",
    request_body = ReceiveStock,
    responses(
        (status = 201, description = "Stock received", body = ApiResponse<StockReceipt>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Part or location not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrent lot creation", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn receive_stock(
    State(state): State<AppState>,
    Json(request): Json<ReceiveStock>,
) -> Result<(StatusCode, Json<ApiResponse<StockReceipt>>), ServiceError> {
    let receipt = state.services.inventory.receive(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(receipt))))
}

/// Receive a batch of stock lines addressed by part and rack name
#[utoipa::path(
    post,
    path = "/api/v1/inventory/receive/bulk",
    summary = "Bulk receive stock",
    tag = "Inventory",
    description = "Process many receipt lines; unknown parts and racks are created on the fly. Atomicity is whole-batch or per-item",
    request_body = BulkReceive,
    responses(
        (status = 200, description = "Batch processed; failures listed per item in per-item mode", body = ApiResponse<BulkReceiveReport>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 422, description = "Whole-batch mode aborted on a failing item", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn receive_stock_bulk(
    State(state): State<AppState>,
    Json(request): Json<BulkReceive>,
) -> Result<Json<ApiResponse<BulkReceiveReport>>, ServiceError> {
    let report = state.services.inventory.receive_bulk(request).await?;
    Ok(Json(ApiResponse::success(report)))
}

/// List inventory rows, optionally filtered by part or location
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    summary = "List inventory",
    tag = "Inventory",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
        ("part_id" = Option<i32>, Query, description = "Filter by part"),
        ("location_id" = Option<i32>, Query, description = "Filter by location"),
    ),
    responses(
        (status = 200, description = "Inventory retrieved successfully", body = ApiResponse<PaginatedResponse<inventory::Model>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(query): Query<InventoryListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<inventory::Model>>>, ServiceError> {
    let (page, limit) = state.page_window(query.page, query.limit);
    let (items, total) = state
        .services
        .inventory
        .list_inventory(page, limit, query.part_id, query.location_id)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

/// Get an inventory row with its receipt logs
#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}",
    summary = "Get inventory",
    tag = "Inventory",
    params(("id" = i32, Path, description = "Inventory id")),
    responses(
        (status = 200, description = "Inventory retrieved successfully", body = ApiResponse<InventoryDetail>),
        (status = 404, description = "Inventory not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_inventory(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<InventoryDetail>>, ServiceError> {
    let detail = state.services.inventory.get_inventory(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// Set an inventory row to an absolute quantity
#[utoipa::path(
    put,
    path = "/api/v1/inventory/{id}/quantity",
    summary = "Set inventory quantity",
    tag = "Inventory",
    description = "Overrides the lot quantity; the difference flows into the part's total and available counters",
    params(("id" = i32, Path, description = "Inventory id")),
    request_body = SetQuantity,
    responses(
        (status = 200, description = "Quantity updated", body = ApiResponse<InventoryUpdate>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Inventory not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Change would drive a counter negative", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn set_inventory_quantity(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<SetQuantity>,
) -> Result<Json<ApiResponse<InventoryUpdate>>, ServiceError> {
    let update = state.services.inventory.set_quantity(id, request).await?;
    Ok(Json(ApiResponse::success(update)))
}

/// Delete an inventory row
#[utoipa::path(
    delete,
    path = "/api/v1/inventory/{id}",
    summary = "Delete inventory",
    tag = "Inventory",
    params(("id" = i32, Path, description = "Inventory id")),
    responses(
        (status = 200, description = "Inventory row deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Inventory not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Row still referenced by order lines or logs", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn delete_inventory(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state.services.inventory.delete_inventory(id).await?;
    Ok(Json(ApiResponse::success(())))
}

/// Correct a receipt log's quantity or annotations
#[utoipa::path(
    put,
    path = "/api/v1/inventory/logs/{log_id}",
    summary = "Update receipt log",
    tag = "Inventory",
    params(("log_id" = i32, Path, description = "Receipt log id")),
    request_body = UpdateLog,
    responses(
        (status = 200, description = "Log corrected and counters re-balanced", body = ApiResponse<LogCorrection>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Log not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Correction would drive a counter negative", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn update_inventory_log(
    State(state): State<AppState>,
    Path(log_id): Path<i32>,
    Json(request): Json<UpdateLog>,
) -> Result<Json<ApiResponse<LogCorrection>>, ServiceError> {
    let correction = state.services.inventory.update_log(log_id, request).await?;
    Ok(Json(ApiResponse::success(correction)))
}

/// Delete a receipt log, backing its quantity out of the lot
#[utoipa::path(
    delete,
    path = "/api/v1/inventory/logs/{log_id}",
    summary = "Delete receipt log",
    tag = "Inventory",
    params(("log_id" = i32, Path, description = "Receipt log id")),
    responses(
        (status = 200, description = "Log deleted and counters re-balanced", body = ApiResponse<InventoryUpdate>),
        (status = 404, description = "Log not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Lot stock already consumed by orders", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn delete_inventory_log(
    State(state): State<AppState>,
    Path(log_id): Path<i32>,
) -> Result<Json<ApiResponse<InventoryUpdate>>, ServiceError> {
    let update = state.services.inventory.delete_log(log_id).await?;
    Ok(Json(ApiResponse::success(update)))
}
