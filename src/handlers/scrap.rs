use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};

use crate::entities::scrap;
use crate::services::scrap::{NewScrap, ScrapRecord};
use crate::{errors::ServiceError, ApiResponse, AppState, ListQuery, PaginatedResponse};

/// List scrap records
#[utoipa::path(
    get,
    path = "/api/v1/scrap",
    summary = "List scrap records",
    tag = "Scrap",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Scrap records retrieved successfully", body = ApiResponse<PaginatedResponse<scrap::Model>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_scraps(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<scrap::Model>>>, ServiceError> {
    let (page, limit) = state.page_window(query.page, query.limit);
    let (items, total) = state.services.scrap.list_scraps(page, limit).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

/// Write off damaged stock
#[utoipa::path(
    post,
    path = "/api/v1/scrap",
    summary = "Record scrap",
    tag = "Scrap",
    description = "Reduces the part's total and available counters and records the write-off",
    request_body = NewScrap,
    responses(
        (status = 201, description = "Scrap recorded", body = ApiResponse<ScrapRecord>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Part not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Write-off exceeds available stock", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn record_scrap(
    State(state): State<AppState>,
    Json(request): Json<NewScrap>,
) -> Result<(StatusCode, Json<ApiResponse<ScrapRecord>>), ServiceError> {
    let record = state.services.scrap.record_scrap(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(record))))
}
