use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

use crate::entities::part;
use crate::services::parts::{CreatePart, PartDeleteSummary, UpdatePart};
use crate::{errors::ServiceError, ApiResponse, AppState, ListQuery, PaginatedResponse};

/// List parts with pagination and optional name search
#[utoipa::path(
    get,
    path = "/api/v1/parts",
    summary = "List parts",
    tag = "Parts",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
        ("search" = Option<String>, Query, description = "Match against name or alternate name"),
    ),
    responses(
        (status = 200, description = "Parts retrieved successfully", body = ApiResponse<PaginatedResponse<part::Model>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_parts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<part::Model>>>, ServiceError> {
    let (page, limit) = state.page_window(query.page, query.limit);
    let (items, total) = state
        .services
        .parts
        .list_parts(page, limit, query.search)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

/// Create a part with all quantity counters at zero
#[utoipa::path(
    post,
    path = "/api/v1/parts",
    summary = "Create part",
    tag = "Parts",
    request_body = CreatePart,
    responses(
        (status = 201, description = "Part created successfully", body = ApiResponse<part::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Part name already exists", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn create_part(
    State(state): State<AppState>,
    Json(request): Json<CreatePart>,
) -> Result<(StatusCode, Json<ApiResponse<part::Model>>), ServiceError> {
    let part = state.services.parts.create_part(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(part))))
}

/// Get a part by id
#[utoipa::path(
    get,
    path = "/api/v1/parts/{id}",
    summary = "Get part",
    tag = "Parts",
    params(("id" = i32, Path, description = "Part id")),
    responses(
        (status = 200, description = "Part retrieved successfully", body = ApiResponse<part::Model>),
        (status = 404, description = "Part not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_part(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<part::Model>>, ServiceError> {
    let part = state.services.parts.get_part(id).await?;
    Ok(Json(ApiResponse::success(part)))
}

/// Update a part's descriptive fields
#[utoipa::path(
    put,
    path = "/api/v1/parts/{id}",
    summary = "Update part",
    tag = "Parts",
    params(("id" = i32, Path, description = "Part id")),
    request_body = UpdatePart,
    responses(
        (status = 200, description = "Part updated successfully", body = ApiResponse<part::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Part not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Part name already exists", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn update_part(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdatePart>,
) -> Result<Json<ApiResponse<part::Model>>, ServiceError> {
    let part = state.services.parts.update_part(id, request).await?;
    Ok(Json(ApiResponse::success(part)))
}

/// Delete a part and every row that references it
#[utoipa::path(
    delete,
    path = "/api/v1/parts/{id}",
    summary = "Delete part",
    tag = "Parts",
    params(("id" = i32, Path, description = "Part id")),
    responses(
        (status = 200, description = "Part deleted with referencing rows", body = ApiResponse<PartDeleteSummary>),
        (status = 404, description = "Part not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn delete_part(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<PartDeleteSummary>>, ServiceError> {
    let summary = state.services.parts.delete_part(id).await?;
    Ok(Json(ApiResponse::success(summary)))
}
