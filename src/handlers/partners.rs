use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

use crate::entities::partner;
use crate::services::partners::CreatePartner;
use crate::{errors::ServiceError, ApiResponse, AppState, ListQuery, PaginatedResponse};

/// List partners
#[utoipa::path(
    get,
    path = "/api/v1/partners",
    summary = "List partners",
    tag = "Partners",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Partners retrieved successfully", body = ApiResponse<PaginatedResponse<partner::Model>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_partners(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<partner::Model>>>, ServiceError> {
    let (page, limit) = state.page_window(query.page, query.limit);
    let (items, total) = state.services.partners.list_partners(page, limit).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

/// Register a partner
#[utoipa::path(
    post,
    path = "/api/v1/partners",
    summary = "Create partner",
    tag = "Partners",
    request_body = CreatePartner,
    responses(
        (status = 201, description = "Partner created successfully", body = ApiResponse<partner::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Partner email already exists", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn create_partner(
    State(state): State<AppState>,
    Json(request): Json<CreatePartner>,
) -> Result<(StatusCode, Json<ApiResponse<partner::Model>>), ServiceError> {
    let partner = state.services.partners.create_partner(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(partner))))
}

/// Get a partner by id
#[utoipa::path(
    get,
    path = "/api/v1/partners/{id}",
    summary = "Get partner",
    tag = "Partners",
    params(("id" = i32, Path, description = "Partner id")),
    responses(
        (status = 200, description = "Partner retrieved successfully", body = ApiResponse<partner::Model>),
        (status = 404, description = "Partner not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_partner(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<partner::Model>>, ServiceError> {
    let partner = state.services.partners.get_partner(id).await?;
    Ok(Json(ApiResponse::success(partner)))
}
