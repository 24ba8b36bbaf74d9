use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};

use crate::entities::location;
use crate::services::locations::{BulkCreateLocations, CreateLocation};
use crate::{errors::ServiceError, ApiResponse, AppState, ListQuery, PaginatedResponse};

/// List rack locations
#[utoipa::path(
    get,
    path = "/api/v1/locations",
    summary = "List locations",
    tag = "Locations",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Locations retrieved successfully", body = ApiResponse<PaginatedResponse<location::Model>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_locations(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<location::Model>>>, ServiceError> {
    let (page, limit) = state.page_window(query.page, query.limit);
    let (items, total) = state.services.locations.list_locations(page, limit).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

/// Create a rack location
#[utoipa::path(
    post,
    path = "/api/v1/locations",
    summary = "Create location",
    tag = "Locations",
    request_body = CreateLocation,
    responses(
        (status = 201, description = "Location created successfully", body = ApiResponse<location::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Rack already exists", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn create_location(
    State(state): State<AppState>,
    Json(request): Json<CreateLocation>,
) -> Result<(StatusCode, Json<ApiResponse<location::Model>>), ServiceError> {
    let location = state.services.locations.create_location(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(location))))
}

/// Create several rack locations at once. Racks that already exist are
/// left alone; the response carries every row the request named.
#[utoipa::path(
    post,
    path = "/api/v1/locations/bulk",
    summary = "Bulk create locations",
    tag = "Locations",
    request_body = BulkCreateLocations,
    responses(
        (status = 201, description = "Rows for every requested rack, newly created or pre-existing", body = ApiResponse<Vec<location::Model>>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn bulk_create_locations(
    State(state): State<AppState>,
    Json(request): Json<BulkCreateLocations>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<location::Model>>>), ServiceError> {
    let created = state
        .services
        .locations
        .bulk_create_locations(request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}
