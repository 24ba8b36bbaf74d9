use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use crate::entities::customer_request::{self, RequestStatus};
use crate::services::customer_requests::{
    ApproveRequest, ApprovedRequest, NewRequest, RequestDetail,
};
use crate::{errors::ServiceError, ApiResponse, AppState, PaginatedResponse};

#[derive(Debug, Deserialize)]
pub struct RequestListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<RequestStatus>,
}

/// List customer requests with an optional status filter
#[utoipa::path(
    get,
    path = "/api/v1/requests",
    summary = "List customer requests",
    tag = "Requests",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
        ("status" = Option<RequestStatus>, Query, description = "Filter by request status"),
    ),
    responses(
        (status = 200, description = "Requests retrieved successfully", body = ApiResponse<PaginatedResponse<customer_request::Model>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<customer_request::Model>>>, ServiceError> {
    let (page, limit) = state.page_window(query.page, query.limit);
    let (items, total) = state
        .services
        .customer_requests
        .list_requests(page, limit, query.status)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

/// Submit a customer request for a part
#[utoipa::path(
    post,
    path = "/api/v1/requests",
    summary = "Submit customer request",
    tag = "Requests",
    description = "Records a pending request. No stock moves until approval",
    request_body = NewRequest,
    responses(
        (status = 201, description = "Request submitted", body = ApiResponse<RequestDetail>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Partner or part not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn submit_request(
    State(state): State<AppState>,
    Json(request): Json<NewRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RequestDetail>>), ServiceError> {
    let detail = state
        .services
        .customer_requests
        .submit_request(request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(detail))))
}

/// Get a customer request with its part line
#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}",
    summary = "Get customer request",
    tag = "Requests",
    params(("id" = i32, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request retrieved successfully", body = ApiResponse<RequestDetail>),
        (status = 404, description = "Request not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<RequestDetail>>, ServiceError> {
    let detail = state.services.customer_requests.get_request(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// Approve a pending request, minting an order from a chosen lot
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/approve",
    summary = "Approve customer request",
    tag = "Requests",
    description = "Loans the requested quantity out of the chosen lot and issues an order linked back to the request",
    params(("id" = i32, Path, description = "Request id")),
    request_body = ApproveRequest,
    responses(
        (status = 200, description = "Request approved; order issued", body = ApiResponse<ApprovedRequest>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Request or part not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Request already approved or finalized", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock in the chosen lot", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn approve_request(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<ApproveRequest>,
) -> Result<Json<ApiResponse<ApprovedRequest>>, ServiceError> {
    let approved = state
        .services
        .customer_requests
        .approve_request(id, request)
        .await?;
    Ok(Json(ApiResponse::success(approved)))
}

/// Reject a pending request
#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/reject",
    summary = "Reject customer request",
    tag = "Requests",
    params(("id" = i32, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request rejected", body = ApiResponse<customer_request::Model>),
        (status = 404, description = "Request not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Request already finalized", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn reject_request(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<customer_request::Model>>, ServiceError> {
    let request = state.services.customer_requests.reject_request(id).await?;
    Ok(Json(ApiResponse::success(request)))
}
