//! Partstock API Library
//!
//! This crate provides the core functionality for the Partstock API
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod logging;
pub mod openapi;
pub mod services;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub services: handlers::AppServices,
}

impl AppState {
    /// Resolves the page and page size for a list request.
    ///
    /// Pages are 1-based. A missing page size falls back to the configured
    /// default and is capped at the configured maximum.
    pub fn page_window(&self, page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
        let page = page.unwrap_or(1).max(1);
        let limit = limit
            .unwrap_or(u64::from(self.config.api_default_page_size))
            .clamp(1, u64::from(self.config.api_max_page_size));
        (page, limit)
    }
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
}

// Common response wrappers
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
        }
    }

    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Validation failed".to_string()),
            errors: Some(errors),
        }
    }
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

// API routes, mounted under /api/v1
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        // Parts catalog
        .route(
            "/parts",
            get(handlers::parts::list_parts).post(handlers::parts::create_part),
        )
        .route(
            "/parts/:id",
            get(handlers::parts::get_part)
                .put(handlers::parts::update_part)
                .delete(handlers::parts::delete_part),
        )
        // Rack locations
        .route(
            "/locations",
            get(handlers::locations::list_locations).post(handlers::locations::create_location),
        )
        .route(
            "/locations/bulk",
            post(handlers::locations::bulk_create_locations),
        )
        // Partners
        .route(
            "/partners",
            get(handlers::partners::list_partners).post(handlers::partners::create_partner),
        )
        .route("/partners/:id", get(handlers::partners::get_partner))
        // Inventory and receipt logs
        .route("/inventory/receive", post(handlers::inventory::receive_stock))
        .route(
            "/inventory/receive/bulk",
            post(handlers::inventory::receive_stock_bulk),
        )
        .route("/inventory", get(handlers::inventory::list_inventory))
        .route(
            "/inventory/:id",
            get(handlers::inventory::get_inventory).delete(handlers::inventory::delete_inventory),
        )
        .route(
            "/inventory/:id/quantity",
            put(handlers::inventory::set_inventory_quantity),
        )
        .route(
            "/inventory/logs/:log_id",
            put(handlers::inventory::update_inventory_log)
                .delete(handlers::inventory::delete_inventory_log),
        )
        // Orders
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route(
            "/orders/:id",
            get(handlers::orders::get_order).delete(handlers::orders::delete_order),
        )
        .route("/orders/:id/status", put(handlers::orders::change_order_status))
        .route("/orders/:id/part", put(handlers::orders::edit_order_part))
        // Customer requests
        .route(
            "/requests",
            get(handlers::customer_requests::list_requests)
                .post(handlers::customer_requests::submit_request),
        )
        .route("/requests/:id", get(handlers::customer_requests::get_request))
        .route(
            "/requests/:id/approve",
            post(handlers::customer_requests::approve_request),
        )
        .route(
            "/requests/:id/reject",
            post(handlers::customer_requests::reject_request),
        )
        // Scrap write-offs
        .route(
            "/scrap",
            get(handlers::scrap::list_scraps).post(handlers::scrap::record_scrap),
        )
}

async fn api_status(State(state): State<AppState>) -> ApiResult<Value> {
    let status_data = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "partstock-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": state.config.environment,
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(State(state): State<AppState>) -> ApiResult<Value> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}
