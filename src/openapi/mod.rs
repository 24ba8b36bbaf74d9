use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Partstock API",
        description = r#"
# Partstock Quantity Ledger API

Backend for a rental-parts operation: receive stock into racked lots,
loan parts out on orders, take them back, and keep the per-part quantity
counters consistent through every mutation.

## Counters

Each part carries four counters. `total_qty = available_qty + loan_qty`
holds after every committed request; `sell` accumulates lifetime
loaned-out quantity and is only walked back when an order is edited or
deleted.

## Pagination

List endpoints accept `page` and `limit` query parameters. `limit` is
clamped to the configured maximum.

## Error Handling

Errors use a consistent envelope:

```json
{
  "success": false,
  "errorMessages": ["Part 7 not found"]
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Parts", description = "Part catalog and quantity counters"),
        (name = "Locations", description = "Rack locations"),
        (name = "Inventory", description = "Stock receipts, lots and receipt logs"),
        (name = "Orders", description = "Rental orders and their part lines"),
        (name = "Requests", description = "Customer requests and approvals"),
        (name = "Partners", description = "Partner registry"),
        (name = "Scrap", description = "Damaged-stock write-offs")
    ),
    paths(
        // Parts
        crate::handlers::parts::list_parts,
        crate::handlers::parts::create_part,
        crate::handlers::parts::get_part,
        crate::handlers::parts::update_part,
        crate::handlers::parts::delete_part,

        // Locations
        crate::handlers::locations::list_locations,
        crate::handlers::locations::create_location,
        crate::handlers::locations::bulk_create_locations,

        // Inventory
        crate::handlers::inventory::receive_stock,
        crate::handlers::inventory::receive_stock_bulk,
        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::get_inventory,
        crate::handlers::inventory::set_inventory_quantity,
        crate::handlers::inventory::delete_inventory,
        crate::handlers::inventory::update_inventory_log,
        crate::handlers::inventory::delete_inventory_log,

        // Orders
        crate::handlers::orders::list_orders,
        crate::handlers::orders::create_order,
        crate::handlers::orders::get_order,
        crate::handlers::orders::change_order_status,
        crate::handlers::orders::edit_order_part,
        crate::handlers::orders::delete_order,

        // Customer requests
        crate::handlers::customer_requests::list_requests,
        crate::handlers::customer_requests::submit_request,
        crate::handlers::customer_requests::get_request,
        crate::handlers::customer_requests::approve_request,
        crate::handlers::customer_requests::reject_request,

        // Partners
        crate::handlers::partners::list_partners,
        crate::handlers::partners::create_partner,
        crate::handlers::partners::get_partner,

        // Scrap
        crate::handlers::scrap::list_scraps,
        crate::handlers::scrap::record_scrap,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,
            crate::ListQuery,

            // Entity models
            crate::entities::part::Model,
            crate::entities::location::Model,
            crate::entities::partner::Model,
            crate::entities::inventory::Model,
            crate::entities::inventory_log::Model,
            crate::entities::order::Model,
            crate::entities::order::OrderStatus,
            crate::entities::order_part::Model,
            crate::entities::customer_request::Model,
            crate::entities::customer_request::RequestStatus,
            crate::entities::customer_requested_part::Model,
            crate::entities::scrap::Model,

            // Part types
            crate::services::parts::CreatePart,
            crate::services::parts::UpdatePart,
            crate::services::parts::PartDeleteSummary,

            // Location types
            crate::services::locations::CreateLocation,
            crate::services::locations::BulkCreateLocations,

            // Inventory types
            crate::services::inventory::ReceiveStock,
            crate::services::inventory::BulkReceiveItem,
            crate::services::inventory::BulkReceive,
            crate::services::inventory::SetQuantity,
            crate::services::inventory::UpdateLog,
            crate::services::inventory::StockReceipt,
            crate::services::inventory::BulkItemFailure,
            crate::services::inventory::BulkReceiveReport,
            crate::services::inventory::InventoryDetail,
            crate::services::inventory::InventoryUpdate,
            crate::services::inventory::LogCorrection,
            crate::config::BulkAtomicity,

            // Order types
            crate::services::orders::NewOrder,
            crate::services::orders::StatusChange,
            crate::services::orders::EditOrderPart,
            crate::services::orders::OrderDetail,
            crate::services::orders::OrderCreation,
            crate::services::orders::OrderDeletion,

            // Customer request types
            crate::services::customer_requests::NewRequest,
            crate::services::customer_requests::ApproveRequest,
            crate::services::customer_requests::RequestDetail,
            crate::services::customer_requests::ApprovedRequest,

            // Partner types
            crate::services::partners::CreatePartner,

            // Scrap types
            crate::services::scrap::NewScrap,
            crate::services::scrap::ScrapRecord,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_includes_core_paths() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).expect("serialize document");
        assert!(json.contains("Partstock"));
        assert!(json.contains("/api/v1/orders"));
        assert!(json.contains("/api/v1/inventory/receive"));
        assert!(json.contains("/api/v1/requests/{id}/approve"));
    }
}
