use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One stock row per (location, part, poll) lot
        manager
            .create_index(
                Index::create()
                    .name("idx_inventories_location_part_poll")
                    .table(Inventories::Table)
                    .col(Inventories::LocationId)
                    .col(Inventories::PartId)
                    .col(Inventories::Poll)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Join indexes for the reconciliation paths
        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_logs_inventory_id")
                    .table(InventoryLogs::Table)
                    .col(InventoryLogs::InventoryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_parts_order_id")
                    .table(OrderParts::Table)
                    .col(OrderParts::OrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_parts_inventory_id")
                    .table(OrderParts::Table)
                    .col(OrderParts::InventoryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_parts_part_id")
                    .table(OrderParts::Table)
                    .col(OrderParts::PartId)
                    .to_owned(),
            )
            .await?;

        // Order listings filtered by partner and status
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_partner_status")
                    .table(Orders::Table)
                    .col(Orders::PartnerId)
                    .col(Orders::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_requested_parts_request_id")
                    .table(CustomerRequestedParts::Table)
                    .col(CustomerRequestedParts::CustomerRequestId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_requested_parts_request_id")
                    .table(CustomerRequestedParts::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_orders_partner_status")
                    .table(Orders::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_order_parts_part_id")
                    .table(OrderParts::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_order_parts_inventory_id")
                    .table(OrderParts::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_order_parts_order_id")
                    .table(OrderParts::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_inventory_logs_inventory_id")
                    .table(InventoryLogs::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_inventories_location_part_poll")
                    .table(Inventories::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Inventories {
    Table,
    LocationId,
    PartId,
    Poll,
}

#[derive(DeriveIden)]
enum InventoryLogs {
    Table,
    InventoryId,
}

#[derive(DeriveIden)]
enum OrderParts {
    Table,
    OrderId,
    InventoryId,
    PartId,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    PartnerId,
    Status,
}

#[derive(DeriveIden)]
enum CustomerRequestedParts {
    Table,
    CustomerRequestId,
}
