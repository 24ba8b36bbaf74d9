use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create inventories table: per (location, part, poll) stock
        manager
            .create_table(
                Table::create()
                    .table(Inventories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Inventories::Id)
                            .integer()
                            .primary_key()
                            .auto_increment()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Inventories::PartId).integer().not_null())
                    .col(ColumnDef::new(Inventories::LocationId).integer().not_null())
                    .col(ColumnDef::new(Inventories::Poll).string().not_null())
                    .col(
                        ColumnDef::new(Inventories::Qty)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Inventories::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Inventories::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        // Create inventory_logs table: append-only receipt audit trail
        manager
            .create_table(
                Table::create()
                    .table(InventoryLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryLogs::Id)
                            .integer()
                            .primary_key()
                            .auto_increment()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryLogs::InventoryId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InventoryLogs::AddedQty).integer().not_null())
                    .col(ColumnDef::new(InventoryLogs::EventNo).string().null())
                    .col(ColumnDef::new(InventoryLogs::Remarks).text().null())
                    .col(
                        ColumnDef::new(InventoryLogs::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InventoryLogs::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Inventories::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Inventories {
    Table,
    Id,
    PartId,
    LocationId,
    Poll,
    Qty,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum InventoryLogs {
    Table,
    Id,
    InventoryId,
    AddedQty,
    EventNo,
    Remarks,
    CreatedAt,
}
