use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create orders table
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Orders::Id)
                            .integer()
                            .primary_key()
                            .auto_increment()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::InvoiceId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Orders::PartnerId).integer().not_null())
                    .col(
                        ColumnDef::new(Orders::Status)
                            .string()
                            .not_null()
                            .default("open"),
                    )
                    .col(ColumnDef::new(Orders::Qty).integer().not_null().default(0))
                    .col(ColumnDef::new(Orders::CloseDate).timestamp().null())
                    .col(ColumnDef::new(Orders::CaseId).string().null())
                    .col(ColumnDef::new(Orders::CallDate).timestamp().null())
                    .col(ColumnDef::new(Orders::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Orders::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        // Create order_parts table: the single part line an order draws down
        manager
            .create_table(
                Table::create()
                    .table(OrderParts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderParts::Id)
                            .integer()
                            .primary_key()
                            .auto_increment()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderParts::OrderId).integer().not_null())
                    .col(ColumnDef::new(OrderParts::InventoryId).integer().not_null())
                    .col(ColumnDef::new(OrderParts::PartId).integer().not_null())
                    .col(ColumnDef::new(OrderParts::Qty).integer().not_null())
                    .col(ColumnDef::new(OrderParts::Description).text().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderParts::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Orders {
    Table,
    Id,
    InvoiceId,
    PartnerId,
    Status,
    Qty,
    CloseDate,
    CaseId,
    CallDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum OrderParts {
    Table,
    Id,
    OrderId,
    InventoryId,
    PartId,
    Qty,
    Description,
}
