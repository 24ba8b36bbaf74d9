use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create customer_requests table
        manager
            .create_table(
                Table::create()
                    .table(CustomerRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustomerRequests::Id)
                            .integer()
                            .primary_key()
                            .auto_increment()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerRequests::PartnerId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerRequests::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(CustomerRequests::OrderId)
                            .integer()
                            .null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(CustomerRequests::CaseId).string().null())
                    .col(ColumnDef::new(CustomerRequests::CallDate).timestamp().null())
                    .col(
                        ColumnDef::new(CustomerRequests::ApprovalImage)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CustomerRequests::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerRequests::UpdatedAt)
                            .timestamp()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create customer_requested_parts table
        manager
            .create_table(
                Table::create()
                    .table(CustomerRequestedParts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustomerRequestedParts::Id)
                            .integer()
                            .primary_key()
                            .auto_increment()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerRequestedParts::CustomerRequestId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerRequestedParts::PartId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerRequestedParts::Qty)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerRequestedParts::Description)
                            .text()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(CustomerRequestedParts::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(CustomerRequests::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum CustomerRequests {
    Table,
    Id,
    PartnerId,
    Status,
    OrderId,
    CaseId,
    CallDate,
    ApprovalImage,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum CustomerRequestedParts {
    Table,
    Id,
    CustomerRequestId,
    PartId,
    Qty,
    Description,
}
