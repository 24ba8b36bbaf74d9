use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create parts table with aggregate stock counters
        manager
            .create_table(
                Table::create()
                    .table(Parts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Parts::Id)
                            .integer()
                            .primary_key()
                            .auto_increment()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Parts::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Parts::AlternateName).string().null())
                    .col(ColumnDef::new(Parts::Description).text().null())
                    .col(
                        ColumnDef::new(Parts::TotalQty)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Parts::AvailableQty)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Parts::LoanQty)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Parts::Sell).integer().not_null().default(0))
                    .col(ColumnDef::new(Parts::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Parts::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Parts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Parts {
    Table,
    Id,
    Name,
    AlternateName,
    Description,
    TotalQty,
    AvailableQty,
    LoanQty,
    Sell,
    CreatedAt,
    UpdatedAt,
}
