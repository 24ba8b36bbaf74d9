use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Scraps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Scraps::Id)
                            .integer()
                            .primary_key()
                            .auto_increment()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Scraps::PartId).integer().not_null())
                    .col(ColumnDef::new(Scraps::Qty).integer().not_null())
                    .col(ColumnDef::new(Scraps::Remarks).text().null())
                    .col(ColumnDef::new(Scraps::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Scraps::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Scraps {
    Table,
    Id,
    PartId,
    Qty,
    Remarks,
    CreatedAt,
}
