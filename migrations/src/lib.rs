pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_parts_table;
mod m20250301_000002_create_locations_table;
mod m20250301_000003_create_partners_table;
mod m20250301_000004_create_inventory_tables;
mod m20250301_000005_create_order_tables;
mod m20250301_000006_create_request_tables;
mod m20250301_000007_create_scraps_table;
mod m20250610_000008_add_stock_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_parts_table::Migration),
            Box::new(m20250301_000002_create_locations_table::Migration),
            Box::new(m20250301_000003_create_partners_table::Migration),
            Box::new(m20250301_000004_create_inventory_tables::Migration),
            Box::new(m20250301_000005_create_order_tables::Migration),
            Box::new(m20250301_000006_create_request_tables::Migration),
            Box::new(m20250301_000007_create_scraps_table::Migration),
            Box::new(m20250610_000008_add_stock_indexes::Migration),
        ]
    }
}
