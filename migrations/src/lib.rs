pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_accounts_tables;
mod m20240101_000002_create_products_table;
mod m20240101_000003_create_cart_items_table;
mod m20240101_000004_create_promos_tables;
mod m20240101_000005_create_couriers_table;
mod m20240101_000006_create_orders_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_accounts_tables::Migration),
            Box::new(m20240101_000002_create_products_table::Migration),
            Box::new(m20240101_000003_create_cart_items_table::Migration),
            Box::new(m20240101_000004_create_promos_tables::Migration),
            Box::new(m20240101_000005_create_couriers_table::Migration),
            Box::new(m20240101_000006_create_orders_tables::Migration),
        ]
    }
}
