pub use sea_orm_migration::prelude::*;

mod m20260101_000001_create_users;
mod m20260101_000002_create_catalog;
mod m20260101_000003_create_orders;
mod m20260101_000004_add_open_cart_indexes;
mod m20260101_000005_add_order_capture_claim;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_users::Migration),
            Box::new(m20260101_000002_create_catalog::Migration),
            Box::new(m20260101_000003_create_orders::Migration),
            Box::new(m20260101_000004_add_open_cart_indexes::Migration),
            Box::new(m20260101_000005_add_order_capture_claim::Migration),
        ]
    }
}
