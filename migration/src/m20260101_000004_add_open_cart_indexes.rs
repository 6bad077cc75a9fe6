use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Partial unique indexes backing the cart invariants:
/// - one open (ordered = false) order per user
/// - one open line per (user, item)
///
/// Written as raw SQL because both Postgres and SQLite accept the same
/// `CREATE UNIQUE INDEX ... WHERE` form.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_orders_one_open_per_user \
             ON orders (user_id) WHERE ordered = false",
        )
        .await?;
        db.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_order_items_one_open_line \
             ON order_items (user_id, item_id) WHERE ordered = false",
        )
        .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP INDEX IF EXISTS idx_order_items_one_open_line")
            .await?;
        db.execute_unprepared("DROP INDEX IF EXISTS idx_orders_one_open_per_user")
            .await?;
        Ok(())
    }
}
