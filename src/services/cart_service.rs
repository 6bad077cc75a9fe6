use crate::entities::{
    item_entity as items, order_entity as orders, order_item_entity as order_items,
    order_link_entity as order_links,
};
use crate::error::{AppError, AppResult};
use crate::models::{CartOutcome, CartUpdate, OrderLine, OrderSummary};
use crate::services::find_item_by_slug;
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use std::future::Future;

/// Attempts made by add-to-cart when a concurrent request wins the race
/// for the open order or the open line.
const MAX_ADD_ATTEMPTS: u32 = 3;

/// A capture claim older than this is treated as abandoned.
const CAPTURE_CLAIM_MINUTES: i64 = 10;

#[derive(Clone)]
pub struct CartService {
    pool: DatabaseConnection,
}

impl CartService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Add one unit of an item to the user's open order, creating the order
    /// and the line as needed.
    pub async fn add_to_cart(&self, user_id: i64, slug: &str) -> AppResult<CartUpdate> {
        let item = find_item_by_slug(&self.pool, slug).await?;

        // Losing the race for the open order or line means another request
        // just created it, so a fresh attempt will find it.
        let item_ref = &item;
        let outcome = retry_on_unique_violation(MAX_ADD_ATTEMPTS, move |attempt| {
            if attempt > 1 {
                log::warn!(
                    "Concurrent cart update for user {user_id}, item {} (attempt {attempt}), retrying",
                    item_ref.id
                );
            }
            self.try_add(user_id, item_ref)
        })
        .await
        .map_err(AppError::DatabaseError)?;

        log::info!("Cart of user {user_id}: {:?} item {}", outcome, item.slug);
        let cart = open_order_summary(&self.pool, user_id).await?;
        Ok(CartUpdate::new(outcome, &item.slug, cart))
    }

    /// Drop an item's line from the open order whatever its quantity.
    pub async fn remove_from_cart(&self, user_id: i64, slug: &str) -> AppResult<CartUpdate> {
        let item = find_item_by_slug(&self.pool, slug).await?;

        let txn = self.pool.begin().await?;
        let outcome = match locate_line(&txn, user_id, item.id).await? {
            LineLookup::NoActiveOrder => CartOutcome::NoActiveOrder,
            LineLookup::NotInCart => CartOutcome::NotInCart,
            LineLookup::Found { order, .. } if !hold_order(&txn, order.id).await? => {
                CartOutcome::PaymentInProgress
            }
            LineLookup::Found { order, line } => {
                delete_line(&txn, order.id, line.id).await?;
                CartOutcome::Removed
            }
        };
        txn.commit().await?;

        let cart = open_order_summary(&self.pool, user_id).await?;
        Ok(CartUpdate::new(outcome, &item.slug, cart))
    }

    /// Take one unit off an item's line; the last unit removes the line.
    pub async fn remove_single_from_cart(
        &self,
        user_id: i64,
        slug: &str,
    ) -> AppResult<CartUpdate> {
        let item = find_item_by_slug(&self.pool, slug).await?;

        let txn = self.pool.begin().await?;
        let outcome = match locate_line(&txn, user_id, item.id).await? {
            LineLookup::NoActiveOrder => CartOutcome::NoActiveOrder,
            LineLookup::NotInCart => CartOutcome::NotInCart,
            LineLookup::Found { order, .. } if !hold_order(&txn, order.id).await? => {
                CartOutcome::PaymentInProgress
            }
            LineLookup::Found { order, line } => {
                // guarded so two concurrent decrements cannot take the line below one
                let decremented = if line.quantity > 1 {
                    order_items::Entity::update_many()
                        .col_expr(
                            order_items::Column::Quantity,
                            Expr::col(order_items::Column::Quantity).sub(1),
                        )
                        .col_expr(order_items::Column::UpdatedAt, Expr::value(Utc::now()))
                        .filter(order_items::Column::Id.eq(line.id))
                        .filter(order_items::Column::Quantity.gt(1))
                        .exec(&txn)
                        .await?
                        .rows_affected
                        == 1
                } else {
                    false
                };

                if decremented {
                    CartOutcome::QuantityUpdated
                } else {
                    delete_line(&txn, order.id, line.id).await?;
                    CartOutcome::Removed
                }
            }
        };
        txn.commit().await?;

        let cart = open_order_summary(&self.pool, user_id).await?;
        Ok(CartUpdate::new(outcome, &item.slug, cart))
    }

    pub async fn order_summary(&self, user_id: i64) -> AppResult<Option<OrderSummary>> {
        open_order_summary(&self.pool, user_id).await
    }

    async fn try_add(&self, user_id: i64, item: &items::Model) -> Result<CartOutcome, DbErr> {
        let txn = self.pool.begin().await?;
        let open_order = find_open_order(&txn, user_id).await?;
        let outcome = add_in_txn(&txn, user_id, item, open_order).await?;
        txn.commit().await?;
        Ok(outcome)
    }
}

/// Add one unit given the open order seen by the caller, if any. A stale
/// `None` surfaces as a unique violation on the order insert.
async fn add_in_txn<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
    item: &items::Model,
    open_order: Option<orders::Model>,
) -> Result<CartOutcome, DbErr> {
    let order = match open_order {
        Some(order) => order,
        None => {
            orders::ActiveModel {
                user_id: Set(user_id),
                start_date: Set(Utc::now()),
                ordered_date: Set(None),
                ordered: Set(false),
                billing_address_id: Set(None),
                payment_id: Set(None),
                capture_started_at: Set(None),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };

    if !hold_order(db, order.id).await? {
        return Ok(CartOutcome::PaymentInProgress);
    }

    let outcome = match find_open_line(db, user_id, item.id).await? {
        Some(line) => {
            if line_in_order(db, order.id, line.id).await? {
                order_items::Entity::update_many()
                    .col_expr(
                        order_items::Column::Quantity,
                        Expr::col(order_items::Column::Quantity).add(1),
                    )
                    .col_expr(order_items::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(order_items::Column::Id.eq(line.id))
                    .exec(db)
                    .await?;
                CartOutcome::QuantityUpdated
            } else {
                // open line left behind by an earlier order
                link_line(db, order.id, line.id).await?;
                CartOutcome::Added
            }
        }
        None => {
            let now = Utc::now();
            let line = order_items::ActiveModel {
                user_id: Set(user_id),
                item_id: Set(item.id),
                quantity: Set(1),
                ordered: Set(false),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?;
            link_line(db, order.id, line.id).await?;
            CartOutcome::Added
        }
    };
    Ok(outcome)
}

enum LineLookup {
    NoActiveOrder,
    NotInCart,
    Found {
        order: orders::Model,
        line: order_items::Model,
    },
}

async fn locate_line<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
    item_id: i64,
) -> Result<LineLookup, DbErr> {
    let Some(order) = find_open_order(db, user_id).await? else {
        return Ok(LineLookup::NoActiveOrder);
    };
    let Some(line) = find_open_line(db, user_id, item_id).await? else {
        return Ok(LineLookup::NotInCart);
    };
    if line_in_order(db, order.id, line.id).await? {
        Ok(LineLookup::Found { order, line })
    } else {
        Ok(LineLookup::NotInCart)
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

async fn retry_on_unique_violation<T, F, Fut>(max_attempts: u32, mut op: F) -> Result<T, DbErr>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op(attempt).await {
            Err(e) if is_unique_violation(&e) && attempt < max_attempts => continue,
            result => return result,
        }
    }
}

/// Orders no payment capture is holding right now.
pub(crate) fn capture_unclaimed(now: DateTime<Utc>) -> Condition {
    Condition::any()
        .add(orders::Column::CaptureStartedAt.is_null())
        .add(orders::Column::CaptureStartedAt.lt(now - Duration::minutes(CAPTURE_CLAIM_MINUTES)))
}

/// Touch the open order inside a cart transaction. Fails when a capture
/// holds the order; otherwise the row stays locked until commit, so a
/// capture claim waits for this edit.
async fn hold_order<C: ConnectionTrait>(db: &C, order_id: i64) -> Result<bool, DbErr> {
    let res = orders::Entity::update_many()
        .col_expr(
            orders::Column::CaptureStartedAt,
            Expr::value(Option::<DateTime<Utc>>::None),
        )
        .filter(orders::Column::Id.eq(order_id))
        .filter(orders::Column::Ordered.eq(false))
        .filter(capture_unclaimed(Utc::now()))
        .exec(db)
        .await?;
    Ok(res.rows_affected == 1)
}

pub async fn find_open_order<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
) -> Result<Option<orders::Model>, DbErr> {
    orders::Entity::find()
        .filter(orders::Column::UserId.eq(user_id))
        .filter(orders::Column::Ordered.eq(false))
        .one(db)
        .await
}

async fn find_open_line<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
    item_id: i64,
) -> Result<Option<order_items::Model>, DbErr> {
    order_items::Entity::find()
        .filter(order_items::Column::UserId.eq(user_id))
        .filter(order_items::Column::ItemId.eq(item_id))
        .filter(order_items::Column::Ordered.eq(false))
        .one(db)
        .await
}

async fn line_in_order<C: ConnectionTrait>(
    db: &C,
    order_id: i64,
    line_id: i64,
) -> Result<bool, DbErr> {
    Ok(order_links::Entity::find_by_id((order_id, line_id))
        .one(db)
        .await?
        .is_some())
}

async fn link_line<C: ConnectionTrait>(db: &C, order_id: i64, line_id: i64) -> Result<(), DbErr> {
    order_links::Entity::insert(order_links::ActiveModel {
        order_id: Set(order_id),
        order_item_id: Set(line_id),
    })
    .exec(db)
    .await?;
    Ok(())
}

/// Unlink a line from the order and delete it, so a later add starts from one unit.
async fn delete_line<C: ConnectionTrait>(db: &C, order_id: i64, line_id: i64) -> Result<(), DbErr> {
    order_links::Entity::delete_many()
        .filter(order_links::Column::OrderId.eq(order_id))
        .filter(order_links::Column::OrderItemId.eq(line_id))
        .exec(db)
        .await?;
    order_items::Entity::delete_by_id(line_id).exec(db).await?;
    Ok(())
}

/// Lines of an order joined with their catalog items.
pub async fn load_order_lines<C: ConnectionTrait>(
    db: &C,
    order_id: i64,
) -> AppResult<Vec<OrderLine>> {
    let rows = order_items::Entity::find()
        .filter(
            order_items::Column::Id.in_subquery(
                Query::select()
                    .column(order_links::Column::OrderItemId)
                    .from(order_links::Entity)
                    .and_where(order_links::Column::OrderId.eq(order_id))
                    .to_owned(),
            ),
        )
        .find_also_related(items::Entity)
        .order_by_asc(order_items::Column::Id)
        .all(db)
        .await?;

    rows.into_iter()
        .filter_map(|(line, item)| item.map(|item| OrderLine::new(&line, &item)))
        .collect()
}

pub async fn open_order_summary<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
) -> AppResult<Option<OrderSummary>> {
    let Some(order) = find_open_order(db, user_id).await? else {
        return Ok(None);
    };
    let lines = load_order_lines(db, order.id).await?;
    OrderSummary::new(&order, lines).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Label, category_entity as categories, user_entity as users};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database, PaginatorTrait};
    use std::sync::atomic::{AtomicU32, Ordering};

    async fn setup() -> (DatabaseConnection, i64, items::Model) {
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let now = Utc::now();
        let user = users::ActiveModel {
            username: Set("racer".to_string()),
            password_hash: Set("x".to_string()),
            is_staff: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        let category = categories::ActiveModel {
            title: Set("Shirts".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        let item = items::ActiveModel {
            title: Set("Shirt".to_string()),
            image: Set(None),
            price: Set(1000),
            discount_price: Set(None),
            category_id: Set(category.id),
            label: Set(Label::Primary),
            description: Set(String::new()),
            slug: Set("shirt".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        (db, user.id, item)
    }

    #[tokio::test]
    async fn test_add_retries_after_losing_open_order_race() {
        let (db, user_id, item) = setup().await;
        let service = CartService::new(db.clone());
        let (service, db_ref, item_ref) = (&service, &db, &item);
        let attempts = AtomicU32::new(0);
        let attempts_ref = &attempts;

        let outcome = retry_on_unique_violation(MAX_ADD_ATTEMPTS, move |attempt| async move {
            attempts_ref.fetch_add(1, Ordering::SeqCst);
            if attempt == 1 {
                // another request commits the open order first, ours still thinks there is none
                service.try_add(user_id, item_ref).await?;
                let txn = db_ref.begin().await?;
                let stale = add_in_txn(&txn, user_id, item_ref, None).await;
                assert!(stale.as_ref().is_err_and(is_unique_violation));
                stale
            } else {
                service.try_add(user_id, item_ref).await
            }
        })
        .await
        .unwrap();

        assert_eq!(outcome, CartOutcome::QuantityUpdated);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);

        let open_orders = orders::Entity::find()
            .filter(orders::Column::UserId.eq(user_id))
            .filter(orders::Column::Ordered.eq(false))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(open_orders, 1);
        let summary = open_order_summary(&db, user_id).await.unwrap().unwrap();
        assert_eq!(summary.lines.len(), 1);
        assert_eq!(summary.lines[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_add_gives_up_after_repeated_conflicts() {
        let (db, user_id, item) = setup().await;
        let service = CartService::new(db.clone());
        service.try_add(user_id, &item).await.unwrap();
        let (db_ref, item_ref) = (&db, &item);
        let attempts = AtomicU32::new(0);
        let attempts_ref = &attempts;

        let err = retry_on_unique_violation(MAX_ADD_ATTEMPTS, move |_| async move {
            attempts_ref.fetch_add(1, Ordering::SeqCst);
            let txn = db_ref.begin().await?;
            add_in_txn(&txn, user_id, item_ref, None).await
        })
        .await
        .unwrap_err();

        assert!(is_unique_violation(&err));
        assert_eq!(attempts.load(Ordering::SeqCst), MAX_ADD_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_cart_edits_wait_for_capture_claim() {
        let (db, user_id, item) = setup().await;
        let service = CartService::new(db.clone());
        service.try_add(user_id, &item).await.unwrap();
        let order_id = find_open_order(&db, user_id).await.unwrap().unwrap().id;

        let claim = |at: DateTime<Utc>| {
            let db = db.clone();
            async move {
                orders::Entity::update_many()
                    .col_expr(orders::Column::CaptureStartedAt, Expr::value(at))
                    .filter(orders::Column::Id.eq(order_id))
                    .exec(&db)
                    .await
                    .unwrap();
            }
        };

        claim(Utc::now()).await;
        let update = service.add_to_cart(user_id, "shirt").await.unwrap();
        assert_eq!(update.outcome, CartOutcome::PaymentInProgress);
        let update = service.remove_from_cart(user_id, "shirt").await.unwrap();
        assert_eq!(update.outcome, CartOutcome::PaymentInProgress);
        let update = service.remove_single_from_cart(user_id, "shirt").await.unwrap();
        assert_eq!(update.outcome, CartOutcome::PaymentInProgress);
        assert_eq!(update.cart.unwrap().lines[0].quantity, 1);

        // an abandoned claim no longer blocks the cart, and is cleared by the edit
        claim(Utc::now() - Duration::minutes(CAPTURE_CLAIM_MINUTES + 1)).await;
        let update = service.add_to_cart(user_id, "shirt").await.unwrap();
        assert_eq!(update.outcome, CartOutcome::QuantityUpdated);
        let order = find_open_order(&db, user_id).await.unwrap().unwrap();
        assert_eq!(order.capture_started_at, None);
    }
}
