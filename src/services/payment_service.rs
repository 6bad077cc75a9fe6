use crate::entities::{
    order_entity as orders, order_item_entity as order_items, payment_entity as payments,
};
use crate::error::{AppError, AppResult};
use crate::external::{Charge, ChargeError, ChargeRequest, PaymentGateway};
use crate::models::{
    CaptureOutcome, OrderLine, PaymentOption, PaymentPage, PaymentResponse, order_total,
};
use crate::services::cart_service::capture_unclaimed;
use crate::services::{find_open_order, load_order_lines, open_order_summary};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct PaymentService {
    pool: DatabaseConnection,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl PaymentService {
    pub fn new(pool: DatabaseConnection, gateway: Arc<dyn PaymentGateway>, currency: String) -> Self {
        Self {
            pool,
            gateway,
            currency,
        }
    }

    pub async fn payment_page(&self, user_id: i64) -> AppResult<Option<PaymentPage>> {
        let summary = open_order_summary(&self.pool, user_id).await?;
        Ok(summary.map(|order| PaymentPage {
            amount: order.total,
            currency: self.currency.clone(),
            order,
        }))
    }

    /// Charge the open order's total and seal the order on success.
    ///
    /// Nothing is written when the gateway refuses the charge. While the
    /// charge is in flight the order is claimed: cart edits and a second
    /// capture for the same order are turned away.
    pub async fn capture(
        &self,
        user_id: i64,
        option: PaymentOption,
        source_token: &str,
    ) -> AppResult<CaptureOutcome> {
        // only card payments have a gateway behind them
        if option != PaymentOption::Stripe {
            return Err(AppError::ValidationError(format!(
                "{} payments are not supported",
                option.label()
            )));
        }
        let source_token = source_token.trim();
        if source_token.is_empty() {
            return Err(AppError::ValidationError(
                "A card token is required".to_string(),
            ));
        }

        let Some(order) = find_open_order(&self.pool, user_id).await? else {
            return Ok(CaptureOutcome::NoActiveOrder);
        };

        let Some(claimed_at) = self.claim(order.id).await? else {
            log::warn!(
                "Capture for order {} of user {user_id} refused, another one is in flight",
                order.id
            );
            return Ok(CaptureOutcome::PaymentInProgress);
        };

        let result = self
            .charge_claimed(user_id, &order, source_token, claimed_at)
            .await;

        // sealing clears the claim itself
        if !matches!(result, Ok(CaptureOutcome::Captured(_))) {
            self.release(order.id).await;
        }
        result
    }

    async fn charge_claimed(
        &self,
        user_id: i64,
        order: &orders::Model,
        source_token: &str,
        claimed_at: DateTime<Utc>,
    ) -> AppResult<CaptureOutcome> {
        // lines are read after the claim, so they are what gets sealed
        let lines = load_order_lines(&self.pool, order.id).await?;
        if lines.is_empty() {
            return Ok(CaptureOutcome::EmptyCart);
        }
        if order.billing_address_id.is_none() {
            return Ok(CaptureOutcome::MissingBillingAddress);
        }

        let amount = order_total(&lines)?;
        log::info!(
            "Charging {amount} {} for order {} of user {user_id}",
            self.currency,
            order.id
        );

        let charge = self
            .gateway
            .charge(ChargeRequest {
                amount,
                currency: self.currency.clone(),
                source: source_token.to_string(),
                description: Some(format!("Order {}", order.id)),
                idempotency_key: idempotency_key(order.id, claimed_at),
            })
            .await
            .inspect_err(|e| {
                log::warn!("Charge for order {} declined: {e}", order.id);
            })?;

        if charge.amount != amount {
            log::warn!(
                "Gateway charged {} for order {} totalling {amount}",
                charge.amount,
                order.id
            );
        }

        match self.seal_order(user_id, order, &lines, amount, &charge).await {
            Ok(payment) => {
                log::info!(
                    "Order {} sealed with payment {} (charge {})",
                    order.id,
                    payment.id,
                    payment.stripe_charge_id
                );
                Ok(CaptureOutcome::Captured(PaymentResponse::new(
                    order.id, payment,
                )))
            }
            Err(e) => {
                // money moved but nothing was recorded; the charge id is what support needs
                log::error!(
                    "Charge {} of {amount} succeeded but order {} could not be sealed: {e}",
                    charge.id,
                    order.id
                );
                Err(AppError::PaymentError(ChargeError::Unexpected(format!(
                    "charge {} not recorded: {e}",
                    charge.id
                ))))
            }
        }
    }

    /// Returns the claim time, or `None` when a capture already holds the order.
    async fn claim(&self, order_id: i64) -> Result<Option<DateTime<Utc>>, DbErr> {
        let now = Utc::now();
        let claimed = orders::Entity::update_many()
            .col_expr(orders::Column::CaptureStartedAt, Expr::value(now))
            .filter(orders::Column::Id.eq(order_id))
            .filter(orders::Column::Ordered.eq(false))
            .filter(capture_unclaimed(now))
            .exec(&self.pool)
            .await?;
        Ok((claimed.rows_affected == 1).then_some(now))
    }

    async fn release(&self, order_id: i64) {
        let released = orders::Entity::update_many()
            .col_expr(
                orders::Column::CaptureStartedAt,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .filter(orders::Column::Id.eq(order_id))
            .filter(orders::Column::Ordered.eq(false))
            .exec(&self.pool)
            .await;
        // an unreleased claim lapses on its own
        if let Err(e) = released {
            log::error!("Failed to release payment claim on order {order_id}: {e}");
        }
    }

    async fn seal_order(
        &self,
        user_id: i64,
        order: &orders::Model,
        lines: &[OrderLine],
        amount: i64,
        charge: &Charge,
    ) -> AppResult<payments::Model> {
        let now = Utc::now();
        let txn = self.pool.begin().await?;

        // refuse to seal anything other than what was charged
        let current = load_order_lines(&txn, order.id).await?;
        if current.as_slice() != lines || order_total(&current)? != amount {
            return Err(AppError::InternalError(format!(
                "order {} changed while its charge was in flight",
                order.id
            )));
        }

        let payment = payments::ActiveModel {
            stripe_charge_id: Set(charge.id.clone()),
            user_id: Set(Some(user_id)),
            amount: Set(amount),
            timestamp: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let sealed = orders::Entity::update_many()
            .col_expr(orders::Column::Ordered, Expr::value(true))
            .col_expr(orders::Column::OrderedDate, Expr::value(now))
            .col_expr(orders::Column::PaymentId, Expr::value(payment.id))
            .col_expr(
                orders::Column::CaptureStartedAt,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .filter(orders::Column::Id.eq(order.id))
            .filter(orders::Column::Ordered.eq(false))
            .exec(&txn)
            .await?;
        if sealed.rows_affected != 1 {
            return Err(AppError::InternalError(format!(
                "order {} was sealed concurrently",
                order.id
            )));
        }

        // the lines become the receipt
        let line_ids: Vec<i64> = lines.iter().map(|l| l.order_item_id).collect();
        order_items::Entity::update_many()
            .col_expr(order_items::Column::Ordered, Expr::value(true))
            .col_expr(order_items::Column::UpdatedAt, Expr::value(now))
            .filter(order_items::Column::Id.is_in(line_ids))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(payment)
    }
}

/// One key per claim: a resent request reuses the charge, a retry after a
/// decline gets a fresh one.
fn idempotency_key(order_id: i64, claimed_at: DateTime<Utc>) -> String {
    format!("order-{order_id}-{}", claimed_at.timestamp_micros())
}
