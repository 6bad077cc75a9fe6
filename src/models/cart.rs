use crate::entities::{item_entity, order_entity, order_item_entity};
use crate::error::{AppError, AppResult};
use crate::utils::format_cents;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::catalog::{API_PREFIX, ItemLinks, product_url};

pub fn order_summary_url() -> String {
    format!("{API_PREFIX}/order-summary/")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct OrderLine {
    pub order_item_id: i64,
    pub item_id: i64,
    pub title: String,
    pub slug: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub unit_discount_price: Option<i64>,
    /// list price × quantity
    pub total_item_price: i64,
    /// discount price × quantity, when discounted
    pub total_discount_item_price: Option<i64>,
    pub amount_saved: i64,
    pub final_price: i64,
    pub links: ItemLinks,
}

impl OrderLine {
    pub fn new(line: &order_item_entity::Model, item: &item_entity::Model) -> AppResult<Self> {
        let quantity = i64::from(line.quantity);
        let total_item_price = item.price.checked_mul(quantity).ok_or_else(|| overflow(item))?;
        let total_discount_item_price = match item.discount_price {
            Some(discount) => Some(discount.checked_mul(quantity).ok_or_else(|| overflow(item))?),
            None => None,
        };
        let final_price = total_discount_item_price.unwrap_or(total_item_price);
        Ok(Self {
            order_item_id: line.id,
            item_id: item.id,
            title: item.title.clone(),
            slug: item.slug.clone(),
            quantity: line.quantity,
            unit_price: item.price,
            unit_discount_price: item.discount_price,
            total_item_price,
            total_discount_item_price,
            amount_saved: total_item_price - final_price,
            final_price,
            links: ItemLinks::for_slug(&item.slug),
        })
    }
}

fn overflow(item: &item_entity::Model) -> AppError {
    AppError::ValidationError(format!("Line total for '{}' is out of range", item.slug))
}

/// Sum of each line's final price, in minor units.
pub fn order_total(lines: &[OrderLine]) -> AppResult<i64> {
    lines
        .iter()
        .try_fold(0i64, |acc, l| acc.checked_add(l.final_price))
        .ok_or_else(|| AppError::ValidationError("Order total is out of range".to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderSummary {
    pub order_id: i64,
    pub start_date: DateTime<Utc>,
    pub ordered: bool,
    pub ordered_date: Option<DateTime<Utc>>,
    pub billing_address_id: Option<i64>,
    pub lines: Vec<OrderLine>,
    pub item_count: i64,
    /// cents
    pub total: i64,
    pub total_display: String,
}

impl OrderSummary {
    pub fn new(order: &order_entity::Model, lines: Vec<OrderLine>) -> AppResult<Self> {
        let total = order_total(&lines)?;
        Ok(Self {
            order_id: order.id,
            start_date: order.start_date,
            ordered: order.ordered,
            ordered_date: order.ordered_date,
            billing_address_id: order.billing_address_id,
            item_count: lines.iter().map(|l| i64::from(l.quantity)).sum(),
            total,
            total_display: format_cents(total),
            lines,
        })
    }
}

/// Result of a cart mutation. The last three are reported to the user, not raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CartOutcome {
    Added,
    QuantityUpdated,
    Removed,
    NoActiveOrder,
    NotInCart,
    PaymentInProgress,
}

impl CartOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            CartOutcome::Added | CartOutcome::QuantityUpdated | CartOutcome::Removed
        )
    }

    pub fn message(&self) -> &'static str {
        match self {
            CartOutcome::Added => "This item was added to your cart.",
            CartOutcome::QuantityUpdated => "This item quantity was updated.",
            CartOutcome::Removed => "This item was removed from your cart.",
            CartOutcome::NoActiveOrder => NO_ACTIVE_ORDER_MESSAGE,
            CartOutcome::NotInCart => "This item was not in your cart.",
            CartOutcome::PaymentInProgress => PAYMENT_IN_PROGRESS_MESSAGE,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CartOutcome::Added => "ADDED",
            CartOutcome::QuantityUpdated => "QUANTITY_UPDATED",
            CartOutcome::Removed => "REMOVED",
            CartOutcome::NoActiveOrder => NO_ACTIVE_ORDER_CODE,
            CartOutcome::NotInCart => "NOT_IN_CART",
            CartOutcome::PaymentInProgress => PAYMENT_IN_PROGRESS_CODE,
        }
    }
}

pub const NO_ACTIVE_ORDER_MESSAGE: &str = "You do not have an active order.";
pub const NO_ACTIVE_ORDER_CODE: &str = "NO_ACTIVE_ORDER";
pub const PAYMENT_IN_PROGRESS_MESSAGE: &str =
    "Your order is being paid for, so the cart cannot change right now.";
pub const PAYMENT_IN_PROGRESS_CODE: &str = "PAYMENT_IN_PROGRESS";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartUpdate {
    pub outcome: CartOutcome,
    /// Order summary on success, product page otherwise
    pub next: String,
    pub cart: Option<OrderSummary>,
}

impl CartUpdate {
    pub fn new(outcome: CartOutcome, slug: &str, cart: Option<OrderSummary>) -> Self {
        let next = if outcome.is_success() {
            order_summary_url()
        } else {
            product_url(slug)
        };
        Self { outcome, next, cart }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Label;

    fn item(id: i64, price: i64, discount_price: Option<i64>) -> item_entity::Model {
        item_entity::Model {
            id,
            title: format!("Item {id}"),
            image: None,
            price,
            discount_price,
            category_id: 1,
            label: Label::Primary,
            description: String::new(),
            slug: format!("item-{id}"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(id: i64, item_id: i64, quantity: i32) -> order_item_entity::Model {
        order_item_entity::Model {
            id,
            user_id: 1,
            item_id,
            quantity,
            ordered: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_line_without_discount() {
        let l = OrderLine::new(&line(1, 1, 3), &item(1, 1000, None)).unwrap();
        assert_eq!(l.total_item_price, 3000);
        assert_eq!(l.total_discount_item_price, None);
        assert_eq!(l.amount_saved, 0);
        assert_eq!(l.final_price, 3000);
    }

    #[test]
    fn test_line_with_discount() {
        let l = OrderLine::new(&line(1, 2, 2), &item(2, 1000, Some(750))).unwrap();
        assert_eq!(l.total_item_price, 2000);
        assert_eq!(l.total_discount_item_price, Some(1500));
        assert_eq!(l.amount_saved, 500);
        assert_eq!(l.final_price, 1500);
    }

    #[test]
    fn test_order_total_uses_final_prices() {
        let lines = vec![
            OrderLine::new(&line(1, 1, 3), &item(1, 1000, None)).unwrap(),
            OrderLine::new(&line(2, 2, 2), &item(2, 1000, Some(750))).unwrap(),
        ];
        assert_eq!(order_total(&lines).unwrap(), 4500);

        let order = order_entity::Model {
            id: 9,
            user_id: 1,
            start_date: Utc::now(),
            ordered_date: None,
            ordered: false,
            billing_address_id: None,
            payment_id: None,
            capture_started_at: None,
        };
        let summary = OrderSummary::new(&order, lines).unwrap();
        assert_eq!(summary.total, 4500);
        assert_eq!(summary.total_display, "45.00");
        assert_eq!(summary.item_count, 5);
    }

    #[test]
    fn test_oversized_line_is_rejected() {
        let huge = i64::MAX / 2 + 1;
        assert!(OrderLine::new(&line(1, 1, 1), &item(1, huge, None)).is_ok());
        let err = OrderLine::new(&line(1, 1, 2), &item(1, huge, None)).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        let err = OrderLine::new(&line(1, 1, 3), &item(1, huge + 10, Some(huge))).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn test_order_total_overflow_is_rejected() {
        let huge = i64::MAX / 2 + 1;
        let lines = vec![
            OrderLine::new(&line(1, 1, 1), &item(1, huge, None)).unwrap(),
            OrderLine::new(&line(2, 2, 1), &item(2, huge, None)).unwrap(),
        ];
        assert!(matches!(order_total(&lines), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_cart_update_next_step() {
        let ok = CartUpdate::new(CartOutcome::Added, "shirt", None);
        assert_eq!(ok.next, "/api/v1/order-summary/");
        let missing = CartUpdate::new(CartOutcome::NotInCart, "shirt", None);
        assert_eq!(missing.next, "/api/v1/product/shirt/");
        assert!(!CartOutcome::NoActiveOrder.is_success());
    }
}
