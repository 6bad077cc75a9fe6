use crate::entities::{billing_address_entity as billing_addresses, order_entity as orders};
use crate::error::AppResult;
use crate::models::{
    CheckoutForm, CheckoutOutcome, CheckoutPage, CheckoutResponse, PaymentOption,
    payment_choices,
};
use crate::services::{find_open_order, open_order_summary};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, IntoActiveModel, Set, TransactionTrait};

#[derive(Clone)]
pub struct CheckoutService {
    pool: DatabaseConnection,
}

impl CheckoutService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn checkout_page(&self, user_id: i64) -> AppResult<Option<CheckoutPage>> {
        let summary = open_order_summary(&self.pool, user_id).await?;
        Ok(summary.map(|order| CheckoutPage {
            order,
            payment_options: payment_choices(),
        }))
    }

    /// Record the billing address on the open order and pick the payment step.
    pub async fn submit(&self, user_id: i64, form: CheckoutForm) -> AppResult<CheckoutOutcome> {
        let Some(order) = find_open_order(&self.pool, user_id).await? else {
            return Ok(CheckoutOutcome::NoActiveOrder);
        };

        // a bad address is a hard error, a bad option only a soft one
        let cleaned = form.clean()?;
        let Some(payment_option) = PaymentOption::from_code(&form.payment_option) else {
            log::warn!(
                "User {user_id} picked unknown payment option '{}'",
                form.payment_option
            );
            return Ok(CheckoutOutcome::InvalidPaymentOption);
        };

        // address and order link are written together
        let txn = self.pool.begin().await?;

        let address = billing_addresses::ActiveModel {
            user_id: Set(user_id),
            street_address: Set(cleaned.street_address),
            apartment_address: Set(cleaned.apartment_address),
            country: Set(cleaned.country),
            zip: Set(cleaned.zip),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let order_id = order.id;
        let mut am: orders::ActiveModel = order.into_active_model();
        am.billing_address_id = Set(Some(address.id));
        am.update(&txn).await?;

        txn.commit().await?;

        log::info!(
            "Billing address {} attached to order {order_id}, paying with {}",
            address.id,
            payment_option.label()
        );

        Ok(CheckoutOutcome::Accepted(CheckoutResponse {
            billing_address_id: address.id,
            payment_option,
            next: payment_option.payment_url(),
        }))
    }
}
