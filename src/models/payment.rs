use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::payment_entity;

use super::cart::OrderSummary;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentRequest {
    /// Card token obtained client side with Stripe.js
    #[schema(example = "tok_visa")]
    pub stripe_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentPage {
    pub order: OrderSummary,
    /// cents
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub payment_id: i64,
    pub order_id: i64,
    pub stripe_charge_id: String,
    /// cents
    pub amount: i64,
    pub timestamp: DateTime<Utc>,
}

impl PaymentResponse {
    pub fn new(order_id: i64, payment: payment_entity::Model) -> Self {
        Self {
            payment_id: payment.id,
            order_id,
            stripe_charge_id: payment.stripe_charge_id,
            amount: payment.amount,
            timestamp: payment.timestamp,
        }
    }
}

/// Why a capture was not attempted, or its success.
#[derive(Debug, Clone)]
pub enum CaptureOutcome {
    Captured(PaymentResponse),
    NoActiveOrder,
    EmptyCart,
    MissingBillingAddress,
    /// another capture holds the order
    PaymentInProgress,
}

impl CaptureOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            CaptureOutcome::Captured(_) => "Your order was successful!",
            CaptureOutcome::NoActiveOrder => super::cart::NO_ACTIVE_ORDER_MESSAGE,
            CaptureOutcome::EmptyCart => "Your cart is empty.",
            CaptureOutcome::MissingBillingAddress => {
                "Please provide a billing address before paying."
            }
            CaptureOutcome::PaymentInProgress => super::cart::PAYMENT_IN_PROGRESS_MESSAGE,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CaptureOutcome::Captured(_) => "CAPTURED",
            CaptureOutcome::NoActiveOrder => super::cart::NO_ACTIVE_ORDER_CODE,
            CaptureOutcome::EmptyCart => "EMPTY_CART",
            CaptureOutcome::MissingBillingAddress => "MISSING_BILLING_ADDRESS",
            CaptureOutcome::PaymentInProgress => super::cart::PAYMENT_IN_PROGRESS_CODE,
        }
    }
}
