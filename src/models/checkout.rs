use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::cart::OrderSummary;
use super::catalog::API_PREFIX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOption {
    Stripe,
    Paypal,
}

impl PaymentOption {
    /// Form choice code: `S` or `P`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "S" => Some(PaymentOption::Stripe),
            "P" => Some(PaymentOption::Paypal),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            PaymentOption::Stripe => "S",
            PaymentOption::Paypal => "P",
        }
    }

    /// Path segment of the payment route.
    pub fn slug(&self) -> &'static str {
        match self {
            PaymentOption::Stripe => "stripe",
            PaymentOption::Paypal => "paypal",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "stripe" => Some(PaymentOption::Stripe),
            "paypal" => Some(PaymentOption::Paypal),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentOption::Stripe => "Stripe",
            PaymentOption::Paypal => "PayPal",
        }
    }

    pub fn payment_url(&self) -> String {
        format!("{API_PREFIX}/payment/{}", self.slug())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentChoice {
    pub code: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutForm {
    #[schema(example = "1234 Main St")]
    pub street_address: String,
    #[serde(default)]
    pub apartment_address: Option<String>,
    #[schema(example = "US")]
    pub country: String,
    #[schema(example = "94107")]
    pub zip: String,
    #[serde(default)]
    pub same_shipping_address: bool,
    #[serde(default)]
    pub save_info: bool,
    #[schema(example = "S")]
    pub payment_option: String,
}

/// Billing fields after trimming and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedBillingAddress {
    pub street_address: String,
    pub apartment_address: String,
    pub country: String,
    pub zip: String,
}

impl CheckoutForm {
    pub fn clean(&self) -> AppResult<CleanedBillingAddress> {
        let street_address = self.street_address.trim();
        if street_address.is_empty() || street_address.chars().count() > 100 {
            return Err(AppError::ValidationError(
                "Street address is required (at most 100 characters)".to_string(),
            ));
        }

        let apartment_address = self
            .apartment_address
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();
        if apartment_address.chars().count() > 100 {
            return Err(AppError::ValidationError(
                "Apartment address must be at most 100 characters".to_string(),
            ));
        }

        let country = self.country.trim().to_ascii_uppercase();
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(AppError::ValidationError(
                "Country must be a two-letter country code".to_string(),
            ));
        }

        let zip = self.zip.trim();
        if zip.is_empty() || zip.chars().count() > 20 {
            return Err(AppError::ValidationError(
                "Zip is required (at most 20 characters)".to_string(),
            ));
        }

        Ok(CleanedBillingAddress {
            street_address: street_address.to_string(),
            apartment_address: apartment_address.to_string(),
            country,
            zip: zip.to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutPage {
    pub order: OrderSummary,
    pub payment_options: Vec<PaymentChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    pub billing_address_id: i64,
    pub payment_option: PaymentOption,
    pub next: String,
}

#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    Accepted(CheckoutResponse),
    InvalidPaymentOption,
    NoActiveOrder,
}

pub fn payment_choices() -> Vec<PaymentChoice> {
    [PaymentOption::Stripe, PaymentOption::Paypal]
        .iter()
        .map(|o| PaymentChoice {
            code: o.code().to_string(),
            label: o.label().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> CheckoutForm {
        CheckoutForm {
            street_address: " 1 Main St ".into(),
            apartment_address: None,
            country: "us".into(),
            zip: "94107".into(),
            same_shipping_address: false,
            save_info: false,
            payment_option: "S".into(),
        }
    }

    #[test]
    fn test_clean_normalizes_fields() {
        let cleaned = form().clean().unwrap();
        assert_eq!(cleaned.street_address, "1 Main St");
        assert_eq!(cleaned.apartment_address, "");
        assert_eq!(cleaned.country, "US");
    }

    #[test]
    fn test_clean_rejects_bad_fields() {
        let mut f = form();
        f.street_address = "  ".into();
        assert!(f.clean().is_err());

        let mut f = form();
        f.country = "USA".into();
        assert!(f.clean().is_err());

        let mut f = form();
        f.zip = String::new();
        assert!(f.clean().is_err());
    }

    #[test]
    fn test_payment_option_codes() {
        assert_eq!(PaymentOption::from_code("S"), Some(PaymentOption::Stripe));
        assert_eq!(PaymentOption::from_code("P"), Some(PaymentOption::Paypal));
        assert_eq!(PaymentOption::from_code("X"), None);
        assert_eq!(PaymentOption::Stripe.payment_url(), "/api/v1/payment/stripe");
        assert_eq!(PaymentOption::from_slug("paypal"), Some(PaymentOption::Paypal));
        assert_eq!(payment_choices().len(), 2);
    }
}
