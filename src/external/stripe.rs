use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::config::StripeConfig;

/// A single card charge request, amount in minor units.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub amount: i64,
    pub currency: String,
    pub source: String,
    pub description: Option<String>,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Charge {
    pub id: String,
    pub amount: i64,
    #[serde(default)]
    pub status: Option<String>,
}

/// Failure categories reported by the card gateway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChargeError {
    #[error("card error: {message}")]
    Card {
        message: String,
        code: Option<String>,
    },

    #[error("rate limited by the payment gateway")]
    RateLimit,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("authentication with the payment gateway failed: {0}")]
    Authentication(String),

    #[error("could not reach the payment gateway: {0}")]
    Connection(String),

    #[error("payment gateway error: {0}")]
    Api(String),

    #[error("unexpected payment failure: {0}")]
    Unexpected(String),
}

impl ChargeError {
    /// Message shown to the shopper. Card errors carry the gateway's own text.
    pub fn user_message(&self) -> String {
        match self {
            ChargeError::Card { message, .. } => message.clone(),
            ChargeError::RateLimit => "Rate limit error".to_string(),
            ChargeError::InvalidRequest(_) => "Invalid parameters".to_string(),
            ChargeError::Authentication(_) => "Not Authenticated".to_string(),
            ChargeError::Connection(_) => "Network error".to_string(),
            ChargeError::Api(_) => {
                "Something went wrong, You were not charged. Please try again".to_string()
            }
            ChargeError::Unexpected(_) => {
                "A serious error occurred. We have been notified".to_string()
            }
        }
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: ChargeRequest) -> Result<Charge, ChargeError>;
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: Option<String>,
    code: Option<String>,
}

/// Classify a non-2xx response from the Charges API.
fn classify_error(status: StatusCode, body: &str) -> ChargeError {
    let detail = serde_json::from_str::<StripeErrorBody>(body)
        .ok()
        .map(|b| b.error);
    let message = detail
        .as_ref()
        .and_then(|d| d.message.clone())
        .unwrap_or_else(|| format!("HTTP {status}"));
    let error_type = detail.as_ref().and_then(|d| d.error_type.as_deref());

    if status == StatusCode::TOO_MANY_REQUESTS {
        return ChargeError::RateLimit;
    }

    match error_type {
        Some("card_error") => ChargeError::Card {
            message,
            code: detail.and_then(|d| d.code),
        },
        Some("rate_limit_error") => ChargeError::RateLimit,
        Some("invalid_request_error") => ChargeError::InvalidRequest(message),
        Some("authentication_error") => ChargeError::Authentication(message),
        Some(_) => ChargeError::Api(message),
        None => match status {
            StatusCode::UNAUTHORIZED => ChargeError::Authentication(message),
            StatusCode::PAYMENT_REQUIRED => ChargeError::Card {
                message,
                code: None,
            },
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
                ChargeError::InvalidRequest(message)
            }
            _ => ChargeError::Api(message),
        },
    }
}

#[derive(Clone)]
pub struct StripeGateway {
    client: Client,
    config: StripeConfig,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn charges_url(&self) -> String {
        format!("{}/v1/charges", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn charge(&self, request: ChargeRequest) -> Result<Charge, ChargeError> {
        let mut params = vec![
            ("amount", request.amount.to_string()),
            ("currency", request.currency.to_lowercase()),
            ("source", request.source.clone()),
        ];
        if let Some(description) = &request.description {
            params.push(("description", description.clone()));
        }

        let response = self
            .client
            .post(self.charges_url())
            .bearer_auth(&self.config.secret_key)
            .header("Idempotency-Key", &request.idempotency_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() || e.is_request() {
                    ChargeError::Connection(e.to_string())
                } else {
                    ChargeError::Unexpected(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<Charge>()
                .await
                .map_err(|e| ChargeError::Unexpected(format!("malformed charge response: {e}")))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(classify_error(status, &body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_creation() {
        let config = StripeConfig {
            secret_key: "sk_test_123".to_string(),
            api_base: "https://api.stripe.com/".to_string(),
            currency: "usd".to_string(),
        };
        let gateway = StripeGateway::new(config);
        assert_eq!(gateway.charges_url(), "https://api.stripe.com/v1/charges");
    }

    #[test]
    fn test_classify_card_error() {
        let body = r#"{"error":{"type":"card_error","code":"card_declined","message":"Your card was declined."}}"#;
        let err = classify_error(StatusCode::PAYMENT_REQUIRED, body);
        assert_eq!(
            err,
            ChargeError::Card {
                message: "Your card was declined.".to_string(),
                code: Some("card_declined".to_string()),
            }
        );
        assert_eq!(err.user_message(), "Your card was declined.");
    }

    #[test]
    fn test_classify_by_type() {
        let invalid = r#"{"error":{"type":"invalid_request_error","message":"No such token"}}"#;
        assert_eq!(
            classify_error(StatusCode::BAD_REQUEST, invalid).user_message(),
            "Invalid parameters"
        );

        let auth = r#"{"error":{"type":"authentication_error","message":"Invalid API Key"}}"#;
        assert_eq!(
            classify_error(StatusCode::UNAUTHORIZED, auth).user_message(),
            "Not Authenticated"
        );

        let api = r#"{"error":{"type":"api_error","message":"boom"}}"#;
        assert!(matches!(
            classify_error(StatusCode::INTERNAL_SERVER_ERROR, api),
            ChargeError::Api(_)
        ));
    }

    #[test]
    fn test_classify_rate_limit_by_status() {
        assert_eq!(
            classify_error(StatusCode::TOO_MANY_REQUESTS, "not json"),
            ChargeError::RateLimit
        );
    }

    #[test]
    fn test_classify_without_body() {
        assert!(matches!(
            classify_error(StatusCode::UNAUTHORIZED, ""),
            ChargeError::Authentication(_)
        ));
        assert!(matches!(
            classify_error(StatusCode::BAD_GATEWAY, ""),
            ChargeError::Api(_)
        ));
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(ChargeError::RateLimit.user_message(), "Rate limit error");
        assert_eq!(
            ChargeError::Connection("timeout".into()).user_message(),
            "Network error"
        );
        assert_eq!(
            ChargeError::Unexpected("x".into()).user_message(),
            "A serious error occurred. We have been notified"
        );
    }
}
