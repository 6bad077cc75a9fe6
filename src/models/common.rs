use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Severity attached to a user-visible message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<MessageLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

/// Where a client should go after a cart or checkout action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct NextStep {
    pub next: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            level: None,
            error: None,
        }
    }

    pub fn success_with_message(data: T, message: String, level: MessageLevel) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
            level: Some(level),
            error: None,
        }
    }

    /// A recoverable outcome reported to the user rather than raised as an error.
    pub fn soft_failure(data: Option<T>, code: &str, message: String, level: MessageLevel) -> Self {
        Self {
            success: false,
            data,
            message: Some(message.clone()),
            level: Some(level),
            error: Some(ApiError {
                code: code.to_string(),
                message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_skips_empty_fields() {
        let value = serde_json::to_value(ApiResponse::success(1)).unwrap();
        assert_eq!(value, json!({"success": true, "data": 1}));
    }

    #[test]
    fn test_soft_failure_shape() {
        let resp: ApiResponse<NextStep> = ApiResponse::soft_failure(
            Some(NextStep {
                next: "/api/v1/".into(),
            }),
            "NO_ACTIVE_ORDER",
            "You do not have an active order.".into(),
            MessageLevel::Info,
        );
        let value = serde_json::to_value(resp).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["level"], json!("info"));
        assert_eq!(value["error"]["code"], json!("NO_ACTIVE_ORDER"));
        assert_eq!(value["data"]["next"], json!("/api/v1/"));
    }
}
