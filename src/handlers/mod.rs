pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod payment;

pub use admin::admin_config;
pub use auth::auth_config;
pub use cart::cart_config;
pub use catalog::catalog_config;
pub use checkout::checkout_config;
pub use payment::payment_config;

use crate::error::{AppError, AppResult};
use crate::middlewares::AuthenticatedUser;
use crate::models::{ApiResponse, MessageLevel, NO_ACTIVE_ORDER_CODE, NO_ACTIVE_ORDER_MESSAGE};
use actix_web::{HttpMessage, HttpRequest, HttpResponse};
use serde::Serialize;

/// User id stored by the auth middleware.
pub(crate) fn current_user_id(req: &HttpRequest) -> AppResult<i64> {
    req.extensions()
        .get::<AuthenticatedUser>()
        .map(|u| u.0)
        .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))
}

/// 200 response carrying a user-facing message instead of an error status.
pub(crate) fn soft_failure<T: Serialize>(
    data: Option<T>,
    code: &str,
    message: &str,
    level: MessageLevel,
) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::soft_failure(
        data,
        code,
        message.to_string(),
        level,
    ))
}

pub(crate) fn no_active_order() -> HttpResponse {
    soft_failure::<()>(
        None,
        NO_ACTIVE_ORDER_CODE,
        NO_ACTIVE_ORDER_MESSAGE,
        MessageLevel::Error,
    )
}
