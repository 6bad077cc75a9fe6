use crate::handlers::{current_user_id, no_active_order, soft_failure};
use crate::models::*;
use crate::services::CheckoutService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/api/v1/checkout/",
    tag = "checkout",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Open order and the payment options", body = CheckoutPage)
    )
)]
pub async fn checkout_page(
    checkout_service: web::Data<CheckoutService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match checkout_service.checkout_page(user_id).await {
        Ok(Some(page)) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Ok(None) => Ok(no_active_order()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/checkout/",
    tag = "checkout",
    request_body = CheckoutForm,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Billing address saved, or why it was not", body = CheckoutResponse),
        (status = 400, description = "Invalid billing address")
    )
)]
pub async fn submit_checkout(
    checkout_service: web::Data<CheckoutService>,
    req: HttpRequest,
    form: web::Json<CheckoutForm>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match checkout_service.submit(user_id, form.into_inner()).await {
        Ok(CheckoutOutcome::Accepted(response)) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
        }
        // nothing was saved, send the user back to the form
        Ok(CheckoutOutcome::InvalidPaymentOption) => Ok(soft_failure(
            Some(NextStep {
                next: format!("{API_PREFIX}/checkout/"),
            }),
            "INVALID_PAYMENT_OPTION",
            "Invalid payment option selected",
            MessageLevel::Warning,
        )),
        Ok(CheckoutOutcome::NoActiveOrder) => Ok(no_active_order()),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn checkout_config(cfg: &mut web::ServiceConfig) {
    for path in ["/checkout/", "/checkout"] {
        cfg.service(
            web::resource(path)
                .route(web::get().to(checkout_page))
                .route(web::post().to(submit_checkout)),
        );
    }
}
