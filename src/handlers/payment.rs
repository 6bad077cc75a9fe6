use crate::error::AppError;
use crate::handlers::{current_user_id, no_active_order, soft_failure};
use crate::models::*;
use crate::services::PaymentService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

fn parse_option(slug: &str) -> Result<PaymentOption, AppError> {
    PaymentOption::from_slug(slug)
        .ok_or_else(|| AppError::ValidationError(format!("Unknown payment option '{slug}'")))
}

#[utoipa::path(
    get,
    path = "/api/v1/payment/{option}",
    tag = "payment",
    params(
        ("option" = String, Path, description = "Payment option slug, e.g. stripe")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Order and amount to be charged", body = PaymentPage),
        (status = 400, description = "Unknown payment option")
    )
)]
pub async fn payment_page(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    if let Err(e) = parse_option(&path) {
        return Ok(e.error_response());
    }

    match payment_service.payment_page(user_id).await {
        Ok(Some(page)) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Ok(None) => Ok(no_active_order()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/payment/{option}",
    tag = "payment",
    params(
        ("option" = String, Path, description = "Payment option slug, e.g. stripe")
    ),
    request_body = PaymentRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Charge captured, or why it was not attempted", body = PaymentResponse),
        (status = 400, description = "Unknown or unsupported payment option"),
        (status = 402, description = "The gateway refused the charge")
    )
)]
pub async fn capture_payment(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    path: web::Path<String>,
    request: web::Json<PaymentRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    let option = match parse_option(&path) {
        Ok(option) => option,
        Err(e) => return Ok(e.error_response()),
    };

    let outcome = match payment_service
        .capture(user_id, option, &request.stripe_token)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => return Ok(e.error_response()),
    };

    let message = outcome.message();
    let code = outcome.code();
    match outcome {
        CaptureOutcome::Captured(payment) => Ok(HttpResponse::Ok().json(
            ApiResponse::success_with_message(payment, message.to_string(), MessageLevel::Success),
        )),
        CaptureOutcome::NoActiveOrder => Ok(no_active_order()),
        // the order needs fixing at checkout before a card can be charged
        CaptureOutcome::EmptyCart | CaptureOutcome::MissingBillingAddress => Ok(soft_failure(
            Some(NextStep {
                next: format!("{API_PREFIX}/checkout/"),
            }),
            code,
            message,
            MessageLevel::Warning,
        )),
        CaptureOutcome::PaymentInProgress => Ok(soft_failure(
            Some(NextStep {
                next: order_summary_url(),
            }),
            code,
            message,
            MessageLevel::Info,
        )),
    }
}

pub fn payment_config(cfg: &mut web::ServiceConfig) {
    for path in ["/payment/{option}", "/payment/{option}/"] {
        cfg.service(
            web::resource(path)
                .route(web::get().to(payment_page))
                .route(web::post().to(capture_payment)),
        );
    }
}
