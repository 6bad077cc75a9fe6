use crate::handlers::{current_user_id, no_active_order, soft_failure};
use crate::models::*;
use crate::services::CartService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

fn cart_response(update: CartUpdate) -> HttpResponse {
    let outcome = update.outcome;
    if outcome.is_success() {
        HttpResponse::Ok().json(ApiResponse::success_with_message(
            update,
            outcome.message().to_string(),
            MessageLevel::Info,
        ))
    } else {
        // not an error: the client shows the message and follows `next`
        soft_failure(
            Some(update),
            outcome.code(),
            outcome.message(),
            MessageLevel::Info,
        )
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/add-to-cart/{slug}",
    tag = "cart",
    params(
        ("slug" = String, Path, description = "Item slug")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Cart updated", body = CartUpdate),
        (status = 404, description = "Unknown item")
    )
)]
pub async fn add_to_cart(
    cart_service: web::Data<CartService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match cart_service.add_to_cart(user_id, &path).await {
        Ok(update) => Ok(cart_response(update)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/remove-from-cart/{slug}",
    tag = "cart",
    params(
        ("slug" = String, Path, description = "Item slug")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Line removed, or why it was not", body = CartUpdate),
        (status = 404, description = "Unknown item")
    )
)]
pub async fn remove_from_cart(
    cart_service: web::Data<CartService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match cart_service.remove_from_cart(user_id, &path).await {
        Ok(update) => Ok(cart_response(update)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/remove-item-from-cart/{slug}",
    tag = "cart",
    params(
        ("slug" = String, Path, description = "Item slug")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Quantity decremented, or why it was not", body = CartUpdate),
        (status = 404, description = "Unknown item")
    )
)]
pub async fn remove_single_item_from_cart(
    cart_service: web::Data<CartService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match cart_service.remove_single_from_cart(user_id, &path).await {
        Ok(update) => Ok(cart_response(update)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/order-summary/",
    tag = "cart",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Open order with its lines and total", body = OrderSummary)
    )
)]
pub async fn order_summary(
    cart_service: web::Data<CartService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match cart_service.order_summary(user_id).await {
        Ok(Some(summary)) => Ok(HttpResponse::Ok().json(ApiResponse::success(summary))),
        Ok(None) => Ok(no_active_order()),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn cart_config(cfg: &mut web::ServiceConfig) {
    // "card" spellings stay routable for older clients
    for prefix in ["/add-to-cart", "/add-to-card"] {
        cfg.service(
            web::resource(format!("{prefix}/{{slug}}"))
                .route(web::get().to(add_to_cart))
                .route(web::post().to(add_to_cart)),
        );
    }
    for prefix in ["/remove-from-cart", "/remove-from-card"] {
        cfg.service(
            web::resource(format!("{prefix}/{{slug}}"))
                .route(web::get().to(remove_from_cart))
                .route(web::post().to(remove_from_cart)),
        );
    }
    for prefix in ["/remove-item-from-cart", "/remove-item-from-card"] {
        cfg.service(
            web::resource(format!("{prefix}/{{slug}}"))
                .route(web::get().to(remove_single_item_from_cart))
                .route(web::post().to(remove_single_item_from_cart)),
        );
    }
    cfg.route("/order-summary/", web::get().to(order_summary))
        .route("/order-summary", web::get().to(order_summary));
}
