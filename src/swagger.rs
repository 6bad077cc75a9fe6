use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::Label;
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::me,
        handlers::catalog::home,
        handlers::catalog::product,
        handlers::cart::add_to_cart,
        handlers::cart::remove_from_cart,
        handlers::cart::remove_single_item_from_cart,
        handlers::cart::order_summary,
        handlers::checkout::checkout_page,
        handlers::checkout::submit_checkout,
        handlers::payment::payment_page,
        handlers::payment::capture_payment,
        handlers::admin::list_categories,
        handlers::admin::create_category,
        handlers::admin::create_item,
        handlers::admin::update_item,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            UserResponse,
            AuthResponse,
            Label,
            ItemLinks,
            CategoryResponse,
            ItemResponse,
            CreateCategoryRequest,
            CreateItemRequest,
            UpdateItemRequest,
            OrderLine,
            OrderSummary,
            CartOutcome,
            CartUpdate,
            PaymentOption,
            PaymentChoice,
            CheckoutForm,
            CheckoutPage,
            CheckoutResponse,
            PaymentRequest,
            PaymentPage,
            PaymentResponse,
            MessageLevel,
            NextStep,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Accounts and tokens"),
        (name = "catalog", description = "Browsing items"),
        (name = "cart", description = "Open order management"),
        (name = "checkout", description = "Billing address and payment option"),
        (name = "payment", description = "Card payment capture"),
        (name = "admin", description = "Staff catalog management"),
    ),
    info(
        title = "Storefront API",
        version = "1.0.0",
        description = "Storefront REST API documentation"
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
