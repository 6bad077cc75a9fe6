mod common;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use common::*;
use serde_json::Value;
use std::sync::Arc;
use storefront_backend::handlers;
use storefront_backend::middlewares::AuthMiddleware;
use storefront_backend::services::{
    AuthService, CartService, CatalogService, CheckoutService, PaymentService,
};
use storefront_backend::utils::JwtService;

macro_rules! storefront_app {
    ($db:expr, $jwt:expr) => {
        test::init_service(
            App::new()
                .wrap(AuthMiddleware::new($jwt.clone()))
                .app_data(web::Data::new(AuthService::new(
                    $db.clone(),
                    $jwt.clone(),
                    vec!["admin".to_string()],
                )))
                .app_data(web::Data::new(CatalogService::new($db.clone(), 10)))
                .app_data(web::Data::new(CartService::new($db.clone())))
                .app_data(web::Data::new(CheckoutService::new($db.clone())))
                .app_data(web::Data::new(PaymentService::new(
                    $db.clone(),
                    Arc::new(FakeGateway::approving()),
                    "usd".to_string(),
                )))
                .service(
                    web::scope("/api/v1")
                        .configure(handlers::auth_config)
                        .configure(handlers::catalog_config)
                        .configure(handlers::cart_config)
                        .configure(handlers::checkout_config)
                        .configure(handlers::payment_config)
                        .configure(handlers::admin_config),
                ),
        )
        .await
    };
}

fn jwt() -> JwtService {
    JwtService::new("test-secret", 3600, 7200)
}

#[actix_web::test]
async fn home_lists_items_without_login() {
    let db = setup_db().await;
    let category = create_category(&db, "Shirts").await;
    create_item(&db, category.id, "blue-shirt", 2500, None).await;
    let jwt = jwt();
    let app = storefront_app!(db, jwt);

    let req = test::TestRequest::get().uri("/api/v1/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["items"]["total"], 1);
    assert_eq!(body["data"]["items"]["data"][0]["slug"], "blue-shirt");

    let req = test::TestRequest::get()
        .uri("/api/v1/product/blue-shirt/")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["final_price"], 2500);
}

#[actix_web::test]
async fn cart_routes_require_a_token() {
    let db = setup_db().await;
    let jwt = jwt();
    let app = storefront_app!(db, jwt);

    let req = test::TestRequest::get()
        .uri("/api/v1/order-summary/")
        .to_request();
    let err = test::try_call_service(&app, req).await.err().unwrap();
    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn add_to_cart_and_soft_failures_over_http() {
    let db = setup_db().await;
    let user = create_user(&db, "alice").await;
    let category = create_category(&db, "Shirts").await;
    create_item(&db, category.id, "blue-shirt", 2500, None).await;
    let jwt = jwt();
    let token = jwt.generate_access_token(user.id, &user.username).unwrap();
    let bearer = ("Authorization", format!("Bearer {token}"));
    let app = storefront_app!(db, jwt);

    let req = test::TestRequest::get()
        .uri("/api/v1/remove-from-cart/blue-shirt")
        .insert_header(bearer.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "You do not have an active order.");
    assert_eq!(body["error"]["code"], "NO_ACTIVE_ORDER");

    // The misspelt route is served too
    for uri in [
        "/api/v1/add-to-cart/blue-shirt",
        "/api/v1/add-to-card/blue-shirt",
    ] {
        let req = test::TestRequest::post()
            .uri(uri)
            .insert_header(bearer.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/order-summary/")
        .insert_header(bearer.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["lines"][0]["quantity"], 2);
    assert_eq!(body["data"]["total"], 5000);

    let req = test::TestRequest::get()
        .uri("/api/v1/add-to-cart/missing")
        .insert_header(bearer)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn admin_routes_are_staff_only() {
    let db = setup_db().await;
    let user = create_user(&db, "alice").await;
    let jwt = jwt();
    let token = jwt.generate_access_token(user.id, &user.username).unwrap();
    let app = storefront_app!(db, jwt);

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/categories")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(serde_json::json!({ "title": "Hats" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
