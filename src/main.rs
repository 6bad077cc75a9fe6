use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local;
use env_logger::{Env, Target};
use std::io::Write; // for the JSON log formatter
use std::sync::Arc;

use storefront_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{PaymentGateway, StripeGateway},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // load configuration
    let config = Config::from_toml().expect("Failed to load configuration file");

    // database pool
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // apply pending migrations
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // JWT service
    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    // card gateway
    let gateway: Arc<dyn PaymentGateway> = Arc::new(StripeGateway::new(config.stripe.clone()));

    // services
    let auth_service = AuthService::new(
        pool.clone(),
        jwt_service.clone(),
        config.storefront.staff_usernames.clone(),
    );
    let catalog_service = CatalogService::new(pool.clone(), config.storefront.page_size);
    let cart_service = CartService::new(pool.clone());
    let checkout_service = CheckoutService::new(pool.clone());
    let payment_service =
        PaymentService::new(pool.clone(), gateway, config.stripe.currency.clone());

    let allowed_origins = config.server.allowed_origins.clone();

    // start HTTP server
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors(&allowed_origins))
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(catalog_service.clone()))
            .app_data(web::Data::new(cart_service.clone()))
            .app_data(web::Data::new(checkout_service.clone()))
            .app_data(web::Data::new(payment_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::catalog_config)
                    .configure(handlers::cart_config)
                    .configure(handlers::checkout_config)
                    .configure(handlers::payment_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
