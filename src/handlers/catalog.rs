use crate::models::*;
use crate::services::CatalogService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/api/v1/",
    tag = "catalog",
    params(
        ("page" = Option<u64>, Query, description = "Page number, from 1"),
        ("category" = Option<i64>, Query, description = "Only items of this category")
    ),
    responses(
        (status = 200, description = "One page of items and all categories")
    )
)]
pub async fn home(
    catalog_service: web::Data<CatalogService>,
    query: web::Query<HomeQuery>,
) -> Result<HttpResponse> {
    match catalog_service.home(&query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/product/{slug}/",
    tag = "catalog",
    params(
        ("slug" = String, Path, description = "Item slug")
    ),
    responses(
        (status = 200, description = "Item detail", body = ItemResponse),
        (status = 404, description = "Unknown item")
    )
)]
pub async fn product(
    catalog_service: web::Data<CatalogService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match catalog_service.get_item(&path).await {
        Ok(item) => Ok(HttpResponse::Ok().json(ApiResponse::success(item))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn catalog_config(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(home))
        .route("/", web::get().to(home))
        .route("/product/{slug}/", web::get().to(product))
        .route("/product/{slug}", web::get().to(product));
}
