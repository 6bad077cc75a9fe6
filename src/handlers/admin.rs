use crate::handlers::current_user_id;
use crate::models::*;
use crate::services::{AuthService, CatalogService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

/// Resolves the caller and rejects anyone without staff rights.
async fn staff_user(auth_service: &AuthService, req: &HttpRequest) -> Result<i64, HttpResponse> {
    let user_id = current_user_id(req).map_err(|e| e.error_response())?;
    auth_service
        .ensure_staff(user_id)
        .await
        .map_err(|e| e.error_response())?;
    Ok(user_id)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/categories",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All categories", body = [CategoryResponse]),
        (status = 403, description = "Staff only")
    )
)]
pub async fn list_categories(
    auth_service: web::Data<AuthService>,
    catalog_service: web::Data<CatalogService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    // 401 without a token, 403 for non-staff
    if let Err(resp) = staff_user(&auth_service, &req).await {
        return Ok(resp);
    }

    match catalog_service.list_categories().await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/categories",
    tag = "admin",
    request_body = CreateCategoryRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Invalid title"),
        (status = 403, description = "Staff only")
    )
)]
pub async fn create_category(
    auth_service: web::Data<AuthService>,
    catalog_service: web::Data<CatalogService>,
    req: HttpRequest,
    request: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse> {
    if let Err(resp) = staff_user(&auth_service, &req).await {
        return Ok(resp);
    }

    match catalog_service.create_category(request.into_inner()).await {
        Ok(category) => Ok(HttpResponse::Created().json(ApiResponse::success(category))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/items",
    tag = "admin",
    request_body = CreateItemRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Item created", body = ItemResponse),
        (status = 400, description = "Invalid item"),
        (status = 403, description = "Staff only")
    )
)]
pub async fn create_item(
    auth_service: web::Data<AuthService>,
    catalog_service: web::Data<CatalogService>,
    req: HttpRequest,
    request: web::Json<CreateItemRequest>,
) -> Result<HttpResponse> {
    if let Err(resp) = staff_user(&auth_service, &req).await {
        return Ok(resp);
    }

    match catalog_service.create_item(request.into_inner()).await {
        Ok(item) => Ok(HttpResponse::Created().json(ApiResponse::success(item))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/items/{slug}",
    tag = "admin",
    params(
        ("slug" = String, Path, description = "Item slug")
    ),
    request_body = UpdateItemRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Item updated", body = ItemResponse),
        (status = 400, description = "Invalid item"),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Unknown item")
    )
)]
pub async fn update_item(
    auth_service: web::Data<AuthService>,
    catalog_service: web::Data<CatalogService>,
    req: HttpRequest,
    path: web::Path<String>,
    request: web::Json<UpdateItemRequest>,
) -> Result<HttpResponse> {
    if let Err(resp) = staff_user(&auth_service, &req).await {
        return Ok(resp);
    }

    match catalog_service
        .update_item(&path, request.into_inner())
        .await
    {
        Ok(item) => Ok(HttpResponse::Ok().json(ApiResponse::success(item))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(
                web::resource("/categories")
                    .route(web::get().to(list_categories))
                    .route(web::post().to(create_category)),
            )
            .route("/items", web::post().to(create_item))
            .route("/items/{slug}", web::put().to(update_item)),
    );
}
