use crate::entities::{category_entity as categories, item_entity as items};
use crate::error::{AppError, AppResult};
use crate::models::{
    CategoryResponse, CreateCategoryRequest, CreateItemRequest, HomeQuery, HomeResponse,
    ItemResponse, PaginatedResponse, PaginationParams, UpdateItemRequest, validate_item_fields,
    validate_slug,
};
use crate::utils::slugify;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

#[derive(Clone)]
pub struct CatalogService {
    pool: DatabaseConnection,
    page_size: u64,
}

impl CatalogService {
    pub fn new(pool: DatabaseConnection, page_size: u64) -> Self {
        Self { pool, page_size }
    }

    /// Home page: one page of items plus every category
    pub async fn home(&self, query: &HomeQuery) -> AppResult<HomeResponse> {
        let params = PaginationParams::new(query.page, Some(self.page_size));

        let mut base_query = items::Entity::find();
        if let Some(category_id) = query.category {
            base_query = base_query.filter(items::Column::CategoryId.eq(category_id));
        }

        let total = base_query.clone().count(&self.pool).await?;

        let models = base_query
            .order_by_asc(items::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        let data: Vec<ItemResponse> = models.into_iter().map(Into::into).collect();

        Ok(HomeResponse {
            items: PaginatedResponse::new(data, &params, total),
            categories: self.list_categories().await?,
        })
    }

    pub async fn get_item(&self, slug: &str) -> AppResult<ItemResponse> {
        Ok(find_item_by_slug(&self.pool, slug).await?.into())
    }

    pub async fn list_categories(&self) -> AppResult<Vec<CategoryResponse>> {
        let list = categories::Entity::find()
            .order_by_asc(categories::Column::Title)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> AppResult<CategoryResponse> {
        let title = request.validate()?;
        let model = categories::ActiveModel {
            title: Set(title),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        log::info!("Created category {} ({})", model.id, model.title);
        Ok(model.into())
    }

    pub async fn create_item(&self, request: CreateItemRequest) -> AppResult<ItemResponse> {
        validate_item_fields(
            &request.title,
            &request.description,
            request.price,
            request.discount_price,
        )?;
        self.ensure_category(request.category_id).await?;

        let slug = match &request.slug {
            Some(slug) => slug.trim().to_string(),
            None => slugify(&request.title),
        };
        validate_slug(&slug)?;

        if items::Entity::find()
            .filter(items::Column::Slug.eq(slug.as_str()))
            .one(&self.pool)
            .await?
            .is_some()
        {
            return Err(AppError::ValidationError(format!(
                "An item with slug '{slug}' already exists"
            )));
        }

        // slug is checked above, the unique index still has the last word
        let now = Utc::now();
        let model = items::ActiveModel {
            title: Set(request.title.trim().to_string()),
            image: Set(request.image),
            price: Set(request.price),
            discount_price: Set(request.discount_price),
            category_id: Set(request.category_id),
            label: Set(request.label),
            description: Set(request.description),
            slug: Set(slug),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Created item {} ({})", model.id, model.slug);
        Ok(model.into())
    }

    pub async fn update_item(
        &self,
        slug: &str,
        request: UpdateItemRequest,
    ) -> AppResult<ItemResponse> {
        let current = find_item_by_slug(&self.pool, slug).await?;

        let title = request.title.unwrap_or_else(|| current.title.clone());
        let description = request
            .description
            .unwrap_or_else(|| current.description.clone());
        // merge onto the stored item, then validate the result as a whole
        let price = request.price.unwrap_or(current.price);
        let discount_price = if request.clear_discount {
            None
        } else {
            request.discount_price.or(current.discount_price)
        };
        validate_item_fields(&title, &description, price, discount_price)?;

        let category_id = request.category_id.unwrap_or(current.category_id);
        if category_id != current.category_id {
            self.ensure_category(category_id).await?;
        }

        let label = request.label.unwrap_or(current.label);
        let image = request.image.or_else(|| current.image.clone());

        let mut am = current.into_active_model();
        am.title = Set(title.trim().to_string());
        am.description = Set(description);
        am.price = Set(price);
        am.discount_price = Set(discount_price);
        am.category_id = Set(category_id);
        am.label = Set(label);
        am.image = Set(image);
        am.updated_at = Set(Utc::now());
        let updated = am.update(&self.pool).await?;

        Ok(updated.into())
    }

    async fn ensure_category(&self, category_id: i64) -> AppResult<()> {
        categories::Entity::find_by_id(category_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::ValidationError("Category does not exist".to_string()))?;
        Ok(())
    }
}

/// Look an item up by slug; unknown slugs are a 404.
pub async fn find_item_by_slug<C: ConnectionTrait>(db: &C, slug: &str) -> AppResult<items::Model> {
    items::Entity::find()
        .filter(items::Column::Slug.eq(slug))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No item found for '{slug}'")))
}
