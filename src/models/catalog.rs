use crate::entities::{Label, category_entity, item_entity};
use crate::error::{AppError, AppResult};
use crate::utils::{format_cents, is_valid_slug};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::PaginatedResponse;

pub const API_PREFIX: &str = "/api/v1";

/// Routes a client follows from an item, mirroring the product page buttons.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ItemLinks {
    pub product: String,
    pub add_to_cart: String,
    pub remove_from_cart: String,
    pub remove_single_from_cart: String,
}

impl ItemLinks {
    pub fn for_slug(slug: &str) -> Self {
        Self {
            product: product_url(slug),
            add_to_cart: format!("{API_PREFIX}/add-to-cart/{slug}"),
            remove_from_cart: format!("{API_PREFIX}/remove-from-cart/{slug}"),
            remove_single_from_cart: format!("{API_PREFIX}/remove-item-from-cart/{slug}"),
        }
    }
}

pub fn product_url(slug: &str) -> String {
    format!("{API_PREFIX}/product/{slug}/")
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i64,
    pub title: String,
}

impl From<category_entity::Model> for CategoryResponse {
    fn from(m: category_entity::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub image: Option<String>,
    /// cents
    pub price: i64,
    pub discount_price: Option<i64>,
    pub final_price: i64,
    pub price_display: String,
    pub category_id: i64,
    pub label: Label,
    pub label_name: String,
    pub description: String,
    pub links: ItemLinks,
}

impl From<item_entity::Model> for ItemResponse {
    fn from(m: item_entity::Model) -> Self {
        let final_price = m.final_unit_price();
        Self {
            links: ItemLinks::for_slug(&m.slug),
            id: m.id,
            title: m.title,
            slug: m.slug,
            image: m.image,
            price: m.price,
            discount_price: m.discount_price,
            final_price,
            price_display: format_cents(final_price),
            category_id: m.category_id,
            label: m.label,
            label_name: m.label.name().to_string(),
            description: m.description,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HomeQuery {
    pub page: Option<u64>,
    pub category: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub items: PaginatedResponse<ItemResponse>,
    pub categories: Vec<CategoryResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    #[schema(example = "Shirts")]
    pub title: String,
}

impl CreateCategoryRequest {
    pub fn validate(&self) -> AppResult<String> {
        let title = self.title.trim();
        if title.is_empty() || title.chars().count() > 30 {
            return Err(AppError::ValidationError(
                "Category title must be between 1 and 30 characters".to_string(),
            ));
        }
        Ok(title.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateItemRequest {
    #[schema(example = "Blue T-Shirt")]
    pub title: String,
    pub image: Option<String>,
    /// cents
    #[schema(example = 2500)]
    pub price: i64,
    pub discount_price: Option<i64>,
    pub category_id: i64,
    pub label: Label,
    pub description: String,
    /// Derived from the title when omitted
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    pub title: Option<String>,
    pub image: Option<String>,
    pub price: Option<i64>,
    pub discount_price: Option<i64>,
    /// Drops an existing discount price
    #[serde(default)]
    pub clear_discount: bool,
    pub category_id: Option<i64>,
    pub label: Option<Label>,
    pub description: Option<String>,
}

/// Field rules shared by item creation and update.
/// Highest accepted list or discount price, in cents.
pub const MAX_PRICE_CENTS: i64 = 99_999_999;

pub fn validate_item_fields(
    title: &str,
    description: &str,
    price: i64,
    discount_price: Option<i64>,
) -> AppResult<()> {
    let title_len = title.trim().chars().count();
    if title_len == 0 || title_len > 100 {
        return Err(AppError::ValidationError(
            "Item title must be between 1 and 100 characters".to_string(),
        ));
    }
    if description.chars().count() > 200 {
        return Err(AppError::ValidationError(
            "Item description must be at most 200 characters".to_string(),
        ));
    }
    if price <= 0 {
        return Err(AppError::ValidationError(
            "Item price must be positive".to_string(),
        ));
    }
    if price > MAX_PRICE_CENTS {
        return Err(AppError::ValidationError(format!(
            "Item price must be at most {MAX_PRICE_CENTS} cents"
        )));
    }
    if let Some(discount) = discount_price
        && (discount <= 0 || discount >= price)
    {
        return Err(AppError::ValidationError(
            "Discount price must be positive and below the list price".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_slug(slug: &str) -> AppResult<()> {
    if !is_valid_slug(slug) {
        return Err(AppError::ValidationError(
            "Slug must be lowercase letters, digits and single dashes".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_links() {
        let links = ItemLinks::for_slug("blue-shirt");
        assert_eq!(links.product, "/api/v1/product/blue-shirt/");
        assert_eq!(links.add_to_cart, "/api/v1/add-to-cart/blue-shirt");
        assert_eq!(links.remove_from_cart, "/api/v1/remove-from-cart/blue-shirt");
        assert_eq!(
            links.remove_single_from_cart,
            "/api/v1/remove-item-from-cart/blue-shirt"
        );
    }

    #[test]
    fn test_validate_item_fields() {
        assert!(validate_item_fields("Shirt", "Nice", 1000, None).is_ok());
        assert!(validate_item_fields("Shirt", "Nice", 1000, Some(800)).is_ok());
        assert!(validate_item_fields("", "Nice", 1000, None).is_err());
        assert!(validate_item_fields("Shirt", "Nice", 0, None).is_err());
        assert!(validate_item_fields("Shirt", "Nice", 1000, Some(1000)).is_err());
        assert!(validate_item_fields("Shirt", "Nice", 1000, Some(0)).is_err());
        assert!(validate_item_fields("Shirt", &"x".repeat(201), 1000, None).is_err());
    }

    #[test]
    fn test_validate_item_price_ceiling() {
        assert!(validate_item_fields("Yacht", "", MAX_PRICE_CENTS, None).is_ok());
        assert!(validate_item_fields("Yacht", "", MAX_PRICE_CENTS + 1, None).is_err());
        assert!(validate_item_fields("Yacht", "", i64::MAX / 2 + 1, None).is_err());
        // discount stays below the list price, so it inherits the ceiling
        assert!(
            validate_item_fields("Yacht", "", MAX_PRICE_CENTS, Some(MAX_PRICE_CENTS - 1)).is_ok()
        );
    }

    #[test]
    fn test_validate_category_title() {
        let ok = CreateCategoryRequest {
            title: "  Shirts ".into(),
        };
        assert_eq!(ok.validate().unwrap(), "Shirts");
        let too_long = CreateCategoryRequest {
            title: "x".repeat(31),
        };
        assert!(too_long.validate().is_err());
    }
}
