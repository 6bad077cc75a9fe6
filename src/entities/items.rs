use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Cosmetic badge shown next to an item.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(1))")]
pub enum Label {
    #[sea_orm(string_value = "P")]
    #[serde(rename = "P")]
    Primary,
    #[sea_orm(string_value = "S")]
    #[serde(rename = "S")]
    Secondary,
    #[sea_orm(string_value = "D")]
    #[serde(rename = "D")]
    Danger,
}

impl Label {
    pub fn name(&self) -> &'static str {
        match self {
            Label::Primary => "primary",
            Label::Secondary => "secondary",
            Label::Danger => "danger",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub image: Option<String>,
    /// cents
    pub price: i64,
    pub discount_price: Option<i64>,
    pub category_id: i64,
    pub label: Label,
    pub description: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Price actually charged per unit: the discount price when set.
    pub fn final_unit_price(&self) -> i64 {
        self.discount_price.unwrap_or(self.price)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_delete = "Cascade"
    )]
    Category,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
