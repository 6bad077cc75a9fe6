use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// A shopping cart while `ordered` is false, a receipt afterwards.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub start_date: DateTime<Utc>,
    pub ordered_date: Option<DateTime<Utc>>,
    pub ordered: bool,
    pub billing_address_id: Option<i64>,
    pub payment_id: Option<i64>,
    /// set while a charge is in flight
    pub capture_started_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
