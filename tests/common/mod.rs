#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use storefront_backend::entities::{
    Label, category_entity as categories, item_entity as items, user_entity as users,
};
use storefront_backend::external::{Charge, ChargeError, ChargeRequest, PaymentGateway};

/// Fresh in-memory database with every migration applied.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn create_user(db: &DatabaseConnection, username: &str) -> users::Model {
    let now = Utc::now();
    users::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set("not-a-real-hash".to_string()),
        is_staff: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_category(db: &DatabaseConnection, title: &str) -> categories::Model {
    categories::ActiveModel {
        title: Set(title.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_item(
    db: &DatabaseConnection,
    category_id: i64,
    slug: &str,
    price: i64,
    discount_price: Option<i64>,
) -> items::Model {
    let now = Utc::now();
    items::ActiveModel {
        title: Set(slug.replace('-', " ")),
        image: Set(None),
        price: Set(price),
        discount_price: Set(discount_price),
        category_id: Set(category_id),
        label: Set(Label::Primary),
        description: Set(String::new()),
        slug: Set(slug.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

type SideEffect = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Gateway double that records requests and answers with a fixed result.
pub struct FakeGateway {
    result: Result<(), ChargeError>,
    pub requests: Mutex<Vec<ChargeRequest>>,
    during_charge: Mutex<Option<SideEffect>>,
}

impl FakeGateway {
    pub fn approving() -> Self {
        Self::answering(Ok(()))
    }

    pub fn declining(error: ChargeError) -> Self {
        Self::answering(Err(error))
    }

    fn answering(result: Result<(), ChargeError>) -> Self {
        Self {
            result,
            requests: Mutex::new(Vec::new()),
            during_charge: Mutex::new(None),
        }
    }

    /// Run `effect` while the first charge is still in flight.
    pub fn during_first_charge(self, effect: impl Future<Output = ()> + Send + 'static) -> Self {
        *self.during_charge.lock().unwrap() = Some(Box::pin(effect));
        self
    }

    pub fn charged_amounts(&self) -> Vec<i64> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.amount)
            .collect()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn charge(&self, request: ChargeRequest) -> Result<Charge, ChargeError> {
        let count = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };
        let effect = self.during_charge.lock().unwrap().take();
        if let Some(effect) = effect {
            effect.await;
        }
        self.result.clone().map(|_| Charge {
            id: format!("ch_test_{count}"),
            amount: request.amount,
            status: Some("succeeded".to_string()),
        })
    }
}
