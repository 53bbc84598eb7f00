#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;
use storefront_api::{
    app_router,
    auth::{AuthConfig, AuthService},
    commands::orders::CreateOrderCommand,
    config::AppConfig,
    db::{self, DbConfig, DbPool},
    entities::{courier, order, product, promo, user, user_location},
    errors::ServiceError,
    events::{self, EventSender},
    handlers::AppServices,
    services::{
        accounts::NewLocation, catalog::NewProduct, promos::NewPromo, PdfReceiptRenderer,
    },
    AppState,
};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "q8Zr2mVx7LpT4nWc9yHk3sJd6fGb1aQe5uRt0oPi8lKj2hGf4dSa6zXc9vBn3mQw";

static PHONE_SEQ: AtomicU32 = AtomicU32::new(1);

fn next_phone() -> String {
    format!("+99655{:06}", PHONE_SEQ.fetch_add(1, Ordering::SeqCst))
}

/// Application state over a fresh SQLite database.
///
/// [`TestApp::new`] uses an in-memory database behind a single connection, so
/// concurrent callers queue on it. [`TestApp::new_shared`] puts the database in
/// a temporary file behind several connections, so racing transactions really
/// interleave.
pub struct TestApp {
    pub state: AppState,
    router: Router,
    _event_task: tokio::task::JoinHandle<()>,
    _dir: Option<TempDir>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::build("sqlite::memory:".to_string(), 1, None).await
    }

    pub async fn new_shared() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("store.db").display());
        Self::build(url, 4, Some(dir)).await
    }

    async fn build(url: String, connections: u32, dir: Option<TempDir>) -> Self {
        let mut cfg = AppConfig::new(
            url,
            TEST_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = connections;
        cfg.db_min_connections = 1;

        let db_cfg = DbConfig {
            url: cfg.database_url.clone(),
            max_connections: connections,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            ..DbConfig::default()
        };
        let pool = db::establish_connection_with_config(&db_cfg)
            .await
            .expect("test database");
        db::run_migrations(&pool).await.expect("migrations apply");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth = Arc::new(AuthService::new(AuthConfig::new(
            cfg.jwt_secret.clone(),
            Duration::from_secs(3600),
        )));
        let services = AppServices::new(
            db_arc.clone(),
            event_sender.clone(),
            &cfg,
            Arc::new(PdfReceiptRenderer),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            auth,
            services,
        };
        let router = app_router(state.clone());

        Self {
            state,
            router,
            _event_task: event_task,
            _dir: dir,
        }
    }

    pub fn services(&self) -> &AppServices {
        &self.state.services
    }

    pub fn db(&self) -> &DbPool {
        &self.state.db
    }

    pub fn token_for(&self, user: &user::Model) -> String {
        self.state
            .auth
            .issue_token(user.id, &user.phone, user.is_superuser)
            .expect("token issued")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("serialize request body"))
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("router response")
    }

    pub async fn seed_user(&self, name: &str, is_superuser: bool) -> user::Model {
        self.services()
            .accounts
            .create_user(name, &next_phone(), is_superuser)
            .await
            .expect("seed user")
    }

    pub async fn seed_location(&self, user_id: Uuid, address: &str) -> user_location::Model {
        self.services()
            .accounts
            .add_location(
                user_id,
                NewLocation {
                    address: Some(address.to_string()),
                    latitude: Some("42.8746".into()),
                    longitude: Some("74.5698".into()),
                    floor: Some("3".into()),
                    apartment: Some("12".into()),
                },
            )
            .await
            .expect("seed location")
    }

    pub async fn seed_product(
        &self,
        name: &str,
        unit_price: Decimal,
        discount_percent: i32,
        quantity_on_hand: i32,
    ) -> product::Model {
        self.services()
            .catalog
            .create_product(NewProduct {
                name: name.to_string(),
                unit_price,
                discount_percent,
                quantity_on_hand,
            })
            .await
            .expect("seed product")
    }

    pub async fn seed_cart_item(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Uuid {
        self.services()
            .cart
            .add_item(user_id, product_id, quantity)
            .await
            .expect("seed cart item")
            .item
            .id
    }

    pub async fn seed_promo(
        &self,
        owner_id: Uuid,
        code: &str,
        discount_percent: i32,
        min_qualifying_amount: Decimal,
        expiry_date: Option<NaiveDate>,
    ) -> promo::Model {
        self.services()
            .promos
            .create_promo(
                owner_id,
                NewPromo {
                    code: code.to_string(),
                    description: None,
                    discount_percent,
                    min_qualifying_amount,
                    expiry_date,
                },
            )
            .await
            .expect("seed promo")
    }

    pub async fn seed_courier(&self, user_id: Uuid, group_role: Option<&str>) -> courier::Model {
        self.services()
            .couriers
            .create_courier(user_id, next_phone(), group_role.map(str::to_string))
            .await
            .expect("seed courier")
    }

    pub async fn place_order(
        &self,
        user_id: Uuid,
        item_ids: Vec<Uuid>,
        promo_code: Option<&str>,
    ) -> Result<order::Model, ServiceError> {
        self.services()
            .orders
            .create_order(CreateOrderCommand {
                user_id,
                item_ids,
                promo_code: promo_code.map(str::to_string),
                location_id: None,
                file_attachment: None,
            })
            .await
    }

    pub async fn stock_of(&self, product_id: Uuid) -> i32 {
        self.services()
            .inventory
            .available(product_id)
            .await
            .expect("product stock")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}
