//! Storefront API Library
//!
//! Order lifecycle and pricing backend: carts, promo codes, courier dispatch
//! and PDF receipts behind an axum HTTP surface.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod commands;
pub mod config;
pub mod db;
pub mod dto;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod metrics;
pub mod middleware_helpers;
pub mod models;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    extract::FromRef,
    response::Json,
    routing::{get, patch, post, put},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::AuthService;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub auth: Arc<AuthService>,
    pub services: handlers::AppServices,
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}


/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Routes mounted under `/api/v1`; every one of them requires a bearer token.
pub fn api_v1_routes() -> Router<AppState> {
    let cart = Router::new()
        .route(
            "/cart/items",
            get(handlers::cart::list_items)
                .post(handlers::cart::add_item)
                .delete(handlers::cart::clear),
        )
        .route(
            "/cart/items/:id",
            patch(handlers::cart::update_item).delete(handlers::cart::remove_item),
        );

    let promos = Router::new()
        .route("/promos", post(handlers::promos::create_promo))
        .route("/promos/check", post(handlers::promos::check_promo))
        .route("/promos/:code/expire", post(handlers::promos::expire_promo));

    let orders = Router::new()
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route(
            "/orders/:id",
            get(handlers::orders::get_order).delete(handlers::orders::delete_order),
        )
        .route("/orders/:id/courier", post(handlers::orders::assign_courier))
        .route("/orders/:id/deliver", post(handlers::orders::deliver_order))
        .route("/orders/:id/status", post(handlers::orders::set_status))
        .route("/orders/:id/receipt", get(handlers::orders::download_receipt));

    let couriers = Router::new()
        .route("/couriers", post(handlers::couriers::create_courier))
        .route("/couriers/me/orders", get(handlers::couriers::my_orders))
        .route("/couriers/:id", put(handlers::couriers::update_courier));

    let locations = Router::new().route(
        "/locations",
        get(handlers::locations::list_locations).post(handlers::locations::create_location),
    );

    let products = Router::new()
        .route("/products", post(handlers::products::create_product))
        .route("/products/:id", get(handlers::products::get_product))
        .route("/products/:id/restock", post(handlers::products::restock));

    Router::new()
        .merge(cart)
        .merge(promos)
        .merge(orders)
        .merge(couriers)
        .merge(locations)
        .merge(products)
}

/// Full application router: health, metrics, OpenAPI document and the v1 API,
/// with request ids and HTTP tracing applied.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::metrics))
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        .nest("/api/v1", api_v1_routes())
        .layer(crate::tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}
