pub mod cart;
pub mod couriers;
pub mod health;
pub mod locations;
pub mod orders;
pub mod products;
pub mod promos;

use crate::{
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services::{
        AccountService, CartService, CatalogService, CourierService, InventoryService,
        OrderService, PromoService, ReceiptRenderer, ReceiptService,
    },
};
use std::sync::Arc;

pub use crate::AppState;

/// Every service the HTTP layer calls, built once at startup.
#[derive(Clone)]
pub struct AppServices {
    pub accounts: Arc<AccountService>,
    pub catalog: Arc<CatalogService>,
    pub inventory: Arc<InventoryService>,
    pub cart: Arc<CartService>,
    pub promos: Arc<PromoService>,
    pub couriers: Arc<CourierService>,
    pub orders: Arc<OrderService>,
    pub receipts: Arc<ReceiptService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        config: &AppConfig,
        renderer: Arc<dyn ReceiptRenderer>,
    ) -> Self {
        let orders = OrderService::new(db_pool.clone(), event_sender.clone());
        let receipts = ReceiptService::new(db_pool.clone(), orders.clone(), renderer);

        Self {
            accounts: Arc::new(AccountService::new(db_pool.clone())),
            catalog: Arc::new(CatalogService::new(db_pool.clone())),
            inventory: Arc::new(InventoryService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            cart: Arc::new(CartService::new(db_pool.clone(), event_sender.clone())),
            promos: Arc::new(PromoService::new(
                db_pool.clone(),
                event_sender.clone(),
                config.promo_min_amount_floor,
            )),
            couriers: Arc::new(CourierService::new(db_pool, event_sender)),
            orders: Arc::new(orders),
            receipts: Arc::new(receipts),
        }
    }
}
