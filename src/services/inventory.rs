//! Stock reservation against `products.quantity_on_hand`.
//!
//! A reservation is a single conditional `UPDATE ... WHERE quantity_on_hand >= q`,
//! so the check and the decrement cannot be separated by a concurrent writer.
//! When no row matches, the product is re-read only to report what is left.

use crate::{
    entities::{product, Product},
    errors::ServiceError,
    events::{Event, EventSender},
    metrics::STOCK_REJECTIONS,
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Reserves stock outside of any caller transaction.
    #[instrument(skip(self))]
    pub async fn reserve(&self, product_id: Uuid, quantity: i32) -> Result<i32, ServiceError> {
        let remaining = Self::reserve_in(&*self.db, product_id, quantity).await?;
        self.event_sender
            .send_or_log(Event::InventoryReserved {
                product_id,
                quantity,
                remaining,
            })
            .await;
        Ok(remaining)
    }

    /// Atomically decrements stock by `quantity` and returns the remainder.
    ///
    /// Fails with `InsufficientStock` without touching the row when less than
    /// `quantity` is on hand.
    pub async fn reserve_in<C: ConnectionTrait>(
        conn: &C,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<i32, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "reservation quantity must be at least 1".into(),
            ));
        }

        let result = Product::update_many()
            .col_expr(
                product::Column::QuantityOnHand,
                Expr::col(product::Column::QuantityOnHand).sub(quantity),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Some(Utc::now())))
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::QuantityOnHand.gte(quantity))
            .exec(conn)
            .await?;

        let current = Product::find_by_id(product_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        if result.rows_affected == 0 {
            STOCK_REJECTIONS.inc();
            warn!(
                product_id = %product_id,
                requested = quantity,
                available = current.quantity_on_hand,
                "Stock reservation rejected"
            );
            return Err(ServiceError::InsufficientStock {
                product: current.name,
                available: current.quantity_on_hand,
            });
        }

        Ok(current.quantity_on_hand)
    }

    #[instrument(skip(self))]
    pub async fn restock(&self, product_id: Uuid, quantity: i32) -> Result<i32, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "restock quantity must be at least 1".into(),
            ));
        }

        let result = Product::update_many()
            .col_expr(
                product::Column::QuantityOnHand,
                Expr::col(product::Column::QuantityOnHand).add(quantity),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Some(Utc::now())))
            .filter(product::Column::Id.eq(product_id))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                product_id
            )));
        }

        let on_hand = self.available(product_id).await?;
        info!(product_id = %product_id, quantity, on_hand, "Product restocked");
        self.event_sender
            .send_or_log(Event::InventoryRestocked {
                product_id,
                quantity,
            })
            .await;
        Ok(on_hand)
    }

    pub async fn available(&self, product_id: Uuid) -> Result<i32, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .map(|p| p.quantity_on_hand)
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }
}
