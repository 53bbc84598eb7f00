use crate::{
    entities::{cart_item, product, CartItem, Product},
    errors::ServiceError,
    events::{Event, EventSender},
    services::pricing,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Largest quantity a single cart row may hold
pub const MAX_ITEM_QUANTITY: i32 = 10_000;

/// A cart row with its product and priced line amount.
///
/// `product` is `None` once the product was deleted; such rows price at zero.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub item: cart_item::Model,
    pub product: Option<product::Model>,
    pub line_amount: Decimal,
}

impl CartLine {
    fn price(item: cart_item::Model, product: Option<product::Model>) -> Self {
        let line_amount = product.as_ref().map_or(Decimal::ZERO, |p| {
            pricing::line_amount(p.unit_price, p.discount_percent, item.quantity)
        });
        Self {
            item,
            product,
            line_amount,
        }
    }
}

/// Per-user cart of not-yet-ordered items.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Adds a product, merging into an existing open row for the same product.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartLine, ServiceError> {
        ensure_quantity(quantity)?;

        let product = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let existing = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .filter(cart_item::Column::IsOrdered.eq(false))
            .one(&*self.db)
            .await?;

        let item = match existing {
            Some(row) => {
                let merged = row
                    .quantity
                    .checked_add(quantity)
                    .filter(|q| *q <= MAX_ITEM_QUANTITY)
                    .ok_or_else(quantity_too_large)?;
                let mut active: cart_item::ActiveModel = row.into();
                active.quantity = Set(merged);
                active.update(&*self.db).await?
            }
            None => {
                cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    product_id: Set(Some(product_id)),
                    quantity: Set(quantity),
                    is_ordered: Set(false),
                    created_at: Set(Utc::now()),
                }
                .insert(&*self.db)
                .await?
            }
        };

        info!(user_id = %user_id, item_id = %item.id, quantity = item.quantity, "Cart item saved");
        self.event_sender
            .send_or_log(Event::CartItemAdded {
                user_id,
                item_id: item.id,
                product_id,
                quantity,
            })
            .await;

        Ok(CartLine::price(item, Some(product)))
    }

    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<CartLine, ServiceError> {
        ensure_quantity(quantity)?;

        let row = self.open_item(user_id, item_id).await?;
        let mut active: cart_item::ActiveModel = row.into();
        active.quantity = Set(quantity);
        let item = active.update(&*self.db).await?;

        let product = match item.product_id {
            Some(pid) => Product::find_by_id(pid).one(&*self.db).await?,
            None => None,
        };
        Ok(CartLine::price(item, product))
    }

    /// Deletes one open row owned by the user.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<(), ServiceError> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::Id.eq(item_id))
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::IsOrdered.eq(false))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Cart item {} not found",
                item_id
            )));
        }

        self.event_sender
            .send_or_log(Event::CartItemRemoved { user_id, item_id })
            .await;
        Ok(())
    }

    /// Deletes every open row of the user and returns how many went.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::IsOrdered.eq(false))
            .exec(&*self.db)
            .await?;

        info!(user_id = %user_id, removed = result.rows_affected, "Cart cleared");
        self.event_sender
            .send_or_log(Event::CartCleared {
                user_id,
                removed: result.rows_affected,
            })
            .await;
        Ok(result.rows_affected)
    }

    /// Open rows of the user, oldest first, each priced from the current catalog.
    pub async fn list_items(&self, user_id: Uuid) -> Result<Vec<CartLine>, ServiceError> {
        let rows = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::IsOrdered.eq(false))
            .order_by_asc(cart_item::Column::CreatedAt)
            .find_also_related(Product)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(item, product)| CartLine::price(item, product))
            .collect())
    }

    pub async fn total(&self, user_id: Uuid) -> Result<Decimal, ServiceError> {
        let lines = self.list_items(user_id).await?;
        Ok(pricing::cart_total(lines.iter().map(|l| l.line_amount)))
    }

    async fn open_item(&self, user_id: Uuid, item_id: Uuid) -> Result<cart_item::Model, ServiceError> {
        CartItem::find_by_id(item_id)
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::IsOrdered.eq(false))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", item_id)))
    }
}

fn ensure_quantity(quantity: i32) -> Result<(), ServiceError> {
    if quantity < 1 {
        return Err(ServiceError::ValidationError(
            "quantity must be at least 1".into(),
        ));
    }
    if quantity > MAX_ITEM_QUANTITY {
        return Err(quantity_too_large());
    }
    Ok(())
}

fn quantity_too_large() -> ServiceError {
    ServiceError::ValidationError(format!(
        "quantity cannot exceed {} per cart item",
        MAX_ITEM_QUANTITY
    ))
}
