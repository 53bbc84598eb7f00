use crate::{
    commands::Command,
    db::DbPool,
    entities::{
        cart_item,
        order::{self, ItemSnapshot, ItemsSnapshot, LocationSnapshot},
        order_cart_item, product, user_location, CartItem, OrderCartItem, Product,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    metrics::{ORDERS_CREATED, ORDER_CREATION_FAILURES, STOCK_REJECTIONS},
    models::OrderLifecycle,
    services::{
        accounts::AccountService,
        inventory::InventoryService,
        pricing,
        promos::{self, PromoService},
    },
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Extensions accepted for an order attachment
pub const ALLOWED_ATTACHMENT_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg"];

/// Turns a set of the user's cart items into an order.
///
/// Location, items, stock and promo are all resolved and checked before the
/// first write; the writes (promo redemption, stock decrements, cart
/// consumption, order row and its links) share one transaction.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderCommand {
    pub user_id: Uuid,
    #[validate(length(min = 1, message = "At least one cart item is required"))]
    pub item_ids: Vec<Uuid>,
    #[validate(length(min = 1, max = 8))]
    pub promo_code: Option<String>,
    pub location_id: Option<Uuid>,
    #[validate(length(max = 255), custom = "validate_attachment")]
    pub file_attachment: Option<String>,
}

fn validate_attachment(name: &str) -> Result<(), ValidationError> {
    let extension = name
        .rsplit_once('.')
        .map(|(stem, ext)| (stem.trim(), ext.to_ascii_lowercase()));
    match extension {
        Some((stem, ext))
            if !stem.is_empty() && ALLOWED_ATTACHMENT_EXTENSIONS.contains(&ext.as_str()) =>
        {
            Ok(())
        }
        _ => {
            let mut err = ValidationError::new("file_extension");
            err.message = Some("attachment must be a pdf, png, jpg or jpeg file".into());
            Err(err)
        }
    }
}

/// A product reserved by the order, with the quantity summed over its cart rows
#[derive(Debug, Clone)]
struct Reservation {
    product: product::Model,
    quantity: i32,
}

/// What the transaction produced, for post-commit events
struct Placed {
    order: order::Model,
    promo_id: Option<Uuid>,
    reserved: Vec<(Uuid, i32, i32)>,
}

#[async_trait::async_trait]
impl Command for CreateOrderCommand {
    type Result = order::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(user_id = %self.user_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            ORDER_CREATION_FAILURES.inc();
            let msg = format!("Invalid input: {}", e);
            error!("{}", msg);
            ServiceError::ValidationError(msg)
        })?;

        let placed = match self.place_order(db_pool.as_ref()).await {
            Ok(placed) => placed,
            Err(e) => {
                ORDER_CREATION_FAILURES.inc();
                error!(error = %e, "Order creation failed");
                return Err(e);
            }
        };

        ORDERS_CREATED.inc();
        self.publish(&event_sender, &placed).await;
        Ok(placed.order)
    }
}

impl CreateOrderCommand {
    async fn place_order(&self, db: &DbPool) -> Result<Placed, ServiceError> {
        let command = self.clone();

        db.transaction::<_, Placed, ServiceError>(move |txn| {
            Box::pin(async move { command.place_in(txn).await })
        })
        .await
        .map_err(|e| match e {
            TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
            TransactionError::Transaction(service_err) => service_err,
        })
    }

    async fn place_in(&self, txn: &DatabaseTransaction) -> Result<Placed, ServiceError> {
        let location = self.resolve_location(txn).await?;
        let rows = self.resolve_items(txn).await?;

        let mut lines = Vec::with_capacity(rows.len());
        let mut reservations: Vec<Reservation> = Vec::new();
        for (item, product) in &rows {
            lines.push(ItemSnapshot {
                product_id: product.id,
                product_name: product.name.clone(),
                quantity: item.quantity,
                unit_price: product.unit_price,
                discount_percent: product.discount_percent,
                line_amount: pricing::line_amount(
                    product.unit_price,
                    product.discount_percent,
                    item.quantity,
                ),
            });

            match reservations.iter_mut().find(|r| r.product.id == product.id) {
                Some(existing) => {
                    existing.quantity =
                        existing.quantity.checked_add(item.quantity).ok_or_else(|| {
                            ServiceError::ValidationError(format!(
                                "requested quantity of {} is too large",
                                product.name
                            ))
                        })?
                }
                None => reservations.push(Reservation {
                    product: product.clone(),
                    quantity: item.quantity,
                }),
            }
        }

        for reservation in &reservations {
            if reservation.quantity > reservation.product.quantity_on_hand {
                STOCK_REJECTIONS.inc();
                return Err(ServiceError::InsufficientStock {
                    product: reservation.product.name.clone(),
                    available: reservation.product.quantity_on_hand,
                });
            }
        }

        let items = ItemsSnapshot(lines);
        let subtotal = pricing::snapshot_subtotal(&items);

        let promo = match &self.promo_code {
            Some(code) => {
                let promo = PromoService::lookup_in(txn, code).await?;
                let already = PromoService::has_redeemed_in(txn, promo.id, self.user_id).await?;
                promos::validate_for_redemption(
                    &promo,
                    already,
                    subtotal,
                    Utc::now().date_naive(),
                )?;
                Some(promo)
            }
            None => None,
        };
        let total = match &promo {
            Some(p) => pricing::apply_promo(subtotal, p.discount_percent),
            None => subtotal,
        };

        // Every check has passed; from here on only writes.
        if let Some(promo) = &promo {
            PromoService::redeem_in(txn, promo, self.user_id).await?;
        }

        let mut reserved = Vec::with_capacity(reservations.len());
        for reservation in &reservations {
            let remaining =
                InventoryService::reserve_in(txn, reservation.product.id, reservation.quantity)
                    .await?;
            reserved.push((reservation.product.id, reservation.quantity, remaining));
        }

        let item_ids: Vec<Uuid> = rows.iter().map(|(item, _)| item.id).collect();
        CartItem::update_many()
            .col_expr(cart_item::Column::IsOrdered, Expr::value(true))
            .filter(cart_item::Column::Id.is_in(item_ids.clone()))
            .exec(txn)
            .await?;

        let now = Utc::now();
        let mut model = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(self.user_id),
            location_snapshot: Set(location),
            items_snapshot: Set(items),
            promo_code: Set(promo.as_ref().map(|p| p.code.clone())),
            subtotal_amount: Set(subtotal),
            total_amount: Set(total),
            file_attachment: Set(self.file_attachment.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            version: Set(1),
            ..Default::default()
        };
        OrderLifecycle::new().write_to(&mut model);
        let order = model.insert(txn).await?;

        OrderCartItem::insert_many(item_ids.into_iter().map(|cart_item_id| {
            order_cart_item::ActiveModel {
                order_id: Set(order.id),
                cart_item_id: Set(cart_item_id),
            }
        }))
        .exec_without_returning(txn)
        .await?;

        Ok(Placed {
            promo_id: promo.map(|p| p.id),
            order,
            reserved,
        })
    }

    async fn resolve_location(
        &self,
        txn: &DatabaseTransaction,
    ) -> Result<LocationSnapshot, ServiceError> {
        let location = match self.location_id {
            Some(id) => AccountService::owned_location_in(txn, self.user_id, id).await?,
            None => AccountService::latest_location_in(txn, self.user_id)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(
                        "no delivery location on file; add a location first".into(),
                    )
                })?,
        };
        Ok(snapshot_location(location))
    }

    /// The requested cart rows, restricted to the user's open rows, oldest first.
    async fn resolve_items(
        &self,
        txn: &DatabaseTransaction,
    ) -> Result<Vec<(cart_item::Model, product::Model)>, ServiceError> {
        let mut wanted = self.item_ids.clone();
        wanted.sort_unstable();
        wanted.dedup();

        let rows = CartItem::find()
            .filter(cart_item::Column::Id.is_in(wanted.clone()))
            .filter(cart_item::Column::UserId.eq(self.user_id))
            .filter(cart_item::Column::IsOrdered.eq(false))
            .order_by_asc(cart_item::Column::CreatedAt)
            .find_also_related(Product)
            .all(txn)
            .await?;

        if rows.len() != wanted.len() {
            return Err(ServiceError::NotFound(format!(
                "Cart items not found: {} of {} requested items are available",
                rows.len(),
                wanted.len()
            )));
        }

        rows.into_iter()
            .map(|(item, product)| match product {
                Some(product) => Ok((item, product)),
                None => Err(ServiceError::NotFound(format!(
                    "Product for cart item {} no longer exists",
                    item.id
                ))),
            })
            .collect()
    }

    async fn publish(&self, event_sender: &EventSender, placed: &Placed) {
        let order = &placed.order;
        info!(
            order_id = %order.id,
            user_id = %self.user_id,
            items_count = order.items_snapshot.lines().len(),
            total_amount = %order.total_amount,
            "Order created successfully"
        );

        if let Some(promo_id) = placed.promo_id {
            event_sender
                .send_or_log(Event::PromoRedeemed {
                    promo_id,
                    user_id: self.user_id,
                })
                .await;
        }
        for &(product_id, quantity, remaining) in &placed.reserved {
            event_sender
                .send_or_log(Event::InventoryReserved {
                    product_id,
                    quantity,
                    remaining,
                })
                .await;
        }
        event_sender
            .send_or_log(Event::OrderCreated {
                order_id: order.id,
                user_id: self.user_id,
                total_amount: order.total_amount,
            })
            .await;
    }
}

fn snapshot_location(location: user_location::Model) -> LocationSnapshot {
    LocationSnapshot {
        address: location.address,
        latitude: location.latitude,
        longitude: location.longitude,
        floor: location.floor,
        apartment: location.apartment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn command(file: Option<&str>, promo: Option<&str>, items: usize) -> CreateOrderCommand {
        CreateOrderCommand {
            user_id: Uuid::new_v4(),
            item_ids: (0..items).map(|_| Uuid::new_v4()).collect(),
            promo_code: promo.map(str::to_string),
            location_id: None,
            file_attachment: file.map(str::to_string),
        }
    }

    #[rstest]
    #[case("invoice.pdf")]
    #[case("photo.JPG")]
    #[case("scan.jpeg")]
    #[case("map.png")]
    fn accepts_known_attachment_types(#[case] name: &str) {
        assert!(command(Some(name), None, 1).validate().is_ok());
    }

    #[rstest]
    #[case("payload.exe")]
    #[case("README")]
    #[case(".pdf")]
    fn rejects_other_attachments(#[case] name: &str) {
        assert!(command(Some(name), None, 1).validate().is_err());
    }

    #[test]
    fn requires_items_and_short_codes() {
        assert!(command(None, None, 0).validate().is_err());
        assert!(command(None, Some("TOOLONGCODE"), 1).validate().is_err());
        assert!(command(None, Some("SAVE10"), 2).validate().is_ok());
    }
}
