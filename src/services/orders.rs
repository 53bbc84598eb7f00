use crate::{
    commands::{orders::CreateOrderCommand, Command},
    entities::{
        courier,
        order::{self, OrderStatus},
        promo, Courier, Order, Promo,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    metrics::{CONCURRENCY_CONFLICTS, ORDERS_DELIVERED, ORDER_TRANSITIONS},
    models::{OrderLifecycle, Transition},
    services::pricing,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// The authenticated caller of an order operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub is_superuser: bool,
}

impl Actor {
    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_superuser: false,
        }
    }

    pub fn superuser(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_superuser: true,
        }
    }
}

/// Order queries and lifecycle transitions.
///
/// Transitions are written with an optimistic `version` check; a writer that
/// loses the race gets `ConcurrentModification` and nothing is stored.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Checks out the user's cart through [`CreateOrderCommand`].
    pub async fn create_order(
        &self,
        command: CreateOrderCommand,
    ) -> Result<order::Model, ServiceError> {
        command
            .execute(self.db.clone(), self.event_sender.clone())
            .await
    }

    /// An order visible to the actor: its owner, its courier, or a superuser.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, actor: Actor, order_id: Uuid) -> Result<order::Model, ServiceError> {
        let order = self.find(order_id).await?;
        if actor.is_superuser || order.user_id == actor.user_id {
            return Ok(order);
        }

        match (order.courier_id, self.courier_of(actor.user_id).await?) {
            (Some(assigned), Some(own)) if assigned == own.id => Ok(order),
            _ => Err(not_found(order_id)),
        }
    }

    /// The actor's own orders, or every order for a superuser. Newest first.
    pub async fn list_orders(&self, actor: Actor) -> Result<Vec<order::Model>, ServiceError> {
        let mut query = Order::find().order_by_desc(order::Column::CreatedAt);
        if !actor.is_superuser {
            query = query.filter(order::Column::UserId.eq(actor.user_id));
        }
        Ok(query.all(&*self.db).await?)
    }

    /// Recomputes the total from the frozen snapshot.
    ///
    /// If the order's promo no longer resolves the undiscounted total is
    /// returned.
    pub async fn order_total(&self, order: &order::Model) -> Result<Decimal, ServiceError> {
        let discount = match &order.promo_code {
            Some(code) => Promo::find()
                .filter(promo::Column::Code.eq(code.as_str()))
                .one(&*self.db)
                .await?
                .map(|p| p.discount_percent),
            None => None,
        };
        Ok(pricing::order_total(&order.items_snapshot, discount))
    }

    /// Attaches a courier. Only superusers may assign.
    #[instrument(skip(self), fields(order_id = %order_id, courier_id = %courier_id))]
    pub async fn assign_courier(
        &self,
        actor: Actor,
        order_id: Uuid,
        courier_id: Uuid,
    ) -> Result<order::Model, ServiceError> {
        if !actor.is_superuser {
            return Err(ServiceError::Forbidden(
                "only administrators can assign couriers".into(),
            ));
        }

        Courier::find_by_id(courier_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Courier {} not found", courier_id)))?;

        let order = self.find(order_id).await?;
        let now = Utc::now();
        let mut lifecycle = OrderLifecycle::of(&order);
        let transition = lifecycle.assign_courier(courier_id, now);
        let updated = self.persist(order, &lifecycle, now).await?;

        info!(
            order_id = %order_id,
            courier_id = %courier_id,
            status = %updated.status,
            "Courier assigned"
        );
        self.event_sender
            .send_or_log(Event::CourierAssigned {
                order_id,
                courier_id,
                assigned_at: updated.assigned_at,
            })
            .await;
        self.announce(&updated, transition).await;
        Ok(updated)
    }

    /// Marks an order delivered. Allowed for the assigned courier and superusers.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn set_delivered(&self, actor: Actor, order_id: Uuid) -> Result<order::Model, ServiceError> {
        let order = self.find(order_id).await?;
        self.ensure_assigned_courier(actor, &order).await?;

        let now = Utc::now();
        let mut lifecycle = OrderLifecycle::of(&order);
        let transition = lifecycle.mark_delivered(now);
        let updated = self.persist(order, &lifecycle, now).await?;

        self.announce(&updated, transition).await;
        Ok(updated)
    }

    /// Explicit status assignment, superusers only. Nothing leaves `delivered`.
    #[instrument(skip(self), fields(order_id = %order_id, status = %status))]
    pub async fn set_status(
        &self,
        actor: Actor,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        if !actor.is_superuser {
            return Err(ServiceError::Forbidden(
                "only administrators can set order status".into(),
            ));
        }

        let order = self.find(order_id).await?;
        let now = Utc::now();
        let mut lifecycle = OrderLifecycle::of(&order);
        let transition = lifecycle.set_status(status, now)?;
        let updated = self.persist(order, &lifecycle, now).await?;

        self.announce(&updated, transition).await;
        Ok(updated)
    }

    /// Hard-deletes an order. Stock and promo redemptions are not restored.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn delete_order(&self, actor: Actor, order_id: Uuid) -> Result<(), ServiceError> {
        let order = self.find(order_id).await?;
        if !actor.is_superuser && order.user_id != actor.user_id {
            return Err(not_found(order_id));
        }

        Order::delete_by_id(order_id).exec(&*self.db).await?;
        info!(order_id = %order_id, "Order deleted");
        self.event_sender
            .send_or_log(Event::OrderDeleted(order_id))
            .await;
        Ok(())
    }

    async fn find(&self, order_id: Uuid) -> Result<order::Model, ServiceError> {
        Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| not_found(order_id))
    }

    async fn courier_of(&self, user_id: Uuid) -> Result<Option<courier::Model>, ServiceError> {
        Ok(Courier::find()
            .filter(courier::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?)
    }

    async fn ensure_assigned_courier(
        &self,
        actor: Actor,
        order: &order::Model,
    ) -> Result<(), ServiceError> {
        if actor.is_superuser {
            return Ok(());
        }
        let own = self.courier_of(actor.user_id).await?;
        match (own, order.courier_id) {
            (Some(courier), Some(assigned)) if courier.id == assigned => Ok(()),
            _ => {
                warn!(order_id = %order.id, user_id = %actor.user_id, "Delivery refused");
                Err(ServiceError::Forbidden(
                    "only the assigned courier can deliver this order".into(),
                ))
            }
        }
    }

    /// Writes the lifecycle fields if the stored version is still the one read.
    async fn persist(
        &self,
        order: order::Model,
        lifecycle: &OrderLifecycle,
        now: DateTime<Utc>,
    ) -> Result<order::Model, ServiceError> {
        let mut changes = order::ActiveModel {
            version: Set(order.version + 1),
            updated_at: Set(now),
            ..Default::default()
        };
        lifecycle.write_to(&mut changes);

        let result = Order::update_many()
            .set(changes)
            .filter(order::Column::Id.eq(order.id))
            .filter(order::Column::Version.eq(order.version))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            CONCURRENCY_CONFLICTS.inc();
            warn!(order_id = %order.id, version = order.version, "Order version conflict");
            return Err(ServiceError::ConcurrentModification(order.id));
        }

        Ok(order::Model {
            status: lifecycle.status,
            courier_id: lifecycle.courier_id,
            assigned_at: lifecycle.assigned_at,
            delivered_at: lifecycle.delivered_at,
            version: order.version + 1,
            updated_at: now,
            ..order
        })
    }

    async fn announce(&self, order: &order::Model, transition: Transition) {
        if !transition.changed() {
            return;
        }
        let order_id = order.id;

        ORDER_TRANSITIONS
            .with_label_values(&[transition.to.to_string().as_str()])
            .inc();
        info!(
            order_id = %order_id,
            from = %transition.from,
            to = %transition.to,
            "Order status changed"
        );
        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status: transition.from.to_string(),
                new_status: transition.to.to_string(),
            })
            .await;

        if transition.to == OrderStatus::Delivered {
            ORDERS_DELIVERED.inc();
            self.event_sender
                .send_or_log(Event::OrderDelivered {
                    order_id,
                    delivered_at: order.delivered_at.unwrap_or(order.updated_at),
                })
                .await;
        }
    }
}

fn not_found(order_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("Order {} not found", order_id))
}
