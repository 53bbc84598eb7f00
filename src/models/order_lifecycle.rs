use crate::entities::order::{self, OrderStatus};
use crate::errors::ServiceError;
use chrono::{DateTime, Utc};
use sea_orm::Set;
use uuid::Uuid;

/// Fulfilment state of an order and the rules for moving it forward.
///
/// `assigned_at` is stamped by the first courier assignment only and
/// `delivered_at` by the first delivery only; repeating either operation
/// never rewrites a timestamp. Nothing leaves `delivered`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLifecycle {
    pub status: OrderStatus,
    pub courier_id: Option<Uuid>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Status before and after an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

impl Default for OrderLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderLifecycle {
    /// State of a freshly created order.
    pub fn new() -> Self {
        Self {
            status: OrderStatus::Preparing,
            courier_id: None,
            assigned_at: None,
            delivered_at: None,
        }
    }

    pub fn of(order: &order::Model) -> Self {
        Self {
            status: order.status,
            courier_id: order.courier_id,
            assigned_at: order.assigned_at,
            delivered_at: order.delivered_at,
        }
    }

    /// Attaches a courier. The first attachment stamps `assigned_at` and moves
    /// a preparing order out for delivery.
    pub fn assign_courier(&mut self, courier_id: Uuid, now: DateTime<Utc>) -> Transition {
        let from = self.status;
        self.courier_id = Some(courier_id);

        if self.assigned_at.is_none() {
            self.assigned_at = Some(now);
            if self.status == OrderStatus::Preparing {
                self.status = OrderStatus::OutForDelivery;
            }
        }

        Transition {
            from,
            to: self.status,
        }
    }

    pub fn mark_delivered(&mut self, now: DateTime<Utc>) -> Transition {
        let from = self.status;
        self.status = OrderStatus::Delivered;
        if self.delivered_at.is_none() {
            self.delivered_at = Some(now);
        }

        Transition {
            from,
            to: self.status,
        }
    }

    /// Explicit status assignment for administrators.
    pub fn set_status(
        &mut self,
        target: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Transition, ServiceError> {
        match (self.status, target) {
            (_, OrderStatus::Delivered) => Ok(self.mark_delivered(now)),
            (OrderStatus::Delivered, _) => Err(ServiceError::InvalidOperation(format!(
                "a delivered order cannot move back to {}",
                target
            ))),
            (from, to) => {
                self.status = to;
                Ok(Transition { from, to })
            }
        }
    }

    /// Copies the lifecycle fields onto an active model for persistence.
    pub fn write_to(&self, model: &mut order::ActiveModel) {
        model.status = Set(self.status);
        model.courier_id = Set(self.courier_id);
        model.assigned_at = Set(self.assigned_at);
        model.delivered_at = Set(self.delivered_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;

    #[test]
    fn first_assignment_stamps_and_dispatches() {
        let now = Utc::now();
        let courier = Uuid::new_v4();
        let mut lifecycle = OrderLifecycle::new();

        let transition = lifecycle.assign_courier(courier, now);

        assert!(transition.changed());
        assert_eq!(lifecycle.status, OrderStatus::OutForDelivery);
        assert_eq!(lifecycle.courier_id, Some(courier));
        assert_eq!(lifecycle.assigned_at, Some(now));
    }

    #[test]
    fn reassignment_keeps_original_timestamp() {
        let first = Utc::now();
        let later = first + Duration::minutes(30);
        let replacement = Uuid::new_v4();
        let mut lifecycle = OrderLifecycle::new();

        lifecycle.assign_courier(Uuid::new_v4(), first);
        let transition = lifecycle.assign_courier(replacement, later);

        assert!(!transition.changed());
        assert_eq!(lifecycle.assigned_at, Some(first));
        assert_eq!(lifecycle.courier_id, Some(replacement));
    }

    #[test]
    fn assignment_after_delivery_never_moves_backward() {
        let now = Utc::now();
        let mut lifecycle = OrderLifecycle::new();
        lifecycle.mark_delivered(now);

        lifecycle.assign_courier(Uuid::new_v4(), now + Duration::minutes(5));

        assert_eq!(lifecycle.status, OrderStatus::Delivered);
        assert!(lifecycle.assigned_at.is_some());
    }

    #[test]
    fn delivery_is_stamped_once() {
        let first = Utc::now();
        let mut lifecycle = OrderLifecycle::new();

        let transition = lifecycle.mark_delivered(first);
        assert_eq!(transition.from, OrderStatus::Preparing);
        assert_eq!(lifecycle.delivered_at, Some(first));

        let again = lifecycle.mark_delivered(first + Duration::hours(1));
        assert!(!again.changed());
        assert_eq!(lifecycle.delivered_at, Some(first));
    }

    #[test]
    fn set_status_refuses_to_leave_delivered() {
        let now = Utc::now();
        let mut lifecycle = OrderLifecycle::new();
        lifecycle.mark_delivered(now);

        assert_matches!(
            lifecycle.set_status(OrderStatus::Preparing, now),
            Err(ServiceError::InvalidOperation(_))
        );
        assert_matches!(
            lifecycle.set_status(OrderStatus::Delivered, now),
            Ok(Transition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Delivered
            })
        );
    }

    #[test]
    fn set_status_delivered_uses_delivery_rules() {
        let now = Utc::now();
        let mut lifecycle = OrderLifecycle::new();
        lifecycle.set_status(OrderStatus::OutForDelivery, now).unwrap();
        lifecycle.set_status(OrderStatus::Delivered, now).unwrap();
        assert_eq!(lifecycle.delivered_at, Some(now));
    }
}
