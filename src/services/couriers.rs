use crate::{
    db,
    entities::{courier, order, user, user_group, Courier, Order, User, UserGroup},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionError, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Courier profiles and the staff/group grants that come with them.
#[derive(Clone)]
pub struct CourierService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CourierService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Makes `user_id` a courier.
    ///
    /// The user becomes active staff and their group set is replaced by
    /// `{group_role}` (emptied when no group is given). One courier per user.
    #[instrument(skip(self))]
    pub async fn create_courier(
        &self,
        user_id: Uuid,
        phone: String,
        group_role: Option<String>,
    ) -> Result<courier::Model, ServiceError> {
        validate_phone(&phone)?;
        let group_role = normalize_group(group_role);

        let courier = self
            .db
            .transaction::<_, courier::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let user = User::find_by_id(user_id).one(txn).await?.ok_or_else(|| {
                        ServiceError::NotFound(format!("User {} not found", user_id))
                    })?;

                    let inserted = courier::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        user_id: Set(user_id),
                        phone: Set(phone),
                        group_role: Set(group_role.clone()),
                        created_at: Set(Utc::now()),
                    }
                    .insert(txn)
                    .await
                    .map_err(|e| {
                        if db::is_unique_violation(&e) {
                            ServiceError::ValidationError(format!(
                                "user {} is already a courier",
                                user_id
                            ))
                        } else {
                            ServiceError::db_error(e)
                        }
                    })?;

                    grant_courier_access(txn, user, group_role.as_deref()).await?;
                    Ok(inserted)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(courier_id = %courier.id, user_id = %user_id, "Courier created");
        self.event_sender
            .send_or_log(Event::CourierCreated {
                courier_id: courier.id,
                user_id,
            })
            .await;
        Ok(courier)
    }

    /// Updates a courier. `group_role` is replaced as given and the user's
    /// group set follows it.
    #[instrument(skip(self))]
    pub async fn update_courier(
        &self,
        courier_id: Uuid,
        phone: Option<String>,
        group_role: Option<String>,
    ) -> Result<courier::Model, ServiceError> {
        if let Some(phone) = &phone {
            validate_phone(phone)?;
        }
        let group_role = normalize_group(group_role);

        let updated = self
            .db
            .transaction::<_, courier::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let existing = Courier::find_by_id(courier_id).one(txn).await?.ok_or_else(
                        || ServiceError::NotFound(format!("Courier {} not found", courier_id)),
                    )?;
                    let user = User::find_by_id(existing.user_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("User {} not found", existing.user_id))
                        })?;

                    let mut active: courier::ActiveModel = existing.into();
                    if let Some(phone) = phone {
                        active.phone = Set(phone);
                    }
                    active.group_role = Set(group_role.clone());
                    let saved = active.update(txn).await?;

                    grant_courier_access(txn, user, group_role.as_deref()).await?;
                    Ok(saved)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(courier_id = %courier_id, "Courier updated");
        self.event_sender
            .send_or_log(Event::CourierUpdated(courier_id))
            .await;
        Ok(updated)
    }

    pub async fn get_courier(&self, courier_id: Uuid) -> Result<courier::Model, ServiceError> {
        Courier::find_by_id(courier_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Courier {} not found", courier_id)))
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<courier::Model>, ServiceError> {
        Ok(Courier::find()
            .filter(courier::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?)
    }

    /// Orders currently assigned to the courier, newest first.
    pub async fn list_assigned_orders(
        &self,
        courier_id: Uuid,
    ) -> Result<Vec<order::Model>, ServiceError> {
        Ok(Order::find()
            .filter(order::Column::CourierId.eq(courier_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }
}

async fn grant_courier_access<C: ConnectionTrait>(
    conn: &C,
    user: user::Model,
    group_role: Option<&str>,
) -> Result<(), ServiceError> {
    let user_id = user.id;
    if !(user.is_staff && user.is_active) {
        let mut active: user::ActiveModel = user.into();
        active.is_staff = Set(true);
        active.is_active = Set(true);
        active.update(conn).await?;
    }

    UserGroup::delete_many()
        .filter(user_group::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;

    if let Some(group) = group_role {
        user_group::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            group_name: Set(group.to_string()),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

fn normalize_group(group_role: Option<String>) -> Option<String> {
    group_role
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
}

fn validate_phone(phone: &str) -> Result<(), ServiceError> {
    if phone.is_empty() || phone.len() > 12 {
        return Err(ServiceError::ValidationError(
            "courier phone must be 1 to 12 characters".into(),
        ));
    }
    Ok(())
}
