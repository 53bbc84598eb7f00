use crate::{
    db,
    entities::{user, user_group, user_location, User, UserGroup, UserLocation},
    errors::ServiceError,
};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{7,11}$").expect("phone pattern compiles"));

/// Optional address fields of a saved delivery location.
#[derive(Debug, Clone, Default)]
pub struct NewLocation {
    pub address: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub floor: Option<String>,
    pub apartment: Option<String>,
}

/// Users, their saved locations and group memberships.
#[derive(Clone)]
pub struct AccountService {
    db: Arc<DatabaseConnection>,
}

impl AccountService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Registers a user. Phone numbers are unique.
    #[instrument(skip(self))]
    pub async fn create_user(
        &self,
        name: &str,
        phone: &str,
        is_superuser: bool,
    ) -> Result<user::Model, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::ValidationError("name is required".into()));
        }
        if !PHONE_RE.is_match(phone) {
            return Err(ServiceError::ValidationError(format!(
                "invalid phone number: {}",
                phone
            )));
        }

        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.trim().to_string()),
            phone: Set(phone.to_string()),
            is_active: Set(true),
            is_staff: Set(is_superuser),
            is_superuser: Set(is_superuser),
            created_at: Set(Utc::now()),
        };

        let user = model.insert(&*self.db).await.map_err(|e| {
            if db::is_unique_violation(&e) {
                ServiceError::ValidationError(format!("phone {} is already registered", phone))
            } else {
                ServiceError::db_error(e)
            }
        })?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<user::Model, ServiceError> {
        User::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))
    }

    /// Removes a user together with everything that cascades from it.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), ServiceError> {
        let result = User::delete_by_id(user_id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("User {} not found", user_id)));
        }
        info!(user_id = %user_id, "User deleted");
        Ok(())
    }

    #[instrument(skip(self, location))]
    pub async fn add_location(
        &self,
        user_id: Uuid,
        location: NewLocation,
    ) -> Result<user_location::Model, ServiceError> {
        self.get_user(user_id).await?;

        let model = user_location::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            address: Set(location.address),
            latitude: Set(location.latitude),
            longitude: Set(location.longitude),
            floor: Set(location.floor),
            apartment: Set(location.apartment),
            created_at: Set(Utc::now()),
        };
        let saved = model.insert(&*self.db).await?;
        info!(user_id = %user_id, location_id = %saved.id, "Location saved");
        Ok(saved)
    }

    /// Locations of a user, newest first.
    pub async fn list_locations(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<user_location::Model>, ServiceError> {
        Ok(UserLocation::find()
            .filter(user_location::Column::UserId.eq(user_id))
            .order_by_desc(user_location::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// The default delivery location: the most recently created one.
    pub async fn latest_location_in<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> Result<Option<user_location::Model>, ServiceError> {
        Ok(UserLocation::find()
            .filter(user_location::Column::UserId.eq(user_id))
            .order_by_desc(user_location::Column::CreatedAt)
            .one(conn)
            .await?)
    }

    /// A location that belongs to `user_id`; any other location is reported missing.
    pub async fn owned_location_in<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        location_id: Uuid,
    ) -> Result<user_location::Model, ServiceError> {
        UserLocation::find_by_id(location_id)
            .filter(user_location::Column::UserId.eq(user_id))
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Location {} not found", location_id))
            })
    }

    pub async fn groups(&self, user_id: Uuid) -> Result<Vec<String>, ServiceError> {
        let rows = UserGroup::find()
            .filter(user_group::Column::UserId.eq(user_id))
            .order_by_asc(user_group::Column::GroupName)
            .all(&*self.db)
            .await?;
        Ok(rows.into_iter().map(|g| g.group_name).collect())
    }
}
