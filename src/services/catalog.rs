use crate::{
    entities::{product, Product},
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Fields for a new catalog product
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub unit_price: Decimal,
    pub discount_percent: i32,
    pub quantity_on_hand: i32,
}

/// Thin catalog store: products with price, discount and stock.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(name = %input.name))]
    pub async fn create_product(&self, input: NewProduct) -> Result<product::Model, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "product name is required".into(),
            ));
        }
        if input.unit_price.is_sign_negative() {
            return Err(ServiceError::ValidationError(
                "unit price cannot be negative".into(),
            ));
        }
        if !(0..=100).contains(&input.discount_percent) {
            return Err(ServiceError::ValidationError(
                "discount percent must be between 0 and 100".into(),
            ));
        }
        if input.quantity_on_hand < 0 {
            return Err(ServiceError::ValidationError(
                "quantity on hand cannot be negative".into(),
            ));
        }

        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            unit_price: Set(input.unit_price),
            discount_percent: Set(input.discount_percent),
            quantity_on_hand: Set(input.quantity_on_hand),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        let saved = model.insert(&*self.db).await?;
        info!(product_id = %saved.id, "Product created");
        Ok(saved)
    }

    pub async fn get_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        Self::get_product_in(&*self.db, product_id).await
    }

    pub async fn get_product_in<C: ConnectionTrait>(
        conn: &C,
        product_id: Uuid,
    ) -> Result<product::Model, ServiceError> {
        Product::find_by_id(product_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    /// Deletes a product. Cart rows keep existing with no product; order
    /// snapshots are untouched.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let result = Product::delete_by_id(product_id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                product_id
            )));
        }
        info!(product_id = %product_id, "Product deleted");
        Ok(())
    }
}
