use crate::{
    entities::{
        courier,
        order::{self, LocationSnapshot, OrderStatus},
        product, promo, user_location,
    },
    services::{cart::CartLine, promos::PromoCheck},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// ----- cart -----

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 10000, message = "quantity must be between 1 and 10000"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCartItemRequest {
    #[validate(range(min = 1, max = 10000, message = "quantity must be between 1 and 10000"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartItemResponse {
    pub id: Uuid,
    /// Absent when the product has been removed from the catalog
    pub product_id: Option<Uuid>,
    pub product_name: Option<String>,
    pub unit_price: Option<Decimal>,
    pub discount_percent: Option<i32>,
    pub quantity: i32,
    pub line_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<CartLine> for CartItemResponse {
    fn from(line: CartLine) -> Self {
        let product = line.product.as_ref();
        Self {
            id: line.item.id,
            product_id: product.map(|p| p.id),
            product_name: product.map(|p| p.name.clone()),
            unit_price: product.map(|p| p.unit_price),
            discount_percent: product.map(|p| p.discount_percent),
            quantity: line.item.quantity,
            line_amount: line.line_amount,
            created_at: line.item.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartResponse {
    pub items: Vec<CartItemResponse>,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClearCartResponse {
    pub removed: u64,
}

// ----- promos -----

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePromoRequest {
    #[validate(length(min = 1, max = 8))]
    pub code: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub discount_percent: i32,
    pub min_qualifying_amount: Decimal,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CheckPromoRequest {
    #[validate(length(min = 1, max = 8))]
    pub code: String,
    /// Defaults to the caller's current cart total
    pub cart_total: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PromoResponse {
    pub id: Uuid,
    pub code: String,
    pub description: Option<String>,
    pub discount_percent: i32,
    pub min_qualifying_amount: Decimal,
    pub expiry_date: Option<NaiveDate>,
    pub is_expired: bool,
    pub created_at: DateTime<Utc>,
}

impl From<promo::Model> for PromoResponse {
    fn from(model: promo::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            description: model.description,
            discount_percent: model.discount_percent,
            min_qualifying_amount: model.min_qualifying_amount,
            expiry_date: model.expiry_date,
            is_expired: model.is_expired,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PromoCheckResponse {
    pub code: String,
    pub discount_percent: i32,
    pub cart_total: Decimal,
    pub discounted_total: Decimal,
}

impl From<PromoCheck> for PromoCheckResponse {
    fn from(check: PromoCheck) -> Self {
        Self {
            code: check.code,
            discount_percent: check.discount_percent,
            cart_total: check.cart_total,
            discounted_total: check.discounted_total,
        }
    }
}

// ----- orders -----

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "At least one cart item is required"))]
    pub item_ids: Vec<Uuid>,
    #[validate(length(min = 1, max = 8))]
    pub promo_code: Option<String>,
    /// Defaults to the most recently saved location
    pub location_id: Option<Uuid>,
    /// File name of an attachment (pdf, png, jpg or jpeg)
    pub file_attachment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignCourierRequest {
    pub courier_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeliveryLocation {
    pub address: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub floor: Option<String>,
    pub apartment: Option<String>,
}

impl From<LocationSnapshot> for DeliveryLocation {
    fn from(snapshot: LocationSnapshot) -> Self {
        Self {
            address: snapshot.address,
            latitude: snapshot.latitude,
            longitude: snapshot.longitude,
            floor: snapshot.floor,
            apartment: snapshot.apartment,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount_percent: i32,
    pub line_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location: DeliveryLocation,
    pub items: Vec<OrderItemResponse>,
    pub promo_code: Option<String>,
    pub subtotal_amount: Decimal,
    pub total_amount: Decimal,
    pub file_attachment: Option<String>,
    pub status: OrderStatus,
    pub is_delivered: bool,
    pub courier_id: Option<Uuid>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<order::Model> for OrderResponse {
    fn from(model: order::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            location: model.location_snapshot.into(),
            items: model
                .items_snapshot
                .0
                .into_iter()
                .map(|line| OrderItemResponse {
                    product_id: line.product_id,
                    product_name: line.product_name,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    discount_percent: line.discount_percent,
                    line_amount: line.line_amount,
                })
                .collect(),
            promo_code: model.promo_code,
            subtotal_amount: model.subtotal_amount,
            total_amount: model.total_amount,
            file_attachment: model.file_attachment,
            is_delivered: model.status == OrderStatus::Delivered,
            status: model.status,
            courier_id: model.courier_id,
            assigned_at: model.assigned_at,
            delivered_at: model.delivered_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

// ----- couriers -----

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCourierRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 12))]
    pub phone: String,
    #[validate(length(max = 150))]
    pub group_role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCourierRequest {
    #[validate(length(min = 1, max = 12))]
    pub phone: Option<String>,
    /// Replaces the current group; omit to clear it
    #[validate(length(max = 150))]
    pub group_role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourierResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub phone: String,
    pub group_role: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<courier::Model> for CourierResponse {
    fn from(model: courier::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            phone: model.phone,
            group_role: model.group_role,
            created_at: model.created_at,
        }
    }
}

// ----- locations -----

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateLocationRequest {
    #[validate(length(max = 1000))]
    pub address: Option<String>,
    #[validate(length(max = 50))]
    pub latitude: Option<String>,
    #[validate(length(max = 50))]
    pub longitude: Option<String>,
    #[validate(length(max = 50))]
    pub floor: Option<String>,
    #[validate(length(max = 50))]
    pub apartment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationResponse {
    pub id: Uuid,
    pub address: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub floor: Option<String>,
    pub apartment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<user_location::Model> for LocationResponse {
    fn from(model: user_location::Model) -> Self {
        Self {
            id: model.id,
            address: model.address,
            latitude: model.latitude,
            longitude: model.longitude,
            floor: model.floor,
            apartment: model.apartment,
            created_at: model.created_at,
        }
    }
}

// ----- catalog -----

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub unit_price: Decimal,
    #[serde(default)]
    #[validate(range(min = 0, max = 100))]
    pub discount_percent: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub quantity_on_hand: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RestockRequest {
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub discount_percent: i32,
    pub quantity_on_hand: i32,
}

impl From<product::Model> for ProductResponse {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            unit_price: model.unit_price,
            discount_percent: model.discount_percent,
            quantity_on_hand: model.quantity_on_hand,
        }
    }
}
