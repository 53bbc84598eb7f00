use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use crate::dto::v1;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = r#"
Order lifecycle and pricing backend for a delivery storefront.

Customers keep a cart, apply one-time promo codes and check out into orders
that move from `preparing` to `out_for_delivery` to `delivered`. Couriers see
the orders assigned to them and mark them delivered; delivered orders expose a
PDF receipt.

All `/api/v1` endpoints expect `Authorization: Bearer <jwt>`.
        "#
    ),
    tags(
        (name = "Cart", description = "Cart management"),
        (name = "Promos", description = "Promo codes"),
        (name = "Orders", description = "Checkout, lifecycle and receipts"),
        (name = "Couriers", description = "Courier accounts and assignments"),
        (name = "Locations", description = "Delivery locations"),
        (name = "Catalog", description = "Products and stock"),
        (name = "Health", description = "Liveness")
    ),
    paths(
        crate::handlers::cart::list_items,
        crate::handlers::cart::add_item,
        crate::handlers::cart::update_item,
        crate::handlers::cart::remove_item,
        crate::handlers::cart::clear,
        crate::handlers::promos::create_promo,
        crate::handlers::promos::check_promo,
        crate::handlers::promos::expire_promo,
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::delete_order,
        crate::handlers::orders::assign_courier,
        crate::handlers::orders::deliver_order,
        crate::handlers::orders::set_status,
        crate::handlers::orders::download_receipt,
        crate::handlers::couriers::create_courier,
        crate::handlers::couriers::update_courier,
        crate::handlers::couriers::my_orders,
        crate::handlers::locations::create_location,
        crate::handlers::locations::list_locations,
        crate::handlers::products::create_product,
        crate::handlers::products::get_product,
        crate::handlers::products::restock,
        crate::handlers::health::health_check,
    ),
    components(
        schemas(
            v1::CartResponse,
            v1::OrderResponse,
            v1::DeliveryLocation,
            v1::PromoCheckResponse,
            crate::entities::order::OrderStatus,
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDocV1;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// Serves the generated document as JSON.
pub async fn openapi_json() -> axum::Json<utoipa::openapi::OpenApi> {
    axum::Json(ApiDocV1::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_order_routes_and_bearer_scheme() {
        let json = serde_json::to_string(&ApiDocV1::openapi()).unwrap();
        assert!(json.contains("Storefront API"));
        assert!(json.contains("/api/v1/orders/{id}/receipt"));
        assert!(json.contains("bearer_auth"));
    }
}
