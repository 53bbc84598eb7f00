use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthUser,
    dto::v1::{CreateProductRequest, ProductResponse, RestockRequest},
    errors::{ErrorResponse, ServiceError},
    services::catalog::NewProduct,
    ApiResponse, ApiResult, AppState,
};

/// Add a catalog product (administrators only)
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_superuser()?;
    payload.validate()?;

    let product = state
        .services
        .catalog
        .create_product(NewProduct {
            name: payload.name,
            unit_price: payload.unit_price,
            discount_percent: payload.discount_percent,
            quantity_on_hand: payload.quantity_on_hand,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ProductResponse::from(product))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn get_product(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> ApiResult<ProductResponse> {
    let product = state.services.catalog.get_product(product_id).await?;
    Ok(Json(ApiResponse::success(product.into())))
}

/// Add stock to a product (administrators only)
#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/restock",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = RestockRequest,
    responses(
        (status = 200, description = "Stock after the restock", body = ProductResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn restock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<RestockRequest>,
) -> ApiResult<ProductResponse> {
    user.require_superuser()?;
    payload.validate()?;

    state
        .services
        .inventory
        .restock(product_id, payload.quantity)
        .await?;
    let product = state.services.catalog.get_product(product_id).await?;
    Ok(Json(ApiResponse::success(product.into())))
}
