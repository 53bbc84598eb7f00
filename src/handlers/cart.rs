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
    dto::v1::{
        AddCartItemRequest, CartItemResponse, CartResponse, ClearCartResponse,
        UpdateCartItemRequest,
    },
    errors::{ErrorResponse, ServiceError},
    services::pricing,
    ApiResponse, ApiResult, AppState,
};

/// List the caller's open cart items with their total
#[utoipa::path(
    get,
    path = "/api/v1/cart/items",
    responses(
        (status = 200, description = "Cart contents", body = CartResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn list_items(State(state): State<AppState>, user: AuthUser) -> ApiResult<CartResponse> {
    let lines = state.services.cart.list_items(user.user_id).await?;
    let total = pricing::cart_total(lines.iter().map(|l| l.line_amount));
    Ok(Json(ApiResponse::success(CartResponse {
        items: lines.into_iter().map(CartItemResponse::from).collect(),
        total,
    })))
}

/// Add a product to the cart
#[utoipa::path(
    post,
    path = "/api/v1/cart/items",
    request_body = AddCartItemRequest,
    responses(
        (status = 201, description = "Item added", body = CartItemResponse),
        (status = 400, description = "Invalid quantity", body = ErrorResponse),
        (status = 404, description = "Unknown product", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddCartItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let line = state
        .services
        .cart
        .add_item(user.user_id, payload.product_id, payload.quantity)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CartItemResponse::from(line))),
    ))
}

/// Change the quantity of a cart item
#[utoipa::path(
    patch,
    path = "/api/v1/cart/items/{id}",
    params(("id" = Uuid, Path, description = "Cart item id")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Item updated", body = CartItemResponse),
        (status = 404, description = "No such item in the cart", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> ApiResult<CartItemResponse> {
    payload.validate()?;
    let line = state
        .services
        .cart
        .update_quantity(user.user_id, item_id, payload.quantity)
        .await?;
    Ok(Json(ApiResponse::success(line.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart/items/{id}",
    params(("id" = Uuid, Path, description = "Cart item id")),
    responses(
        (status = 204, description = "Item removed"),
        (status = 404, description = "No such item in the cart", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.cart.remove_item(user.user_id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart/items",
    responses((status = 200, description = "Cart emptied", body = ClearCartResponse)),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn clear(State(state): State<AppState>, user: AuthUser) -> ApiResult<ClearCartResponse> {
    let removed = state.services.cart.clear(user.user_id).await?;
    Ok(Json(ApiResponse::success(ClearCartResponse { removed })))
}
