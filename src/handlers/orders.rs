use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthUser,
    commands::orders::CreateOrderCommand,
    dto::v1::{AssignCourierRequest, CreateOrderRequest, OrderResponse, SetStatusRequest},
    errors::{ErrorResponse, ServiceError},
    ApiResponse, ApiResult, AppState,
};

/// Check out cart items into a new order
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Invalid request or promo rejected", body = ErrorResponse),
        (status = 404, description = "Cart items, location or promo not found", body = ErrorResponse),
        (status = 422, description = "Insufficient stock", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let command = CreateOrderCommand {
        user_id: user.user_id,
        item_ids: payload.item_ids,
        promo_code: payload.promo_code,
        location_id: payload.location_id,
        file_attachment: payload.file_attachment,
    };
    let order = state.services.orders.create_order(command).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(OrderResponse::from(order))),
    ))
}

/// List the caller's orders (all orders for administrators)
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    responses((status = 200, description = "Orders, newest first", body = [OrderResponse])),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<OrderResponse>> {
    let orders = state.services.orders.list_orders(user.actor()).await?;
    Ok(Json(ApiResponse::success(
        orders.into_iter().map(OrderResponse::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", body = OrderResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> ApiResult<OrderResponse> {
    let order = state.services.orders.get_order(user.actor(), order_id).await?;
    Ok(Json(ApiResponse::success(order.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state
        .services
        .orders
        .delete_order(user.actor(), order_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Attach a courier to an order (administrators only)
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/courier",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = AssignCourierRequest,
    responses(
        (status = 200, description = "Courier assigned", body = OrderResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 409, description = "Concurrent update, retry", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn assign_courier(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<AssignCourierRequest>,
) -> ApiResult<OrderResponse> {
    let order = state
        .services
        .orders
        .assign_courier(user.actor(), order_id, payload.courier_id)
        .await?;
    Ok(Json(ApiResponse::success(order.into())))
}

/// Mark an order delivered (assigned courier or administrator)
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/deliver",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order delivered", body = OrderResponse),
        (status = 403, description = "Caller is not the assigned courier", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn deliver_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> ApiResult<OrderResponse> {
    let order = state
        .services
        .orders
        .set_delivered(user.actor(), order_id)
        .await?;
    Ok(Json(ApiResponse::success(order.into())))
}

/// Set an order's status explicitly (administrators only)
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderResponse),
        (status = 400, description = "Delivered orders cannot move back", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn set_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<SetStatusRequest>,
) -> ApiResult<OrderResponse> {
    let order = state
        .services
        .orders
        .set_status(user.actor(), order_id, payload.status)
        .await?;
    Ok(Json(ApiResponse::success(order.into())))
}

/// Download the PDF receipt of a delivered order
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/receipt",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "PDF receipt as application/pdf attachment"),
        (status = 400, description = "Order not delivered yet", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn download_receipt(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let receipt = state
        .services
        .receipts
        .render(user.actor(), order_id)
        .await?;

    let disposition = format!("attachment; filename=\"{}\"", receipt.filename);
    Ok((
        [
            (header::CONTENT_TYPE, receipt.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        receipt.bytes,
    ))
}
