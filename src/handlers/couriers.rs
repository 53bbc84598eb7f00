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
    dto::v1::{CourierResponse, CreateCourierRequest, OrderResponse, UpdateCourierRequest},
    errors::{ErrorResponse, ServiceError},
    ApiResponse, ApiResult, AppState,
};

/// Register a user as a courier (administrators only)
#[utoipa::path(
    post,
    path = "/api/v1/couriers",
    request_body = CreateCourierRequest,
    responses(
        (status = 201, description = "Courier created", body = CourierResponse),
        (status = 400, description = "User is already a courier", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Couriers"
)]
pub async fn create_courier(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCourierRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_superuser()?;
    payload.validate()?;

    let courier = state
        .services
        .couriers
        .create_courier(payload.user_id, payload.phone, payload.group_role)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CourierResponse::from(courier))),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/couriers/{id}",
    params(("id" = Uuid, Path, description = "Courier id")),
    request_body = UpdateCourierRequest,
    responses(
        (status = 200, description = "Courier updated", body = CourierResponse),
        (status = 404, description = "Courier not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Couriers"
)]
pub async fn update_courier(
    State(state): State<AppState>,
    user: AuthUser,
    Path(courier_id): Path<Uuid>,
    Json(payload): Json<UpdateCourierRequest>,
) -> ApiResult<CourierResponse> {
    user.require_superuser()?;
    payload.validate()?;

    let courier = state
        .services
        .couriers
        .update_courier(courier_id, payload.phone, payload.group_role)
        .await?;
    Ok(Json(ApiResponse::success(courier.into())))
}

/// Orders assigned to the calling courier
#[utoipa::path(
    get,
    path = "/api/v1/couriers/me/orders",
    responses(
        (status = 200, description = "Assigned orders", body = [OrderResponse]),
        (status = 403, description = "Caller is not a courier", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Couriers"
)]
pub async fn my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<OrderResponse>> {
    let courier = state
        .services
        .couriers
        .find_by_user(user.user_id)
        .await?
        .ok_or_else(|| ServiceError::Forbidden("caller is not a courier".into()))?;

    let orders = state
        .services
        .couriers
        .list_assigned_orders(courier.id)
        .await?;
    Ok(Json(ApiResponse::success(
        orders.into_iter().map(OrderResponse::from).collect(),
    )))
}
