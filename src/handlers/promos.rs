use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    auth::AuthUser,
    dto::v1::{CheckPromoRequest, CreatePromoRequest, PromoCheckResponse, PromoResponse},
    errors::{ErrorResponse, ServiceError},
    services::promos::NewPromo,
    ApiResponse, ApiResult, AppState,
};

/// Create a promo code (administrators only)
#[utoipa::path(
    post,
    path = "/api/v1/promos",
    request_body = CreatePromoRequest,
    responses(
        (status = 201, description = "Promo created", body = PromoResponse),
        (status = 400, description = "Invalid or duplicate promo", body = ErrorResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Promos"
)]
pub async fn create_promo(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePromoRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_superuser()?;
    payload.validate()?;

    let promo = state
        .services
        .promos
        .create_promo(
            user.user_id,
            NewPromo {
                code: payload.code,
                description: payload.description,
                discount_percent: payload.discount_percent,
                min_qualifying_amount: payload.min_qualifying_amount,
                expiry_date: payload.expiry_date,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(PromoResponse::from(promo))),
    ))
}

/// Check whether a promo code applies to the caller's cart
#[utoipa::path(
    post,
    path = "/api/v1/promos/check",
    request_body = CheckPromoRequest,
    responses(
        (status = 200, description = "Promo applies", body = PromoCheckResponse),
        (status = 400, description = "Expired, already used or minimum not met", body = ErrorResponse),
        (status = 404, description = "Unknown code", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Promos"
)]
pub async fn check_promo(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CheckPromoRequest>,
) -> ApiResult<PromoCheckResponse> {
    payload.validate()?;
    let check = state
        .services
        .promos
        .check_promo(user.user_id, &payload.code, payload.cart_total)
        .await?;
    Ok(Json(ApiResponse::success(check.into())))
}

/// Expire a promo code immediately (administrators only)
#[utoipa::path(
    post,
    path = "/api/v1/promos/{code}/expire",
    params(("code" = String, Path, description = "Promo code")),
    responses(
        (status = 200, description = "Promo expired", body = PromoResponse),
        (status = 404, description = "Unknown code", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Promos"
)]
pub async fn expire_promo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(code): Path<String>,
) -> ApiResult<PromoResponse> {
    user.require_superuser()?;
    let promo = state.services.promos.expire_promo(&code).await?;
    Ok(Json(ApiResponse::success(promo.into())))
}
