use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    auth::AuthUser,
    dto::v1::{CreateLocationRequest, LocationResponse},
    errors::{ErrorResponse, ServiceError},
    services::accounts::NewLocation,
    ApiResponse, ApiResult, AppState,
};

/// Save a delivery location; the newest one becomes the default
#[utoipa::path(
    post,
    path = "/api/v1/locations",
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Location saved", body = LocationResponse),
        (status = 400, description = "Invalid location", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Locations"
)]
pub async fn create_location(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateLocationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let location = state
        .services
        .accounts
        .add_location(
            user.user_id,
            NewLocation {
                address: payload.address,
                latitude: payload.latitude,
                longitude: payload.longitude,
                floor: payload.floor,
                apartment: payload.apartment,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(LocationResponse::from(location))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations",
    responses((status = 200, description = "Saved locations, newest first", body = [LocationResponse])),
    security(("bearer_auth" = [])),
    tag = "Locations"
)]
pub async fn list_locations(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<LocationResponse>> {
    let locations = state.services.accounts.list_locations(user.user_id).await?;
    Ok(Json(ApiResponse::success(
        locations.into_iter().map(LocationResponse::from).collect(),
    )))
}
