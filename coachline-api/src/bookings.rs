use axum::{
    extract::{rejection::JsonRejection, Path, State},
    handler::Handler,
    http::StatusCode,
    middleware,
    routing::{get, patch},
    Extension, Json, Router,
};
use coachline_core::{Actor, Booking, BookingError, BookingGroup, SeatRequest};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::{auth_middleware, require_admin};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(alias = "busId")]
    pub trip_id: Uuid,
    #[serde(alias = "seat")]
    pub seats: Vec<i64>,
    /// Only honoured for admins.
    #[serde(default, alias = "userId")]
    pub user_id: Option<String>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/bookings",
            get(list_all_bookings.layer(middleware::from_fn(require_admin))).post(create_booking),
        )
        .route("/api/bookings/user/{user_id}", get(list_user_bookings))
        .route("/api/bookings/{id}", get(get_booking))
        .route("/api/bookings/{id}/cancel", patch(cancel_booking))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// POST /api/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingGroup>), AppError> {
    let Json(req) = payload.map_err(|rejection| BookingError::InvalidRequest(rejection.body_text()))?;

    let request = SeatRequest::new(req.trip_id, req.seats)?;
    let group = state
        .bookings
        .reserve(&actor, &request, req.user_id.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(group)))
}

/// GET /api/bookings
pub async fn list_all_bookings(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.bookings.list_all_bookings(&actor).await?))
}

/// GET /api/bookings/user/{user_id}
pub async fn list_user_bookings(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.bookings.list_bookings_for_user(&actor, &user_id).await?))
}

/// GET /api/bookings/{id}
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.bookings.get_booking(booking_id, &actor).await?))
}

/// PATCH /api/bookings/{id}/cancel
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.bookings.cancel(booking_id, &actor).await?))
}
