use axum::{
    extract::{rejection::JsonRejection, Path, State},
    handler::Handler,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use coachline_core::search::{TripFilter, TripSummary};
use coachline_core::{Actor, BookingError, NewTrip};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::{auth_middleware, require_admin};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let admin_only = create_trip
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/api/buses", get(list_trips).post(admin_only))
        .route("/api/buses/{id}", get(get_trip))
        .route("/api/buses/search/route", post(search_trips))
}

/// GET /api/buses
pub async fn list_trips(State(state): State<AppState>) -> Result<Json<Vec<TripSummary>>, AppError> {
    Ok(Json(state.bookings.list_trips().await?))
}

/// GET /api/buses/{id}
pub async fn get_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<TripSummary>, AppError> {
    Ok(Json(state.bookings.get_trip(trip_id).await?))
}

/// POST /api/buses/search/route
pub async fn search_trips(
    State(state): State<AppState>,
    payload: Result<Json<TripFilter>, JsonRejection>,
) -> Result<Json<Vec<TripSummary>>, AppError> {
    let Json(mut filter) = payload.map_err(|rejection| BookingError::InvalidRequest(rejection.body_text()))?;

    // Blank form fields mean "any"
    filter.origin = filter.origin.filter(|o| !o.trim().is_empty());
    filter.destination = filter.destination.filter(|d| !d.trim().is_empty());

    Ok(Json(state.bookings.search_trips(&filter).await?))
}

/// POST /api/buses
pub async fn create_trip(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<NewTrip>, JsonRejection>,
) -> Result<(StatusCode, Json<TripSummary>), AppError> {
    let Json(new_trip) = payload.map_err(|rejection| BookingError::InvalidRequest(rejection.body_text()))?;

    let trip = state.bookings.create_trip(&actor, new_trip).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}
