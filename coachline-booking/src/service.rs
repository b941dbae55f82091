use std::sync::Arc;

use coachline_core::policy;
use coachline_core::repository::BookingStore;
use coachline_core::search::{TripFilter, TripSummary};
use coachline_core::{Actor, Booking, BookingError, BookingGroup, BookingResult, NewTrip, SeatRequest};
use tracing::info;
use uuid::Uuid;

use crate::cancellation::CancellationEngine;
use crate::reservation::ReservationEngine;
use crate::retry::RetryPolicy;

/// Entry point for everything the HTTP layer does with trips and bookings.
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    reservations: ReservationEngine,
    cancellations: CancellationEngine,
}

impl BookingService {
    pub fn new(store: Arc<dyn BookingStore>, retry: RetryPolicy) -> Self {
        Self {
            reservations: ReservationEngine::new(store.clone(), retry.clone()),
            cancellations: CancellationEngine::new(store.clone(), retry),
            store,
        }
    }

    /// Reserve seats for the actor, or for `on_behalf_of` when the actor is
    /// an admin.
    pub async fn reserve(
        &self,
        actor: &Actor,
        request: &SeatRequest,
        on_behalf_of: Option<&str>,
    ) -> BookingResult<BookingGroup> {
        let owner = match on_behalf_of {
            Some(user_id) if user_id != actor.user_id => {
                policy::ensure_admin(actor)
                    .map_err(|_| BookingError::Forbidden("Cannot book seats for another user".to_string()))?;
                user_id
            }
            _ => actor.user_id.as_str(),
        };

        self.reservations.reserve(request, owner).await
    }

    pub async fn cancel(&self, booking_id: Uuid, actor: &Actor) -> BookingResult<Booking> {
        self.cancellations.cancel(booking_id, actor).await
    }

    pub async fn get_booking(&self, booking_id: Uuid, actor: &Actor) -> BookingResult<Booking> {
        let booking = self
            .store
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::booking_not_found(booking_id))?;

        policy::ensure_access(actor, &booking)?;
        Ok(booking)
    }

    pub async fn list_bookings_for_user(&self, actor: &Actor, user_id: &str) -> BookingResult<Vec<Booking>> {
        policy::ensure_user(actor, user_id)?;
        Ok(self.store.list_bookings_for_user(user_id).await?)
    }

    pub async fn list_all_bookings(&self, actor: &Actor) -> BookingResult<Vec<Booking>> {
        policy::ensure_admin(actor)?;
        Ok(self.store.list_bookings().await?)
    }

    pub async fn list_trips(&self) -> BookingResult<Vec<TripSummary>> {
        let trips = self.store.list_trips().await?;
        Ok(trips.into_iter().map(TripSummary::from).collect())
    }

    pub async fn get_trip(&self, trip_id: Uuid) -> BookingResult<TripSummary> {
        self.store
            .get_trip(trip_id)
            .await?
            .map(TripSummary::from)
            .ok_or_else(|| BookingError::trip_not_found(trip_id))
    }

    pub async fn search_trips(&self, filter: &TripFilter) -> BookingResult<Vec<TripSummary>> {
        let trips = self.store.search_trips(filter).await?;
        Ok(trips.into_iter().map(TripSummary::from).collect())
    }

    pub async fn create_trip(&self, actor: &Actor, new_trip: NewTrip) -> BookingResult<TripSummary> {
        policy::ensure_admin(actor)?;
        validate_new_trip(&new_trip)?;

        let trip = self.store.create_trip(new_trip).await?;
        info!(trip_id = %trip.id, capacity = trip.capacity, "Trip created");
        Ok(TripSummary::from(trip))
    }
}

fn validate_new_trip(new_trip: &NewTrip) -> BookingResult<()> {
    if new_trip.capacity == 0 {
        return Err(BookingError::InvalidRequest("Capacity must be greater than zero".to_string()));
    }
    if new_trip.origin.trim().is_empty() || new_trip.destination.trim().is_empty() {
        return Err(BookingError::InvalidRequest("Origin and destination are required".to_string()));
    }
    Ok(())
}
