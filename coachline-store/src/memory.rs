use std::collections::HashMap;

use async_trait::async_trait;
use coachline_core::inventory;
use coachline_core::repository::{
    BookingLedger, CancellationCommit, CommitOutcome, ReservationCommit, SeatInventory, StoreError, TripRepository,
};
use coachline_core::search::TripFilter;
use coachline_core::{Booking, BookingStatus, NewTrip, Trip};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    trips: HashMap<Uuid, Trip>,
    bookings: HashMap<Uuid, Booking>,
}

/// Process-local backend. One lock guards trips and bookings together, so
/// every commit is a single critical section.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_trips(trips: &mut [Trip]) {
    trips.sort_by(|a, b| {
        (a.travel_date, &a.departure_time, a.created_at).cmp(&(b.travel_date, &b.departure_time, b.created_at))
    });
}

fn sort_bookings(bookings: &mut [Booking]) {
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.seat.cmp(&b.seat)));
}

#[async_trait]
impl TripRepository for InMemoryStore {
    async fn create_trip(&self, new_trip: NewTrip) -> Result<Trip, StoreError> {
        let trip = Trip::from_new(new_trip);
        let mut inner = self.inner.write().await;
        inner.trips.insert(trip.id, trip.clone());
        Ok(trip)
    }

    async fn get_trip(&self, id: Uuid) -> Result<Option<Trip>, StoreError> {
        Ok(self.inner.read().await.trips.get(&id).cloned())
    }

    async fn search_trips(&self, filter: &TripFilter) -> Result<Vec<Trip>, StoreError> {
        let inner = self.inner.read().await;
        let mut trips: Vec<Trip> = inner.trips.values().filter(|t| filter.matches(t)).cloned().collect();
        sort_trips(&mut trips);
        Ok(trips)
    }
}

#[async_trait]
impl BookingLedger for InMemoryStore {
    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.inner.read().await.bookings.get(&id).cloned())
    }

    async fn list_bookings_for_user(&self, user_id: &str) -> Result<Vec<Booking>, StoreError> {
        let inner = self.inner.read().await;
        let mut bookings: Vec<Booking> = inner.bookings.values().filter(|b| b.user_id == user_id).cloned().collect();
        sort_bookings(&mut bookings);
        Ok(bookings)
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        let inner = self.inner.read().await;
        let mut bookings: Vec<Booking> = inner.bookings.values().cloned().collect();
        sort_bookings(&mut bookings);
        Ok(bookings)
    }

    async fn count_active_bookings(&self, trip_id: Uuid) -> Result<u32, StoreError> {
        let inner = self.inner.read().await;
        let count = inner.bookings.values().filter(|b| b.trip_id == trip_id && b.is_active()).count();
        Ok(count as u32)
    }
}

#[async_trait]
impl SeatInventory for InMemoryStore {
    async fn commit_reservation(&self, commit: &ReservationCommit) -> Result<CommitOutcome, StoreError> {
        let mut inner = self.inner.write().await;

        let trip = match inner.trips.get_mut(&commit.trip_id) {
            Some(trip) => trip,
            None => return Err(format!("Trip {} vanished during commit", commit.trip_id).into()),
        };
        if inventory::apply_reservation(trip, &commit.seats()).is_err() {
            return Ok(CommitOutcome::Stale);
        }

        for booking in &commit.bookings {
            inner.bookings.insert(booking.id, booking.clone());
        }
        Ok(CommitOutcome::Committed)
    }

    async fn commit_cancellation(&self, commit: &CancellationCommit) -> Result<CommitOutcome, StoreError> {
        let mut inner = self.inner.write().await;
        let Inner { trips, bookings } = &mut *inner;

        let booking = match bookings.get_mut(&commit.booking_id) {
            Some(booking) if booking.is_active() => booking,
            _ => return Ok(CommitOutcome::Stale),
        };
        let trip = match trips.get_mut(&commit.trip_id) {
            Some(trip) => trip,
            None => return Err(format!("Trip {} vanished during commit", commit.trip_id).into()),
        };
        if !inventory::apply_release(trip, commit.seat) {
            return Ok(CommitOutcome::Stale);
        }

        booking.status = BookingStatus::Cancelled;
        booking.cancelled_at = Some(commit.cancelled_at);
        Ok(CommitOutcome::Committed)
    }
}
