use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Booking, NewTrip, SeatNumber, Trip};
use crate::search::TripFilter;

pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a guarded seat commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// A requested seat was taken, or the booking was cancelled, after the
    /// caller's read. Nothing was written.
    Stale,
}

/// Everything needed to atomically commit a reservation.
#[derive(Debug, Clone)]
pub struct ReservationCommit {
    pub trip_id: Uuid,
    pub bookings: Vec<Booking>,
}

impl ReservationCommit {
    pub fn seats(&self) -> Vec<SeatNumber> {
        self.bookings.iter().map(|b| b.seat).collect()
    }
}

/// Everything needed to atomically release one booked seat.
#[derive(Debug, Clone)]
pub struct CancellationCommit {
    pub trip_id: Uuid,
    pub booking_id: Uuid,
    pub seat: SeatNumber,
    pub cancelled_at: DateTime<Utc>,
}

/// Repository trait for trip data access
#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn create_trip(&self, trip: NewTrip) -> Result<Trip, StoreError>;

    async fn get_trip(&self, id: Uuid) -> Result<Option<Trip>, StoreError>;

    async fn search_trips(&self, filter: &TripFilter) -> Result<Vec<Trip>, StoreError>;

    async fn list_trips(&self) -> Result<Vec<Trip>, StoreError> {
        self.search_trips(&TripFilter::default()).await
    }
}

/// Repository trait for the booking ledger. Read-only; writes go through
/// [`SeatInventory`].
#[async_trait]
pub trait BookingLedger: Send + Sync {
    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;

    async fn list_bookings_for_user(&self, user_id: &str) -> Result<Vec<Booking>, StoreError>;

    async fn list_bookings(&self) -> Result<Vec<Booking>, StoreError>;

    async fn count_active_bookings(&self, trip_id: Uuid) -> Result<u32, StoreError>;
}

/// Atomic seat mutations. Each call is one unit: either every write lands
/// or none does. Commits on disjoint seats of the same trip never make each
/// other stale.
#[async_trait]
pub trait SeatInventory: Send + Sync {
    /// Inserts the bookings and adds their seats to the trip, provided none
    /// of the seats is held.
    async fn commit_reservation(&self, commit: &ReservationCommit) -> Result<CommitOutcome, StoreError>;

    /// Flips the booking to cancelled and frees its seat, provided the
    /// booking is still booked.
    async fn commit_cancellation(&self, commit: &CancellationCommit) -> Result<CommitOutcome, StoreError>;
}

/// A complete storage backend.
pub trait BookingStore: TripRepository + BookingLedger + SeatInventory {}

impl<T> BookingStore for T where T: TripRepository + BookingLedger + SeatInventory {}
