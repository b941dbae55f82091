use std::sync::Arc;

use coachline_core::inventory;
use coachline_core::repository::{BookingStore, CommitOutcome, ReservationCommit};
use coachline_core::{BookingError, BookingGroup, BookingResult, SeatRequest};
use tracing::{debug, info, warn};

use crate::retry::RetryPolicy;

/// Commits a set of seats on one trip, all or nothing.
///
/// Each attempt reads the trip and validates the seats against that
/// snapshot. The store re-checks the seats inside its atomic commit; if one
/// was taken in between, the commit is stale and the next attempt reports
/// the taken seat from a fresh snapshot. Bookings of other seats on the
/// same trip never make a commit stale.
pub struct ReservationEngine {
    store: Arc<dyn BookingStore>,
    retry: RetryPolicy,
}

impl ReservationEngine {
    pub fn new(store: Arc<dyn BookingStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    pub async fn reserve(&self, request: &SeatRequest, user_id: &str) -> BookingResult<BookingGroup> {
        let trip_id = request.trip_id();

        for attempt in 1..=self.retry.max_attempts {
            let trip = self
                .store
                .get_trip(trip_id)
                .await?
                .ok_or_else(|| BookingError::trip_not_found(trip_id))?;

            inventory::check_reservable(&trip, request.seats())?;

            let group = BookingGroup::new(trip_id, user_id, request.seats());
            let commit = ReservationCommit {
                trip_id,
                bookings: group.bookings.clone(),
            };

            match self.store.commit_reservation(&commit).await? {
                CommitOutcome::Committed => {
                    info!(
                        trip_id = %trip_id,
                        user_id,
                        seats = ?request.sorted_seats(),
                        attempt,
                        "Seats reserved"
                    );
                    return Ok(group);
                }
                CommitOutcome::Stale => {
                    debug!(trip_id = %trip_id, attempt, "Reservation commit stale");
                    if attempt < self.retry.max_attempts {
                        self.retry.backoff(attempt).await;
                    }
                }
            }
        }

        warn!(
            trip_id = %trip_id,
            attempts = self.retry.max_attempts,
            "Reservation gave up after repeated contention"
        );
        Err(BookingError::Conflict(trip_id))
    }
}
