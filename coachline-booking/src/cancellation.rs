use std::sync::Arc;

use chrono::Utc;
use coachline_core::policy;
use coachline_core::repository::{BookingStore, CancellationCommit, CommitOutcome};
use coachline_core::{Actor, Booking, BookingError, BookingResult, BookingStatus};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::retry::RetryPolicy;

/// Releases one booked seat back to its trip.
///
/// Cancelling an already-cancelled booking returns it unchanged and
/// writes nothing.
pub struct CancellationEngine {
    store: Arc<dyn BookingStore>,
    retry: RetryPolicy,
}

impl CancellationEngine {
    pub fn new(store: Arc<dyn BookingStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    async fn load(&self, booking_id: Uuid) -> BookingResult<Booking> {
        self.store
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::booking_not_found(booking_id))
    }

    pub async fn cancel(&self, booking_id: Uuid, actor: &Actor) -> BookingResult<Booking> {
        let mut booking = self.load(booking_id).await?;
        policy::ensure_access(actor, &booking)?;
        let trip_id = booking.trip_id;

        for attempt in 1..=self.retry.max_attempts {
            if booking.status == BookingStatus::Cancelled {
                debug!(booking_id = %booking_id, "Booking already cancelled");
                return Ok(booking);
            }

            let cancelled_at = Utc::now();
            let commit = CancellationCommit {
                trip_id,
                booking_id,
                seat: booking.seat,
                cancelled_at,
            };

            match self.store.commit_cancellation(&commit).await? {
                CommitOutcome::Committed => {
                    info!(
                        booking_id = %booking_id,
                        trip_id = %trip_id,
                        seat = booking.seat,
                        actor = %actor.user_id,
                        "Booking cancelled"
                    );
                    return Ok(Booking {
                        status: BookingStatus::Cancelled,
                        cancelled_at: Some(cancelled_at),
                        ..booking
                    });
                }
                CommitOutcome::Stale => {
                    debug!(booking_id = %booking_id, attempt, "Cancellation commit stale");
                    if attempt < self.retry.max_attempts {
                        self.retry.backoff(attempt).await;
                        booking = self.load(booking_id).await?;
                    }
                }
            }
        }

        warn!(booking_id = %booking_id, trip_id = %trip_id, "Cancellation gave up after repeated contention");
        Err(BookingError::Conflict(trip_id))
    }
}
