use std::collections::HashSet;

use uuid::Uuid;

use crate::{BookingError, BookingResult, SeatNumber};

/// A seat reservation request that has passed boundary validation:
/// non-empty, positive seat numbers, no duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatRequest {
    trip_id: Uuid,
    seats: Vec<SeatNumber>,
}

impl SeatRequest {
    pub fn new(trip_id: Uuid, seats: Vec<i64>) -> BookingResult<Self> {
        if seats.is_empty() {
            return Err(BookingError::InvalidRequest("At least one seat must be requested".to_string()));
        }

        let mut seen = HashSet::with_capacity(seats.len());
        let mut validated = Vec::with_capacity(seats.len());

        for raw in seats {
            let seat = SeatNumber::try_from(raw)
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| BookingError::InvalidRequest(format!("Seat {} is not a positive seat number", raw)))?;

            if !seen.insert(seat) {
                return Err(BookingError::InvalidRequest(format!("Seat {} requested more than once", seat)));
            }
            validated.push(seat);
        }

        Ok(Self { trip_id, seats: validated })
    }

    pub fn trip_id(&self) -> Uuid {
        self.trip_id
    }

    /// Seats in the order they were requested.
    pub fn seats(&self) -> &[SeatNumber] {
        &self.seats
    }

    pub fn sorted_seats(&self) -> Vec<SeatNumber> {
        let mut seats = self.seats.clone();
        seats.sort_unstable();
        seats
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }
}
