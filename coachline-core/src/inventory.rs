//! Seat inventory rules over a trip snapshot.
//!
//! These functions never touch storage. Backends call the `apply_*`
//! functions inside their own atomic section; the engines call the
//! `check_*` functions against the snapshot they are about to commit on.

use crate::{BookingError, BookingResult, SeatNumber, Trip};

/// Rejects the lowest requested seat that is not within `1..=capacity`.
pub fn check_in_range(trip: &Trip, seats: &[SeatNumber]) -> BookingResult<()> {
    match seats.iter().copied().filter(|s| *s == 0 || *s > trip.capacity).min() {
        Some(seat) => Err(BookingError::SeatOutOfRange { seat, capacity: trip.capacity }),
        None => Ok(()),
    }
}

/// The lowest requested seat that is already held, if any.
pub fn first_conflict(trip: &Trip, seats: &[SeatNumber]) -> Option<SeatNumber> {
    seats.iter().copied().filter(|s| trip.is_seat_booked(*s)).min()
}

/// Range check followed by the availability check.
pub fn check_reservable(trip: &Trip, seats: &[SeatNumber]) -> BookingResult<()> {
    check_in_range(trip, seats)?;
    match first_conflict(trip, seats) {
        Some(seat) => Err(BookingError::SeatAlreadyBooked(seat)),
        None => Ok(()),
    }
}

/// Marks every seat as held. All-or-nothing: on error the trip is untouched.
pub fn apply_reservation(trip: &mut Trip, seats: &[SeatNumber]) -> BookingResult<()> {
    check_reservable(trip, seats)?;

    trip.booked_seats.extend(seats.iter().copied());
    trip.seats_booked += seats.len() as u32;
    trip.version += 1;
    Ok(())
}

/// Returns a seat to the pool. Returns `false` if the seat was not held.
pub fn apply_release(trip: &mut Trip, seat: SeatNumber) -> bool {
    if !trip.booked_seats.remove(&seat) {
        return false;
    }

    trip.seats_booked = trip.seats_booked.saturating_sub(1);
    trip.version += 1;
    true
}

pub fn available_seats(trip: &Trip) -> u32 {
    trip.capacity.saturating_sub(trip.seats_booked)
}
