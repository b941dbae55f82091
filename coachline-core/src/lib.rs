pub mod models;
pub mod request;
pub mod inventory;
pub mod policy;
pub mod repository;
pub mod search;

pub use models::{Actor, Booking, BookingGroup, BookingStatus, NewTrip, Role, SeatNumber, Trip, TripClass};
pub use request::SeatRequest;

use uuid::Uuid;

/// Every failure the booking core can hand back to a caller.
///
/// All variants are recoverable at the request boundary; none of them
/// terminate the process.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Seat {seat} is out of range, trip has {capacity} seats")]
    SeatOutOfRange {
        seat: SeatNumber,
        capacity: u32,
    },

    #[error("Seat {0} already booked. Choose a different seat")]
    SeatAlreadyBooked(SeatNumber),

    #[error("{entity} not found: {id}")]
    NotFound {
        entity: &'static str,
        id: Uuid,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Trip {0} is under heavy contention, retry the request")]
    Conflict(Uuid),

    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl BookingError {
    pub fn trip_not_found(id: Uuid) -> Self {
        BookingError::NotFound { entity: "Trip", id }
    }

    pub fn booking_not_found(id: Uuid) -> Self {
        BookingError::NotFound { entity: "Booking", id }
    }

    /// Stable, machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::InvalidRequest(_) => "INVALID_REQUEST",
            BookingError::SeatOutOfRange { .. } => "SEAT_OUT_OF_RANGE",
            BookingError::SeatAlreadyBooked(_) => "SEAT_ALREADY_BOOKED",
            BookingError::NotFound { .. } => "NOT_FOUND",
            BookingError::Forbidden(_) => "FORBIDDEN",
            BookingError::Conflict(_) => "CONFLICT",
            BookingError::StorageFailure(_) => "STORAGE_FAILURE",
        }
    }

    /// Whether the caller may simply resend the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::Conflict(_))
    }
}

impl From<repository::StoreError> for BookingError {
    fn from(err: repository::StoreError) -> Self {
        tracing::error!("Storage failure: {}", err);
        BookingError::StorageFailure(err.to_string())
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
