use crate::{Actor, Booking, BookingError, BookingResult};

/// Owner-or-admin rule for reading and cancelling a booking.
pub fn can_access(actor: &Actor, booking: &Booking) -> bool {
    actor.is_admin() || actor.user_id == booking.user_id
}

pub fn can_act_for_user(actor: &Actor, user_id: &str) -> bool {
    actor.is_admin() || actor.user_id == user_id
}

pub fn ensure_access(actor: &Actor, booking: &Booking) -> BookingResult<()> {
    if can_access(actor, booking) {
        Ok(())
    } else {
        Err(BookingError::Forbidden(format!("Booking {} does not belong to you", booking.id)))
    }
}

pub fn ensure_user(actor: &Actor, user_id: &str) -> BookingResult<()> {
    if can_act_for_user(actor, user_id) {
        Ok(())
    } else {
        Err(BookingError::Forbidden("Cannot act on another user's bookings".to_string()))
    }
}

pub fn ensure_admin(actor: &Actor) -> BookingResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(BookingError::Forbidden("Admin access required".to_string()))
    }
}
