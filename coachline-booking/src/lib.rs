pub mod cancellation;
pub mod reservation;
pub mod retry;
pub mod service;

pub use cancellation::CancellationEngine;
pub use reservation::ReservationEngine;
pub use retry::RetryPolicy;
pub use service::BookingService;
