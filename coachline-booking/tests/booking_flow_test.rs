//! End-to-end booking behaviour against the in-process store.

use std::sync::Arc;

use chrono::NaiveDate;
use coachline_booking::{BookingService, RetryPolicy};
use coachline_core::repository::{BookingLedger, TripRepository};
use coachline_core::search::TripFilter;
use coachline_core::{Actor, BookingError, BookingStatus, NewTrip, SeatRequest, TripClass};
use coachline_store::InMemoryStore;
use uuid::Uuid;

fn new_trip(capacity: u32) -> NewTrip {
    NewTrip {
        carrier: "Selam Bus".to_string(),
        bus_number: "SB-12".to_string(),
        origin: "Addis Ababa".to_string(),
        destination: "Hawassa".to_string(),
        departure_time: "06:30".to_string(),
        travel_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
        trip_class: TripClass::Standard,
        price_amount: 650,
        price_currency: "ETB".to_string(),
        features: vec!["wifi".to_string()],
        capacity,
    }
}

async fn setup(capacity: u32) -> (Arc<InMemoryStore>, BookingService, Uuid) {
    let store = Arc::new(InMemoryStore::new());
    let service = BookingService::new(store.clone(), RetryPolicy::default());
    let trip = service.create_trip(&Actor::admin("admin"), new_trip(capacity)).await.unwrap();
    (store, service, trip.id)
}

fn seats(trip_id: Uuid, seats: &[i64]) -> SeatRequest {
    SeatRequest::new(trip_id, seats.to_vec()).unwrap()
}

#[tokio::test]
async fn test_batch_with_one_taken_seat_books_nothing() {
    let (store, service, trip_id) = setup(40).await;
    let alice = Actor::user("alice");
    let bob = Actor::user("bob");

    service.reserve(&alice, &seats(trip_id, &[4]), None).await.unwrap();

    let err = service.reserve(&bob, &seats(trip_id, &[3, 4, 5]), None).await.unwrap_err();
    assert!(matches!(err, BookingError::SeatAlreadyBooked(4)));
    assert!(err.to_string().contains("Seat 4"));

    assert!(store.list_bookings_for_user("bob").await.unwrap().is_empty());
    let trip = store.get_trip(trip_id).await.unwrap().unwrap();
    assert_eq!(trip.booked_seats.iter().copied().collect::<Vec<_>>(), vec![4]);
    assert_eq!(trip.seats_booked, 1);
}

#[tokio::test]
async fn test_reserve_cancel_round_trip() {
    let (store, service, trip_id) = setup(40).await;
    let alice = Actor::user("alice");
    let bob = Actor::user("bob");

    let group = service.reserve(&alice, &seats(trip_id, &[7]), None).await.unwrap();
    assert_eq!(group.bookings.len(), 1);
    let booking = &group.bookings[0];
    assert_eq!(booking.status, BookingStatus::Booked);
    assert_eq!(booking.user_id, "alice");

    let cancelled = service.cancel(booking.id, &alice).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());

    let rebooked = service.reserve(&bob, &seats(trip_id, &[7]), None).await.unwrap();
    assert_eq!(rebooked.bookings[0].user_id, "bob");

    let trip = store.get_trip(trip_id).await.unwrap().unwrap();
    assert_eq!(trip.seats_booked, 1);
    assert_eq!(store.count_active_bookings(trip_id).await.unwrap(), 1);
    // History is kept
    assert_eq!(store.list_bookings().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let (store, service, trip_id) = setup(40).await;
    let alice = Actor::user("alice");

    let group = service.reserve(&alice, &seats(trip_id, &[1, 2]), None).await.unwrap();
    let booking_id = group.bookings[0].id;

    let first = service.cancel(booking_id, &alice).await.unwrap();
    let second = service.cancel(booking_id, &alice).await.unwrap();
    assert_eq!(first, second);

    let trip = store.get_trip(trip_id).await.unwrap().unwrap();
    assert_eq!(trip.seats_booked, 1);
    assert_eq!(trip.booked_seats.iter().copied().collect::<Vec<_>>(), vec![2]);
}

#[tokio::test]
async fn test_out_of_range_and_missing_trip() {
    let (_store, service, trip_id) = setup(40).await;
    let alice = Actor::user("alice");

    let err = service.reserve(&alice, &seats(trip_id, &[41, 39]), None).await.unwrap_err();
    assert!(matches!(err, BookingError::SeatOutOfRange { seat: 41, capacity: 40 }));

    let err = service.reserve(&alice, &seats(Uuid::new_v4(), &[1]), None).await.unwrap_err();
    assert!(matches!(err, BookingError::NotFound { entity: "Trip", .. }));

    let err = service.cancel(Uuid::new_v4(), &alice).await.unwrap_err();
    assert!(matches!(err, BookingError::NotFound { entity: "Booking", .. }));
}

#[tokio::test]
async fn test_access_policy() {
    let (_store, service, trip_id) = setup(40).await;
    let alice = Actor::user("alice");
    let mallory = Actor::user("mallory");
    let admin = Actor::admin("admin");

    let group = service.reserve(&alice, &seats(trip_id, &[10]), None).await.unwrap();
    let booking_id = group.bookings[0].id;

    assert!(matches!(service.get_booking(booking_id, &mallory).await, Err(BookingError::Forbidden(_))));
    assert!(matches!(service.cancel(booking_id, &mallory).await, Err(BookingError::Forbidden(_))));
    assert!(matches!(
        service.list_bookings_for_user(&mallory, "alice").await,
        Err(BookingError::Forbidden(_))
    ));
    assert!(matches!(service.list_all_bookings(&alice).await, Err(BookingError::Forbidden(_))));

    assert_eq!(service.get_booking(booking_id, &alice).await.unwrap().id, booking_id);
    assert_eq!(service.list_bookings_for_user(&admin, "alice").await.unwrap().len(), 1);
    assert_eq!(service.list_all_bookings(&admin).await.unwrap().len(), 1);

    let cancelled = service.cancel(booking_id, &admin).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn test_booking_on_behalf_of_another_user() {
    let (_store, service, trip_id) = setup(40).await;

    let err = service
        .reserve(&Actor::user("alice"), &seats(trip_id, &[1]), Some("bob"))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Forbidden(_)));

    // Naming yourself is fine
    let own = service
        .reserve(&Actor::user("alice"), &seats(trip_id, &[1]), Some("alice"))
        .await
        .unwrap();
    assert_eq!(own.user_id, "alice");

    let group = service
        .reserve(&Actor::admin("admin"), &seats(trip_id, &[2]), Some("bob"))
        .await
        .unwrap();
    assert_eq!(group.user_id, "bob");
    assert!(group.bookings.iter().all(|b| b.user_id == "bob"));
}

#[tokio::test]
async fn test_trip_read_path() {
    let (_store, service, trip_id) = setup(40).await;
    let admin = Actor::admin("admin");

    let mut other = new_trip(20);
    other.destination = "Bahir Dar".to_string();
    service.create_trip(&admin, other).await.unwrap();

    service.reserve(&Actor::user("alice"), &seats(trip_id, &[3, 1]), None).await.unwrap();

    let summary = service.get_trip(trip_id).await.unwrap();
    assert_eq!(summary.seats_booked, 2);
    assert_eq!(summary.remaining_seats, 38);
    assert_eq!(summary.booked_seats, vec![1, 3]);

    assert_eq!(service.list_trips().await.unwrap().len(), 2);

    let filter = TripFilter {
        origin: Some("Addis Ababa".to_string()),
        destination: Some("Hawassa".to_string()),
        date: NaiveDate::from_ymd_opt(2026, 11, 2),
    };
    let found = service.search_trips(&filter).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, trip_id);

    let wrong_day = TripFilter {
        date: NaiveDate::from_ymd_opt(2026, 11, 3),
        ..filter
    };
    assert!(service.search_trips(&wrong_day).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_trip_validation() {
    let (_store, service, _trip_id) = setup(40).await;
    let admin = Actor::admin("admin");

    assert!(matches!(
        service.create_trip(&admin, new_trip(0)).await,
        Err(BookingError::InvalidRequest(_))
    ));

    let mut no_origin = new_trip(10);
    no_origin.origin = "  ".to_string();
    assert!(matches!(
        service.create_trip(&admin, no_origin).await,
        Err(BookingError::InvalidRequest(_))
    ));

    assert!(matches!(
        service.create_trip(&Actor::user("alice"), new_trip(10)).await,
        Err(BookingError::Forbidden(_))
    ));
}
