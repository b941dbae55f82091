//! Races on the same trip: no double booking, counts stay consistent.
//!
//! Run with: `cargo test --test concurrency_stress_test -- --nocapture`

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use coachline_booking::{BookingService, RetryPolicy};
use coachline_core::repository::{BookingLedger, TripRepository};
use coachline_core::{Actor, BookingError, NewTrip, SeatRequest, TripClass};
use coachline_store::InMemoryStore;
use futures_util::future::join_all;
use uuid::Uuid;

fn new_trip(capacity: u32) -> NewTrip {
    NewTrip {
        carrier: "Sky Bus".to_string(),
        bus_number: "SK-3".to_string(),
        origin: "Addis Ababa".to_string(),
        destination: "Mekelle".to_string(),
        departure_time: "05:00".to_string(),
        travel_date: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
        trip_class: TripClass::Vip,
        price_amount: 1200,
        price_currency: "ETB".to_string(),
        features: vec![],
        capacity,
    }
}

async fn setup(capacity: u32, retry: RetryPolicy) -> (Arc<InMemoryStore>, Arc<BookingService>, Uuid) {
    let store = Arc::new(InMemoryStore::new());
    let service = Arc::new(BookingService::new(store.clone(), retry));
    let trip = service.create_trip(&Actor::admin("admin"), new_trip(capacity)).await.unwrap();
    (store, service, trip.id)
}

async fn assert_conserved(store: &InMemoryStore, trip_id: Uuid) {
    let trip = store.get_trip(trip_id).await.unwrap().unwrap();
    let active = store.count_active_bookings(trip_id).await.unwrap();
    assert_eq!(trip.seats_booked as usize, trip.booked_seats.len());
    assert_eq!(trip.seats_booked, active);
    assert!(trip.seats_booked <= trip.capacity);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_last_seat_1000_concurrent_requests() {
    let (store, service, trip_id) = setup(40, RetryPolicy::default()).await;

    let handles: Vec<_> = (0..1000)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                let actor = Actor::user(format!("user-{}", i));
                let request = SeatRequest::new(trip_id, vec![12]).unwrap();
                service.reserve(&actor, &request, None).await
            })
        })
        .collect();

    let results: Vec<_> = join_all(handles).await.into_iter().map(|r| r.unwrap()).collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let taken = results
        .iter()
        .filter(|r| matches!(r, Err(BookingError::SeatAlreadyBooked(12))))
        .count();

    println!("successes={} taken={}", successes, taken);
    assert_eq!(successes, 1, "exactly one caller wins the seat");
    assert_eq!(taken, 999, "every other caller is told the seat is taken");

    assert_eq!(store.count_active_bookings(trip_id).await.unwrap(), 1);
    assert_conserved(&store, trip_id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_batches_never_both_win() {
    for _ in 0..50 {
        let (store, service, trip_id) = setup(40, RetryPolicy::default()).await;

        let first = {
            let service = service.clone();
            tokio::spawn(async move {
                let request = SeatRequest::new(trip_id, vec![5, 6]).unwrap();
                service.reserve(&Actor::user("alice"), &request, None).await
            })
        };
        let second = {
            let service = service.clone();
            tokio::spawn(async move {
                let request = SeatRequest::new(trip_id, vec![6, 7]).unwrap();
                service.reserve(&Actor::user("bob"), &request, None).await
            })
        };

        let (first, second) = (first.await.unwrap(), second.await.unwrap());
        assert!(first.is_ok() ^ second.is_ok(), "exactly one overlapping batch commits");

        let loser = if first.is_ok() { second } else { first };
        assert!(matches!(loser, Err(BookingError::SeatAlreadyBooked(6))));

        assert_eq!(store.count_active_bookings(trip_id).await.unwrap(), 2);
        assert_conserved(&store, trip_id).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_disjoint_seats_all_commit() {
    // One attempt only: bookings of other seats must never make a commit stale
    let retry = RetryPolicy::new(1, Duration::ZERO, Duration::ZERO);
    let (store, service, trip_id) = setup(40, retry).await;

    let handles: Vec<_> = (1..=40)
        .map(|seat| {
            let service = service.clone();
            tokio::spawn(async move {
                let request = SeatRequest::new(trip_id, vec![seat]).unwrap();
                service.reserve(&Actor::user(format!("user-{}", seat)), &request, None).await
            })
        })
        .collect();

    for result in join_all(handles).await {
        result.unwrap().unwrap();
    }

    let trip = store.get_trip(trip_id).await.unwrap().unwrap();
    assert_eq!(trip.seats_booked, 40);
    assert_conserved(&store, trip_id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_mixed_reserve_and_cancel_conserves_counts() {
    let retry = RetryPolicy::new(32, Duration::from_millis(1), Duration::from_millis(10));
    let (store, service, trip_id) = setup(10, retry).await;

    let handles: Vec<_> = (0..200)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                let actor = Actor::user(format!("user-{}", i % 7));
                let seat = (i % 10) + 1;
                let request = SeatRequest::new(trip_id, vec![seat]).unwrap();
                match service.reserve(&actor, &request, None).await {
                    Ok(group) if i % 3 == 0 => {
                        service.cancel(group.bookings[0].id, &actor).await.map(|_| ())
                    }
                    Ok(_) => Ok(()),
                    Err(e) => Err(e),
                }
            })
        })
        .collect();

    for result in join_all(handles).await {
        match result.unwrap() {
            Ok(()) | Err(BookingError::SeatAlreadyBooked(_)) | Err(BookingError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_conserved(&store, trip_id).await;

    // No seat is held by two live bookings
    let mut live: Vec<u32> = store
        .list_bookings()
        .await
        .unwrap()
        .into_iter()
        .filter(|b| b.trip_id == trip_id && b.is_active())
        .map(|b| b.seat)
        .collect();
    let before = live.len();
    live.sort_unstable();
    live.dedup();
    assert_eq!(live.len(), before);
}
