use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use coachline_core::repository::{
    BookingLedger, CancellationCommit, CommitOutcome, ReservationCommit, SeatInventory, StoreError, TripRepository,
};
use coachline_core::search::TripFilter;
use coachline_core::{Booking, NewTrip, Trip};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

const TRIP_COLUMNS: &str = "id, carrier, bus_number, origin, destination, departure_time, travel_date, trip_class, \
     price_amount, price_currency, features, capacity, booked_seats, seats_booked, version, created_at";

const BOOKING_COLUMNS: &str = "id, trip_id, user_id, seat, status, group_id, created_at, cancelled_at";

/// PostgreSQL backend. Seat commits run in one transaction that locks the
/// trip row; the seat-overlap guard is evaluated under that lock, and the
/// partial unique index on live bookings backs it up.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    carrier: String,
    bus_number: String,
    origin: String,
    destination: String,
    departure_time: String,
    travel_date: NaiveDate,
    trip_class: String,
    price_amount: i32,
    price_currency: String,
    features: Vec<String>,
    capacity: i32,
    booked_seats: Vec<i32>,
    seats_booked: i32,
    version: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<TripRow> for Trip {
    type Error = StoreError;

    fn try_from(row: TripRow) -> Result<Self, Self::Error> {
        Ok(Trip {
            id: row.id,
            carrier: row.carrier,
            bus_number: row.bus_number,
            origin: row.origin,
            destination: row.destination,
            departure_time: row.departure_time,
            travel_date: row.travel_date,
            trip_class: row.trip_class.parse()?,
            price_amount: row.price_amount,
            price_currency: row.price_currency,
            features: row.features,
            capacity: u32::try_from(row.capacity)?,
            booked_seats: row
                .booked_seats
                .into_iter()
                .map(u32::try_from)
                .collect::<Result<_, _>>()?,
            seats_booked: u32::try_from(row.seats_booked)?,
            version: row.version,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    trip_id: Uuid,
    user_id: String,
    seat: i32,
    status: String,
    group_id: Uuid,
    created_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            trip_id: row.trip_id,
            user_id: row.user_id,
            seat: u32::try_from(row.seat)?,
            status: row.status.parse()?,
            group_id: row.group_id,
            created_at: row.created_at,
            cancelled_at: row.cancelled_at,
        })
    }
}

fn to_bookings(rows: Vec<BookingRow>) -> Result<Vec<Booking>, StoreError> {
    rows.into_iter().map(Booking::try_from).collect()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl TripRepository for PostgresStore {
    async fn create_trip(&self, new_trip: NewTrip) -> Result<Trip, StoreError> {
        let trip = Trip::from_new(new_trip);

        sqlx::query(
            r#"
            INSERT INTO trips (id, carrier, bus_number, origin, destination, departure_time, travel_date,
                               trip_class, price_amount, price_currency, features, capacity, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(trip.id)
        .bind(&trip.carrier)
        .bind(&trip.bus_number)
        .bind(&trip.origin)
        .bind(&trip.destination)
        .bind(&trip.departure_time)
        .bind(trip.travel_date)
        .bind(trip.trip_class.to_string())
        .bind(trip.price_amount)
        .bind(&trip.price_currency)
        .bind(&trip.features)
        .bind(i32::try_from(trip.capacity)?)
        .bind(trip.created_at)
        .execute(&self.pool)
        .await?;

        Ok(trip)
    }

    async fn get_trip(&self, id: Uuid) -> Result<Option<Trip>, StoreError> {
        let row: Option<TripRow> = sqlx::query_as(&format!("SELECT {} FROM trips WHERE id = $1", TRIP_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Trip::try_from).transpose()
    }

    async fn search_trips(&self, filter: &TripFilter) -> Result<Vec<Trip>, StoreError> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM trips WHERE TRUE", TRIP_COLUMNS));
        if let Some(origin) = &filter.origin {
            query.push(" AND origin = ").push_bind(origin.clone());
        }
        if let Some(destination) = &filter.destination {
            query.push(" AND destination = ").push_bind(destination.clone());
        }
        if let Some(date) = filter.date {
            query.push(" AND travel_date = ").push_bind(date);
        }
        query.push(" ORDER BY travel_date, departure_time, created_at");

        let rows: Vec<TripRow> = query.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(Trip::try_from).collect()
    }
}

#[async_trait]
impl BookingLedger for PostgresStore {
    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let row: Option<BookingRow> =
            sqlx::query_as(&format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Booking::try_from).transpose()
    }

    async fn list_bookings_for_user(&self, user_id: &str) -> Result<Vec<Booking>, StoreError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC, seat",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        to_bookings(rows)
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings ORDER BY created_at DESC, seat",
            BOOKING_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        to_bookings(rows)
    }

    async fn count_active_bookings(&self, trip_id: Uuid) -> Result<u32, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE trip_id = $1 AND status = 'booked'")
            .bind(trip_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(u32::try_from(count)?)
    }
}

#[async_trait]
impl SeatInventory for PostgresStore {
    async fn commit_reservation(&self, commit: &ReservationCommit) -> Result<CommitOutcome, StoreError> {
        let seats = commit
            .seats()
            .into_iter()
            .map(i32::try_from)
            .collect::<Result<Vec<i32>, _>>()?;

        let mut tx = self.pool.begin().await?;

        // Locks the trip row; concurrent commits on this trip queue here.
        let updated = sqlx::query(
            r#"
            UPDATE trips
            SET booked_seats = booked_seats || $2::int4[],
                seats_booked = seats_booked + $3,
                version = version + 1
            WHERE id = $1 AND NOT (booked_seats && $2::int4[])
            "#,
        )
        .bind(commit.trip_id)
        .bind(&seats)
        .bind(seats.len() as i32)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            debug!(trip_id = %commit.trip_id, "Seat taken concurrently, reservation not applied");
            return Ok(CommitOutcome::Stale);
        }

        let mut insert = QueryBuilder::<Postgres>::new(
            "INSERT INTO bookings (id, trip_id, user_id, seat, status, group_id, created_at) ",
        );
        insert.push_values(&commit.bookings, |mut row, booking| {
            row.push_bind(booking.id)
                .push_bind(booking.trip_id)
                .push_bind(booking.user_id.clone())
                .push_bind(booking.seat as i32)
                .push_bind(booking.status.as_str())
                .push_bind(booking.group_id)
                .push_bind(booking.created_at);
        });

        match insert.build().execute(&mut *tx).await {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                tx.rollback().await?;
                return Ok(CommitOutcome::Stale);
            }
            Err(err) => return Err(err.into()),
        }

        tx.commit().await?;
        Ok(CommitOutcome::Committed)
    }

    async fn commit_cancellation(&self, commit: &CancellationCommit) -> Result<CommitOutcome, StoreError> {
        let seat = i32::try_from(commit.seat)?;
        let mut tx = self.pool.begin().await?;

        let released = sqlx::query(
            r#"
            UPDATE trips
            SET booked_seats = array_remove(booked_seats, $2::int4),
                seats_booked = seats_booked - 1,
                version = version + 1
            WHERE id = $1 AND $2::int4 = ANY(booked_seats)
            "#,
        )
        .bind(commit.trip_id)
        .bind(seat)
        .execute(&mut *tx)
        .await?;

        if released.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(CommitOutcome::Stale);
        }

        let cancelled = sqlx::query(
            "UPDATE bookings SET status = 'cancelled', cancelled_at = $2 WHERE id = $1 AND status = 'booked'",
        )
        .bind(commit.booking_id)
        .bind(commit.cancelled_at)
        .execute(&mut *tx)
        .await?;

        if cancelled.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(CommitOutcome::Stale);
        }

        tx.commit().await?;
        Ok(CommitOutcome::Committed)
    }
}
