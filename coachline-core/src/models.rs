use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical seat slot on a trip, numbered from 1.
pub type SeatNumber = u32;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TripClass {
    #[serde(rename = "VIP")]
    Vip,
    Standard,
}

impl fmt::Display for TripClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripClass::Vip => write!(f, "VIP"),
            TripClass::Standard => write!(f, "Standard"),
        }
    }
}

impl FromStr for TripClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VIP" => Ok(TripClass::Vip),
            "Standard" => Ok(TripClass::Standard),
            other => Err(format!("unknown trip class: {}", other)),
        }
    }
}

/// A scheduled bus run and its seat inventory.
///
/// Route and schedule attributes are immutable business metadata. Only
/// `booked_seats`, `seats_booked` and `version` change after creation, and
/// only through the seat inventory commits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trip {
    pub id: Uuid,
    pub carrier: String,
    pub bus_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: String,
    pub travel_date: NaiveDate,
    pub trip_class: TripClass,
    pub price_amount: i32,
    pub price_currency: String,
    pub features: Vec<String>,
    pub capacity: u32,
    pub booked_seats: BTreeSet<SeatNumber>,
    pub seats_booked: u32,
    /// Bumped on every seat commit. A change counter for readers; commits do
    /// not check it.
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    pub fn from_new(new_trip: NewTrip) -> Self {
        Self {
            id: Uuid::new_v4(),
            carrier: new_trip.carrier,
            bus_number: new_trip.bus_number,
            origin: new_trip.origin,
            destination: new_trip.destination,
            departure_time: new_trip.departure_time,
            travel_date: new_trip.travel_date,
            trip_class: new_trip.trip_class,
            price_amount: new_trip.price_amount,
            price_currency: new_trip.price_currency,
            features: new_trip.features,
            capacity: new_trip.capacity,
            booked_seats: BTreeSet::new(),
            seats_booked: 0,
            version: 0,
            created_at: Utc::now(),
        }
    }

    pub fn is_seat_booked(&self, seat: SeatNumber) -> bool {
        self.booked_seats.contains(&seat)
    }
}

/// Trip metadata supplied by the admin interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrip {
    pub carrier: String,
    pub bus_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: String,
    pub travel_date: NaiveDate,
    pub trip_class: TripClass,
    pub price_amount: i32,
    #[serde(default = "default_currency")]
    pub price_currency: String,
    #[serde(default)]
    pub features: Vec<String>,
    pub capacity: u32,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Booked,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Booked => "booked",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booked" => Ok(BookingStatus::Booked),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

/// One seat on one trip held by one account.
///
/// Rows are never deleted; cancellation flips `status` once and stamps
/// `cancelled_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub user_id: String,
    pub seat: SeatNumber,
    pub status: BookingStatus,
    /// Shared by every booking created in the same reservation.
    pub group_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Booked
    }
}

/// The bookings created by a single successful reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingGroup {
    pub group_id: Uuid,
    pub trip_id: Uuid,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub bookings: Vec<Booking>,
}

impl BookingGroup {
    /// Builds one `Booked` entry per seat, all sharing a group id and timestamp.
    pub fn new(trip_id: Uuid, user_id: &str, seats: &[SeatNumber]) -> Self {
        let group_id = Uuid::new_v4();
        let created_at = Utc::now();
        let bookings = seats
            .iter()
            .map(|&seat| Booking {
                id: Uuid::new_v4(),
                trip_id,
                user_id: user_id.to_string(),
                seat,
                status: BookingStatus::Booked,
                group_id,
                created_at,
                cancelled_at: None,
            })
            .collect();

        Self {
            group_id,
            trip_id,
            user_id: user_id.to_string(),
            created_at,
            bookings,
        }
    }

    pub fn seats(&self) -> Vec<SeatNumber> {
        self.bookings.iter().map(|b| b.seat).collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// The authenticated caller, as supplied by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), role: Role::User }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), role: Role::Admin }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
