use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Trip, TripClass};

/// Route search. Every field is optional; an empty filter matches all trips.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripFilter {
    #[serde(default, alias = "from")]
    pub origin: Option<String>,
    #[serde(default, alias = "to")]
    pub destination: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>, // Just date, ignore departure time for search match
}

impl TripFilter {
    pub fn matches(&self, trip: &Trip) -> bool {
        self.origin.as_deref().map_or(true, |o| o == trip.origin)
            && self.destination.as_deref().map_or(true, |d| d == trip.destination)
            && self.date.map_or(true, |d| d == trip.travel_date)
    }
}

/// Read-model of a trip for listings.
#[derive(Debug, Serialize)]
pub struct TripSummary {
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
    pub seats_booked: u32,
    pub remaining_seats: u32,
    pub booked_seats: Vec<u32>,
    pub created_at: DateTime<Utc>,
}

impl From<Trip> for TripSummary {
    fn from(trip: Trip) -> Self {
        let remaining_seats = crate::inventory::available_seats(&trip);
        Self {
            id: trip.id,
            carrier: trip.carrier,
            bus_number: trip.bus_number,
            origin: trip.origin,
            destination: trip.destination,
            departure_time: trip.departure_time,
            travel_date: trip.travel_date,
            trip_class: trip.trip_class,
            price_amount: trip.price_amount,
            price_currency: trip.price_currency,
            features: trip.features,
            capacity: trip.capacity,
            seats_booked: trip.seats_booked,
            remaining_seats,
            booked_seats: trip.booked_seats.into_iter().collect(),
            created_at: trip.created_at,
        }
    }
}
