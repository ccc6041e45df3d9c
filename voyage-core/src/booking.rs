use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CURRENCY: &str = "USD";

/// A confirmed flight selection. Airport details are copied at booking time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i32,
    pub trip_id: i32,
    pub carrier: String,
    pub flight_number: String,
    pub origin_city: String,
    pub origin_code: String,
    pub origin_airport_name: String,
    pub destination_city: String,
    pub destination_code: String,
    pub destination_airport_name: String,
    pub depart_at: DateTime<Utc>,
    pub arrive_at: DateTime<Utc>,
    pub price: i32,
    pub currency: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Airport {
    pub city: String,
    pub code: String,
    pub airport_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub trip_id: i32,
    pub carrier: String,
    pub flight_number: String,
    pub origin: Airport,
    pub destination: Airport,
    pub depart_at: DateTime<Utc>,
    pub arrive_at: DateTime<Utc>,
    pub price: i32,
    pub currency: String,
    pub image_url: Option<String>,
}
