use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use voyage_core::booking::{Booking, NewBooking};
use voyage_core::repository::{BookingRepository, RepoResult};

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: i32,
    trip_id: i32,
    carrier: String,
    flight_number: String,
    origin_city: String,
    origin_code: String,
    origin_airport_name: String,
    destination_city: String,
    destination_code: String,
    destination_airport_name: String,
    depart_at: DateTime<Utc>,
    arrive_at: DateTime<Utc>,
    price: i32,
    currency: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            trip_id: row.trip_id,
            carrier: row.carrier,
            flight_number: row.flight_number,
            origin_city: row.origin_city,
            origin_code: row.origin_code,
            origin_airport_name: row.origin_airport_name,
            destination_city: row.destination_city,
            destination_code: row.destination_code,
            destination_airport_name: row.destination_airport_name,
            depart_at: row.depart_at,
            arrive_at: row.arrive_at,
            price: row.price,
            currency: row.currency,
            image_url: row.image_url,
            created_at: row.created_at,
        }
    }
}

const BOOKING_COLUMNS: &str = "id, trip_id, carrier, flight_number, \
    origin_city, origin_code, origin_airport_name, \
    destination_city, destination_code, destination_airport_name, \
    depart_at, arrive_at, price, currency, image_url, created_at";

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn create_booking(&self, booking: &NewBooking) -> RepoResult<Booking> {
        let row: BookingRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO bookings (
                trip_id, carrier, flight_number,
                origin_city, origin_code, origin_airport_name,
                destination_city, destination_code, destination_airport_name,
                depart_at, arrive_at, price, currency, image_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(booking.trip_id)
        .bind(&booking.carrier)
        .bind(&booking.flight_number)
        .bind(&booking.origin.city)
        .bind(&booking.origin.code)
        .bind(&booking.origin.airport_name)
        .bind(&booking.destination.city)
        .bind(&booking.destination.code)
        .bind(&booking.destination.airport_name)
        .bind(booking.depart_at)
        .bind(booking.arrive_at)
        .bind(booking.price)
        .bind(&booking.currency)
        .bind(&booking.image_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_recent_bookings(&self, limit: i64) -> RepoResult<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings ORDER BY created_at DESC, id DESC LIMIT $1",
            BOOKING_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }
}
