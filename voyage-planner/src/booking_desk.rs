use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};
use voyage_core::attempt::BestEffort;
use voyage_core::booking::{Airport, Booking, NewBooking, DEFAULT_CURRENCY};
use voyage_core::dates::parse_timestamp;
use voyage_core::repository::{BookingRepository, TripRepository};
use voyage_core::supplier::PhotoSearch;
use voyage_core::trip::{non_blank, whole_units};
use voyage_core::{CoreError, CoreResult};

pub const RECENT_BOOKINGS: i64 = 8;

/// A flight selection as posted by the browser. Airport details may arrive
/// flat (`originCity`, `originCode`, ...) or nested under `origin`/`destination`.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub booking: NewBooking,
}

impl BookingRequest {
    /// Validate a raw body, collecting every problem.
    pub fn parse(body: &Value) -> CoreResult<Self> {
        let mut errors = Vec::new();

        let trip_id = number(body.get("tripId")).and_then(|n| i32::try_from(n.trunc() as i64).ok());
        if trip_id.is_none() {
            errors.push("tripId is required".to_string());
        }
        let carrier = text(body.get("carrier"));
        if carrier.is_none() {
            errors.push("carrier is required".to_string());
        }
        let flight_number = text(body.get("flightNumber"));
        if flight_number.is_none() {
            errors.push("flightNumber is required".to_string());
        }
        let origin = airport(body, "origin");
        if origin.is_none() {
            errors.push("origin details are required".to_string());
        }
        let destination = airport(body, "destination");
        if destination.is_none() {
            errors.push("destination details are required".to_string());
        }
        let depart_at = timestamp(body.get("departAt"));
        if depart_at.is_none() {
            errors.push("departAt must be ISO date".to_string());
        }
        let arrive_at = timestamp(body.get("arriveAt"));
        if arrive_at.is_none() {
            errors.push("arriveAt must be ISO date".to_string());
        }
        let price = number(body.get("price")).and_then(whole_units);
        if price.is_none() {
            errors.push("price must be number".to_string());
        }

        match (trip_id, carrier, flight_number, origin, destination, depart_at, arrive_at, price) {
            (
                Some(trip_id),
                Some(carrier),
                Some(flight_number),
                Some(origin),
                Some(destination),
                Some(depart_at),
                Some(arrive_at),
                Some(price),
            ) if errors.is_empty() => Ok(Self {
                booking: NewBooking {
                    trip_id,
                    carrier,
                    flight_number,
                    origin,
                    destination,
                    depart_at,
                    arrive_at,
                    price,
                    currency: non_blank(body.get("currency").and_then(Value::as_str))
                        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
                    image_url: non_blank(body.get("imageUrl").and_then(Value::as_str)),
                },
            }),
            _ => Err(CoreError::Validation(errors)),
        }
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty()).map(String::from)
}

/// JSON numbers and numeric strings.
fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value.and_then(Value::as_str).and_then(parse_timestamp)
}

fn airport(body: &Value, side: &str) -> Option<Airport> {
    let nested = body.get(side).filter(|v| v.is_object());
    let field = |suffix: &str, nested_key: &str| {
        text(body.get(format!("{}{}", side, suffix).as_str())).or_else(|| text(nested.and_then(|n| n.get(nested_key))))
    };
    Some(Airport {
        city: field("City", "city")?,
        code: field("Code", "code")?,
        airport_name: field("AirportName", "airportName")?,
    })
}

pub struct BookingDesk {
    trips: Arc<dyn TripRepository>,
    bookings: Arc<dyn BookingRepository>,
    photos: Arc<dyn PhotoSearch>,
}

impl BookingDesk {
    pub fn new(
        trips: Arc<dyn TripRepository>,
        bookings: Arc<dyn BookingRepository>,
        photos: Arc<dyn PhotoSearch>,
    ) -> Self {
        Self { trips, bookings, photos }
    }

    /// Mark the trip booked, resolve a destination photo and store the booking.
    pub async fn book(&self, body: &Value) -> CoreResult<Booking> {
        let BookingRequest { mut booking } = BookingRequest::parse(body)?;

        if !self.trips.mark_booked(booking.trip_id).await? {
            warn!(trip_id = booking.trip_id, "Booking references an unknown trip");
        }

        if booking.image_url.is_none() {
            booking.image_url = self
                .photos
                .destination_image(&booking.destination.city)
                .await
                .best_effort("destination image lookup")
                .flatten();
        }

        let stored = self.bookings.create_booking(&booking).await?;
        info!(booking_id = stored.id, trip_id = stored.trip_id, "Created booking {}", stored.flight_number);
        Ok(stored)
    }

    pub async fn recent(&self) -> CoreResult<Vec<Booking>> {
        Ok(self.bookings.list_recent_bookings(RECENT_BOOKINGS).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use voyage_core::trip::{NewTrip, SEARCH_SOURCE};
    use voyage_store::memory::{MemoryBookingRepository, MemoryTripRepository};

    struct FixedPhoto(Option<&'static str>);

    #[async_trait]
    impl PhotoSearch for FixedPhoto {
        async fn destination_image(
            &self,
            _city: &str,
        ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
            match self.0 {
                Some(url) => Ok(Some(url.to_string())),
                None => Err("unsplash down".into()),
            }
        }
    }

    fn flat_body(trip_id: i32) -> Value {
        json!({
            "tripId": trip_id,
            "carrier": "All Nippon Airways",
            "flightNumber": "NH200",
            "originCity": "Tokyo", "originCode": "HND", "originAirportName": "Haneda",
            "destinationCity": "Paris", "destinationCode": "CDG", "destinationAirportName": "Charles de Gaulle",
            "departAt": "2026-05-01T09:00:00Z",
            "arriveAt": "2026-05-01T12:45:00Z",
            "price": 450.75
        })
    }

    async fn desk(photo: FixedPhoto) -> (BookingDesk, Arc<MemoryTripRepository>, i32) {
        let trips = Arc::new(MemoryTripRepository::new());
        let id = trips
            .create_trip(&NewTrip {
                name: "Trip to Paris".to_string(),
                destination: "Paris".to_string(),
                origin: Some("Tokyo".to_string()),
                budget: Some(2500),
                start_date: None,
                end_date: None,
                source: SEARCH_SOURCE.to_string(),
            })
            .await
            .unwrap();
        let desk = BookingDesk::new(trips.clone(), Arc::new(MemoryBookingRepository::new()), Arc::new(photo));
        (desk, trips, id)
    }

    #[test]
    fn test_invalid_depart_at_is_reported() {
        let mut body = flat_body(1);
        body["departAt"] = json!("soon");
        body["price"] = json!("cheap");
        match BookingRequest::parse(&body) {
            Err(CoreError::Validation(errors)) => {
                assert_eq!(errors, vec!["departAt must be ISO date", "price must be number"])
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_price_outside_i32_is_rejected() {
        let mut body = flat_body(1);
        body["price"] = json!(1e12);
        match BookingRequest::parse(&body) {
            Err(CoreError::Validation(errors)) => assert_eq!(errors, vec!["price must be number"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_empty_body_reports_everything() {
        match BookingRequest::parse(&json!({})) {
            Err(CoreError::Validation(errors)) => assert_eq!(errors.len(), 8),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_nested_airports_and_string_numbers() {
        let body = json!({
            "tripId": "4",
            "carrier": "KLM",
            "flightNumber": "KL200",
            "origin": {"city": "Amsterdam", "code": "AMS", "airportName": "Schiphol"},
            "destination": {"city": "Doha", "code": "DOH", "airportName": "Hamad Intl"},
            "departAt": "2026-05-01",
            "arriveAt": "2026-05-01T12:45:00",
            "price": "520",
            "currency": " "
        });
        let request = BookingRequest::parse(&body).unwrap();
        assert_eq!(request.booking.trip_id, 4);
        assert_eq!(request.booking.origin.code, "AMS");
        assert_eq!(request.booking.destination.airport_name, "Hamad Intl");
        assert_eq!(request.booking.price, 520);
        assert_eq!(request.booking.currency, "USD");
    }

    #[tokio::test]
    async fn test_book_marks_trip_and_resolves_image() {
        let (desk, trips, id) = desk(FixedPhoto(Some("https://images.example/paris.jpg"))).await;
        let booking = desk.book(&flat_body(id)).await.unwrap();

        assert_eq!(booking.price, 450);
        assert_eq!(booking.image_url.as_deref(), Some("https://images.example/paris.jpg"));
        assert!(trips.get_trip(id).await.unwrap().unwrap().is_booked);
        assert_eq!(desk.recent().await.unwrap(), vec![booking]);
    }

    #[tokio::test]
    async fn test_image_failure_is_not_fatal() {
        let (desk, _, id) = desk(FixedPhoto(None)).await;
        let booking = desk.book(&flat_body(id)).await.unwrap();
        assert_eq!(booking.image_url, None);
    }

    #[tokio::test]
    async fn test_provided_image_wins() {
        let (desk, _, id) = desk(FixedPhoto(None)).await;
        let mut body = flat_body(id);
        body["imageUrl"] = json!("https://cdn.example/own.jpg");
        let booking = desk.book(&body).await.unwrap();
        assert_eq!(booking.image_url.as_deref(), Some("https://cdn.example/own.jpg"));
    }
}
