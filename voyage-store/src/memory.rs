//! In-memory repositories
//!
//! Thread-safe stand-ins for the Postgres repositories, backed by vectors
//! behind an async RwLock. Ids are assigned serially from 1 like a `SERIAL`
//! column. Used by the test suites in place of Postgres.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use voyage_core::booking::{Booking, NewBooking};
use voyage_core::email::{Email, NewEmail};
use voyage_core::repository::{BookingRepository, EmailRepository, RepoResult, TripRepository};
use voyage_core::trip::{EmailTripFilter, NewTrip, Trip, TripChanges, SEARCH_SOURCE};

/// Newest first; rows created within the same instant fall back to id order.
fn newest_first(trips: &mut [Trip]) {
    trips.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTripRepository {
    trips: Arc<RwLock<Vec<Trip>>>,
}

impl MemoryTripRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.trips.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.trips.read().await.is_empty()
    }

    async fn email_trips(&self, filter: &EmailTripFilter) -> Vec<Trip> {
        let mut matched: Vec<Trip> = self
            .trips
            .read()
            .await
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        newest_first(&mut matched);
        matched
    }
}

#[async_trait]
impl TripRepository for MemoryTripRepository {
    async fn create_trip(&self, trip: &NewTrip) -> RepoResult<i32> {
        let mut trips = self.trips.write().await;
        let id = trips.len() as i32 + 1;
        trips.push(Trip {
            id,
            name: trip.name.clone(),
            destination: trip.destination.clone(),
            origin: trip.origin.clone(),
            budget: trip.budget,
            start_date: trip.start_date,
            end_date: trip.end_date,
            source: trip.source.clone(),
            is_booked: false,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn get_trip(&self, id: i32) -> RepoResult<Option<Trip>> {
        Ok(self.trips.read().await.iter().find(|t| t.id == id).cloned())
    }

    async fn update_trip(&self, id: i32, changes: &TripChanges) -> RepoResult<()> {
        if let Some(trip) = self.trips.write().await.iter_mut().find(|t| t.id == id) {
            changes.apply_to(trip);
        }
        Ok(())
    }

    async fn mark_booked(&self, id: i32) -> RepoResult<bool> {
        match self.trips.write().await.iter_mut().find(|t| t.id == id) {
            Some(trip) => {
                trip.is_booked = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_email_trips(&self, filter: &EmailTripFilter) -> RepoResult<i64> {
        Ok(self.trips.read().await.iter().filter(|t| filter.matches(t)).count() as i64)
    }

    async fn latest_email_trip(&self, filter: &EmailTripFilter) -> RepoResult<Option<Trip>> {
        Ok(self.email_trips(filter).await.into_iter().next())
    }

    async fn list_email_trips(&self, limit: i64) -> RepoResult<Vec<Trip>> {
        let mut trips = self.email_trips(&EmailTripFilter::default()).await;
        trips.truncate(limit.max(0) as usize);
        Ok(trips)
    }

    async fn list_recent_searches(&self, limit: i64) -> RepoResult<Vec<Trip>> {
        let mut trips: Vec<Trip> = self
            .trips
            .read()
            .await
            .iter()
            .filter(|t| !t.is_booked && t.source == SEARCH_SOURCE)
            .cloned()
            .collect();
        newest_first(&mut trips);
        trips.truncate(limit.max(0) as usize);
        Ok(trips)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBookingRepository {
    bookings: Arc<RwLock<Vec<Booking>>>,
}

impl MemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingRepository for MemoryBookingRepository {
    async fn create_booking(&self, booking: &NewBooking) -> RepoResult<Booking> {
        let mut bookings = self.bookings.write().await;
        let row = Booking {
            id: bookings.len() as i32 + 1,
            trip_id: booking.trip_id,
            carrier: booking.carrier.clone(),
            flight_number: booking.flight_number.clone(),
            origin_city: booking.origin.city.clone(),
            origin_code: booking.origin.code.clone(),
            origin_airport_name: booking.origin.airport_name.clone(),
            destination_city: booking.destination.city.clone(),
            destination_code: booking.destination.code.clone(),
            destination_airport_name: booking.destination.airport_name.clone(),
            depart_at: booking.depart_at,
            arrive_at: booking.arrive_at,
            price: booking.price,
            currency: booking.currency.clone(),
            image_url: booking.image_url.clone(),
            created_at: Utc::now(),
        };
        bookings.push(row.clone());
        Ok(row)
    }

    async fn list_recent_bookings(&self, limit: i64) -> RepoResult<Vec<Booking>> {
        let mut bookings = self.bookings.read().await.clone();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        bookings.truncate(limit.max(0) as usize);
        Ok(bookings)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryEmailRepository {
    emails: Arc<RwLock<Vec<Email>>>,
}

impl MemoryEmailRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmailRepository for MemoryEmailRepository {
    async fn create_email(&self, email: &NewEmail) -> RepoResult<Email> {
        let mut emails = self.emails.write().await;
        let row = Email {
            id: emails.len() as i32 + 1,
            subject: email.subject.clone(),
            body: email.body.clone(),
            sender_email: email.sender_email.clone(),
            recipient_email: email.recipient_email.clone(),
            is_read: email.is_read,
            folder: email.folder.clone(),
            sent_at: email.sent_at.unwrap_or_else(Utc::now),
        };
        emails.push(row.clone());
        Ok(row)
    }
}
