use async_trait::async_trait;

use crate::booking::{Booking, NewBooking};
use crate::email::{Email, NewEmail};
use crate::trip::{EmailTripFilter, NewTrip, Trip, TripChanges};

pub type RepoResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Repository trait for `potential_trips` access
#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn create_trip(&self, trip: &NewTrip) -> RepoResult<i32>;

    async fn get_trip(&self, id: i32) -> RepoResult<Option<Trip>>;

    /// Apply the non-`None` fields of `changes`. Unknown ids are a no-op.
    async fn update_trip(&self, id: i32, changes: &TripChanges) -> RepoResult<()>;

    /// Flag a trip as booked; returns false when no row matched.
    async fn mark_booked(&self, id: i32) -> RepoResult<bool>;

    async fn count_email_trips(&self, filter: &EmailTripFilter) -> RepoResult<i64>;

    async fn latest_email_trip(&self, filter: &EmailTripFilter) -> RepoResult<Option<Trip>>;

    /// Newest un-booked email-sourced trips first.
    async fn list_email_trips(&self, limit: i64) -> RepoResult<Vec<Trip>>;

    /// Newest un-booked trips created from the search box.
    async fn list_recent_searches(&self, limit: i64) -> RepoResult<Vec<Trip>>;
}

/// Repository trait for booking data access
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create_booking(&self, booking: &NewBooking) -> RepoResult<Booking>;

    async fn list_recent_bookings(&self, limit: i64) -> RepoResult<Vec<Booking>>;
}

#[async_trait]
pub trait EmailRepository: Send + Sync {
    async fn create_email(&self, email: &NewEmail) -> RepoResult<Email>;
}
