use chrono::{DateTime, Duration, NaiveTime, Utc};
use tracing::debug;
use voyage_core::booking::DEFAULT_CURRENCY;
use voyage_core::trip::Trip;
use voyage_core::TripField;
use voyage_shared::FlightOffer;

use crate::airports::resolve_airport;
use crate::regions::{carrier_code, Airline, Region};

const OFFER_COUNT: usize = 3;
const MAX_CARRIERS: usize = 6;
const BASE_PRICE: i32 = 450;
const PRICE_STEP: i32 = 70;
const BASE_DURATION_MINUTES: i64 = 225;
const DURATION_STEP_MINUTES: i64 = 20;

#[derive(Debug, thiserror::Error)]
pub enum OfferError {
    #[error("Trip is missing required fields: {0:?}")]
    IncompleteTrip(Vec<TripField>),
    #[error("Invalid departure time for offer {0}")]
    InvalidSchedule(usize),
}

/// Synthesizes the three mock flight options shown for a complete trip.
#[derive(Debug, Clone, Default)]
pub struct FlightOfferGenerator;

impl FlightOfferGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, trip: &Trip) -> Result<Vec<FlightOffer>, OfferError> {
        self.generate_at(trip, Utc::now())
    }

    /// Deterministic for a given trip and clock.
    pub fn generate_at(&self, trip: &Trip, now: DateTime<Utc>) -> Result<Vec<FlightOffer>, OfferError> {
        let missing = trip.missing_fields();
        if !missing.is_empty() {
            return Err(OfferError::IncompleteTrip(missing));
        }

        let base_day = trip.start_date.unwrap_or(now).date_naive();
        let airlines = carriers_for(trip.origin.as_deref(), &trip.destination);
        let origin = resolve_airport(trip.origin.as_deref());
        let destination = resolve_airport(Some(&trip.destination));
        debug!(trip_id = trip.id, carriers = airlines.len(), "Generating flight offers");

        (0..OFFER_COUNT)
            .map(|i| {
                let airline = airlines.get(i).or(airlines.first()).copied().unwrap_or(Region::Us.airlines()[0]);
                let hour = 9 + 2 * i as u32;
                let depart_at = NaiveTime::from_hms_opt(hour, 0, 0)
                    .map(|t| base_day.and_time(t).and_utc())
                    .ok_or(OfferError::InvalidSchedule(i))?;
                let duration_minutes = BASE_DURATION_MINUTES + DURATION_STEP_MINUTES * i as i64;

                Ok(FlightOffer {
                    id: format!("{}-{}", trip.id, i + 1),
                    carrier: airline.carrier.to_string(),
                    carrier_logo: airline.logo.to_string(),
                    flight_number: format!("{}{}", carrier_code(airline.carrier), 200 + 7 * i),
                    origin: origin.label.clone(),
                    destination: destination.label.clone(),
                    depart_at,
                    arrive_at: depart_at + Duration::minutes(duration_minutes),
                    duration_minutes,
                    price: BASE_PRICE + PRICE_STEP * i as i32,
                    currency: DEFAULT_CURRENCY.to_string(),
                    origin_city: origin.city.clone(),
                    origin_code: origin.code.clone(),
                    origin_airport_name: origin.name.clone(),
                    destination_city: destination.city.clone(),
                    destination_code: destination.code.clone(),
                    destination_airport_name: destination.name.clone(),
                })
            })
            .collect()
    }
}

/// Origin carriers first, then destination carriers (US when unknown),
/// topped up with US carriers when fewer than three remain after dedupe.
pub fn carriers_for(origin: Option<&str>, destination: &str) -> Vec<Airline> {
    let mut combined: Vec<Airline> = Vec::new();
    if let Some(region) = origin.and_then(Region::detect) {
        push_unique(&mut combined, region.airlines());
    }
    push_unique(&mut combined, Region::detect(destination).unwrap_or(Region::Us).airlines());
    if combined.len() < OFFER_COUNT {
        push_unique(&mut combined, Region::Us.airlines());
    }
    combined
}

/// Append carriers not already present by lowercase name, up to the cap.
fn push_unique(combined: &mut Vec<Airline>, airlines: &[Airline]) {
    for airline in airlines {
        if combined.len() >= MAX_CARRIERS {
            break;
        }
        let key = airline.carrier.to_lowercase();
        if combined.iter().any(|a| a.carrier.to_lowercase() == key) {
            continue;
        }
        combined.push(*airline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use voyage_core::trip::SEARCH_SOURCE;

    fn trip(origin: &str, destination: &str) -> Trip {
        Trip {
            id: 42,
            name: format!("Trip to {}", destination),
            destination: destination.to_string(),
            origin: Some(origin.to_string()),
            budget: Some(2500),
            start_date: Some(Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap()),
            end_date: Some(Utc.with_ymd_and_hms(2026, 5, 8, 0, 0, 0).unwrap()),
            source: SEARCH_SOURCE.to_string(),
            is_booked: false,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_tokyo_to_paris_prefers_origin_carriers() {
        let offers = FlightOfferGenerator::new().generate(&trip("Tokyo", "Paris")).unwrap();
        assert_eq!(offers.len(), 3);
        assert_eq!(offers[0].carrier, "All Nippon Airways");
        assert_eq!(offers[0].flight_number, "NH200");
        assert_eq!(offers[1].flight_number, "JL207");
        assert_eq!(offers[2].flight_number, "MM214");

        let carriers = carriers_for(Some("Tokyo"), "Paris");
        assert!(carriers.iter().any(|a| a.carrier == "Air France"));
    }

    #[test]
    fn test_prices_times_and_ids() {
        let offers = FlightOfferGenerator::new().generate(&trip("Paris", "Tokyo")).unwrap();
        let prices: Vec<i32> = offers.iter().map(|o| o.price).collect();
        assert_eq!(prices, vec![450, 520, 590]);
        assert_eq!(offers[0].id, "42-1");
        assert_eq!(offers[2].id, "42-3");
        assert_eq!(offers[0].depart_at, Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap());
        assert_eq!(offers[1].depart_at, Utc.with_ymd_and_hms(2026, 5, 1, 11, 0, 0).unwrap());
        for offer in &offers {
            assert_eq!(offer.arrive_at - offer.depart_at, Duration::minutes(offer.duration_minutes));
            assert_eq!(offer.currency, "USD");
            assert_eq!(offer.origin, "CDG (Paris)");
            assert_eq!(offer.destination, "HND (Tokyo)");
        }
        assert_eq!(offers[2].duration_minutes, 265);
    }

    #[test]
    fn test_unknown_places_fall_back_to_us_carriers() {
        let offers = FlightOfferGenerator::new().generate(&trip("Reykjavik", "Lima")).unwrap();
        assert_eq!(offers[0].carrier, "Delta Air Lines");
        assert_eq!(offers[0].origin, "Reykjavik");
        assert_eq!(offers[0].origin_code, None);
    }

    #[test]
    fn test_dedupes_and_tops_up() {
        let carriers = carriers_for(Some("Doha"), "Qatar");
        let names: Vec<&str> = carriers.iter().map(|a| a.carrier).collect();
        assert_eq!(names, vec!["Qatar Airways", "Delta Air Lines", "United Airlines", "American Airlines"]);

        let mixed = carriers_for(Some("Amsterdam"), "London");
        assert_eq!(mixed.iter().filter(|a| a.carrier == "easyJet").count(), 1);
        assert!(mixed.len() <= MAX_CARRIERS);
    }

    #[test]
    fn test_rejects_incomplete_trip() {
        let mut t = trip("Paris", "Tokyo");
        t.budget = None;
        assert!(matches!(
            FlightOfferGenerator::new().generate(&t),
            Err(OfferError::IncompleteTrip(fields)) if fields == vec![TripField::Budget]
        ));
    }
}
