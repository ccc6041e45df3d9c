use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::TripField;

pub const SEARCH_SOURCE: &str = "search";
pub const EMAIL_SOURCE_PREFIX: &str = "email:";

/// A trip in progress (the `potential_trips` row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: i32,
    pub name: String,
    pub destination: String,
    pub origin: Option<String>,
    pub budget: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub source: String,
    pub is_booked: bool,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    pub fn has(&self, field: TripField) -> bool {
        match field {
            TripField::Name => !self.name.trim().is_empty(),
            TripField::Destination => !self.destination.trim().is_empty(),
            TripField::Origin => self.origin.as_deref().is_some_and(|o| !o.trim().is_empty()),
            TripField::Budget => self.budget.is_some(),
            TripField::StartDate => self.start_date.is_some(),
            TripField::EndDate => self.end_date.is_some(),
        }
    }

    /// Missing required fields, in canonical order.
    pub fn missing_fields(&self) -> Vec<TripField> {
        TripField::ALL.into_iter().filter(|f| !self.has(*f)).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn is_from_email(&self) -> bool {
        self.source.starts_with(EMAIL_SOURCE_PREFIX)
    }

    /// Multi-line `field: value` rendering fed to the model.
    pub fn describe(&self) -> String {
        format!(
            "name: {}\ndestination: {}\norigin: {}\nbudget: {}\nstartDate: {}\nendDate: {}",
            self.name,
            self.destination,
            self.origin.as_deref().unwrap_or(""),
            self.budget.map(|b| b.to_string()).unwrap_or_default(),
            self.start_date.map(|d| d.to_rfc3339()).unwrap_or_default(),
            self.end_date.map(|d| d.to_rfc3339()).unwrap_or_default(),
        )
    }
}

pub fn email_source(email_id: i32) -> String {
    format!("{}{}", EMAIL_SOURCE_PREFIX, email_id)
}

/// Values for inserting a new trip row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrip {
    pub name: String,
    pub destination: String,
    pub origin: Option<String>,
    pub budget: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub source: String,
}

/// A partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripChanges {
    pub name: Option<String>,
    pub destination: Option<String>,
    pub origin: Option<String>,
    pub budget: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl TripChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.destination.is_none()
            && self.origin.is_none()
            && self.budget.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }

    pub fn apply_to(&self, trip: &mut Trip) {
        if let Some(name) = &self.name {
            trip.name = name.clone();
        }
        if let Some(destination) = &self.destination {
            trip.destination = destination.clone();
        }
        if let Some(origin) = &self.origin {
            trip.origin = Some(origin.clone());
        }
        if let Some(budget) = self.budget {
            trip.budget = Some(budget);
        }
        if let Some(start) = self.start_date {
            trip.start_date = Some(start);
        }
        if let Some(end) = self.end_date {
            trip.end_date = Some(end);
        }
    }
}

/// Narrowing for the email-sourced trip queries behind `/api/emails`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EmailTripFilter {
    pub since: Option<DateTime<Utc>>,
    pub after_id: Option<i32>,
}

impl EmailTripFilter {
    pub fn matches(&self, trip: &Trip) -> bool {
        !trip.is_booked
            && trip.is_from_email()
            && self.since.map_or(true, |since| trip.created_at > since)
            && self.after_id.map_or(true, |after| trip.id > after)
    }
}

/// Trim and drop blank strings.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

/// Whole currency units, truncated toward zero. Values outside `i32` are absent.
pub fn whole_units(value: f64) -> Option<i32> {
    if !value.is_finite() {
        return None;
    }
    i32::try_from(value.trunc() as i64).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn trip() -> Trip {
        Trip {
            id: 1,
            name: "Trip to Kyoto".to_string(),
            destination: "Kyoto".to_string(),
            origin: None,
            budget: None,
            start_date: None,
            end_date: None,
            source: SEARCH_SOURCE.to_string(),
            is_booked: false,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_missing_fields_in_canonical_order() {
        let t = trip();
        assert_eq!(
            t.missing_fields(),
            vec![TripField::Origin, TripField::StartDate, TripField::EndDate, TripField::Budget]
        );
        assert!(!t.is_complete());
    }

    #[test]
    fn test_blank_strings_count_as_missing() {
        let mut t = trip();
        t.name = "   ".to_string();
        t.origin = Some(" ".to_string());
        assert!(!t.has(TripField::Name));
        assert!(!t.has(TripField::Origin));
    }

    #[test]
    fn test_complete_when_all_six_present() {
        let mut t = trip();
        TripChanges {
            origin: Some("Tokyo".to_string()),
            budget: Some(2500),
            start_date: Some(Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap()),
            end_date: Some(Utc.with_ymd_and_hms(2026, 5, 8, 0, 0, 0).unwrap()),
            ..Default::default()
        }
        .apply_to(&mut t);
        assert!(t.is_complete());
    }

    #[test]
    fn test_whole_units_rejects_out_of_range() {
        assert_eq!(whole_units(2500.9), Some(2500));
        assert_eq!(whole_units(-0.5), Some(0));
        assert_eq!(whole_units(i32::MAX as f64), Some(i32::MAX));
        assert_eq!(whole_units(3_000_000_000.0), None);
        assert_eq!(whole_units(1e300), None);
        assert_eq!(whole_units(f64::NAN), None);
    }

    #[test]
    fn test_email_filter() {
        let mut t = trip();
        t.source = email_source(9);
        t.id = 5;
        assert!(EmailTripFilter::default().matches(&t));
        assert!(!EmailTripFilter { after_id: Some(5), since: None }.matches(&t));
        t.is_booked = true;
        assert!(!EmailTripFilter::default().matches(&t));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  Paris ")), Some("Paris".to_string()));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
