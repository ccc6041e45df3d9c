use serde::{Deserialize, Serialize};
use std::fmt;

/// The six fields a trip needs before flight options can be offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TripField {
    Name,
    Destination,
    Origin,
    StartDate,
    EndDate,
    Budget,
}

impl TripField {
    /// Canonical order used when reporting missing fields.
    pub const ALL: [TripField; 6] = [
        TripField::Name,
        TripField::Destination,
        TripField::Origin,
        TripField::StartDate,
        TripField::EndDate,
        TripField::Budget,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TripField::Name => "name",
            TripField::Destination => "destination",
            TripField::Origin => "origin",
            TripField::StartDate => "startDate",
            TripField::EndDate => "endDate",
            TripField::Budget => "budget",
        }
    }
}

impl fmt::Display for TripField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_wire_names() {
        assert_eq!(serde_json::to_string(&TripField::StartDate).unwrap(), "\"startDate\"");
        let field: TripField = serde_json::from_str("\"endDate\"").unwrap();
        assert_eq!(field, TripField::EndDate);
        assert!(serde_json::from_str::<TripField>("\"hotel\"").is_err());
    }
}
