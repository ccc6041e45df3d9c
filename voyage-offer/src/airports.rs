struct AirportEntry {
    keyword: &'static str,
    code: &'static str,
    city: &'static str,
    name: &'static str,
}

const AIRPORTS: [AirportEntry; 20] = [
    AirportEntry { keyword: "paris", code: "CDG", city: "Paris", name: "Charles de Gaulle" },
    AirportEntry { keyword: "london", code: "LHR", city: "London", name: "Heathrow" },
    AirportEntry { keyword: "tokyo", code: "HND", city: "Tokyo", name: "Haneda" },
    AirportEntry { keyword: "osaka", code: "KIX", city: "Osaka", name: "Kansai" },
    AirportEntry { keyword: "kyoto", code: "KIX", city: "Kyoto", name: "Kansai (via Osaka)" },
    AirportEntry { keyword: "amsterdam", code: "AMS", city: "Amsterdam", name: "Schiphol" },
    AirportEntry { keyword: "frankfurt", code: "FRA", city: "Frankfurt", name: "Frankfurt" },
    AirportEntry { keyword: "berlin", code: "BER", city: "Berlin", name: "Brandenburg" },
    AirportEntry { keyword: "munich", code: "MUC", city: "Munich", name: "Franz Josef Strauß" },
    AirportEntry { keyword: "dubai", code: "DXB", city: "Dubai", name: "Dubai Intl" },
    AirportEntry { keyword: "abu", code: "AUH", city: "Abu Dhabi", name: "Zayed Intl" },
    AirportEntry { keyword: "doha", code: "DOH", city: "Doha", name: "Hamad Intl" },
    AirportEntry { keyword: "singapore", code: "SIN", city: "Singapore", name: "Changi" },
    AirportEntry { keyword: "new york", code: "JFK", city: "New York", name: "JFK" },
    AirportEntry { keyword: "los angeles", code: "LAX", city: "Los Angeles", name: "LAX" },
    AirportEntry { keyword: "san francisco", code: "SFO", city: "San Francisco", name: "SFO" },
    AirportEntry { keyword: "miami", code: "MIA", city: "Miami", name: "MIA" },
    AirportEntry { keyword: "chicago", code: "ORD", city: "Chicago", name: "O'Hare" },
    AirportEntry { keyword: "boston", code: "BOS", city: "Boston", name: "Logan" },
    AirportEntry { keyword: "seattle", code: "SEA", city: "Seattle", name: "Sea-Tac" },
];

/// Display form of a place on a flight card. Known cities carry their primary
/// airport; anything else is shown as typed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedAirport {
    pub code: Option<String>,
    pub city: Option<String>,
    pub name: Option<String>,
    pub label: String,
}

pub fn resolve_airport(input: Option<&str>) -> ResolvedAirport {
    let text = input.map(str::trim).unwrap_or("");
    if text.is_empty() {
        return ResolvedAirport::default();
    }

    let lower = text.to_lowercase();
    match AIRPORTS.iter().find(|a| lower.contains(a.keyword)) {
        Some(a) => ResolvedAirport {
            code: Some(a.code.to_string()),
            city: Some(a.city.to_string()),
            name: Some(a.name.to_string()),
            label: format!("{} ({})", a.code, a.city),
        },
        None => ResolvedAirport {
            label: text.to_string(),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_city() {
        let airport = resolve_airport(Some("  Kyoto, Japan "));
        assert_eq!(airport.label, "KIX (Kyoto)");
        assert_eq!(airport.name.as_deref(), Some("Kansai (via Osaka)"));
    }

    #[test]
    fn test_unknown_city_keeps_text() {
        let airport = resolve_airport(Some(" Reykjavik "));
        assert_eq!(airport.label, "Reykjavik");
        assert_eq!(airport.code, None);
    }

    #[test]
    fn test_blank() {
        assert_eq!(resolve_airport(None), ResolvedAirport::default());
        assert_eq!(resolve_airport(Some("  ")).label, "");
    }
}
