use async_trait::async_trait;
use serde_json::Value;

/// A resolved city from the locations API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityMatch {
    pub city_code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightSearchParams {
    pub origin_location_code: String,
    pub destination_location_code: String,
    /// YYYY-MM-DD
    pub departure_date: String,
    pub return_date: Option<String>,
    pub adults: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum SupplierError {
    #[error("Amadeus credentials are not configured")]
    NotConfigured,
    #[error("Amadeus auth failed: {status} {body}")]
    Auth { status: u16, body: String },
    #[error("Amadeus GET {path} failed: {status} {body}")]
    Request { path: String, status: u16, body: String },
    #[error("Network error: {0}")]
    Network(String),
}

/// Flight-data supplier used by the trip search assistant.
#[async_trait]
pub trait FlightSearchClient: Send + Sync {
    async fn find_city(&self, keyword: &str) -> Result<Option<CityMatch>, SupplierError>;

    /// Airport code for a city keyword, falling back to the city code.
    async fn find_airport_for_city(&self, keyword: &str) -> Result<Option<String>, SupplierError>;

    /// Raw offer objects as returned by the supplier.
    async fn search_flights(&self, params: &FlightSearchParams) -> Result<Vec<Value>, SupplierError>;

    fn base_url(&self) -> &str;
}

/// Destination photo lookup.
#[async_trait]
pub trait PhotoSearch: Send + Sync {
    async fn destination_image(
        &self,
        city: &str,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>>;
}

/// `XXX` style code: three ASCII letters, case-insensitive.
pub fn as_location_code(term: &str) -> Option<String> {
    let code = term.trim().to_ascii_uppercase();
    (code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())).then_some(code)
}

/// One line for each of the first two offers, joined by `"; "`.
pub fn summarize_flight_offers(offers: &[Value]) -> String {
    if offers.is_empty() {
        return "No flights found.".to_string();
    }

    offers
        .iter()
        .take(2)
        .map(|offer| {
            let price = match offer.pointer("/price/total") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => "?".to_string(),
            };
            let segment = offer.pointer("/itineraries/0/segments/0");
            let field = |path: &str| {
                segment
                    .and_then(|s| s.pointer(path))
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string()
            };
            let depart_time: String = field("/departure/at").chars().take(16).collect::<String>().replacen('T', " ", 1);
            format!(
                "{} {}→{} {}, ${}",
                field("/carrierCode"),
                field("/departure/iataCode"),
                field("/arrival/iataCode"),
                depart_time,
                price
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}
