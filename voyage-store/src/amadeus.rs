use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};
use voyage_core::supplier::{as_location_code, CityMatch, FlightSearchClient, FlightSearchParams, SupplierError};
use voyage_shared::pii::Masked;

use crate::app_config::AmadeusConfig;

const TOKEN_PATH: &str = "/v1/security/oauth2/token";
const LOCATIONS_PATH: &str = "/v1/reference-data/locations";
const CITIES_PATH: &str = "/v1/reference-data/locations/cities";
const FLIGHT_OFFERS_PATH: &str = "/v2/shopping/flight-offers";

/// Tokens are refreshed this long before they actually expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(10);
const MIN_TOKEN_LIFETIME: Duration = Duration::from_secs(30);

struct Credentials {
    api_key: Masked<String>,
    secret_key: Masked<String>,
}

struct AccessToken {
    token: String,
    expires_at: Instant,
}

impl AccessToken {
    fn issued(token: String, expires_in_secs: u64, now: Instant) -> Self {
        Self {
            token,
            expires_at: now + Duration::from_secs(expires_in_secs).max(MIN_TOKEN_LIFETIME),
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.checked_sub(EXPIRY_MARGIN).is_some_and(|t| t > now)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

/// Amadeus self-service client.
///
/// The OAuth token is shared by every request made through this instance. The
/// mutex is held across a refresh so concurrent callers wait for one fetch.
pub struct AmadeusClient {
    http: Client,
    base_url: String,
    credentials: Option<Credentials>,
    token: Mutex<Option<AccessToken>>,
}

impl AmadeusClient {
    pub fn from_config(config: &AmadeusConfig) -> Result<Self, SupplierError> {
        let credentials = match (&config.api_key, &config.secret_key) {
            (Some(key), Some(secret)) if !key.is_blank() && !secret.is_blank() => Some(Credentials {
                api_key: key.clone(),
                secret_key: secret.clone(),
            }),
            _ => None,
        };
        let base_url = config.resolved_base_url();
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SupplierError::Network(e.to_string()))?;
        info!(%base_url, configured = credentials.is_some(), "Amadeus client ready");

        Ok(Self {
            http,
            base_url,
            credentials,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, SupplierError> {
        let credentials = self.credentials.as_ref().ok_or(SupplierError::NotConfigured)?;

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Instant::now())) {
            return Ok(token.token.clone());
        }

        debug!("Requesting Amadeus access token");
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", credentials.api_key.expose().as_str()),
            ("client_secret", credentials.secret_key.expose().as_str()),
        ];
        let response = self
            .http
            .post(format!("{}{}", self.base_url, TOKEN_PATH))
            .form(&form)
            .send()
            .await
            .map_err(|e| SupplierError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SupplierError::Auth {
                status: status.as_u16(),
                body,
            });
        }

        let issued: TokenResponse = response
            .json()
            .await
            .map_err(|e| SupplierError::Network(e.to_string()))?;
        let token = AccessToken::issued(issued.access_token, issued.expires_in, Instant::now());
        let value = token.token.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, SupplierError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .query(params)
            .send()
            .await
            .map_err(|e| SupplierError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SupplierError::Request {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(|e| SupplierError::Network(e.to_string()))
    }

    /// `data[]` of a locations lookup; failures count as no results.
    async fn locations(&self, path: &str, keyword: &str, sub_type: Option<&str>) -> Vec<Value> {
        let mut params = vec![("keyword", keyword.to_string())];
        if let Some(sub_type) = sub_type {
            params.push(("subType", sub_type.to_string()));
        }
        params.push(("page[limit]", "10".to_string()));

        match self.get(path, &params).await {
            Ok(body) => data_items(body),
            Err(e) => {
                debug!(path, error = %e, "Location lookup failed");
                Vec::new()
            }
        }
    }
}

fn data_items(body: Value) -> Vec<Value> {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn iata_code(item: &Value) -> Option<&str> {
    item["iataCode"].as_str().filter(|c| !c.is_empty())
}

fn first_city(items: &[Value], term: &str) -> Option<CityMatch> {
    items.iter().find_map(|item| {
        iata_code(item).map(|code| CityMatch {
            city_code: code.to_string(),
            name: item["name"]
                .as_str()
                .filter(|n| !n.is_empty())
                .unwrap_or(term)
                .to_string(),
        })
    })
}

/// Prefer an AIRPORT entry, then a CITY entry.
fn preferred_code(items: &[Value]) -> Option<String> {
    ["AIRPORT", "CITY"].iter().find_map(|sub_type| {
        items
            .iter()
            .filter(|item| item["subType"].as_str() == Some(*sub_type))
            .find_map(iata_code)
            .map(String::from)
    })
}

#[async_trait]
impl FlightSearchClient for AmadeusClient {
    async fn find_city(&self, keyword: &str) -> Result<Option<CityMatch>, SupplierError> {
        let term = keyword.trim();
        if let Some(code) = as_location_code(term) {
            return Ok(Some(CityMatch {
                city_code: code,
                name: term.to_string(),
            }));
        }

        let cities = self.locations(LOCATIONS_PATH, term, Some("CITY")).await;
        if let Some(found) = first_city(&cities, term) {
            return Ok(Some(found));
        }

        let cities = self.locations(CITIES_PATH, term, None).await;
        Ok(first_city(&cities, term))
    }

    async fn find_airport_for_city(&self, keyword: &str) -> Result<Option<String>, SupplierError> {
        let term = keyword.trim();
        if let Some(code) = as_location_code(term) {
            return Ok(Some(code));
        }

        let airports = self.locations(LOCATIONS_PATH, term, Some("AIRPORT")).await;
        if let Some(code) = airports.iter().find_map(iata_code) {
            return Ok(Some(code.to_string()));
        }

        let mixed = self.locations(LOCATIONS_PATH, term, Some("AIRPORT,CITY")).await;
        if let Some(code) = preferred_code(&mixed) {
            return Ok(Some(code));
        }

        Ok(self.find_city(term).await?.map(|city| city.city_code))
    }

    async fn search_flights(&self, params: &FlightSearchParams) -> Result<Vec<Value>, SupplierError> {
        let mut query = vec![
            ("originLocationCode", params.origin_location_code.clone()),
            ("destinationLocationCode", params.destination_location_code.clone()),
            ("departureDate", params.departure_date.clone()),
        ];
        if let Some(return_date) = &params.return_date {
            query.push(("returnDate", return_date.clone()));
        }
        query.push(("adults", params.adults.max(1).to_string()));
        query.push(("currencyCode", "USD".to_string()));
        query.push(("max", "5".to_string()));

        let body = self.get(FLIGHT_OFFERS_PATH, &query).await?;
        let offers = data_items(body);
        debug!(count = offers.len(), "Flight offers received");
        Ok(offers)
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn unconfigured() -> AmadeusClient {
        AmadeusClient::from_config(&AmadeusConfig {
            api_key: None,
            secret_key: Some(Masked("secret".to_string())),
            env: Some("sandbox".to_string()),
            base_url: None,
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_token_freshness_margin() {
        let now = Instant::now();
        let token = AccessToken::issued("t".to_string(), 1799, now);
        assert!(token.is_fresh(now));
        assert!(token.is_fresh(now + Duration::from_secs(1788)));
        assert!(!token.is_fresh(now + Duration::from_secs(1789)));

        // short-lived tokens are kept for at least the minimum lifetime
        let short = AccessToken::issued("t".to_string(), 0, now);
        assert_eq!(short.expires_at, now + MIN_TOKEN_LIFETIME);
        assert!(short.is_fresh(now + Duration::from_secs(19)));
    }

    #[test]
    fn test_preferred_code_picks_airport_over_city() {
        let items = vec![
            json!({"subType": "CITY", "iataCode": "PAR", "name": "PARIS"}),
            json!({"subType": "AIRPORT", "iataCode": "CDG"}),
        ];
        assert_eq!(preferred_code(&items).as_deref(), Some("CDG"));
        assert_eq!(preferred_code(&items[..1]).as_deref(), Some("PAR"));
        assert_eq!(first_city(&items, "paris").unwrap().name, "PARIS");
        assert_eq!(first_city(&items[1..], "paris").unwrap().name, "paris");
    }

    #[test]
    fn test_data_items_tolerates_shapes() {
        assert_eq!(data_items(json!({"data": [1, 2]})).len(), 2);
        assert!(data_items(json!({"data": {}})).is_empty());
        assert!(data_items(json!([])).is_empty());
    }

    #[tokio::test]
    async fn test_three_letter_codes_skip_the_api() {
        let client = unconfigured();
        assert_eq!(client.base_url(), "https://test.api.amadeus.com");
        assert_eq!(client.find_airport_for_city(" nrt ").await.unwrap().as_deref(), Some("NRT"));
        let city = client.find_city("par").await.unwrap().unwrap();
        assert_eq!((city.city_code.as_str(), city.name.as_str()), ("PAR", "par"));
    }

    #[tokio::test]
    async fn test_hung_token_endpoint_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let client = AmadeusClient::from_config(&AmadeusConfig {
            api_key: Some(Masked("key".to_string())),
            secret_key: Some(Masked("secret".to_string())),
            env: None,
            base_url: Some(format!("http://{}", addr)),
            timeout_secs: 1,
        })
        .unwrap();
        let params = FlightSearchParams {
            origin_location_code: "JFK".to_string(),
            destination_location_code: "LIS".to_string(),
            departure_date: "2026-05-01".to_string(),
            return_date: None,
            adults: 1,
        };

        let result = tokio::time::timeout(Duration::from_secs(10), client.search_flights(&params))
            .await
            .expect("request should give up on its own");
        assert!(matches!(result, Err(SupplierError::Network(_))));
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let client = unconfigured();
        assert_eq!(client.find_airport_for_city("Lisbon").await.unwrap(), None);

        let params = FlightSearchParams {
            origin_location_code: "JFK".to_string(),
            destination_location_code: "LIS".to_string(),
            departure_date: "2026-05-01".to_string(),
            return_date: None,
            adults: 1,
        };
        let err = client.search_flights(&params).await.unwrap_err();
        assert_eq!(err.to_string(), "Amadeus credentials are not configured");
    }
}
