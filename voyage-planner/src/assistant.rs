use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};
use voyage_core::attempt::BestEffort;
use voyage_core::llm::{ChatMessage, Completion, CompletionRequest, LanguageModel, ToolSpec};
use voyage_core::supplier::{summarize_flight_offers, FlightSearchClient, FlightSearchParams};
use voyage_core::{CoreError, CoreResult};

use crate::input::TripInput;

pub const RUN_TRIP_SEARCH_TOOL: &str = "runTripSearch";
pub const NO_RESULTS: &str = "No results.";
pub const MISSING_SEARCH_FIELDS: &str = "Missing required fields to search (destination, origin, startDate).";

const ASSISTANT_SYSTEM_PROMPT: &str = "You are a travel planning assistant. Use the provided history and current details. If you have enough information (destination, origin, and a departure date), call the runTripSearch tool to perform the search and then return a concise summary. If information is missing, ask up to 3 concise questions to fill the gaps. Keep replies short (<= 120 words).";

/// Conversational flight search: the model gathers details and calls
/// `runTripSearch`, whose report it then condenses into the reply.
pub struct TripSearchAssistant {
    model: Arc<dyn LanguageModel>,
    flights: Arc<dyn FlightSearchClient>,
}

impl TripSearchAssistant {
    pub fn new(model: Arc<dyn LanguageModel>, flights: Arc<dyn FlightSearchClient>) -> Self {
        Self { model, flights }
    }

    pub async fn reply(&self, input: &TripInput) -> CoreResult<String> {
        let mut messages = vec![ChatMessage::system(ASSISTANT_SYSTEM_PROMPT)];
        messages.extend(input.messages.iter().cloned());
        let seed = seed_message(input);
        if !seed.is_empty() {
            messages.push(ChatMessage::user(seed));
        }

        let first = self
            .model
            .complete(self.request(messages.clone()))
            .await
            .map_err(|e| CoreError::Upstream(e.to_string()))?;

        let Some(call) = first.tool_call(RUN_TRIP_SEARCH_TOOL).cloned() else {
            return Ok(reply_text(&first).unwrap_or_else(|| NO_RESULTS.to_string()));
        };

        let report = self.run_trip_search(&call.arguments).await;
        let destination = call.arguments.get("destination").and_then(Value::as_str).unwrap_or("");
        info!(destination, "Trip search tool ran");

        messages.push(ChatMessage::assistant_tool_calls(vec![call.clone()]));
        messages.push(ChatMessage::tool_result(call.id, report.clone()));
        let follow_up = self
            .model
            .complete(self.request(messages))
            .await
            .best_effort("trip search follow-up");

        Ok(follow_up
            .as_ref()
            .and_then(reply_text)
            .or_else(|| (!report.is_empty()).then(|| report.clone()))
            .unwrap_or_else(|| NO_RESULTS.to_string()))
    }

    fn request(&self, messages: Vec<ChatMessage>) -> CompletionRequest {
        CompletionRequest::new(messages)
            .with_tool(run_trip_search_tool())
            .temperature(0.2)
            .max_tokens(400)
    }

    /// Resolve codes, search flights and describe what was found.
    pub async fn run_trip_search(&self, args: &Value) -> String {
        let string_arg = |key: &str| args.get(key).and_then(Value::as_str).map(str::trim).unwrap_or("").to_string();
        let name = args.get("name").and_then(Value::as_str);
        let destination = string_arg("destination");
        let origin = string_arg("origin");
        let depart = string_arg("startDate");
        let return_date = args.get("endDate").and_then(Value::as_str).map(String::from);
        let budget = args.get("budget").and_then(Value::as_f64);

        if destination.is_empty() || origin.is_empty() || depart.is_empty() {
            return MISSING_SEARCH_FIELDS.to_string();
        }

        let city_code = self
            .flights
            .find_city(&destination)
            .await
            .best_effort("destination city lookup")
            .flatten()
            .map(|c| c.city_code);
        let destination_airport = self
            .flights
            .find_airport_for_city(&destination)
            .await
            .best_effort("destination airport lookup")
            .flatten();
        let origin_code = self
            .flights
            .find_airport_for_city(&origin)
            .await
            .best_effort("origin airport lookup")
            .flatten();

        let mut flight_error = None;
        let target = destination_airport.clone().or_else(|| city_code.clone());
        let offers = match (&origin_code, &target) {
            (Some(origin_code), Some(target)) => {
                let params = FlightSearchParams {
                    origin_location_code: origin_code.clone(),
                    destination_location_code: target.clone(),
                    departure_date: depart.clone(),
                    return_date: return_date.clone(),
                    adults: 1,
                };
                match self.flights.search_flights(&params).await {
                    Ok(offers) => offers,
                    Err(e) => {
                        warn!("Flight search failed: {}", e);
                        flight_error = Some(e.to_string());
                        Vec::new()
                    }
                }
            }
            _ => Vec::new(),
        };

        let suffix = |code: &Option<String>| code.as_ref().map(|c| format!(" ({})", c)).unwrap_or_default();
        let or_na = |code: &Option<String>| code.clone().unwrap_or_else(|| "n/a".to_string());

        let mut lines = Vec::new();
        if let Some(name) = name {
            lines.push(format!("Trip: {}", name));
        }
        lines.push(format!("Destination: {}{}", destination, suffix(&city_code)));
        lines.push(format!("Origin: {}{}", origin, suffix(&origin_code)));
        match &return_date {
            Some(ret) => lines.push(format!("Dates: {} → {}", depart, ret)),
            None => lines.push(format!("Dates: {}", depart)),
        }
        if let Some(budget) = budget {
            lines.push(format!("Budget: ${}", budget));
        }
        lines.push(format!("Flights: {}", summarize_flight_offers(&offers)));
        if offers.is_empty() {
            lines.push(format!(
                "Resolved codes — origin: {}, destinationAirport: {}, city: {}",
                or_na(&origin_code),
                or_na(&destination_airport),
                or_na(&city_code)
            ));
        }
        lines.push(format!("Amadeus base: {}", self.flights.base_url()));
        if let Some(error) = flight_error {
            lines.push(format!("Flights error: {}", error));
        }
        if offers.is_empty() {
            lines.push("Note: Amadeus sandbox data is limited. Try major origins (JFK/LHR) or closer dates.".to_string());
        }
        lines.join("\n")
    }
}

fn reply_text(completion: &Completion) -> Option<String> {
    completion.text.as_deref().map(str::trim).filter(|t| !t.is_empty()).map(String::from)
}

fn seed_message(input: &TripInput) -> String {
    let mut lines = Vec::new();
    if let Some(name) = input.name.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("Trip name: {}", name));
    }
    if let Some(destination) = input.destination.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("Destination: {}", destination));
    }
    if let Some(budget) = input.budget {
        lines.push(format!("Budget: ${}", budget));
    }
    if let Some(origin) = input.origin.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("Origin: {}", origin));
    }
    if let Some(start) = input.start_date.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("Start date: {}", start));
    }
    if let Some(end) = input.end_date.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("End date: {}", end));
    }
    lines.join("\n")
}

pub fn run_trip_search_tool() -> ToolSpec {
    ToolSpec {
        name: RUN_TRIP_SEARCH_TOOL.to_string(),
        description: "Run Amadeus searches and summarize flights. Requires origin, destination, and departure date."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "Trip name"},
                "destination": {"type": "string", "description": "City or airport code for destination"},
                "origin": {"type": "string", "description": "City or airport code for origin"},
                "startDate": {"type": "string", "description": "Departure date YYYY-MM-DD"},
                "endDate": {"type": "string", "description": "Return date YYYY-MM-DD (optional)"},
                "budget": {"type": ["number", "null"], "description": "Budget in USD (optional)"}
            },
            "required": ["destination", "origin", "startDate"]
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use voyage_core::supplier::{as_location_code, CityMatch, SupplierError};

    #[derive(Default)]
    struct StubFlights {
        fail_search: bool,
        searches: Mutex<Vec<FlightSearchParams>>,
    }

    #[async_trait]
    impl FlightSearchClient for StubFlights {
        async fn find_city(&self, keyword: &str) -> Result<Option<CityMatch>, SupplierError> {
            Ok(match keyword {
                "Paris" => Some(CityMatch { city_code: "PAR".to_string(), name: "Paris".to_string() }),
                _ => as_location_code(keyword).map(|code| CityMatch { city_code: code, name: keyword.to_string() }),
            })
        }

        async fn find_airport_for_city(&self, keyword: &str) -> Result<Option<String>, SupplierError> {
            Ok(match keyword {
                "Paris" => Some("CDG".to_string()),
                "Tokyo" => Some("HND".to_string()),
                _ => None,
            })
        }

        async fn search_flights(&self, params: &FlightSearchParams) -> Result<Vec<Value>, SupplierError> {
            self.searches.lock().unwrap().push(params.clone());
            if self.fail_search {
                return Err(SupplierError::NotConfigured);
            }
            Ok(vec![json!({
                "price": {"total": "812.40"},
                "itineraries": [{"segments": [{
                    "carrierCode": "AF",
                    "departure": {"iataCode": "HND", "at": "2026-05-01T10:35:00"},
                    "arrival": {"iataCode": "CDG"}
                }]}]
            })])
        }

        fn base_url(&self) -> &str {
            "https://test.api.amadeus.com"
        }
    }

    fn search_args() -> Value {
        json!({"destination": "Paris", "origin": "Tokyo", "startDate": "2026-05-01", "budget": 2500})
    }

    #[tokio::test]
    async fn test_tool_report() {
        let flights = Arc::new(StubFlights::default());
        let assistant = TripSearchAssistant::new(Arc::new(ScriptedModel::new()), flights.clone());
        let report = assistant.run_trip_search(&search_args()).await;

        assert_eq!(
            report,
            "Destination: Paris (PAR)\nOrigin: Tokyo (HND)\nDates: 2026-05-01\nBudget: $2500\nFlights: AF HND→CDG 2026-05-01 10:35, $812.40\nAmadeus base: https://test.api.amadeus.com"
        );
        let searches = flights.searches.lock().unwrap();
        assert_eq!(searches[0].destination_location_code, "CDG");
        assert_eq!(searches[0].adults, 1);
    }

    #[tokio::test]
    async fn test_tool_requires_route_and_date() {
        let assistant = TripSearchAssistant::new(Arc::new(ScriptedModel::new()), Arc::new(StubFlights::default()));
        let report = assistant.run_trip_search(&json!({"destination": "Paris", "origin": " "})).await;
        assert_eq!(report, MISSING_SEARCH_FIELDS);
    }

    #[tokio::test]
    async fn test_tool_reports_search_failure() {
        let flights = Arc::new(StubFlights {
            fail_search: true,
            ..Default::default()
        });
        let assistant = TripSearchAssistant::new(Arc::new(ScriptedModel::new()), flights);
        let report = assistant.run_trip_search(&search_args()).await;
        assert!(report.contains("Flights: No flights found."));
        assert!(report.contains("Resolved codes — origin: HND, destinationAirport: CDG, city: PAR"));
        assert!(report.contains("Flights error: Amadeus credentials are not configured"));
    }

    #[tokio::test]
    async fn test_reply_feeds_tool_result_back() {
        let model = Arc::new(
            ScriptedModel::new()
                .tool(RUN_TRIP_SEARCH_TOOL, search_args())
                .text("Air France has a flight at 10:35 for $812."),
        );
        let assistant = TripSearchAssistant::new(model.clone(), Arc::new(StubFlights::default()));
        let input = TripInput::from_value(&json!({"destination": "Paris", "origin": "Tokyo"}));
        let reply = assistant.reply(&input).await.unwrap();

        assert_eq!(reply, "Air France has a flight at 10:35 for $812.");
        let follow_up = model.request(1);
        let tool_message = follow_up.messages.last().unwrap();
        assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));
        assert!(tool_message.content.starts_with("Destination: Paris (PAR)"));
        assert_eq!(model.request(0).messages.last().unwrap().content, "Destination: Paris\nOrigin: Tokyo");
    }

    #[tokio::test]
    async fn test_reply_falls_back_to_report_then_no_results() {
        let model = Arc::new(ScriptedModel::new().tool(RUN_TRIP_SEARCH_TOOL, search_args()).failure());
        let assistant = TripSearchAssistant::new(model, Arc::new(StubFlights::default()));
        let reply = assistant.reply(&TripInput::default()).await.unwrap();
        assert!(reply.starts_with("Destination: Paris (PAR)"));

        let model = Arc::new(ScriptedModel::new().text("   "));
        let assistant = TripSearchAssistant::new(model, Arc::new(StubFlights::default()));
        assert_eq!(assistant.reply(&TripInput::default()).await.unwrap(), NO_RESULTS);
    }

    #[tokio::test]
    async fn test_model_failure_is_an_error() {
        let assistant = TripSearchAssistant::new(Arc::new(ScriptedModel::new().failure()), Arc::new(StubFlights::default()));
        assert!(matches!(assistant.reply(&TripInput::default()).await, Err(CoreError::Upstream(_))));
    }
}
