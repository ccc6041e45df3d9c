use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use voyage_core::attempt::{attempt, settle, AttemptResult, BestEffort};
use voyage_core::dates::parse_timestamp;
use voyage_core::extract::extract_fields;
use voyage_core::llm::{ChatMessage, CompletionRequest, LanguageModel, ToolSpec};
use voyage_core::repository::TripRepository;
use voyage_core::trip::{non_blank, whole_units, NewTrip, Trip, TripChanges, SEARCH_SOURCE};
use voyage_core::{CoreError, CoreResult};

use crate::input::TripInput;

pub const UPDATE_TRIP_TOOL: &str = "updateTrip";

const RECONCILE_SYSTEM_PROMPT: &str = "You reconcile trip fields from user-provided data and prior conversation. If you find any concrete values for name, destination, origin, budget, startDate, endDate that improve the database record, call the updateTrip tool once with those fields. Use ISO YYYY-MM-DD for dates. If nothing new, do not call the tool.";

/// Merges request fields, chat-extracted fields and a model tool call into
/// the stored trip.
pub struct TripReconciler {
    trips: Arc<dyn TripRepository>,
    model: Arc<dyn LanguageModel>,
}

impl TripReconciler {
    pub fn new(trips: Arc<dyn TripRepository>, model: Arc<dyn LanguageModel>) -> Self {
        Self { trips, model }
    }

    /// Returns the trip as stored after every write this request made.
    pub async fn reconcile(&self, input: &TripInput) -> CoreResult<Trip> {
        let trip_id = match input.trip_id() {
            Some(id) => id,
            None => self.create_from_input(input).await?,
        };

        let current = self
            .trips
            .get_trip(trip_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Trip not found".to_string()))?;

        let deterministic = deterministic_changes(&current, input);
        if !deterministic.is_empty() {
            debug!(trip_id, "Applying request and chat fields: {:?}", deterministic);
            self.trips
                .update_trip(trip_id, &deterministic)
                .await
                .best_effort("deterministic trip update");
        }

        if let Some(applied) = settle(self.tool_pass(&current, input).await) {
            if applied {
                info!(trip_id, "Model updated trip fields");
            }
        }

        let after = self
            .trips
            .get_trip(trip_id)
            .await
            .best_effort("trip re-read")
            .flatten()
            .unwrap_or(current);
        Ok(after)
    }

    async fn create_from_input(&self, input: &TripInput) -> CoreResult<i32> {
        let name = input.name();
        let destination = input.destination();
        if name.is_none() && destination.is_none() {
            return Err(CoreError::BadRequest(
                "destination or name is required to create a trip".to_string(),
            ));
        }

        let new_trip = NewTrip {
            name: name.unwrap_or_else(|| format!("Trip to {}", destination.as_deref().unwrap_or_default())),
            destination: destination.unwrap_or_default(),
            origin: input.origin(),
            budget: input.budget(),
            start_date: input.start_date(),
            end_date: input.end_date(),
            source: SEARCH_SOURCE.to_string(),
        };
        let id = self.trips.create_trip(&new_trip).await?;
        info!(trip_id = id, "Created trip {}", new_trip.name);
        Ok(id)
    }

    /// Offer the model an `updateTrip` tool; `Ok(true)` when it changed the row.
    async fn tool_pass(&self, current: &Trip, input: &TripInput) -> AttemptResult<bool> {
        let mut messages = vec![
            ChatMessage::system(RECONCILE_SYSTEM_PROMPT),
            ChatMessage::user(format!("Current trip:\n{}", current.describe())),
        ];
        let hints = provided_hints(current, input);
        if !hints.is_empty() {
            messages.push(ChatMessage::user(format!("New data provided:\n{}", hints.join("\n"))));
        }
        messages.extend(input.messages.iter().cloned());

        let request = CompletionRequest::new(messages)
            .with_tool(update_trip_tool())
            .temperature(0.0)
            .max_tokens(50);
        let completion = attempt("trip reconciliation model call", self.model.complete(request).await)?;

        let Some(call) = completion.tool_call(UPDATE_TRIP_TOOL) else {
            return Ok(false);
        };
        let args: UpdateTripArgs = attempt("updateTrip arguments", serde_json::from_value(call.arguments.clone()))?;
        let changes = args.into_changes();
        if changes.is_empty() {
            return Ok(false);
        }
        attempt("updateTrip write", self.trips.update_trip(current.id, &changes).await)?;
        Ok(true)
    }
}

/// Request fields win over chat-extracted ones. Origin and budget are only
/// written when they differ from the stored row; dates always are.
pub fn deterministic_changes(current: &Trip, input: &TripInput) -> TripChanges {
    let extracted = extract_fields(&input.messages);
    let mut changes = TripChanges::default();

    if let Some(origin) = input.origin().or(non_blank(extracted.origin.as_deref())) {
        if current.origin.as_deref() != Some(origin.as_str()) {
            changes.origin = Some(origin);
        }
    }
    if let Some(budget) = input.budget().or(extracted.budget) {
        if current.budget != Some(budget) {
            changes.budget = Some(budget);
        }
    }
    changes.start_date = input
        .start_date_text()
        .or(extracted.start_date)
        .as_deref()
        .and_then(parse_timestamp);
    changes.end_date = input
        .end_date_text()
        .or(extracted.end_date)
        .as_deref()
        .and_then(parse_timestamp);
    changes
}

fn provided_hints(current: &Trip, input: &TripInput) -> Vec<String> {
    let mut hints = Vec::new();
    if let Some(name) = input.name.as_deref().filter(|n| !n.is_empty() && *n != current.name) {
        hints.push(format!("name: {}", name));
    }
    if let Some(destination) = input
        .destination
        .as_deref()
        .filter(|d| !d.is_empty() && *d != current.destination)
    {
        hints.push(format!("destination: {}", destination));
    }
    if let Some(origin) = input
        .origin
        .as_deref()
        .filter(|o| !o.is_empty() && current.origin.as_deref() != Some(*o))
    {
        hints.push(format!("origin: {}", origin));
    }
    if let Some(budget) = input.budget.filter(|b| b.is_finite()) {
        if current.budget.map(f64::from) != Some(budget) {
            hints.push(format!("budget: {}", budget));
        }
    }
    if let Some(start) = &input.start_date {
        hints.push(format!("startDate: {}", start));
    }
    if let Some(end) = &input.end_date {
        hints.push(format!("endDate: {}", end));
    }
    hints
}

pub fn update_trip_tool() -> ToolSpec {
    ToolSpec {
        name: UPDATE_TRIP_TOOL.to_string(),
        description: "Update the trips row with any newly available fields.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "minLength": 1},
                "destination": {"type": "string", "minLength": 1},
                "origin": {"type": "string", "minLength": 1},
                "budget": {"type": "integer"},
                "startDate": {"type": "string", "description": "YYYY-MM-DD"},
                "endDate": {"type": "string", "description": "YYYY-MM-DD"}
            },
            "additionalProperties": false
        }),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTripArgs {
    name: Option<String>,
    destination: Option<String>,
    origin: Option<String>,
    budget: Option<Value>,
    start_date: Option<String>,
    end_date: Option<String>,
}

impl UpdateTripArgs {
    fn into_changes(self) -> TripChanges {
        TripChanges {
            name: non_blank(self.name.as_deref()),
            destination: non_blank(self.destination.as_deref()),
            origin: non_blank(self.origin.as_deref()),
            budget: self.budget.as_ref().and_then(coerce_budget),
            start_date: non_blank(self.start_date.as_deref()).as_deref().and_then(parse_timestamp),
            end_date: non_blank(self.end_date.as_deref()).as_deref().and_then(parse_timestamp),
        }
    }
}

/// Numbers and numeric strings, truncated.
fn coerce_budget(value: &Value) -> Option<i32> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    whole_units(number)
}
