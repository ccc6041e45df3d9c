//! Questions for the fields a trip is still missing.
//!
//! The model picks and words the questions; the planner filters them against
//! the stored trip, caps them at three and replaces date suggestions with
//! computed future dates. When the model has nothing to ask it writes a
//! call-to-action label instead.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use voyage_core::dates::to_ymd;
use voyage_core::llm::{transcript, ChatMessage, CompletionRequest, LanguageModel, LlmError};
use voyage_core::trip::Trip;
use voyage_core::TripField;
use voyage_shared::{ButtonComponent, InputType, PromptComponent};

use crate::input::TripInput;

pub const MAX_PROMPTS: usize = 3;
const MAX_SUGGESTIONS: usize = 5;
pub const CTA_FALLBACK_LABEL: &str = "Continue planning";
pub const BUTTON_CLASSES: &str = "px-4 py-2 rounded-lg bg-white/20 hover:bg-white/30 border border-white/30 text-white";

const PLANNER_SYSTEM_PROMPT: &str = "You are a UX planner for a travel app. Identify which of these fields are still missing or empty in the database: name, destination, origin, startDate, endDate, budget. Return up to 3 prompts only for the missing ones. Do not duplicate fields or include fields that already exist. For each selected field, write a short, friendly question to collect JUST that field. Provide at most 3-5 concise suggestions. IMPORTANT for dates: suggest only future dates in YYYY-MM-DD, using today or any provided startDate/endDate as reference. Ensure endDate is after startDate.";

const CTA_SYSTEM_PROMPT: &str = "You write ultra-short, action-oriented CTA button labels for a travel app. Keep it 2-4 words, imperative voice, no emojis.";

/// One question as proposed by the model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedPrompt {
    pub field: TripField,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub input_type: Option<InputType>,
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct PromptDecision {
    #[serde(default)]
    prompts: Vec<PlannedPrompt>,
}

#[derive(Debug, Deserialize)]
struct CtaLabel {
    label: String,
}

pub fn fallback_label(field: TripField) -> &'static str {
    match field {
        TripField::Name => "What should we call this trip?",
        TripField::Destination => "Where are you headed?",
        TripField::Origin => "Where are you departing from?",
        TripField::StartDate => "When do you want to depart?",
        TripField::EndDate => "When do you want to return? (optional)",
        TripField::Budget => "What's your budget? (USD)",
    }
}

pub struct PromptPlanner {
    model: Arc<dyn LanguageModel>,
}

impl PromptPlanner {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Ask the model which fields to collect next. An empty list means it
    /// considers the trip ready.
    pub async fn decide(&self, trip: &Trip, input: &TripInput) -> Result<Vec<PlannedPrompt>, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(PLANNER_SYSTEM_PROMPT),
            ChatMessage::user(planner_context(trip, input)),
        ])
        .with_schema("prompts_decision", prompts_schema())
        .temperature(0.2)
        .max_tokens(200);

        let decision: PromptDecision = self.model.complete(request).await?.parse_json()?;
        Ok(decision.prompts)
    }

    /// CTA label for a ready trip; falls back to a fixed label.
    pub async fn cta_label(&self, trip: &Trip) -> String {
        let mut lines = Vec::new();
        if !trip.name.is_empty() {
            lines.push(format!("Trip name: {}", trip.name));
        }
        if !trip.destination.is_empty() {
            lines.push(format!("Destination: {}", trip.destination));
        }
        if let Some(budget) = trip.budget {
            lines.push(format!("Budget: ${}", budget));
        }
        lines.push("Create a concise CTA label to continue with this trip.".to_string());

        let request = CompletionRequest::new(vec![
            ChatMessage::system(CTA_SYSTEM_PROMPT),
            ChatMessage::user(lines.join("\n")),
        ])
        .with_schema("cta_label", cta_schema())
        .temperature(0.2)
        .max_tokens(60);

        let label = match self.model.complete(request).await.and_then(|c| c.parse_json::<CtaLabel>()) {
            Ok(cta) => cta.label.trim().chars().take(40).collect::<String>(),
            Err(e) => {
                warn!(trip_id = trip.id, "CTA label generation failed: {}", e);
                String::new()
            }
        };
        if label.is_empty() {
            CTA_FALLBACK_LABEL.to_string()
        } else {
            label
        }
    }
}

/// Turn model proposals into prompt components for fields the trip lacks.
pub fn build_prompts(
    trip: &Trip,
    input: &TripInput,
    planned: Vec<PlannedPrompt>,
    now: DateTime<Utc>,
) -> Vec<PromptComponent> {
    let reference = suggestion_reference(trip, input, now);
    let mut seen: Vec<TripField> = Vec::new();

    planned
        .into_iter()
        .filter(|p| !trip.has(p.field))
        .filter(|p| {
            if seen.contains(&p.field) {
                return false;
            }
            seen.push(p.field);
            true
        })
        .take(MAX_PROMPTS)
        .map(|p| {
            let label = if p.question.trim().is_empty() {
                fallback_label(p.field).to_string()
            } else {
                p.question
            };
            let suggestions = match p.field {
                TripField::StartDate | TripField::EndDate => Some(date_suggestions(p.field, reference)),
                _ => p.suggestions.map(|s| s.into_iter().take(MAX_SUGGESTIONS).collect()),
            };
            PromptComponent {
                field: p.field,
                label,
                input_type: p.input_type.unwrap_or_else(|| InputType::for_field(p.field)),
                suggestions,
            }
        })
        .collect()
}

/// Prompts for the first missing fields without asking the model.
pub fn fallback_prompts(trip: &Trip, input: &TripInput, now: DateTime<Utc>) -> Vec<PromptComponent> {
    let planned = trip
        .missing_fields()
        .into_iter()
        .map(|field| PlannedPrompt {
            field,
            question: String::new(),
            input_type: None,
            suggestions: None,
        })
        .collect();
    build_prompts(trip, input, planned, now)
}

pub fn cta_button(trip: &Trip, label: String) -> ButtonComponent {
    let subject = if !trip.name.is_empty() {
        trip.name.clone()
    } else if !trip.destination.is_empty() {
        trip.destination.clone()
    } else {
        trip.id.to_string()
    };
    ButtonComponent {
        label,
        href: format!("/trips/{}", trip.id),
        classes: BUTTON_CLASSES.to_string(),
        aria_label: format!("Open trip {}", subject).trim().to_string(),
    }
}

/// Day the date suggestions count from: the stored start date, else the
/// provided one, else today; never before today.
fn suggestion_reference(trip: &Trip, input: &TripInput, now: DateTime<Utc>) -> NaiveDate {
    let start = trip.start_date.or_else(|| input.start_date()).unwrap_or(now);
    start.max(now).date_naive()
}

pub fn date_suggestions(field: TripField, reference: NaiveDate) -> Vec<String> {
    let days = |n: i64| to_ymd(reference + Duration::days(n));
    match field {
        TripField::StartDate => {
            let next_month = first_of_next_month(reference);
            vec![days(7), days(14), to_ymd(next_month)]
        }
        _ => vec![days(3), days(7), days(14)],
    }
}

fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

fn planner_context(trip: &Trip, input: &TripInput) -> String {
    let mut lines = vec![format!(
        "DB has -> name: {} | destination: {} | origin: {} | budget: {} | startDate: {} | endDate: {}",
        trip.name,
        trip.destination,
        trip.origin.as_deref().unwrap_or(""),
        trip.budget.map(|b| b.to_string()).unwrap_or_default(),
        trip.start_date.map(|d| d.to_rfc3339()).unwrap_or_default(),
        trip.end_date.map(|d| d.to_rfc3339()).unwrap_or_default(),
    )];
    if let Some(name) = input.name.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("Provided name: {}", name));
    }
    if let Some(destination) = input.destination.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("Provided destination: {}", destination));
    }
    if let Some(origin) = input.origin.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("Provided origin: {}", origin));
    }
    if let Some(budget) = input.budget {
        lines.push(format!("Provided budget: ${}", budget));
    }
    if let Some(start) = input.start_date.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("Provided startDate: {}", start));
    }
    if let Some(end) = input.end_date.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("Provided endDate: {}", end));
    }
    let conversation = transcript(&input.messages);
    if !conversation.is_empty() {
        lines.push(format!("Conversation so far:\n{}", conversation));
    }
    lines.push("List up to 3 missing fields and provide a question for each.".to_string());
    lines.join("\n")
}

fn prompts_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "prompts": {
                "type": "array",
                "maxItems": 5,
                "items": {
                    "type": "object",
                    "properties": {
                        "field": {"type": "string", "enum": ["name", "destination", "origin", "startDate", "endDate", "budget"]},
                        "question": {"type": "string", "minLength": 3},
                        "inputType": {"type": "string", "enum": ["text", "date", "number"]},
                        "suggestions": {"type": "array", "items": {"type": "string"}, "maxItems": 5}
                    },
                    "required": ["field", "question"]
                }
            }
        },
        "required": ["prompts"]
    })
}

fn cta_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {"label": {"type": "string", "minLength": 1, "maxLength": 40}},
        "required": ["label"]
    })
}
