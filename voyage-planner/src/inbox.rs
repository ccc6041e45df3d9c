use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use voyage_core::attempt::{attempt, settle, AttemptResult, BestEffort};
use voyage_core::dates::parse_timestamp;
use voyage_core::email::{Email, NewEmail, DEFAULT_FOLDER};
use voyage_core::llm::{ChatMessage, CompletionRequest, LanguageModel, LlmError, TextStream, ToolSpec};
use voyage_core::repository::{EmailRepository, TripRepository};
use voyage_core::trip::{email_source, non_blank, whole_units, EmailTripFilter, NewTrip, Trip};
use voyage_core::{CoreError, CoreResult};
use voyage_shared::pii::mask_email;

pub const CREATE_TRIP_TOOL: &str = "createTrip";
pub const DEFAULT_PROPOSED_LIMIT: i64 = 6;
pub const MAX_PROPOSED_LIMIT: i64 = 20;

const EXTRACT_SYSTEM_PROMPT: &str = "You extract structured travel plans from emails. If and only if the email clearly involves travel (trip, flight, hotel, conference travel, vacation, business trip), call the tool with best-guess values. If date(s) are present, include startDate and endDate in ISO 8601 (YYYY-MM-DD). If not, omit them. If not travel, do not call the tool.";

const PROPOSED_TRIPS_INSTRUCTION: &str = "You write one short, friendly CTA (<= 20 words) about detected trips from emails. If a first name is provided, address the user by that first name. Tell the user they can press Enter (↩) to see the trips.";

const SUMMARY_INSTRUCTION: &str = "You summarize trips for brief user notifications. Answer in one short sentence (<= 20 words).";

/// Query string of the notification endpoint, kept as raw text until validated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeQuery {
    pub intent: Option<String>,
    pub first_name: Option<String>,
    pub since: Option<String>,
    pub after_id: Option<String>,
    pub stream: Option<String>,
    pub summary: Option<String>,
}

impl NoticeQuery {
    pub fn filter(&self) -> CoreResult<EmailTripFilter> {
        let mut filter = EmailTripFilter::default();
        if let Some(since) = self.since.as_deref().filter(|s| !s.is_empty()) {
            filter.since = Some(
                parse_timestamp(since).ok_or_else(|| CoreError::BadRequest("Invalid 'since' timestamp".to_string()))?,
            );
        }
        if let Some(after) = self.after_id.as_deref().filter(|s| !s.is_empty()) {
            let value = after
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| CoreError::BadRequest("Invalid 'afterId' number".to_string()))?;
            filter.after_id = Some(value.floor().clamp(i32::MIN as f64, i32::MAX as f64) as i32);
        }
        Ok(filter)
    }

    pub fn wants_stream(&self) -> bool {
        matches!(self.stream.as_deref(), Some("1") | Some("true"))
    }

    pub fn wants_summary(&self) -> bool {
        self.summary.as_deref() != Some("false")
    }

    fn first_name(&self) -> Option<String> {
        non_blank(self.first_name.as_deref())
    }

    fn is_proposed_trips(&self) -> bool {
        self.intent.as_deref() == Some("proposedTrips")
    }
}

/// Count of new email-sourced trips plus the prompt to describe them.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailNotice {
    pub count: i64,
    pub prompt: Option<String>,
}

impl EmailNotice {
    pub fn has_new(&self) -> bool {
        self.count > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedTrip {
    pub id: i32,
    pub name: String,
    pub destination: String,
    pub budget: Option<i32>,
}

impl From<Trip> for ProposedTrip {
    fn from(trip: Trip) -> Self {
        Self {
            id: trip.id,
            name: trip.name,
            destination: trip.destination,
            budget: trip.budget,
        }
    }
}

pub struct EmailInbox {
    emails: Arc<dyn EmailRepository>,
    trips: Arc<dyn TripRepository>,
    model: Arc<dyn LanguageModel>,
}

impl EmailInbox {
    pub fn new(
        emails: Arc<dyn EmailRepository>,
        trips: Arc<dyn TripRepository>,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        Self { emails, trips, model }
    }

    /// Store an email, then let the model propose a trip from it.
    pub async fn receive(&self, body: &Value) -> CoreResult<Email> {
        let new_email = validate_email(body)?;
        let email = self.emails.create_email(&new_email).await?;
        info!(email_id = email.id, sender = %mask_email(&email.sender_email), "Stored email");

        if let Some(created) = settle(self.propose_trips(&email).await) {
            debug!(email_id = email.id, "Proposed {} trip(s) from email", created);
        }
        Ok(email)
    }

    async fn propose_trips(&self, email: &Email) -> AttemptResult<usize> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(EXTRACT_SYSTEM_PROMPT),
            ChatMessage::user(email.as_prompt()),
        ])
        .with_tool(create_trip_tool())
        .temperature(0.2)
        .max_tokens(300);
        let completion = attempt("email trip extraction", self.model.complete(request).await)?;

        let mut created = 0;
        for call in completion.tool_calls.iter().filter(|c| c.name == CREATE_TRIP_TOOL) {
            let args: CreateTripArgs = attempt("createTrip arguments", serde_json::from_value(call.arguments.clone()))?;
            let (Some(name), Some(destination)) = (non_blank(args.name.as_deref()), non_blank(args.destination.as_deref()))
            else {
                warn!(email_id = email.id, "Skipping createTrip call without a name and destination");
                continue;
            };
            let new_trip = NewTrip {
                name,
                destination,
                origin: None,
                budget: args.budget.and_then(whole_units),
                start_date: args.start_date.as_deref().and_then(parse_timestamp),
                end_date: args.end_date.as_deref().and_then(parse_timestamp),
                source: email_source(email.id),
            };
            let id = attempt("createTrip write", self.trips.create_trip(&new_trip).await)?;
            info!(trip_id = id, email_id = email.id, "Created trip from email");
            created += 1;
        }
        Ok(created)
    }

    pub async fn notice(&self, query: &NoticeQuery) -> CoreResult<EmailNotice> {
        let filter = query.filter()?;
        let count = self.trips.count_email_trips(&filter).await?;
        if count == 0 {
            return Ok(EmailNotice { count, prompt: None });
        }

        let prompt = self
            .trips
            .latest_email_trip(&filter)
            .await
            .best_effort("latest email trip")
            .flatten()
            .map(|trip| notice_prompt(query, count, &trip));
        Ok(EmailNotice { count, prompt })
    }

    /// One-shot notification text; `None` when the model is unavailable.
    pub async fn summarize(&self, prompt: &str) -> Option<String> {
        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)]).temperature(0.2);
        self.model
            .complete(request)
            .await
            .best_effort("email notice summary")
            .and_then(|c| c.text)
    }

    pub async fn stream_summary(&self, prompt: &str) -> Result<TextStream, LlmError> {
        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)]).temperature(0.2);
        self.model.stream_text(request).await
    }

    pub async fn proposed_trips(&self, limit: Option<&str>) -> CoreResult<Vec<ProposedTrip>> {
        let trips = self.trips.list_email_trips(proposed_limit(limit)).await?;
        Ok(trips.into_iter().map(ProposedTrip::from).collect())
    }
}

/// Non-numeric or zero means the default; otherwise clamped to 1..=20.
pub fn proposed_limit(raw: Option<&str>) -> i64 {
    let parsed = raw
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v != 0.0);
    match parsed {
        Some(v) => (v.trunc() as i64).clamp(1, MAX_PROPOSED_LIMIT),
        None => DEFAULT_PROPOSED_LIMIT,
    }
}

fn notice_prompt(query: &NoticeQuery, count: i64, trip: &Trip) -> String {
    if query.is_proposed_trips() {
        let prefix = query.first_name().map(|n| format!("{}, ", n)).unwrap_or_default();
        format!(
            "{}\n{}we detected {} trip(s) from recent emails, e.g. {}. Ask if they want to book them.",
            PROPOSED_TRIPS_INSTRUCTION, prefix, count, trip.destination
        )
    } else {
        format!(
            "{}\nTrip: {}\nDestination: {}\nBudget: {}",
            SUMMARY_INSTRUCTION,
            trip.name,
            trip.destination,
            trip.budget.map(|b| b.to_string()).unwrap_or_else(|| "n/a".to_string())
        )
    }
}

fn validate_email(body: &Value) -> CoreResult<NewEmail> {
    let text = |key: &str| body.get(key).and_then(Value::as_str).filter(|s| !s.is_empty());

    let mut errors = Vec::new();
    for (key, message) in [
        ("subject", "subject is required"),
        ("body", "body is required"),
        ("senderEmail", "senderEmail is required"),
        ("recipientEmail", "recipientEmail is required"),
    ] {
        if text(key).is_none() {
            errors.push(message.to_string());
        }
    }
    if !errors.is_empty() {
        return Err(CoreError::Validation(errors));
    }

    Ok(NewEmail {
        subject: text("subject").unwrap_or_default().to_string(),
        body: text("body").unwrap_or_default().to_string(),
        sender_email: text("senderEmail").unwrap_or_default().to_string(),
        recipient_email: text("recipientEmail").unwrap_or_default().to_string(),
        folder: text("folder").unwrap_or(DEFAULT_FOLDER).to_string(),
        is_read: body.get("isRead").and_then(Value::as_bool).unwrap_or(false),
        sent_at: text("sentAt").and_then(parse_timestamp),
    })
}

pub fn create_trip_tool() -> ToolSpec {
    ToolSpec {
        name: CREATE_TRIP_TOOL.to_string(),
        description: "Create a trip if the email discusses travel".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "Short human-friendly name of the trip"},
                "destination": {"type": "string", "description": "City and/or country destination"},
                "budget": {"type": "integer", "description": "Estimated budget in whole currency units"},
                "startDate": {"type": "string", "description": "Trip start date in ISO 8601 format (YYYY-MM-DD) if known"},
                "endDate": {"type": "string", "description": "Trip end date in ISO 8601 format (YYYY-MM-DD) if known"}
            },
            "required": ["name", "destination"]
        }),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTripArgs {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    destination: Option<String>,
    #[serde(default)]
    budget: Option<f64>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;
    use futures_util::StreamExt;
    use voyage_core::trip::SEARCH_SOURCE;
    use voyage_store::memory::{MemoryEmailRepository, MemoryTripRepository};

    fn inbox(model: ScriptedModel) -> (EmailInbox, Arc<MemoryTripRepository>, Arc<ScriptedModel>) {
        let trips = Arc::new(MemoryTripRepository::new());
        let model = Arc::new(model);
        let inbox = EmailInbox::new(Arc::new(MemoryEmailRepository::new()), trips.clone(), model.clone());
        (inbox, trips, model)
    }

    fn travel_email() -> Value {
        json!({
            "subject": "Lisbon offsite",
            "body": "We fly to Lisbon on 2026-06-10 and return 2026-06-14. Budget 3000.",
            "senderEmail": "ops@example.com",
            "recipientEmail": "me@example.com"
        })
    }

    #[tokio::test]
    async fn test_validation_lists_every_missing_field() {
        let (inbox, _, _) = inbox(ScriptedModel::new());
        let err = inbox.receive(&json!({"subject": "hi", "body": 5})).await.unwrap_err();
        match err {
            CoreError::Validation(errors) => assert_eq!(
                errors,
                vec!["body is required", "senderEmail is required", "recipientEmail is required"]
            ),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_receive_creates_trip_with_email_provenance() {
        let (inbox, trips, model) = inbox(ScriptedModel::new().tool(
            CREATE_TRIP_TOOL,
            json!({"name": "Lisbon offsite", "destination": "Lisbon", "budget": 3000, "startDate": "2026-06-10", "endDate": "2026-06-14", "source": "email:?"}),
        ));
        let email = inbox.receive(&travel_email()).await.unwrap();
        assert_eq!(email.folder, "inbox");
        assert!(!email.is_read);

        let proposed = trips.list_email_trips(10).await.unwrap();
        assert_eq!(proposed.len(), 1);
        assert_eq!(proposed[0].source, format!("email:{}", email.id));
        assert_eq!(proposed[0].budget, Some(3000));
        assert!(model.request(0).messages[1].content.starts_with("Subject: Lisbon offsite\nFrom: ops@example.com"));
    }

    #[tokio::test]
    async fn test_blank_create_trip_arguments_are_skipped() {
        let (inbox, trips, _) = inbox(ScriptedModel::new().tool(
            CREATE_TRIP_TOOL,
            json!({"name": "", "destination": "  ", "budget": 1e12}),
        ));
        assert!(inbox.receive(&travel_email()).await.is_ok());
        assert!(trips.is_empty().await);
    }

    #[tokio::test]
    async fn test_receive_survives_model_failure() {
        let (inbox, trips, _) = inbox(ScriptedModel::new().failure());
        assert!(inbox.receive(&travel_email()).await.is_ok());
        assert!(trips.list_email_trips(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notice_for_proposed_trips_addresses_first_name() {
        let (inbox, trips, _) = inbox(ScriptedModel::new().text("Ana, we found a trip to Lisbon!"));
        trips
            .create_trip(&NewTrip {
                name: "Lisbon offsite".to_string(),
                destination: "Lisbon".to_string(),
                origin: None,
                budget: None,
                start_date: None,
                end_date: None,
                source: email_source(1),
            })
            .await
            .unwrap();
        trips
            .create_trip(&NewTrip {
                name: "Trip to Rome".to_string(),
                destination: "Rome".to_string(),
                origin: None,
                budget: None,
                start_date: None,
                end_date: None,
                source: SEARCH_SOURCE.to_string(),
            })
            .await
            .unwrap();

        let query = NoticeQuery {
            intent: Some("proposedTrips".to_string()),
            first_name: Some(" Ana ".to_string()),
            ..Default::default()
        };
        let notice = inbox.notice(&query).await.unwrap();
        assert_eq!(notice.count, 1);
        let prompt = notice.prompt.unwrap();
        assert!(prompt.ends_with("Ana, we detected 1 trip(s) from recent emails, e.g. Lisbon. Ask if they want to book them."));
        assert_eq!(inbox.summarize(&prompt).await.as_deref(), Some("Ana, we found a trip to Lisbon!"));
    }

    #[tokio::test]
    async fn test_stream_summary_yields_chunks() {
        let (inbox, _, _) = inbox(ScriptedModel::new().streaming(&["New ", "trip!"]));
        let chunks: Vec<String> = inbox
            .stream_summary("prompt")
            .await
            .unwrap()
            .map(|c| c.unwrap())
            .collect()
            .await;
        assert_eq!(chunks.concat(), "New trip!");
    }

    #[tokio::test]
    async fn test_notice_without_new_trips() {
        let (inbox, _, model) = inbox(ScriptedModel::new());
        let notice = inbox.notice(&NoticeQuery::default()).await.unwrap();
        assert!(!notice.has_new());
        assert_eq!(notice.prompt, None);
        assert_eq!(model.request_count(), 0);
    }

    #[test]
    fn test_query_validation() {
        let bad_since = NoticeQuery {
            since: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_since.filter(), Err(CoreError::BadRequest(m)) if m == "Invalid 'since' timestamp"));

        let bad_after = NoticeQuery {
            after_id: Some("abc".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_after.filter(), Err(CoreError::BadRequest(m)) if m == "Invalid 'afterId' number"));

        let ok = NoticeQuery {
            since: Some("2026-03-01T00:00:00Z".to_string()),
            after_id: Some("12".to_string()),
            stream: Some("true".to_string()),
            summary: Some("false".to_string()),
            ..Default::default()
        };
        assert_eq!(ok.filter().unwrap().after_id, Some(12));
        assert!(ok.wants_stream());
        assert!(!ok.wants_summary());
    }

    #[test]
    fn test_proposed_limit() {
        assert_eq!(proposed_limit(None), 6);
        assert_eq!(proposed_limit(Some("abc")), 6);
        assert_eq!(proposed_limit(Some("0")), 6);
        assert_eq!(proposed_limit(Some("-4")), 1);
        assert_eq!(proposed_limit(Some("50")), 20);
        assert_eq!(proposed_limit(Some("3")), 3);
    }
}
