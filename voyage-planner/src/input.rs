use chrono::{DateTime, Utc};
use serde_json::Value;
use voyage_core::dates::parse_timestamp;
use voyage_core::llm::{ChatMessage, Role};
use voyage_core::trip::{non_blank, whole_units};

/// Body of a component or search request: optional trip id, any fields the
/// browser already knows, and the chat history so far.
///
/// Each field is read on its own; a field of the wrong type is dropped
/// without affecting the others.
#[derive(Debug, Clone, Default)]
pub struct TripInput {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub destination: Option<String>,
    pub origin: Option<String>,
    pub budget: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub messages: Vec<ChatMessage>,
}

impl TripInput {
    /// Parse a raw body; anything that is not a JSON object reads as empty.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice::<Value>(body)
            .map(|value| Self::from_value(&value))
            .unwrap_or_default()
    }

    pub fn from_value(body: &Value) -> Self {
        let text = |key: &str| body.get(key).and_then(Value::as_str).map(String::from);
        Self {
            id: body.get("id").and_then(Value::as_i64),
            name: text("name"),
            destination: text("destination"),
            origin: text("origin"),
            budget: body.get("budget").and_then(Value::as_f64),
            start_date: text("startDate"),
            end_date: text("endDate"),
            messages: body
                .get("messages")
                .and_then(Value::as_array)
                .map(|raw| chat_history(raw))
                .unwrap_or_default(),
        }
    }

    pub fn trip_id(&self) -> Option<i32> {
        self.id.and_then(|id| i32::try_from(id).ok()).filter(|id| *id != 0)
    }

    pub fn name(&self) -> Option<String> {
        non_blank(self.name.as_deref())
    }

    pub fn destination(&self) -> Option<String> {
        non_blank(self.destination.as_deref())
    }

    pub fn origin(&self) -> Option<String> {
        non_blank(self.origin.as_deref())
    }

    /// Whole currency units, truncated toward zero.
    pub fn budget(&self) -> Option<i32> {
        self.budget.and_then(whole_units)
    }

    pub fn start_date_text(&self) -> Option<String> {
        non_blank(self.start_date.as_deref())
    }

    pub fn end_date_text(&self) -> Option<String> {
        non_blank(self.end_date.as_deref())
    }

    pub fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date_text().as_deref().and_then(parse_timestamp)
    }

    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date_text().as_deref().and_then(parse_timestamp)
    }
}

/// Keep only well-formed user, assistant and system turns.
fn chat_history(raw: &[Value]) -> Vec<ChatMessage> {
    raw.iter()
        .filter_map(|v| serde_json::from_value::<ChatMessage>(v.clone()).ok())
        .filter(|m| matches!(m.role, Role::User | Role::Assistant | Role::System))
        .map(|m| ChatMessage {
            tool_calls: Vec::new(),
            tool_call_id: None,
            ..m
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_body_tolerates_garbage() {
        let input = TripInput::from_body(b"not json");
        assert!(input.trip_id().is_none());
        assert!(input.messages.is_empty());
    }

    #[test]
    fn test_lenient_fields() {
        let input = TripInput::from_body(
            br#"{"destination":"  Kyoto ","budget":2500.9,"startDate":"2026-05-01",
                "messages":[{"role":"user","content":"origin: Osaka"},{"role":"tool"},{"role":42}]}"#,
        );
        assert_eq!(input.destination().as_deref(), Some("Kyoto"));
        assert_eq!(input.budget(), Some(2500));
        assert!(input.start_date().is_some());
        assert_eq!(input.messages, vec![ChatMessage::user("origin: Osaka")]);
    }

    #[test]
    fn test_mistyped_field_keeps_the_rest() {
        let input = TripInput::from_body(br#"{"id":1,"destination":"Paris","budget":"2500","origin":7,"messages":"hi"}"#);
        assert_eq!(input.trip_id(), Some(1));
        assert_eq!(input.destination().as_deref(), Some("Paris"));
        assert_eq!(input.budget(), None);
        assert_eq!(input.origin(), None);
        assert!(input.messages.is_empty());
    }

    #[test]
    fn test_budget_outside_i32_is_absent() {
        assert_eq!(TripInput::from_body(br#"{"budget":9e12}"#).budget(), None);
    }

    #[test]
    fn test_zero_id_means_new_trip() {
        assert_eq!(TripInput::from_body(br#"{"id":0}"#).trip_id(), None);
        assert_eq!(TripInput::from_body(br#"{"id":7}"#).trip_id(), Some(7));
    }
}
