use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fields::TripField;

// ============================================================================
// UI components returned by /api/component
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    Date,
    Number,
}

impl InputType {
    /// Input control implied by a field when the planner did not pick one.
    pub fn for_field(field: TripField) -> Self {
        match field {
            TripField::Budget => InputType::Number,
            TripField::StartDate | TripField::EndDate => InputType::Date,
            _ => InputType::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonComponent {
    pub label: String,
    pub href: String,
    pub classes: String,
    pub aria_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptComponent {
    pub field: TripField,
    pub label: String,
    pub input_type: InputType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

/// A synthesized flight card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOffer {
    pub id: String,
    pub carrier: String,
    pub carrier_logo: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub depart_at: DateTime<Utc>,
    pub arrive_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub price: i32,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_airport_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_airport_name: Option<String>,
}

/// Everything the browser can render, keyed by the `type` discriminant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Component {
    Button(ButtonComponent),
    Prompt(PromptComponent),
    Flight(FlightOffer),
}

/// First event of a streamed component response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "context", rename_all = "camelCase")]
pub struct ContextEvent {
    pub trip_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentResponse {
    pub trip_id: i32,
    pub components: Vec<Component>,
}

impl ComponentResponse {
    pub fn new(trip_id: i32, components: Vec<Component>) -> Self {
        Self { trip_id, components }
    }

    /// Payloads for the streaming presenter: the context envelope, then one per component.
    pub fn stream_payloads(&self) -> Result<Vec<String>, serde_json::Error> {
        let mut payloads = Vec::with_capacity(self.components.len() + 1);
        payloads.push(serde_json::to_string(&ContextEvent { trip_id: self.trip_id })?);
        for component in &self.components {
            payloads.push(serde_json::to_string(component)?);
        }
        Ok(payloads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prompt(field: TripField) -> Component {
        Component::Prompt(PromptComponent {
            field,
            label: "Where from?".to_string(),
            input_type: InputType::for_field(field),
            suggestions: None,
        })
    }

    #[test]
    fn test_prompt_wire_shape() {
        let value = serde_json::to_value(prompt(TripField::Origin)).unwrap();
        assert_eq!(
            value,
            json!({"type": "prompt", "field": "origin", "label": "Where from?", "inputType": "text"})
        );
    }

    #[test]
    fn test_button_wire_shape() {
        let button = Component::Button(ButtonComponent {
            label: "Plan my trip".to_string(),
            href: "/trips/4".to_string(),
            classes: "btn".to_string(),
            aria_label: "Open trip Kyoto".to_string(),
        });
        let value = serde_json::to_value(&button).unwrap();
        assert_eq!(value["type"], "button");
        assert_eq!(value["ariaLabel"], "Open trip Kyoto");
        let back: Component = serde_json::from_value(value).unwrap();
        assert_eq!(back, button);
    }

    #[test]
    fn test_stream_payloads_lead_with_context() {
        let response = ComponentResponse::new(12, vec![prompt(TripField::Budget), prompt(TripField::Origin)]);
        let payloads = response.stream_payloads().unwrap();
        assert_eq!(payloads.len(), 3);

        let context: serde_json::Value = serde_json::from_str(&payloads[0]).unwrap();
        assert_eq!(context, json!({"type": "context", "tripId": 12}));

        let rest: Vec<Component> = payloads[1..]
            .iter()
            .map(|p| serde_json::from_str(p).unwrap())
            .collect();
        assert_eq!(rest, response.components);
    }

    #[test]
    fn test_input_type_defaults() {
        assert_eq!(InputType::for_field(TripField::Budget), InputType::Number);
        assert_eq!(InputType::for_field(TripField::EndDate), InputType::Date);
        assert_eq!(InputType::for_field(TripField::Name), InputType::Text);
    }
}
