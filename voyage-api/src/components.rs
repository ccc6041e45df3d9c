use std::convert::Infallible;

use axum::{
    body::Bytes,
    extract::{Query, State},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tokio_stream::StreamExt;
use tracing::debug;
use voyage_planner::TripInput;

use crate::error::AppError;
use crate::state::AppState;

const COMPONENT_FAILED: &str = "Failed to generate component";

#[derive(Debug, Default, Deserialize)]
struct ComponentQuery {
    stream: Option<String>,
}

impl ComponentQuery {
    fn wants_stream(&self) -> bool {
        matches!(self.stream.as_deref(), Some("1") | Some("true"))
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/component", post(generate_component))
}

/// Reconcile the trip from the request, then answer with either flight
/// options, follow-up prompts or a call to action. `?stream=1` delivers the
/// same response as server-sent events.
async fn generate_component(
    State(state): State<AppState>,
    Query(query): Query<ComponentQuery>,
    body: Bytes,
) -> Result<Response, AppError> {
    let input = TripInput::from_body(&body);
    let response = state
        .orchestrator
        .respond(&input)
        .await
        .map_err(AppError::route(COMPONENT_FAILED))?;
    debug!(trip_id = response.trip_id, components = response.components.len(), "Component response ready");

    if !query.wants_stream() {
        return Ok(Json(response).into_response());
    }

    let payloads = response.stream_payloads().map_err(|e| AppError::Internal {
        message: COMPONENT_FAILED,
        detail: e.to_string(),
    })?;
    let events = tokio_stream::iter(payloads).map(|payload| Ok::<_, Infallible>(Event::default().data(payload)));
    Ok(Sse::new(events).into_response())
}
