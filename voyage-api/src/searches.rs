use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;
use voyage_core::repository::TripRepository;
use voyage_core::trip::Trip;
use voyage_planner::TripInput;

use crate::error::AppError;
use crate::state::AppState;

const RECENT_SEARCHES: i64 = 8;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecentSearch {
    id: i32,
    destination: String,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<Trip> for RecentSearch {
    fn from(trip: Trip) -> Self {
        Self {
            id: trip.id,
            destination: trip.destination,
            start_date: trip.start_date,
            end_date: trip.end_date,
            created_at: trip.created_at,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/recent-searches", get(recent_searches))
        .route("/api/search-trips", post(search_trips))
}

async fn recent_searches(State(state): State<AppState>) -> Result<Json<Vec<RecentSearch>>, AppError> {
    let trips = state
        .trips
        .list_recent_searches(RECENT_SEARCHES)
        .await
        .map_err(|e| AppError::Internal {
            message: "Failed to load recent searches",
            detail: e.to_string(),
        })?;
    Ok(Json(trips.into_iter().map(RecentSearch::from).collect()))
}

/// Conversational flight search; the reply is plain text.
async fn search_trips(State(state): State<AppState>, body: Bytes) -> Response {
    let input = TripInput::from_body(&body);
    let plain = [(header::CONTENT_TYPE, "text/plain; charset=utf-8")];

    match state.assistant.reply(&input).await {
        Ok(text) => (StatusCode::OK, plain, text).into_response(),
        Err(e) => {
            error!("Trip search failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, plain, "Failed to search trips").into_response()
        }
    }
}
