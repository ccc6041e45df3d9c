use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures_util::{future, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;
use voyage_core::llm::TextStream;
use voyage_planner::NoticeQuery;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
struct ProposedTripsQuery {
    limit: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/emails", get(email_notice).post(receive_email))
        .route("/api/emails/trips", get(proposed_trips))
}

/// Notification about trips proposed from email since the client last looked.
async fn email_notice(State(state): State<AppState>, Query(query): Query<NoticeQuery>) -> Result<Response, AppError> {
    let notice = state
        .inbox
        .notice(&query)
        .await
        .map_err(AppError::route("Internal Server Error"))?;

    if query.wants_stream() {
        if let Some(prompt) = notice.prompt.as_deref() {
            match state.inbox.stream_summary(prompt).await {
                Ok(stream) => return Ok(text_stream(stream)),
                Err(e) => {
                    warn!("Email notice stream failed: {}", e);
                    return Ok(notice_body(notice.count, None));
                }
            }
        }
    }

    let summary = match notice.prompt.as_deref() {
        Some(prompt) if query.wants_summary() => state.inbox.summarize(prompt).await,
        _ => None,
    };
    Ok(notice_body(notice.count, summary))
}

fn notice_body(count: i64, summary: Option<String>) -> Response {
    Json(json!({
        "hasNew": count > 0,
        "count": count,
        "summary": summary,
    }))
    .into_response()
}

/// Model output as a chunked `text/plain` body. A failure mid-stream ends the body.
fn text_stream(stream: TextStream) -> Response {
    let chunks = stream
        .take_while(|chunk| {
            if let Err(e) = chunk {
                warn!("Email notice stream interrupted: {}", e);
            }
            future::ready(chunk.is_ok())
        })
        .filter_map(|chunk| future::ready(chunk.ok().map(Bytes::from)))
        .map(Ok::<_, std::convert::Infallible>);

    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(chunks),
    )
        .into_response()
}

async fn receive_email(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse, AppError> {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let email = state
        .inbox
        .receive(&body)
        .await
        .map_err(AppError::route("Failed to insert email"))?;
    Ok((StatusCode::CREATED, Json(email)))
}

async fn proposed_trips(
    State(state): State<AppState>,
    Query(query): Query<ProposedTripsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let trips = state
        .inbox
        .proposed_trips(query.limit.as_deref())
        .await
        .map_err(AppError::route("Failed to load email trips"))?;
    Ok(Json(trips))
}
