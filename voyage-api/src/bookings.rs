use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/bookings", post(create_booking).get(list_bookings))
}

async fn create_booking(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse, AppError> {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let booking = state
        .booking_desk
        .book(&body)
        .await
        .map_err(AppError::route("Failed to create booking"))?;

    info!(booking_id = booking.id, trip_id = booking.trip_id, "Booking created");
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn list_bookings(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let bookings = state
        .booking_desk
        .recent()
        .await
        .map_err(AppError::route("Failed to fetch bookings"))?;
    Ok(Json(json!({ "bookings": bookings })))
}
