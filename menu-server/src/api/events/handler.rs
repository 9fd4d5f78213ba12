//! Event API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{Local, Utc};
use shared::models::{EventCreate, EventUpdate, compare_events};
use shared::{DeleteResponse, Event};
use uuid::Uuid;
use validator::Validate;

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// GET /api/events - ordered by date, then sortOrder
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Event>>> {
    let mut events = state.store.events().await?;
    events.sort_by(compare_events);
    Ok(Json(events))
}

/// GET /api/events/active - active events from today on
pub async fn active(State(state): State<ServerState>) -> AppResult<Json<Vec<Event>>> {
    let today = Local::now().date_naive();
    let mut events: Vec<Event> = state
        .store
        .events()
        .await?
        .into_iter()
        .filter(|e| e.is_upcoming(today))
        .collect();
    events.sort_by(compare_events);
    Ok(Json(events))
}

/// GET /api/events/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Event>> {
    state
        .store
        .events()
        .await?
        .into_iter()
        .find(|e| e.id == id)
        .map(Json)
        .ok_or_else(|| AppError::event_not_found(id))
}

/// POST /api/events
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<EventCreate>,
) -> AppResult<(StatusCode, Json<Event>)> {
    payload.validate()?;
    let event = payload.into_event(Uuid::new_v4().to_string(), Utc::now());

    let created = state
        .store
        .update_events(|events| {
            events.push(event.clone());
            Ok(event)
        })
        .await?;

    tracing::info!(event = %created.id, date = %created.date, "Event created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/events/{id} - only the fields present change
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(update): Json<EventUpdate>,
) -> AppResult<Json<Event>> {
    let updated = state
        .store
        .update_events(|events| {
            let event = events
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| AppError::event_not_found(&id))?;
            event.apply(update, Utc::now());
            Ok(event.clone())
        })
        .await?;

    tracing::info!(event = %id, "Event updated");
    Ok(Json(updated))
}

/// DELETE /api/events/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<DeleteResponse>> {
    state
        .store
        .update_events(|events| {
            let pos = events
                .iter()
                .position(|e| e.id == id)
                .ok_or_else(|| AppError::event_not_found(&id))?;
            events.remove(pos);
            Ok(())
        })
        .await?;

    tracing::info!(event = %id, "Event deleted");
    Ok(Json(DeleteResponse { success: true, id }))
}
