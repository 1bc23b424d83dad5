//! Gesture capture endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use domain::GestureCapture;
use store::{GestureRecord, GestureTypeStats, StorefrontStore};
use tasks::Task;

use crate::error::ApiError;
use crate::identity::Identity;
use crate::state::AppState;

/// POST /api/v1/gestures — store a sample and queue its processing.
#[tracing::instrument(skip(state, req))]
pub async fn capture<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(user): Identity,
    Json(req): Json<GestureCapture>,
) -> Result<(StatusCode, Json<GestureRecord>), ApiError> {
    let gesture = state.gestures.capture(user, req).await?;

    state.tasks.publish(Task::ProcessGesture {
        gesture_id: gesture.id,
    });

    Ok((StatusCode::CREATED, Json(gesture)))
}

/// GET /api/v1/gestures — the caller's samples, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(user): Identity,
) -> Result<Json<Vec<GestureRecord>>, ApiError> {
    Ok(Json(state.gestures.list(user).await?))
}

/// GET /api/v1/gestures/stats — per-type stats for today.
#[tracing::instrument(skip(state))]
pub async fn stats<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(user): Identity,
) -> Result<Json<Vec<GestureTypeStats>>, ApiError> {
    Ok(Json(state.gestures.stats_today(user).await?))
}
