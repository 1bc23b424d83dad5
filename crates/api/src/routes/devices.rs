//! Push device registry endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::DeviceId;
use serde::{Deserialize, Serialize};
use store::{DevicePlatform, DeviceRecord, StorefrontStore};
use tasks::Task;

use crate::error::ApiError;
use crate::identity::Identity;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterDeviceRequest {
    pub token: String,
    pub platform: DevicePlatform,
}

#[derive(Serialize)]
pub struct QueuedResponse {
    pub status: &'static str,
}

/// POST /api/v1/devices — register (or reactivate) a device token.
#[tracing::instrument(skip(state, req))]
pub async fn register<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(user): Identity,
    Json(req): Json<RegisterDeviceRequest>,
) -> Result<(StatusCode, Json<DeviceRecord>), ApiError> {
    let device = state.devices.register(user, req.token, req.platform).await?;
    Ok((StatusCode::CREATED, Json(device)))
}

/// GET /api/v1/devices
#[tracing::instrument(skip(state))]
pub async fn list<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(user): Identity,
) -> Result<Json<Vec<DeviceRecord>>, ApiError> {
    Ok(Json(state.devices.list(user).await?))
}

/// DELETE /api/v1/devices/{id} — deactivate a device.
#[tracing::instrument(skip(state))]
pub async fn deactivate<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(user): Identity,
    Path(id): Path<DeviceId>,
) -> Result<StatusCode, ApiError> {
    state.devices.deactivate(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/devices/{id}/test — queue a test notification.
#[tracing::instrument(skip(state))]
pub async fn test_notification<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(user): Identity,
    Path(id): Path<DeviceId>,
) -> Result<(StatusCode, Json<QueuedResponse>), ApiError> {
    // Confirms the device exists and belongs to the caller before queueing
    let device = state.devices.get(user, id).await?;

    state.tasks.publish(Task::Notify {
        user_id: user,
        title: "Test notification".to_string(),
        body: format!("Test push for your {} device", device.platform),
    });

    Ok((StatusCode::ACCEPTED, Json(QueuedResponse { status: "queued" })))
}
