//! Order history and status endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::OrderId;
use serde::Deserialize;
use store::{OrderRecord, OrderStatus, StorefrontStore};
use tasks::Task;

use crate::error::ApiError;
use crate::identity::Identity;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SetStatusRequest {
    pub status: OrderStatus,
}

/// GET /api/v1/orders — the caller's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(user): Identity,
) -> Result<Json<Vec<OrderRecord>>, ApiError> {
    Ok(Json(state.orders.list(user).await?))
}

/// GET /api/v1/orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(user): Identity,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderRecord>, ApiError> {
    Ok(Json(state.orders.get(user, id).await?))
}

/// POST /api/v1/orders/{id}/status — move the order along its lifecycle.
#[tracing::instrument(skip(state, req))]
pub async fn set_status<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(user): Identity,
    Path(id): Path<OrderId>,
    Json(req): Json<SetStatusRequest>,
) -> Result<Json<OrderRecord>, ApiError> {
    let order = state.orders.set_status(user, id, req.status).await?;

    state.tasks.publish(Task::Notify {
        user_id: user,
        title: "Order update".to_string(),
        body: format!("Your order for {} is now {}", order.product_name, order.status),
    });

    Ok(Json(order))
}
