//! Cart and checkout endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CartItemId, ProductId};
use domain::{CartView, CheckoutReceipt};
use serde::Deserialize;
use store::StorefrontStore;
use tasks::Task;

use crate::error::ApiError;
use crate::identity::Identity;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Quantity is signed on the wire: any value at or below zero removes
/// the line item.
#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

/// GET /api/v1/cart
#[tracing::instrument(skip(state))]
pub async fn view<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(user): Identity,
) -> Result<Json<CartView>, ApiError> {
    Ok(Json(state.cart.view(user).await?))
}

/// POST /api/v1/cart/items — add a product to the cart.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(user): Identity,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartView>), ApiError> {
    let view = state.cart.add_item(user, req.product_id, req.quantity).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// PUT /api/v1/cart/items/{id} — set quantity; zero or less removes
/// the item.
#[tracing::instrument(skip(state, req))]
pub async fn update_item<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(user): Identity,
    Path(id): Path<CartItemId>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartView>, ApiError> {
    let quantity = u32::try_from(req.quantity.max(0))
        .map_err(|_| ApiError::BadRequest("quantity is too large".to_string()))?;
    Ok(Json(state.cart.update_item(user, id, quantity).await?))
}

/// DELETE /api/v1/cart/items/{id}
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(user): Identity,
    Path(id): Path<CartItemId>,
) -> Result<Json<CartView>, ApiError> {
    Ok(Json(state.cart.remove_item(user, id).await?))
}

/// POST /api/v1/cart/checkout — turn the cart into orders.
#[tracing::instrument(skip(state))]
pub async fn checkout<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(user): Identity,
) -> Result<(StatusCode, Json<CheckoutReceipt>), ApiError> {
    let receipt = state.checkout.checkout(user).await?;

    state.tasks.publish(Task::Notify {
        user_id: user,
        title: "Order confirmed".to_string(),
        body: format!(
            "Your {} order(s) totalling {} were placed",
            receipt.orders.len(),
            receipt.total
        ),
    });

    Ok((StatusCode::CREATED, Json(receipt)))
}
