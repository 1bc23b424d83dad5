//! Catalog, search, and review endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::ProductId;
use domain::{NewProduct, ProductPatch, ProductView};
use serde::Deserialize;
use store::{ReviewRecord, StorefrontStore};

use crate::error::ApiError;
use crate::identity::Identity;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateReviewRequest {
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

/// GET /api/v1/products — list the catalog, or search by name.
///
/// A search that matches nothing falls back to the listing generator:
/// the request blocks (bounded by the configured timeout) while a
/// listing is produced and persisted flagged as AI-generated. If
/// generation times out or fails the response is simply empty.
#[tracing::instrument(skip(state))]
pub async fn list<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ProductView>>, ApiError> {
    let query = params.search.as_deref().map(str::trim).unwrap_or("");
    if query.is_empty() {
        return Ok(Json(state.catalog.list().await?));
    }

    let hits = state.catalog.search(query).await?;
    if !hits.is_empty() {
        return Ok(Json(hits));
    }

    metrics::counter!("search_ai_fallbacks").increment(1);
    match tokio::time::timeout(state.ai_generation_timeout, state.generator.generate(query)).await
    {
        Ok(Ok(listing)) => {
            let view = state
                .catalog
                .create_generated(
                    listing.name,
                    listing.description,
                    listing.price,
                    listing.stock,
                    listing.source,
                )
                .await?;
            Ok(Json(vec![view]))
        }
        Ok(Err(e)) => {
            tracing::warn!(query, error = %e, "listing generation failed");
            Ok(Json(Vec::new()))
        }
        Err(_) => {
            tracing::warn!(query, "listing generation timed out");
            Ok(Json(Vec::new()))
        }
    }
}

/// POST /api/v1/products — create a product.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<NewProduct>,
) -> Result<(StatusCode, Json<ProductView>), ApiError> {
    let view = state.catalog.create(req).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/products/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductView>, ApiError> {
    Ok(Json(state.catalog.get(id).await?))
}

/// PUT /api/v1/products/{id} — partial update.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ProductId>,
    Json(req): Json<ProductPatch>,
) -> Result<Json<ProductView>, ApiError> {
    Ok(Json(state.catalog.update(id, req).await?))
}

/// DELETE /api/v1/products/{id} — rejected while active orders exist.
#[tracing::instrument(skip(state))]
pub async fn remove<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode, ApiError> {
    state.catalog.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/products/ai-generated
#[tracing::instrument(skip(state))]
pub async fn list_ai_generated<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductView>>, ApiError> {
    Ok(Json(state.catalog.list_ai_generated().await?))
}

/// POST /api/v1/products/{id}/approve — promote an AI listing.
#[tracing::instrument(skip(state))]
pub async fn approve<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductView>, ApiError> {
    Ok(Json(state.catalog.approve(id).await?))
}

/// GET /api/v1/products/{id}/reviews
#[tracing::instrument(skip(state))]
pub async fn list_reviews<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<ReviewRecord>>, ApiError> {
    Ok(Json(state.reviews.list(id).await?))
}

/// POST /api/v1/products/{id}/reviews
#[tracing::instrument(skip(state, req))]
pub async fn create_review<S: StorefrontStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Identity(user): Identity,
    Path(id): Path<ProductId>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewRecord>), ApiError> {
    let review = state.reviews.add(user, id, req.rating, req.comment).await?;
    Ok((StatusCode::CREATED, Json(review)))
}
