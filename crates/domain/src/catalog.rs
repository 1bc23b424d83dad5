//! Product catalog service.

use chrono::{DateTime, Utc};
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};
use store::{ProductRecord, StorefrontStore};

use crate::error::{DomainError, DomainResult};

/// Input for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
}

/// Partial update for a product. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub stock: Option<u32>,
}

/// A product as exposed to callers, with its derived average rating.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
    pub is_ai_generated: bool,
    pub ai_source: Option<String>,
    /// Mean review rating, absent while the product has no reviews.
    pub average_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Service for managing the product catalog.
#[derive(Clone)]
pub struct CatalogService<S> {
    store: S,
}

impl<S: StorefrontStore + Clone> CatalogService<S> {
    /// Creates a new catalog service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a regular (non-AI) product.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, input: NewProduct) -> DomainResult<ProductView> {
        validate_listing(&input.name, input.price)?;

        let product = ProductRecord::new(
            input.name.trim(),
            input.description,
            input.price,
            input.stock,
        );
        self.store.insert_product(&product).await?;
        metrics::counter!("catalog_products_created").increment(1);

        Ok(self.into_view(product, None))
    }

    /// Persists a listing produced by the AI generator, flagged as such.
    #[tracing::instrument(skip(self, description))]
    pub async fn create_generated(
        &self,
        name: String,
        description: String,
        price: Money,
        stock: u32,
        source: String,
    ) -> DomainResult<ProductView> {
        validate_listing(&name, price)?;

        let mut product = ProductRecord::new(name.trim(), description, price, stock);
        product.is_ai_generated = true;
        product.ai_source = Some(source);
        self.store.insert_product(&product).await?;
        metrics::counter!("catalog_ai_products_created").increment(1);

        Ok(self.into_view(product, None))
    }

    /// Fetches a product along with its average rating.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> DomainResult<ProductView> {
        let product = self
            .store
            .product(id)
            .await?
            .ok_or(DomainError::NotFound { entity: "product" })?;

        let reviews = self.store.reviews_for_product(id).await?;
        let rating = average_rating(reviews.iter().map(|r| r.rating));

        Ok(self.into_view(product, rating))
    }

    /// Lists the whole catalog.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> DomainResult<Vec<ProductView>> {
        let products = self.store.list_products().await?;
        Ok(products
            .into_iter()
            .map(|p| self.into_view(p, None))
            .collect())
    }

    /// Case-insensitive name substring search.
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, fragment: &str) -> DomainResult<Vec<ProductView>> {
        let products = self.store.search_products(fragment.trim()).await?;
        Ok(products
            .into_iter()
            .map(|p| self.into_view(p, None))
            .collect())
    }

    /// Lists products still flagged as AI-generated.
    #[tracing::instrument(skip(self))]
    pub async fn list_ai_generated(&self) -> DomainResult<Vec<ProductView>> {
        let products = self.store.list_ai_generated().await?;
        Ok(products
            .into_iter()
            .map(|p| self.into_view(p, None))
            .collect())
    }

    /// Applies a partial update to a product.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, id: ProductId, patch: ProductPatch) -> DomainResult<ProductView> {
        let mut product = self
            .store
            .product(id)
            .await?
            .ok_or(DomainError::NotFound { entity: "product" })?;

        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(stock) = patch.stock {
            product.stock = stock;
        }
        validate_listing(&product.name, product.price)?;

        product.updated_at = Utc::now();
        self.store.update_product(&product).await?;

        Ok(self.into_view(product, None))
    }

    /// Deletes a product. Rejected while any order for it is still
    /// pending, paid, or shipped. Cart references are removed.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> DomainResult<()> {
        if self.store.product(id).await?.is_none() {
            return Err(DomainError::NotFound { entity: "product" });
        }

        let active_orders = self.store.count_active_orders(id).await?;
        if active_orders > 0 {
            return Err(DomainError::ProductHasActiveOrders { active_orders });
        }

        self.store.delete_product(id).await?;
        Ok(())
    }

    /// Converts an AI-generated product into a regular catalog entry.
    #[tracing::instrument(skip(self))]
    pub async fn approve(&self, id: ProductId) -> DomainResult<ProductView> {
        let mut product = self
            .store
            .product(id)
            .await?
            .ok_or(DomainError::NotFound { entity: "product" })?;

        if !product.is_ai_generated {
            return Err(DomainError::NotAiGenerated);
        }

        product.is_ai_generated = false;
        product.updated_at = Utc::now();
        self.store.update_product(&product).await?;
        metrics::counter!("catalog_ai_products_approved").increment(1);

        Ok(self.into_view(product, None))
    }

    /// Deletes AI-generated products older than `cutoff` that were
    /// never ordered. Returns the number removed.
    #[tracing::instrument(skip(self))]
    pub async fn cleanup_stale_generated(&self, cutoff: DateTime<Utc>) -> DomainResult<u64> {
        let deleted = self.store.delete_stale_ai_products(cutoff).await?;
        if deleted > 0 {
            metrics::counter!("catalog_ai_products_cleaned").increment(deleted);
        }
        Ok(deleted)
    }

    fn into_view(&self, product: ProductRecord, average_rating: Option<f64>) -> ProductView {
        ProductView {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            is_ai_generated: product.is_ai_generated,
            ai_source: product.ai_source,
            average_rating,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

fn validate_listing(name: &str, price: Money) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::Validation("name must not be empty".into()));
    }
    if price.is_negative() {
        return Err(DomainError::Validation("price must not be negative".into()));
    }
    Ok(())
}

pub(crate) fn average_rating(ratings: impl Iterator<Item = u8>) -> Option<f64> {
    let (count, sum) = ratings.fold((0u32, 0u32), |(c, s), r| (c + 1, s + r as u32));
    if count == 0 {
        None
    } else {
        Some(sum as f64 / count as f64)
    }
}
