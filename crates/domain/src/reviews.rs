//! Product reviews.

use common::{ProductId, UserId};
use store::{ReviewRecord, StorefrontStore};

use crate::catalog::average_rating;
use crate::error::{DomainError, DomainResult};

/// Service for adding and listing product reviews.
#[derive(Clone)]
pub struct ReviewService<S> {
    store: S,
}

impl<S: StorefrontStore + Clone> ReviewService<S> {
    /// Creates a new review service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Adds a review. One review per (product, user).
    #[tracing::instrument(skip(self, comment))]
    pub async fn add(
        &self,
        user: UserId,
        product_id: ProductId,
        rating: u8,
        comment: String,
    ) -> DomainResult<ReviewRecord> {
        if !(1..=5).contains(&rating) {
            return Err(DomainError::Validation(
                "rating must be between 1 and 5".into(),
            ));
        }
        if self.store.product(product_id).await?.is_none() {
            return Err(DomainError::NotFound { entity: "product" });
        }
        if self.store.find_review(product_id, user).await?.is_some() {
            return Err(DomainError::DuplicateReview);
        }

        let review = ReviewRecord::new(product_id, user, rating, comment);
        // The store's uniqueness constraint backstops the check above
        // against racing inserts.
        self.store.insert_review(&review).await?;
        metrics::counter!("reviews_created").increment(1);

        Ok(review)
    }

    /// Lists a product's reviews, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, product_id: ProductId) -> DomainResult<Vec<ReviewRecord>> {
        if self.store.product(product_id).await?.is_none() {
            return Err(DomainError::NotFound { entity: "product" });
        }
        Ok(self.store.reviews_for_product(product_id).await?)
    }

    /// Mean rating over a product's reviews, if it has any.
    #[tracing::instrument(skip(self))]
    pub async fn average(&self, product_id: ProductId) -> DomainResult<Option<f64>> {
        let reviews = self.store.reviews_for_product(product_id).await?;
        Ok(average_rating(reviews.iter().map(|r| r.rating)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;
    use store::{InMemoryStore, ProductRecord};

    async fn seed_product(store: &InMemoryStore) -> ProductId {
        let product = ProductRecord::new("Widget", "", Money::from_cents(1000), 5);
        store.insert_product(&product).await.unwrap();
        product.id
    }

    #[tokio::test]
    async fn add_and_average() {
        let store = InMemoryStore::new();
        let product = seed_product(&store).await;
        let reviews = ReviewService::new(store);

        reviews
            .add(UserId::new(), product, 5, "great".to_string())
            .await
            .unwrap();
        reviews
            .add(UserId::new(), product, 2, "meh".to_string())
            .await
            .unwrap();

        assert_eq!(reviews.list(product).await.unwrap().len(), 2);
        assert_eq!(reviews.average(product).await.unwrap(), Some(3.5));
    }

    #[tokio::test]
    async fn rating_out_of_range_rejected() {
        let store = InMemoryStore::new();
        let product = seed_product(&store).await;
        let reviews = ReviewService::new(store);

        for rating in [0, 6] {
            let result = reviews
                .add(UserId::new(), product, rating, String::new())
                .await;
            assert!(matches!(result, Err(DomainError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn second_review_by_same_user_rejected() {
        let store = InMemoryStore::new();
        let product = seed_product(&store).await;
        let reviews = ReviewService::new(store);
        let user = UserId::new();

        reviews.add(user, product, 4, "good".to_string()).await.unwrap();
        let result = reviews.add(user, product, 1, "bad".to_string()).await;

        assert!(matches!(result, Err(DomainError::DuplicateReview)));
    }

    #[tokio::test]
    async fn review_for_missing_product_rejected() {
        let reviews = ReviewService::new(InMemoryStore::new());

        let result = reviews
            .add(UserId::new(), ProductId::new(), 3, String::new())
            .await;
        assert!(matches!(
            result,
            Err(DomainError::NotFound { entity: "product" })
        ));
    }

    #[tokio::test]
    async fn no_reviews_means_no_average() {
        let store = InMemoryStore::new();
        let product = seed_product(&store).await;
        let reviews = ReviewService::new(store);

        assert_eq!(reviews.average(product).await.unwrap(), None);
    }
}
