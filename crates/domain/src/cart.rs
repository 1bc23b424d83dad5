//! Per-user cart service.

use common::{CartItemId, Money, ProductId, UserId};
use serde::Serialize;
use store::{CartItemRecord, StorefrontStore};

use crate::error::{DomainError, DomainResult};

/// One line of a cart view, priced at the product's current price.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// A user's cart with its derived total.
///
/// Every mutation returns a refreshed view so callers never need a
/// follow-up read to learn the new total or emptiness.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total: Money,
    pub is_empty: bool,
}

/// Service for cart reads and mutations.
#[derive(Clone)]
pub struct CartService<S> {
    store: S,
}

impl<S: StorefrontStore + Clone> CartService<S> {
    /// Creates a new cart service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the user's cart. Carts exist implicitly; a user who
    /// never added anything simply sees an empty one.
    #[tracing::instrument(skip(self))]
    pub async fn view(&self, user: UserId) -> DomainResult<CartView> {
        let items = self.store.cart_items(user).await?;
        self.build_view(items).await
    }

    /// Adds `quantity` of a product to the cart. A line item for the
    /// same product is incremented rather than duplicated.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        user: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> DomainResult<CartView> {
        if quantity == 0 {
            return Err(DomainError::Validation(
                "quantity must be at least 1".into(),
            ));
        }

        let product = self
            .store
            .product(product_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "product" })?;

        let mut item = match self.store.find_cart_item_by_product(user, product_id).await? {
            Some(existing) => existing,
            None => CartItemRecord::new(product_id, 0),
        };
        // A merged quantity that overflows u32 can never fit any stock.
        let Some(requested) = item.quantity.checked_add(quantity) else {
            return Err(DomainError::InsufficientStock {
                product_id,
                requested: u32::MAX,
                available: product.stock,
            });
        };

        if requested > product.stock {
            return Err(DomainError::InsufficientStock {
                product_id,
                requested,
                available: product.stock,
            });
        }

        item.quantity = requested;
        self.store.put_cart_item(user, &item).await?;

        self.view(user).await
    }

    /// Sets a line item's quantity. Zero removes the item, which is a
    /// normal operation rather than an error.
    #[tracing::instrument(skip(self))]
    pub async fn update_item(
        &self,
        user: UserId,
        item_id: CartItemId,
        quantity: u32,
    ) -> DomainResult<CartView> {
        let mut item = self
            .store
            .find_cart_item(user, item_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "cart item" })?;

        if quantity == 0 {
            self.store.delete_cart_item(user, item_id).await?;
            return self.view(user).await;
        }

        let product = self
            .store
            .product(item.product_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "product" })?;

        if quantity > product.stock {
            return Err(DomainError::InsufficientStock {
                product_id: product.id,
                requested: quantity,
                available: product.stock,
            });
        }

        item.quantity = quantity;
        self.store.put_cart_item(user, &item).await?;

        self.view(user).await
    }

    /// Removes a line item unconditionally.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, user: UserId, item_id: CartItemId) -> DomainResult<CartView> {
        if self.store.find_cart_item(user, item_id).await?.is_none() {
            return Err(DomainError::NotFound { entity: "cart item" });
        }
        self.store.delete_cart_item(user, item_id).await?;

        self.view(user).await
    }

    async fn build_view(&self, items: Vec<CartItemRecord>) -> DomainResult<CartView> {
        let mut lines = Vec::with_capacity(items.len());
        let mut total = Money::zero();

        for item in items {
            let product = self
                .store
                .product(item.product_id)
                .await?
                .ok_or(DomainError::NotFound { entity: "product" })?;

            let subtotal = product.price.multiply(item.quantity);
            total += subtotal;
            lines.push(CartLine {
                id: item.id,
                product_id: product.id,
                product_name: product.name,
                quantity: item.quantity,
                unit_price: product.price,
                subtotal,
            });
        }

        Ok(CartView {
            is_empty: lines.is_empty(),
            items: lines,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{InMemoryStore, ProductRecord};

    async fn seed_product(store: &InMemoryStore, name: &str, cents: i64, stock: u32) -> ProductId {
        let product = ProductRecord::new(name, "", Money::from_cents(cents), stock);
        store.insert_product(&product).await.unwrap();
        product.id
    }

    #[tokio::test]
    async fn empty_cart_view() {
        let store = InMemoryStore::new();
        let cart = CartService::new(store);

        let view = cart.view(UserId::new()).await.unwrap();
        assert!(view.is_empty);
        assert!(view.items.is_empty());
        assert_eq!(view.total, Money::zero());
    }

    #[tokio::test]
    async fn repeated_adds_merge_into_one_line() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, "Widget", 1000, 10).await;
        let cart = CartService::new(store);
        let user = UserId::new();

        cart.add_item(user, product, 2).await.unwrap();
        let view = cart.add_item(user, product, 3).await.unwrap();

        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, 5);
        assert_eq!(view.total, Money::from_cents(5000));
        assert!(!view.is_empty);
    }

    #[tokio::test]
    async fn add_beyond_stock_rejected() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, "Widget", 1000, 3).await;
        let cart = CartService::new(store);
        let user = UserId::new();

        cart.add_item(user, product, 2).await.unwrap();
        let result = cart.add_item(user, product, 2).await;

        assert!(matches!(
            result,
            Err(DomainError::InsufficientStock {
                requested: 4,
                available: 3,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn add_overflowing_quantity_rejected_without_panicking() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, "Widget", 1000, 10).await;
        let cart = CartService::new(store);
        let user = UserId::new();

        cart.add_item(user, product, 5).await.unwrap();
        let result = cart.add_item(user, product, u32::MAX).await;

        assert!(matches!(
            result,
            Err(DomainError::InsufficientStock { available: 10, .. })
        ));

        // The failed add must not have touched the stored line.
        let view = cart.view(user).await.unwrap();
        assert_eq!(view.items[0].quantity, 5);
    }

    #[tokio::test]
    async fn add_zero_quantity_rejected() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, "Widget", 1000, 3).await;
        let cart = CartService::new(store);

        let result = cart.add_item(UserId::new(), product, 0).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn update_to_zero_removes_line() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, "Widget", 1000, 5).await;
        let cart = CartService::new(store);
        let user = UserId::new();

        let view = cart.add_item(user, product, 2).await.unwrap();
        let item_id = view.items[0].id;

        let view = cart.update_item(user, item_id, 0).await.unwrap();
        assert!(view.is_empty);
        assert_eq!(view.total, Money::zero());
    }

    #[tokio::test]
    async fn total_sums_line_subtotals() {
        let store = InMemoryStore::new();
        let a = seed_product(&store, "A", 1000, 5).await;
        let b = seed_product(&store, "B", 2000, 1).await;
        let cart = CartService::new(store);
        let user = UserId::new();

        cart.add_item(user, a, 2).await.unwrap();
        let view = cart.add_item(user, b, 1).await.unwrap();

        assert_eq!(view.items.len(), 2);
        assert_eq!(view.total, Money::from_cents(4000));
        let line_sum: Money = view.items.iter().map(|l| l.subtotal).sum();
        assert_eq!(line_sum, view.total);
    }

    #[tokio::test]
    async fn remove_missing_item_is_not_found() {
        let store = InMemoryStore::new();
        let cart = CartService::new(store);

        let result = cart.remove_item(UserId::new(), CartItemId::new()).await;
        assert!(matches!(
            result,
            Err(DomainError::NotFound { entity: "cart item" })
        ));
    }
}
