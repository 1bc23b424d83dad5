//! Cart checkout.

use common::{Money, UserId};
use serde::Serialize;
use store::{OrderRecord, StorefrontStore};

use crate::error::{DomainError, DomainResult};

/// Result of a successful checkout.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    pub orders: Vec<OrderRecord>,
    pub total: Money,
}

/// Turns a cart into orders, all-or-nothing.
///
/// The service validates each line item against current stock, then hands
/// the whole batch to [`StorefrontStore::commit_checkout`], which re-checks
/// the decrements inside its atomic commit. A checkout racing another one
/// therefore fails cleanly with [`DomainError::InsufficientStock`] instead
/// of driving stock negative.
#[derive(Clone)]
pub struct CheckoutService<S> {
    store: S,
}

impl<S: StorefrontStore + Clone> CheckoutService<S> {
    /// Creates a new checkout service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Checks out the user's cart. On success the cart is empty, one
    /// order per line item exists, and every stock decrement has been
    /// applied. On failure nothing has changed.
    #[tracing::instrument(skip(self))]
    pub async fn checkout(&self, user: UserId) -> DomainResult<CheckoutReceipt> {
        let items = self.store.cart_items(user).await?;
        if items.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        let mut orders = Vec::with_capacity(items.len());
        for item in &items {
            let product = self
                .store
                .product(item.product_id)
                .await?
                .ok_or(DomainError::NotFound { entity: "product" })?;

            if item.quantity > product.stock {
                return Err(DomainError::InsufficientStock {
                    product_id: product.id,
                    requested: item.quantity,
                    available: product.stock,
                });
            }

            // Snapshot name and unit price at checkout time.
            orders.push(OrderRecord::new(
                user,
                product.id,
                product.name,
                item.quantity,
                product.price,
            ));
        }

        self.store.commit_checkout(user, &orders).await?;

        let total = orders.iter().map(|o| o.total_price).sum();
        metrics::counter!("checkouts_completed").increment(1);
        metrics::counter!("orders_created").increment(orders.len() as u64);
        tracing::info!(user_id = %user, orders = orders.len(), "checkout committed");

        Ok(CheckoutReceipt { orders, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartService;
    use common::ProductId;
    use store::{InMemoryStore, OrderStatus, ProductRecord};

    async fn seed_product(store: &InMemoryStore, name: &str, cents: i64, stock: u32) -> ProductId {
        let product = ProductRecord::new(name, "", Money::from_cents(cents), stock);
        store.insert_product(&product).await.unwrap();
        product.id
    }

    #[tokio::test]
    async fn empty_cart_rejected() {
        let store = InMemoryStore::new();
        let checkout = CheckoutService::new(store);

        let result = checkout.checkout(UserId::new()).await;
        assert!(matches!(result, Err(DomainError::EmptyCart)));
    }

    #[tokio::test]
    async fn two_line_checkout_creates_both_orders() {
        let store = InMemoryStore::new();
        let a = seed_product(&store, "A", 1000, 5).await;
        let b = seed_product(&store, "B", 2000, 1).await;
        let cart = CartService::new(store.clone());
        let checkout = CheckoutService::new(store.clone());
        let user = UserId::new();

        cart.add_item(user, a, 2).await.unwrap();
        cart.add_item(user, b, 1).await.unwrap();

        let receipt = checkout.checkout(user).await.unwrap();

        assert_eq!(receipt.orders.len(), 2);
        assert_eq!(receipt.total, Money::from_cents(4000));

        let order_a = receipt.orders.iter().find(|o| o.product_id == a).unwrap();
        assert_eq!(order_a.quantity, 2);
        assert_eq!(order_a.unit_price, Money::from_cents(1000));
        assert_eq!(order_a.total_price, Money::from_cents(2000));
        assert_eq!(order_a.status, OrderStatus::Pending);

        let order_b = receipt.orders.iter().find(|o| o.product_id == b).unwrap();
        assert_eq!(order_b.total_price, Money::from_cents(2000));

        // Stock decremented, cart emptied
        assert_eq!(store.product(a).await.unwrap().unwrap().stock, 3);
        assert_eq!(store.product(b).await.unwrap().unwrap().stock, 0);
        assert!(cart.view(user).await.unwrap().is_empty);
    }

    #[tokio::test]
    async fn one_short_item_aborts_everything() {
        let store = InMemoryStore::new();
        let plenty = seed_product(&store, "Plenty", 1000, 5).await;
        let scarce = seed_product(&store, "Scarce", 500, 2).await;
        let cart = CartService::new(store.clone());
        let checkout = CheckoutService::new(store.clone());
        let user = UserId::new();

        cart.add_item(user, plenty, 2).await.unwrap();
        cart.add_item(user, scarce, 2).await.unwrap();

        // Stock drops after the items were added
        let mut product = store.product(scarce).await.unwrap().unwrap();
        product.stock = 1;
        store.update_product(&product).await.unwrap();

        let result = checkout.checkout(user).await;
        assert!(matches!(
            result,
            Err(DomainError::InsufficientStock {
                requested: 2,
                available: 1,
                ..
            })
        ));

        // Nothing committed
        assert_eq!(store.product(plenty).await.unwrap().unwrap().stock, 5);
        assert!(store.orders_for_user(user).await.unwrap().is_empty());
        assert_eq!(cart.view(user).await.unwrap().items.len(), 2);
    }

    #[tokio::test]
    async fn unit_price_frozen_against_later_changes() {
        let store = InMemoryStore::new();
        let product_id = seed_product(&store, "Widget", 1000, 5).await;
        let cart = CartService::new(store.clone());
        let checkout = CheckoutService::new(store.clone());
        let user = UserId::new();

        cart.add_item(user, product_id, 1).await.unwrap();
        let receipt = checkout.checkout(user).await.unwrap();

        let mut product = store.product(product_id).await.unwrap().unwrap();
        product.price = Money::from_cents(9999);
        store.update_product(&product).await.unwrap();

        let order = store
            .order(receipt.orders[0].id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.unit_price, Money::from_cents(1000));
    }
}
