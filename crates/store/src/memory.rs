use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CartItemId, DeviceId, GestureId, OrderId, ProductId, UserId};
use tokio::sync::RwLock;

use crate::{
    CartItemRecord, DeviceRecord, GestureRecord, GestureTypeStats, OrderRecord, OrderStatus,
    ProductRecord, Result, ReviewRecord, StoreError, store::StorefrontStore,
};

#[derive(Default)]
struct State {
    products: HashMap<ProductId, ProductRecord>,
    carts: HashMap<UserId, Vec<CartItemRecord>>,
    orders: HashMap<OrderId, OrderRecord>,
    reviews: Vec<ReviewRecord>,
    devices: HashMap<DeviceId, DeviceRecord>,
    gestures: HashMap<GestureId, GestureRecord>,
}

/// In-memory store implementation for tests and local runs.
///
/// All state lives behind a single lock, which makes
/// `commit_checkout` trivially atomic: the write lock is held for the
/// whole validate-and-apply sequence.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Clears all state.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        *state = State::default();
    }
}

#[async_trait]
impl StorefrontStore for InMemoryStore {
    async fn insert_product(&self, product: &ProductRecord) -> Result<()> {
        let mut state = self.state.write().await;
        state.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn product(&self, id: ProductId) -> Result<Option<ProductRecord>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<ProductRecord>> {
        let state = self.state.read().await;
        let mut products: Vec<_> = state.products.values().cloned().collect();
        products.sort_by_key(|p| p.created_at);
        Ok(products)
    }

    async fn search_products(&self, fragment: &str) -> Result<Vec<ProductRecord>> {
        let needle = fragment.to_lowercase();
        let state = self.state.read().await;
        let mut products: Vec<_> = state
            .products
            .values()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        products.sort_by_key(|p| p.created_at);
        Ok(products)
    }

    async fn list_ai_generated(&self) -> Result<Vec<ProductRecord>> {
        let state = self.state.read().await;
        let mut products: Vec<_> = state
            .products
            .values()
            .filter(|p| p.is_ai_generated)
            .cloned()
            .collect();
        products.sort_by_key(|p| p.created_at);
        Ok(products)
    }

    async fn update_product(&self, product: &ProductRecord) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.products.contains_key(&product.id) {
            return Err(StoreError::NotFound { entity: "product" });
        }
        state.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.products.remove(&id).is_none() {
            return Err(StoreError::NotFound { entity: "product" });
        }
        for items in state.carts.values_mut() {
            items.retain(|item| item.product_id != id);
        }
        state.reviews.retain(|r| r.product_id != id);
        Ok(())
    }

    async fn delete_stale_ai_products(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.write().await;
        let stale: Vec<ProductId> = state
            .products
            .values()
            .filter(|p| {
                p.is_ai_generated
                    && p.created_at < cutoff
                    && !state.orders.values().any(|o| o.product_id == p.id)
            })
            .map(|p| p.id)
            .collect();
        for id in &stale {
            state.products.remove(id);
            for items in state.carts.values_mut() {
                items.retain(|item| item.product_id != *id);
            }
        }
        Ok(stale.len() as u64)
    }

    async fn cart_items(&self, user: UserId) -> Result<Vec<CartItemRecord>> {
        let state = self.state.read().await;
        Ok(state.carts.get(&user).cloned().unwrap_or_default())
    }

    async fn find_cart_item(
        &self,
        user: UserId,
        item: CartItemId,
    ) -> Result<Option<CartItemRecord>> {
        let state = self.state.read().await;
        Ok(state
            .carts
            .get(&user)
            .and_then(|items| items.iter().find(|i| i.id == item))
            .cloned())
    }

    async fn find_cart_item_by_product(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<Option<CartItemRecord>> {
        let state = self.state.read().await;
        Ok(state
            .carts
            .get(&user)
            .and_then(|items| items.iter().find(|i| i.product_id == product))
            .cloned())
    }

    async fn put_cart_item(&self, user: UserId, item: &CartItemRecord) -> Result<()> {
        let mut state = self.state.write().await;
        let items = state.carts.entry(user).or_default();
        match items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => *existing = item.clone(),
            None => items.push(item.clone()),
        }
        Ok(())
    }

    async fn delete_cart_item(&self, user: UserId, item: CartItemId) -> Result<()> {
        let mut state = self.state.write().await;
        let items = state.carts.entry(user).or_default();
        let before = items.len();
        items.retain(|i| i.id != item);
        if items.len() == before {
            return Err(StoreError::NotFound { entity: "cart item" });
        }
        Ok(())
    }

    async fn commit_checkout(&self, user: UserId, orders: &[OrderRecord]) -> Result<()> {
        let mut state = self.state.write().await;

        // Validate every decrement before applying any.
        for order in orders {
            let product = state
                .products
                .get(&order.product_id)
                .ok_or(StoreError::NotFound { entity: "product" })?;
            if product.stock < order.quantity {
                return Err(StoreError::StockConflict {
                    product_id: order.product_id,
                    requested: order.quantity,
                    available: product.stock,
                });
            }
        }

        for order in orders {
            if let Some(product) = state.products.get_mut(&order.product_id) {
                product.stock -= order.quantity;
                product.updated_at = Utc::now();
            }
            state.orders.insert(order.id, order.clone());
        }
        state.carts.remove(&user);
        Ok(())
    }

    async fn order(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn orders_for_user(&self, user: UserId) -> Result<Vec<OrderRecord>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|o| o.user_id == user)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<()> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "order" })?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn count_active_orders(&self, product: ProductId) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .filter(|o| o.product_id == product && o.status.is_active())
            .count() as u64)
    }

    async fn insert_review(&self, review: &ReviewRecord) -> Result<()> {
        let mut state = self.state.write().await;
        if state
            .reviews
            .iter()
            .any(|r| r.product_id == review.product_id && r.user_id == review.user_id)
        {
            return Err(StoreError::Duplicate { entity: "review" });
        }
        state.reviews.push(review.clone());
        Ok(())
    }

    async fn reviews_for_product(&self, product: ProductId) -> Result<Vec<ReviewRecord>> {
        let state = self.state.read().await;
        let mut reviews: Vec<_> = state
            .reviews
            .iter()
            .filter(|r| r.product_id == product)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn find_review(&self, product: ProductId, user: UserId) -> Result<Option<ReviewRecord>> {
        let state = self.state.read().await;
        Ok(state
            .reviews
            .iter()
            .find(|r| r.product_id == product && r.user_id == user)
            .cloned())
    }

    async fn upsert_device(&self, device: &DeviceRecord) -> Result<DeviceRecord> {
        let mut state = self.state.write().await;
        if let Some(existing) = state
            .devices
            .values_mut()
            .find(|d| d.user_id == device.user_id && d.token == device.token)
        {
            existing.active = true;
            existing.last_used = device.last_used;
            return Ok(existing.clone());
        }
        state.devices.insert(device.id, device.clone());
        Ok(device.clone())
    }

    async fn devices_for_user(&self, user: UserId) -> Result<Vec<DeviceRecord>> {
        let state = self.state.read().await;
        let mut devices: Vec<_> = state
            .devices
            .values()
            .filter(|d| d.user_id == user)
            .cloned()
            .collect();
        devices.sort_by_key(|d| d.created_at);
        Ok(devices)
    }

    async fn find_device(&self, user: UserId, id: DeviceId) -> Result<Option<DeviceRecord>> {
        let state = self.state.read().await;
        Ok(state
            .devices
            .get(&id)
            .filter(|d| d.user_id == user)
            .cloned())
    }

    async fn deactivate_device(&self, user: UserId, id: DeviceId) -> Result<()> {
        let mut state = self.state.write().await;
        let device = state
            .devices
            .get_mut(&id)
            .filter(|d| d.user_id == user)
            .ok_or(StoreError::NotFound { entity: "device" })?;
        device.active = false;
        Ok(())
    }

    async fn insert_gesture(&self, gesture: &GestureRecord) -> Result<()> {
        let mut state = self.state.write().await;
        state.gestures.insert(gesture.id, gesture.clone());
        Ok(())
    }

    async fn gesture(&self, id: GestureId) -> Result<Option<GestureRecord>> {
        Ok(self.state.read().await.gestures.get(&id).cloned())
    }

    async fn gestures_for_user(&self, user: UserId) -> Result<Vec<GestureRecord>> {
        let state = self.state.read().await;
        let mut gestures: Vec<_> = state
            .gestures
            .values()
            .filter(|g| g.user_id == user)
            .cloned()
            .collect();
        gestures.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(gestures)
    }

    async fn update_gesture(&self, gesture: &GestureRecord) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.gestures.contains_key(&gesture.id) {
            return Err(StoreError::NotFound { entity: "gesture" });
        }
        state.gestures.insert(gesture.id, gesture.clone());
        Ok(())
    }

    async fn gesture_stats_since(
        &self,
        user: UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<GestureTypeStats>> {
        let state = self.state.read().await;
        let mut grouped: HashMap<String, (u64, f64)> = HashMap::new();
        for gesture in state
            .gestures
            .values()
            .filter(|g| g.user_id == user && g.recorded_at >= since)
        {
            let entry = grouped.entry(gesture.gesture_type.clone()).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += gesture.confidence;
        }
        let mut stats: Vec<_> = grouped
            .into_iter()
            .map(|(gesture_type, (count, sum))| GestureTypeStats {
                gesture_type,
                count,
                mean_confidence: sum / count as f64,
            })
            .collect();
        stats.sort_by(|a, b| a.gesture_type.cmp(&b.gesture_type));
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;

    fn widget(stock: u32) -> ProductRecord {
        ProductRecord::new("Widget", "A widget", Money::from_cents(1000), stock)
    }

    fn pending_order(user: UserId, product: &ProductRecord, quantity: u32) -> OrderRecord {
        let now = Utc::now();
        OrderRecord {
            id: OrderId::new(),
            user_id: user,
            product_id: product.id,
            product_name: product.name.clone(),
            quantity,
            unit_price: product.price,
            total_price: product.price.multiply(quantity),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn insert_and_fetch_product() {
        let store = InMemoryStore::new();
        let product = widget(5);
        store.insert_product(&product).await.unwrap();

        let fetched = store.product(product.id).await.unwrap().unwrap();
        assert_eq!(fetched, product);
    }

    #[tokio::test]
    async fn search_is_case_insensitive() {
        let store = InMemoryStore::new();
        store.insert_product(&widget(5)).await.unwrap();

        let hits = store.search_products("wid").await.unwrap();
        assert_eq!(hits.len(), 1);
        let hits = store.search_products("WIDGET").await.unwrap();
        assert_eq!(hits.len(), 1);
        let hits = store.search_products("gadget").await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn update_missing_product_fails() {
        let store = InMemoryStore::new();
        let result = store.update_product(&widget(5)).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn delete_product_removes_cart_references() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let product = widget(5);
        store.insert_product(&product).await.unwrap();
        store
            .put_cart_item(user, &CartItemRecord::new(product.id, 2))
            .await
            .unwrap();

        store.delete_product(product.id).await.unwrap();
        assert!(store.cart_items(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn commit_checkout_applies_all_writes() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let product = widget(5);
        store.insert_product(&product).await.unwrap();
        store
            .put_cart_item(user, &CartItemRecord::new(product.id, 2))
            .await
            .unwrap();

        let order = pending_order(user, &product, 2);
        store.commit_checkout(user, &[order.clone()]).await.unwrap();

        assert_eq!(store.product(product.id).await.unwrap().unwrap().stock, 3);
        assert!(store.cart_items(user).await.unwrap().is_empty());
        assert_eq!(store.order(order.id).await.unwrap().unwrap(), order);
    }

    #[tokio::test]
    async fn commit_checkout_rejects_insufficient_stock_without_partial_writes() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let plenty = widget(5);
        let scarce = ProductRecord::new("Gadget", "", Money::from_cents(2000), 1);
        store.insert_product(&plenty).await.unwrap();
        store.insert_product(&scarce).await.unwrap();
        store
            .put_cart_item(user, &CartItemRecord::new(plenty.id, 2))
            .await
            .unwrap();
        store
            .put_cart_item(user, &CartItemRecord::new(scarce.id, 2))
            .await
            .unwrap();

        let orders = vec![
            pending_order(user, &plenty, 2),
            pending_order(user, &scarce, 2),
        ];
        let result = store.commit_checkout(user, &orders).await;

        assert!(matches!(
            result,
            Err(StoreError::StockConflict {
                requested: 2,
                available: 1,
                ..
            })
        ));
        // Nothing committed: stock untouched, cart intact, no orders.
        assert_eq!(store.product(plenty.id).await.unwrap().unwrap().stock, 5);
        assert_eq!(store.product(scarce.id).await.unwrap().unwrap().stock, 1);
        assert_eq!(store.cart_items(user).await.unwrap().len(), 2);
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn duplicate_review_rejected() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let product = widget(5);
        store.insert_product(&product).await.unwrap();

        let review = ReviewRecord {
            id: common::ReviewId::new(),
            product_id: product.id,
            user_id: user,
            rating: 5,
            comment: "Great".to_string(),
            created_at: Utc::now(),
        };
        store.insert_review(&review).await.unwrap();

        let second = ReviewRecord {
            id: common::ReviewId::new(),
            rating: 1,
            comment: "Changed my mind".to_string(),
            ..review.clone()
        };
        let result = store.insert_review(&second).await;
        assert!(matches!(result, Err(StoreError::Duplicate { .. })));
    }

    #[tokio::test]
    async fn upsert_device_reactivates_existing_token() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let now = Utc::now();
        let device = DeviceRecord {
            id: DeviceId::new(),
            user_id: user,
            token: "fcm:abc".to_string(),
            platform: crate::DevicePlatform::Fcm,
            active: true,
            created_at: now,
            last_used: now,
        };
        store.upsert_device(&device).await.unwrap();
        store.deactivate_device(user, device.id).await.unwrap();

        let again = DeviceRecord {
            id: DeviceId::new(),
            last_used: Utc::now(),
            ..device.clone()
        };
        let stored = store.upsert_device(&again).await.unwrap();

        // Original row survives, reactivated.
        assert_eq!(stored.id, device.id);
        assert!(stored.active);
        assert_eq!(store.devices_for_user(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn gesture_stats_group_by_type() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let since = Utc::now() - chrono::Duration::hours(1);
        for (gesture_type, confidence) in [("swipe", 0.8), ("swipe", 0.6), ("tap", 1.0)] {
            store
                .insert_gesture(&GestureRecord {
                    id: GestureId::new(),
                    user_id: user,
                    gesture_type: gesture_type.to_string(),
                    points: vec![],
                    confidence,
                    processed: false,
                    recorded_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let stats = store.gesture_stats_since(user, since).await.unwrap();
        assert_eq!(stats.len(), 2);
        let swipe = stats.iter().find(|s| s.gesture_type == "swipe").unwrap();
        assert_eq!(swipe.count, 2);
        assert!((swipe.mean_confidence - 0.7).abs() < 1e-9);
    }
}
