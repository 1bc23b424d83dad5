use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CartItemId, DeviceId, GestureId, OrderId, ProductId, UserId};

use crate::{
    CartItemRecord, DeviceRecord, GestureRecord, GestureTypeStats, OrderRecord, OrderStatus,
    ProductRecord, Result, ReviewRecord,
};

/// Core trait for storefront persistence backends.
///
/// All implementations must be thread-safe (Send + Sync). Single-row
/// operations carry no atomicity guarantees beyond the row itself;
/// [`commit_checkout`](StorefrontStore::commit_checkout) is the one
/// multi-row atomic operation.
#[async_trait]
pub trait StorefrontStore: Send + Sync {
    // -- Products --

    /// Inserts a new product.
    async fn insert_product(&self, product: &ProductRecord) -> Result<()>;

    /// Fetches a product by id. Returns None if it doesn't exist.
    async fn product(&self, id: ProductId) -> Result<Option<ProductRecord>>;

    /// Lists all products, oldest first.
    async fn list_products(&self) -> Result<Vec<ProductRecord>>;

    /// Lists products whose name contains `fragment`, case-insensitively.
    async fn search_products(&self, fragment: &str) -> Result<Vec<ProductRecord>>;

    /// Lists products still flagged as AI-generated.
    async fn list_ai_generated(&self) -> Result<Vec<ProductRecord>>;

    /// Replaces an existing product row.
    ///
    /// Fails with `NotFound` if the product doesn't exist.
    async fn update_product(&self, product: &ProductRecord) -> Result<()>;

    /// Deletes a product and any cart line items referencing it.
    ///
    /// Fails with `NotFound` if the product doesn't exist. Order rows
    /// are left untouched; they carry their own snapshot of the product.
    async fn delete_product(&self, id: ProductId) -> Result<()>;

    /// Deletes AI-generated products created before `cutoff` that were
    /// never ordered. Returns the number of products removed.
    async fn delete_stale_ai_products(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    // -- Cart --

    /// Returns the user's cart line items.
    ///
    /// An absent cart and an empty cart are the same thing; carts exist
    /// lazily from the first line item.
    async fn cart_items(&self, user: UserId) -> Result<Vec<CartItemRecord>>;

    /// Finds a line item by id within the user's cart.
    async fn find_cart_item(&self, user: UserId, item: CartItemId)
    -> Result<Option<CartItemRecord>>;

    /// Finds the user's line item for a product, if one exists.
    async fn find_cart_item_by_product(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<Option<CartItemRecord>>;

    /// Inserts the line item, or replaces the existing row with the
    /// same id.
    async fn put_cart_item(&self, user: UserId, item: &CartItemRecord) -> Result<()>;

    /// Deletes a line item. Fails with `NotFound` if it doesn't exist.
    async fn delete_cart_item(&self, user: UserId, item: CartItemId) -> Result<()>;

    // -- Checkout --

    /// Atomically applies a checkout: inserts all `orders`, decrements
    /// each ordered product's stock by the ordered quantity, and clears
    /// the user's cart. Either every write commits or none do.
    ///
    /// Each decrement is re-checked inside the commit; if any product
    /// lacks sufficient stock the whole operation fails with
    /// [`StoreError::StockConflict`](crate::StoreError::StockConflict)
    /// and nothing is applied. This is what serializes two checkouts
    /// racing for the same stock.
    async fn commit_checkout(&self, user: UserId, orders: &[OrderRecord]) -> Result<()>;

    // -- Orders --

    /// Fetches an order by id.
    async fn order(&self, id: OrderId) -> Result<Option<OrderRecord>>;

    /// Lists a user's orders, newest first.
    async fn orders_for_user(&self, user: UserId) -> Result<Vec<OrderRecord>>;

    /// Overwrites an order's status. Fails with `NotFound` if the order
    /// doesn't exist. Transition legality is the domain layer's job.
    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<()>;

    /// Counts orders for a product whose status still blocks product
    /// deletion (pending, paid, or shipped).
    async fn count_active_orders(&self, product: ProductId) -> Result<u64>;

    // -- Reviews --

    /// Inserts a review. Fails with `Duplicate` if the user already
    /// reviewed the product.
    async fn insert_review(&self, review: &ReviewRecord) -> Result<()>;

    /// Lists a product's reviews, newest first.
    async fn reviews_for_product(&self, product: ProductId) -> Result<Vec<ReviewRecord>>;

    /// Finds a user's review of a product, if any.
    async fn find_review(&self, product: ProductId, user: UserId) -> Result<Option<ReviewRecord>>;

    // -- Devices --

    /// Inserts the device registration, or, if the (user, token) pair is
    /// already registered, reactivates it and refreshes `last_used`.
    /// Returns the stored record.
    async fn upsert_device(&self, device: &DeviceRecord) -> Result<DeviceRecord>;

    /// Lists a user's registered devices.
    async fn devices_for_user(&self, user: UserId) -> Result<Vec<DeviceRecord>>;

    /// Finds a device by id within the user's registrations.
    async fn find_device(&self, user: UserId, id: DeviceId) -> Result<Option<DeviceRecord>>;

    /// Marks a device inactive. Fails with `NotFound` if it doesn't
    /// exist for this user.
    async fn deactivate_device(&self, user: UserId, id: DeviceId) -> Result<()>;

    // -- Gestures --

    /// Inserts a captured gesture sample.
    async fn insert_gesture(&self, gesture: &GestureRecord) -> Result<()>;

    /// Fetches a gesture sample by id.
    async fn gesture(&self, id: GestureId) -> Result<Option<GestureRecord>>;

    /// Lists a user's gesture samples, newest first.
    async fn gestures_for_user(&self, user: UserId) -> Result<Vec<GestureRecord>>;

    /// Replaces an existing gesture row (used after classification).
    async fn update_gesture(&self, gesture: &GestureRecord) -> Result<()>;

    /// Per-type count and mean confidence over the user's samples
    /// recorded at or after `since`.
    async fn gesture_stats_since(
        &self,
        user: UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<GestureTypeStats>>;
}
