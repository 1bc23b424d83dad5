//! Record types persisted by the store.

use chrono::{DateTime, Utc};
use common::{CartItemId, DeviceId, GestureId, Money, OrderId, ProductId, ReviewId, UserId};
use serde::{Deserialize, Serialize};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Unit price. Never negative.
    pub price: Money,
    /// Available inventory count. Never negative.
    pub stock: u32,
    /// True while the listing was produced by the AI generator and has
    /// not been approved into the regular catalog.
    pub is_ai_generated: bool,
    /// Label of the generator that produced the listing, if any.
    pub ai_source: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Creates a new product with generated id and current timestamps.
    pub fn new(name: impl Into<String>, description: impl Into<String>, price: Money, stock: u32) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::new(),
            name: name.into(),
            description: description.into(),
            price,
            stock,
            is_ai_generated: false,
            ai_source: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One line item within a user's cart.
///
/// At most one line item exists per (cart, product) pair; repeated adds
/// increment the quantity instead of inserting a second row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemRecord {
    pub id: CartItemId,
    pub product_id: ProductId,
    /// Always >= 1; a line item that would drop to zero is deleted.
    pub quantity: u32,
}

impl CartItemRecord {
    /// Creates a new line item with a generated id.
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            id: CartItemId::new(),
            product_id,
            quantity,
        }
    }
}

/// The status of an order in its lifecycle.
///
/// Status transitions:
/// ```text
/// Pending ──► Paid ──► Shipped ──► Delivered
///    │          │
///    └──────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order was created at checkout, awaiting payment.
    #[default]
    Pending,

    /// Payment confirmed.
    Paid,

    /// Order has left the warehouse.
    Shipped,

    /// Order reached the customer (terminal).
    Delivered,

    /// Order was cancelled before shipping (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the transition to `next` is allowed.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid)
                | (Pending, Cancelled)
                | (Paid, Shipped)
                | (Paid, Cancelled)
                | (Shipped, Delivered)
        )
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns true if the order still blocks deletion of its product.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Paid | OrderStatus::Shipped
        )
    }

    /// Returns the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Parses a status from its stored name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "paid" => Some(OrderStatus::Paid),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An order created at checkout from a cart line item snapshot.
///
/// Immutable once created except for the status field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub user_id: UserId,
    pub product_id: ProductId,
    /// Product name at time of order, kept for display even if the
    /// product is later renamed or deleted.
    pub product_name: String,
    pub quantity: u32,
    /// Unit price frozen at checkout time, decoupled from later price
    /// changes on the product.
    pub unit_price: Money,
    /// Always `unit_price * quantity`.
    pub total_price: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRecord {
    /// Creates a pending order snapshotting the product's current name
    /// and unit price.
    pub fn new(
        user_id: UserId,
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            user_id,
            product_id,
            product_name: product_name.into(),
            quantity,
            unit_price,
            total_price: unit_price.multiply(quantity),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A product review. One per (product, user) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    /// 1 through 5 inclusive.
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl ReviewRecord {
    /// Creates a new review with a generated id and current timestamp.
    pub fn new(
        product_id: ProductId,
        user_id: UserId,
        rating: u8,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            id: ReviewId::new(),
            product_id,
            user_id,
            rating,
            comment: comment.into(),
            created_at: Utc::now(),
        }
    }
}

/// Push platform a device token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePlatform {
    Fcm,
    Apns,
}

impl DevicePlatform {
    /// Required token prefix for this platform.
    pub fn token_prefix(&self) -> &'static str {
        match self {
            DevicePlatform::Fcm => "fcm:",
            DevicePlatform::Apns => "apn:",
        }
    }

    /// Returns the platform name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            DevicePlatform::Fcm => "fcm",
            DevicePlatform::Apns => "apns",
        }
    }

    /// Parses a platform from its stored name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fcm" => Some(DevicePlatform::Fcm),
            "apns" => Some(DevicePlatform::Apns),
            _ => None,
        }
    }
}

impl std::fmt::Display for DevicePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registered push-notification device token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: DeviceId,
    pub user_id: UserId,
    pub token: String,
    pub platform: DevicePlatform,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

impl DeviceRecord {
    /// Creates an active device registration.
    pub fn new(user_id: UserId, token: impl Into<String>, platform: DevicePlatform) -> Self {
        let now = Utc::now();
        Self {
            id: DeviceId::new(),
            user_id,
            token: token.into(),
            platform,
            active: true,
            created_at: now,
            last_used: now,
        }
    }
}

/// One sampled point of a captured gesture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GesturePoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Seconds since the start of the capture.
    pub timestamp: f64,
}

/// A captured gesture sample awaiting or past classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureRecord {
    pub id: GestureId,
    pub user_id: UserId,
    pub gesture_type: String,
    pub points: Vec<GesturePoint>,
    /// Classifier confidence in [0, 1].
    pub confidence: f64,
    pub processed: bool,
    pub recorded_at: DateTime<Utc>,
}

impl GestureRecord {
    /// Creates an unprocessed gesture capture with zero confidence.
    pub fn new(user_id: UserId, gesture_type: impl Into<String>, points: Vec<GesturePoint>) -> Self {
        Self {
            id: GestureId::new(),
            user_id,
            gesture_type: gesture_type.into(),
            points,
            confidence: 0.0,
            processed: false,
            recorded_at: Utc::now(),
        }
    }
}

/// Aggregated per-type gesture statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GestureTypeStats {
    pub gesture_type: String,
    pub count: u64,
    pub mean_confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn pending_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn paid_transitions() {
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn shipped_cannot_cancel() {
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn terminal_statuses_have_no_transitions() {
        for next in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert!(!OrderStatus::Delivered.can_transition_to(next));
            assert!(!OrderStatus::Cancelled.can_transition_to(next));
        }
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn active_statuses_block_product_deletion() {
        assert!(OrderStatus::Pending.is_active());
        assert!(OrderStatus::Paid.is_active());
        assert!(OrderStatus::Shipped.is_active());
        assert!(!OrderStatus::Delivered.is_active());
        assert!(!OrderStatus::Cancelled.is_active());
    }

    #[test]
    fn status_name_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("refunded"), None);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&OrderStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }

    #[test]
    fn platform_name_roundtrip() {
        assert_eq!(DevicePlatform::parse("fcm"), Some(DevicePlatform::Fcm));
        assert_eq!(DevicePlatform::parse("apns"), Some(DevicePlatform::Apns));
        assert_eq!(DevicePlatform::parse("web"), None);
    }

    #[test]
    fn new_product_has_fresh_timestamps() {
        let product = ProductRecord::new("Widget", "A widget", Money::from_cents(1000), 5);
        assert_eq!(product.created_at, product.updated_at);
        assert!(!product.is_ai_generated);
    }
}
