//! Shared types for the storefront backend.
//!
//! Every entity gets its own UUID-backed identifier type so that a
//! `ProductId` can never be passed where an `OrderId` is expected.
//! Monetary amounts are integer cents ([`Money`]) to avoid floating
//! point rounding in totals.

pub mod ids;
pub mod money;

pub use ids::{CartItemId, DeviceId, GestureId, OrderId, ProductId, ReviewId, UserId};
pub use money::Money;
