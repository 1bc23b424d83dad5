//! Persistence layer for the storefront backend.
//!
//! This crate defines the record types held by the store, the
//! [`StorefrontStore`] trait every backend implements, and two
//! implementations: [`InMemoryStore`] for tests and local runs, and
//! [`PostgresStore`] backed by sqlx.
//!
//! The one multi-row operation is [`StorefrontStore::commit_checkout`],
//! which applies order inserts, stock decrements, and the cart clear as
//! a single atomic commit. Conflicting checkouts are serialized by the
//! backend; a decrement that would drive stock negative fails the whole
//! commit with [`StoreError::StockConflict`].

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use records::{
    CartItemRecord, DevicePlatform, DeviceRecord, GesturePoint, GestureRecord, GestureTypeStats,
    OrderRecord, OrderStatus, ProductRecord, ReviewRecord,
};
pub use store::StorefrontStore;
