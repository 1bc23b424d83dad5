//! HTTP route handlers.

pub mod cart;
pub mod devices;
pub mod gestures;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;
