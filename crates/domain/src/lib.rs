//! Business services for the storefront.
//!
//! Each service wraps a [`store::StorefrontStore`] and enforces the rules the
//! store itself does not: input validation, the order status state machine,
//! cart arithmetic, and the all-or-nothing checkout. Services are cheap to
//! clone and generic over the store backend so the same code runs against
//! the in-memory store in tests and PostgreSQL in production.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod devices;
pub mod error;
pub mod gestures;
pub mod orders;
pub mod reviews;

pub use cart::{CartLine, CartService, CartView};
pub use catalog::{CatalogService, NewProduct, ProductPatch, ProductView};
pub use checkout::{CheckoutReceipt, CheckoutService};
pub use devices::DeviceService;
pub use error::{DomainError, DomainResult};
pub use gestures::{GestureCapture, GestureService};
pub use orders::OrderService;
pub use reviews::ReviewService;
