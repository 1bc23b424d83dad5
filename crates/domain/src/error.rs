//! Domain error types.

use common::ProductId;
use store::{OrderStatus, StoreError};
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed or out-of-range input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The referenced entity does not exist (or is not visible to the
    /// caller).
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// A requested quantity exceeds the product's available stock.
    /// Retryable: the caller can resubmit with a smaller quantity.
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Checkout was attempted on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The order status state machine forbids this transition.
    #[error("Cannot transition order from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// The user already reviewed this product.
    #[error("User has already reviewed this product")]
    DuplicateReview,

    /// The product still has orders in an active status.
    #[error("Product has {active_orders} active order(s) and cannot be deleted")]
    ProductHasActiveOrders { active_orders: u64 },

    /// The product is not AI-generated, so it cannot be approved.
    #[error("Product is not AI-generated")]
    NotAiGenerated,

    /// A store failure the domain cannot recover from.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::StockConflict {
                product_id,
                requested,
                available,
            } => DomainError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            StoreError::NotFound { entity } => DomainError::NotFound { entity },
            StoreError::Duplicate { entity: "review" } => DomainError::DuplicateReview,
            other => DomainError::Store(other),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
