//! Order reads and status transitions.

use common::{OrderId, UserId};
use store::{OrderRecord, OrderStatus, StorefrontStore};

use crate::error::{DomainError, DomainResult};

/// Service for order history and the status lifecycle.
#[derive(Clone)]
pub struct OrderService<S> {
    store: S,
}

impl<S: StorefrontStore + Clone> OrderService<S> {
    /// Creates a new order service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists the user's orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, user: UserId) -> DomainResult<Vec<OrderRecord>> {
        Ok(self.store.orders_for_user(user).await?)
    }

    /// Fetches one order. Orders are only visible to their owner.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, user: UserId, id: OrderId) -> DomainResult<OrderRecord> {
        let order = self
            .store
            .order(id)
            .await?
            .filter(|o| o.user_id == user)
            .ok_or(DomainError::NotFound { entity: "order" })?;

        Ok(order)
    }

    /// Moves an order to a new status, enforcing the state machine.
    #[tracing::instrument(skip(self))]
    pub async fn set_status(
        &self,
        user: UserId,
        id: OrderId,
        status: OrderStatus,
    ) -> DomainResult<OrderRecord> {
        let order = self.get(user, id).await?;

        if !order.status.can_transition_to(status) {
            return Err(DomainError::InvalidStatusTransition {
                from: order.status,
                to: status,
            });
        }

        self.store.update_order_status(id, status).await?;
        metrics::counter!("order_status_transitions").increment(1);
        tracing::info!(order_id = %id, from = %order.status, to = %status, "order status changed");

        self.get(user, id).await
    }
}
