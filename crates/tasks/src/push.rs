//! Push gateway trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::UserId;
use store::DevicePlatform;

use crate::error::TaskError;

/// A notification addressed to one device.
#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub user_id: UserId,
    pub device_token: String,
    pub platform: DevicePlatform,
    pub title: String,
    pub body: String,
}

/// Trait for delivering push notifications to a device.
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Delivers one message. Delivery is best-effort; callers log and
    /// move on when this fails.
    async fn send(&self, message: &PushMessage) -> Result<(), TaskError>;
}

#[derive(Debug, Default)]
struct InMemoryPushState {
    sent: Vec<PushMessage>,
    fail: bool,
}

/// In-memory push gateway for testing; records every message sent.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPushGateway {
    state: Arc<RwLock<InMemoryPushState>>,
}

impl InMemoryPushGateway {
    /// Creates a new in-memory push gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to fail on subsequent sends.
    pub fn set_fail(&self, fail: bool) {
        self.state.write().unwrap().fail = fail;
    }

    /// Returns all messages sent so far.
    pub fn sent(&self) -> Vec<PushMessage> {
        self.state.read().unwrap().sent.clone()
    }

    /// Returns the number of messages sent so far.
    pub fn sent_count(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }
}

#[async_trait]
impl PushGateway for InMemoryPushGateway {
    async fn send(&self, message: &PushMessage) -> Result<(), TaskError> {
        let mut state = self.state.write().unwrap();
        if state.fail {
            return Err(TaskError::PushFailed("gateway configured to fail".to_string()));
        }
        state.sent.push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(token: &str) -> PushMessage {
        PushMessage {
            user_id: UserId::new(),
            device_token: token.to_string(),
            platform: DevicePlatform::Fcm,
            title: "Hello".to_string(),
            body: "World".to_string(),
        }
    }

    #[tokio::test]
    async fn records_sent_messages() {
        let gateway = InMemoryPushGateway::new();

        gateway.send(&message("fcm:one")).await.unwrap();
        gateway.send(&message("fcm:two")).await.unwrap();

        assert_eq!(gateway.sent_count(), 2);
        assert_eq!(gateway.sent()[0].device_token, "fcm:one");
    }

    #[tokio::test]
    async fn configured_failure() {
        let gateway = InMemoryPushGateway::new();
        gateway.set_fail(true);

        let result = gateway.send(&message("fcm:one")).await;
        assert!(matches!(result, Err(TaskError::PushFailed(_))));
        assert_eq!(gateway.sent_count(), 0);
    }
}
