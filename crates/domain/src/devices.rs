//! Push-notification device registry.

use common::{DeviceId, UserId};
use store::{DevicePlatform, DeviceRecord, StorefrontStore};

use crate::error::{DomainError, DomainResult};

/// Service for registering and managing device tokens.
#[derive(Clone)]
pub struct DeviceService<S> {
    store: S,
}

impl<S: StorefrontStore + Clone> DeviceService<S> {
    /// Creates a new device service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a device token for push notifications.
    ///
    /// Tokens are unique per user: re-registering an existing token
    /// reactivates it and refreshes its last-used timestamp instead of
    /// creating a second row.
    #[tracing::instrument(skip(self, token))]
    pub async fn register(
        &self,
        user: UserId,
        token: String,
        platform: DevicePlatform,
    ) -> DomainResult<DeviceRecord> {
        let token = token.trim().to_string();
        if !token.starts_with(platform.token_prefix()) || token.len() <= platform.token_prefix().len()
        {
            return Err(DomainError::Validation(format!(
                "{platform} token must start with '{}'",
                platform.token_prefix()
            )));
        }

        let device = DeviceRecord::new(user, token, platform);
        let stored = self.store.upsert_device(&device).await?;
        metrics::counter!("devices_registered").increment(1);

        Ok(stored)
    }

    /// Lists the user's registered devices.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, user: UserId) -> DomainResult<Vec<DeviceRecord>> {
        Ok(self.store.devices_for_user(user).await?)
    }

    /// Fetches one of the user's devices.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, user: UserId, id: DeviceId) -> DomainResult<DeviceRecord> {
        self.store
            .find_device(user, id)
            .await?
            .ok_or(DomainError::NotFound { entity: "device" })
    }

    /// Deactivates a device so it no longer receives notifications.
    /// The row is kept for auditability.
    #[tracing::instrument(skip(self))]
    pub async fn deactivate(&self, user: UserId, id: DeviceId) -> DomainResult<()> {
        self.store.deactivate_device(user, id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::InMemoryStore;

    #[tokio::test]
    async fn register_validates_platform_prefix() {
        let devices = DeviceService::new(InMemoryStore::new());
        let user = UserId::new();

        // Wrong prefix for the platform
        let result = devices
            .register(user, "apn:token1".to_string(), DevicePlatform::Fcm)
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));

        // Prefix alone is not a token
        let result = devices
            .register(user, "fcm:".to_string(), DevicePlatform::Fcm)
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));

        let device = devices
            .register(user, "fcm:token1".to_string(), DevicePlatform::Fcm)
            .await
            .unwrap();
        assert!(device.active);
    }

    #[tokio::test]
    async fn re_register_reactivates_same_row() {
        let devices = DeviceService::new(InMemoryStore::new());
        let user = UserId::new();

        let first = devices
            .register(user, "apn:token1".to_string(), DevicePlatform::Apns)
            .await
            .unwrap();
        devices.deactivate(user, first.id).await.unwrap();
        assert!(!devices.get(user, first.id).await.unwrap().active);

        let second = devices
            .register(user, "apn:token1".to_string(), DevicePlatform::Apns)
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert!(second.active);
        assert_eq!(devices.list(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deactivate_missing_device_is_not_found() {
        let devices = DeviceService::new(InMemoryStore::new());

        let result = devices.deactivate(UserId::new(), DeviceId::new()).await;
        assert!(matches!(
            result,
            Err(DomainError::NotFound { entity: "device" })
        ));
    }
}
