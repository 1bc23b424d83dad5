//! Gesture sample capture and statistics.

use chrono::Utc;
use common::{GestureId, UserId};
use serde::Deserialize;
use store::{GesturePoint, GestureRecord, GestureTypeStats, StorefrontStore};

use crate::error::{DomainError, DomainResult};

/// Input for capturing a gesture sample.
#[derive(Debug, Clone, Deserialize)]
pub struct GestureCapture {
    pub gesture_type: String,
    pub points: Vec<GesturePoint>,
    /// Classifier confidence supplied by the capturing client, if any.
    #[serde(default)]
    pub confidence: f64,
}

/// Service for capturing gesture samples and reading their stats.
#[derive(Clone)]
pub struct GestureService<S> {
    store: S,
}

impl<S: StorefrontStore + Clone> GestureService<S> {
    /// Creates a new gesture service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Stores a captured sample, unprocessed.
    #[tracing::instrument(skip(self, capture))]
    pub async fn capture(&self, user: UserId, capture: GestureCapture) -> DomainResult<GestureRecord> {
        if capture.gesture_type.trim().is_empty() {
            return Err(DomainError::Validation(
                "gesture_type must not be empty".into(),
            ));
        }
        if capture.points.is_empty() {
            return Err(DomainError::Validation(
                "gesture must contain at least one point".into(),
            ));
        }
        if !(0.0..=1.0).contains(&capture.confidence) {
            return Err(DomainError::Validation(
                "confidence must be between 0 and 1".into(),
            ));
        }

        let mut gesture = GestureRecord::new(user, capture.gesture_type.trim(), capture.points);
        gesture.confidence = capture.confidence;
        self.store.insert_gesture(&gesture).await?;
        metrics::counter!("gestures_captured").increment(1);

        Ok(gesture)
    }

    /// Lists the user's samples, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, user: UserId) -> DomainResult<Vec<GestureRecord>> {
        Ok(self.store.gestures_for_user(user).await?)
    }

    /// Fetches one of the user's samples.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, user: UserId, id: GestureId) -> DomainResult<GestureRecord> {
        self.store
            .gesture(id)
            .await?
            .filter(|g| g.user_id == user)
            .ok_or(DomainError::NotFound { entity: "gesture" })
    }

    /// Per-type stats over the user's samples captured today (UTC).
    #[tracing::instrument(skip(self))]
    pub async fn stats_today(&self, user: UserId) -> DomainResult<Vec<GestureTypeStats>> {
        let midnight = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
            .and_utc();
        Ok(self.store.gesture_stats_since(user, midnight).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::InMemoryStore;

    fn point(x: f64, y: f64) -> GesturePoint {
        GesturePoint {
            x,
            y,
            z: 0.0,
            timestamp: 0.0,
        }
    }

    #[tokio::test]
    async fn capture_and_list() {
        let gestures = GestureService::new(InMemoryStore::new());
        let user = UserId::new();

        let stored = gestures
            .capture(
                user,
                GestureCapture {
                    gesture_type: "swipe".to_string(),
                    points: vec![point(0.0, 0.0), point(1.0, 1.0)],
                    confidence: 0.9,
                },
            )
            .await
            .unwrap();

        assert!(!stored.processed);
        assert_eq!(gestures.list(user).await.unwrap().len(), 1);
        assert_eq!(gestures.get(user, stored.id).await.unwrap().id, stored.id);
    }

    #[tokio::test]
    async fn empty_points_rejected() {
        let gestures = GestureService::new(InMemoryStore::new());

        let result = gestures
            .capture(
                UserId::new(),
                GestureCapture {
                    gesture_type: "swipe".to_string(),
                    points: vec![],
                    confidence: 0.5,
                },
            )
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn confidence_out_of_range_rejected() {
        let gestures = GestureService::new(InMemoryStore::new());

        let result = gestures
            .capture(
                UserId::new(),
                GestureCapture {
                    gesture_type: "swipe".to_string(),
                    points: vec![point(0.0, 0.0)],
                    confidence: 1.5,
                },
            )
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn samples_are_private_to_their_user() {
        let gestures = GestureService::new(InMemoryStore::new());
        let owner = UserId::new();

        let stored = gestures
            .capture(
                owner,
                GestureCapture {
                    gesture_type: "tap".to_string(),
                    points: vec![point(0.0, 0.0)],
                    confidence: 0.0,
                },
            )
            .await
            .unwrap();

        let result = gestures.get(UserId::new(), stored.id).await;
        assert!(matches!(
            result,
            Err(DomainError::NotFound { entity: "gesture" })
        ));
    }

    #[tokio::test]
    async fn today_stats_group_by_type() {
        let gestures = GestureService::new(InMemoryStore::new());
        let user = UserId::new();

        for (ty, conf) in [("swipe", 0.8), ("swipe", 0.4), ("tap", 1.0)] {
            gestures
                .capture(
                    user,
                    GestureCapture {
                        gesture_type: ty.to_string(),
                        points: vec![point(0.0, 0.0)],
                        confidence: conf,
                    },
                )
                .await
                .unwrap();
        }

        let stats = gestures.stats_today(user).await.unwrap();
        assert_eq!(stats.len(), 2);
        let swipe = stats.iter().find(|s| s.gesture_type == "swipe").unwrap();
        assert_eq!(swipe.count, 2);
        assert!((swipe.mean_confidence - 0.6).abs() < 1e-9);
    }
}
