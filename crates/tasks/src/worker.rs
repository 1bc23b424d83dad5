//! The task worker loop and task handlers.

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{GestureId, UserId};
use store::{GesturePoint, ProductRecord, StorefrontStore};
use tokio::sync::mpsc;

use crate::error::TaskError;
use crate::generator::ListingGenerator;
use crate::push::{PushGateway, PushMessage};
use crate::queue::Task;

/// Consumes tasks sequentially. A failing task is logged and dropped;
/// the loop itself only ends when the queue closes.
pub struct TaskWorker<S, G, P> {
    store: S,
    generator: Arc<G>,
    push: Arc<P>,
    /// AI listings older than this and never ordered are removed by
    /// the cleanup task.
    stale_listing_age: Duration,
}

impl<S, G, P> TaskWorker<S, G, P>
where
    S: StorefrontStore + Clone,
    G: ListingGenerator,
    P: PushGateway,
{
    /// Creates a new worker.
    pub fn new(store: S, generator: Arc<G>, push: Arc<P>, stale_listing_age: Duration) -> Self {
        Self {
            store,
            generator,
            push,
            stale_listing_age,
        }
    }

    /// Runs until the queue closes.
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<Task>) {
        tracing::info!("task worker started");
        while let Some(task) = rx.recv().await {
            let name = task.name();
            match self.handle(task).await {
                Ok(()) => {
                    metrics::counter!("tasks_processed", "task" => name).increment(1);
                }
                Err(e) => {
                    metrics::counter!("tasks_failed", "task" => name).increment(1);
                    tracing::error!(task = name, error = %e, "task failed");
                }
            }
        }
        tracing::info!("task queue closed, worker stopping");
    }

    /// Executes one task.
    #[tracing::instrument(skip(self))]
    pub async fn handle(&self, task: Task) -> Result<(), TaskError> {
        match task {
            Task::GenerateListing { query } => self.generate_listing(&query).await,
            Task::ProcessGesture { gesture_id } => self.process_gesture(gesture_id).await,
            Task::Notify {
                user_id,
                title,
                body,
            } => self.notify(user_id, &title, &body).await,
            Task::CleanupStaleListings => self.cleanup_stale_listings().await,
        }
    }

    async fn generate_listing(&self, query: &str) -> Result<(), TaskError> {
        let listing = self.generator.generate(query).await?;

        let mut product = ProductRecord::new(
            listing.name,
            listing.description,
            listing.price,
            listing.stock,
        );
        product.is_ai_generated = true;
        product.ai_source = Some(listing.source);
        self.store.insert_product(&product).await?;

        tracing::info!(product_id = %product.id, query, "generated listing persisted");
        Ok(())
    }

    async fn process_gesture(&self, id: GestureId) -> Result<(), TaskError> {
        let mut gesture = self
            .store
            .gesture(id)
            .await?
            .ok_or(TaskError::NotFound { entity: "gesture" })?;

        if gesture.processed {
            tracing::debug!(gesture_id = %id, "gesture already processed");
            return Ok(());
        }

        let (label, confidence) = classify(&gesture.points);
        gesture.points = normalize(&gesture.points);
        gesture.gesture_type = label.to_string();
        gesture.confidence = confidence;
        gesture.processed = true;
        self.store.update_gesture(&gesture).await?;

        self.notify(
            gesture.user_id,
            "Gesture processed",
            &format!("Your gesture was classified as \"{label}\""),
        )
        .await
    }

    async fn notify(&self, user: UserId, title: &str, body: &str) -> Result<(), TaskError> {
        let devices = self.store.devices_for_user(user).await?;

        let mut delivered = 0u64;
        for device in devices.iter().filter(|d| d.active) {
            let message = PushMessage {
                user_id: user,
                device_token: device.token.clone(),
                platform: device.platform,
                title: title.to_string(),
                body: body.to_string(),
            };
            // Per-device delivery is best-effort
            match self.push.send(&message).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(device_id = %device.id, error = %e, "push delivery failed");
                }
            }
        }

        if delivered > 0 {
            metrics::counter!("notifications_delivered").increment(delivered);
        }
        tracing::debug!(user_id = %user, delivered, "notification fan-out done");
        Ok(())
    }

    async fn cleanup_stale_listings(&self) -> Result<(), TaskError> {
        let cutoff = Utc::now() - self.stale_listing_age;
        let deleted = self.store.delete_stale_ai_products(cutoff).await?;
        if deleted > 0 {
            tracing::info!(deleted, "removed stale AI listings");
        }
        Ok(())
    }
}

/// Scales points into a unit box centered on their centroid.
/// Timestamps are rebased to start at zero.
fn normalize(points: &[GesturePoint]) -> Vec<GesturePoint> {
    if points.is_empty() {
        return Vec::new();
    }

    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / n;
    let cz = points.iter().map(|p| p.z).sum::<f64>() / n;
    let t0 = points
        .iter()
        .map(|p| p.timestamp)
        .fold(f64::INFINITY, f64::min);

    let scale = points
        .iter()
        .map(|p| {
            (p.x - cx)
                .abs()
                .max((p.y - cy).abs())
                .max((p.z - cz).abs())
        })
        .fold(0.0f64, f64::max);
    let scale = if scale > 0.0 { scale } else { 1.0 };

    points
        .iter()
        .map(|p| GesturePoint {
            x: (p.x - cx) / scale,
            y: (p.y - cy) / scale,
            z: (p.z - cz) / scale,
            timestamp: p.timestamp - t0,
        })
        .collect()
}

/// Heuristic gesture classification from raw point extents.
fn classify(points: &[GesturePoint]) -> (&'static str, f64) {
    if points.len() < 2 {
        return ("tap", 1.0);
    }

    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    let dx = max_x - min_x;
    let dy = max_y - min_y;

    if dx < 0.05 && dy < 0.05 {
        return ("tap", 0.9);
    }

    let (label, dominant) = if dx >= dy {
        ("swipe_horizontal", dx)
    } else {
        ("swipe_vertical", dy)
    };
    let confidence = (dominant / (dx + dy)).clamp(0.5, 1.0);
    (label, confidence)
}
