//! Task definitions and the fire-and-forget publisher.

use common::{GestureId, UserId};
use tokio::sync::mpsc;

/// One unit of background work.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// Generate and persist an AI product listing for a search query
    /// that matched nothing.
    GenerateListing { query: String },

    /// Normalize, classify, and mark a captured gesture sample, then
    /// notify the owner's devices.
    ProcessGesture { gesture_id: GestureId },

    /// Fan a notification out to a user's active devices.
    Notify {
        user_id: UserId,
        title: String,
        body: String,
    },

    /// Delete old AI-generated listings that were never ordered.
    CleanupStaleListings,
}

impl Task {
    /// Short name used in logs and metrics labels.
    pub fn name(&self) -> &'static str {
        match self {
            Task::GenerateListing { .. } => "generate_listing",
            Task::ProcessGesture { .. } => "process_gesture",
            Task::Notify { .. } => "notify",
            Task::CleanupStaleListings => "cleanup_stale_listings",
        }
    }
}

/// Publishes tasks onto the queue.
///
/// Publishing never blocks and never fails the caller: if the worker
/// is gone the task is dropped with a warning. Request handlers treat
/// background work as strictly best-effort.
#[derive(Debug, Clone)]
pub struct TaskPublisher {
    tx: mpsc::UnboundedSender<Task>,
}

impl TaskPublisher {
    /// Publishes a task, fire-and-forget.
    pub fn publish(&self, task: Task) {
        let name = task.name();
        if self.tx.send(task).is_err() {
            tracing::warn!(task = name, "task queue closed, dropping task");
            return;
        }
        metrics::counter!("tasks_published", "task" => name).increment(1);
    }
}

/// Creates the queue, returning the publisher and the receiver the
/// worker consumes from.
pub fn task_channel() -> (TaskPublisher, mpsc::UnboundedReceiver<Task>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (TaskPublisher { tx }, rx)
}
