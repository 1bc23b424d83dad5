//! Background tasks for the storefront.
//!
//! Work that should not block a request (AI listing generation,
//! gesture processing, notification fan-out, stale-listing cleanup) is
//! published as a [`Task`] onto an in-process queue. Publication is
//! fire-and-forget; the [`TaskWorker`] consumes tasks sequentially,
//! logs failures, and never stops on them.

pub mod error;
pub mod generator;
pub mod push;
pub mod queue;
pub mod worker;

pub use error::TaskError;
pub use generator::{GeneratedListing, ListingGenerator, TemplateListingGenerator};
pub use push::{InMemoryPushGateway, PushGateway, PushMessage};
pub use queue::{Task, TaskPublisher, task_channel};
pub use worker::TaskWorker;
