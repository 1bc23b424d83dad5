//! Shared application state and default wiring.

use std::sync::Arc;

use domain::{
    CartService, CatalogService, CheckoutService, DeviceService, GestureService, OrderService,
    ReviewService,
};
use store::StorefrontStore;
use tasks::{
    InMemoryPushGateway, ListingGenerator, Task, TaskPublisher, TaskWorker,
    TemplateListingGenerator, task_channel,
};
use tokio::sync::mpsc;

use crate::config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S: StorefrontStore> {
    pub catalog: CatalogService<S>,
    pub cart: CartService<S>,
    pub checkout: CheckoutService<S>,
    pub orders: OrderService<S>,
    pub reviews: ReviewService<S>,
    pub devices: DeviceService<S>,
    pub gestures: GestureService<S>,
    /// Queue handle for publishing background work.
    pub tasks: TaskPublisher,
    /// Generator used by the synchronous search fallback.
    pub generator: Arc<dyn ListingGenerator>,
    /// How long the search fallback waits for the generator.
    pub ai_generation_timeout: std::time::Duration,
}

/// Creates the application state with the default generator and push
/// gateway, plus the worker that drains the task queue.
pub fn create_default_state<S: StorefrontStore + Clone + 'static>(
    store: S,
    config: &Config,
) -> (
    Arc<AppState<S>>,
    TaskWorker<S, TemplateListingGenerator, InMemoryPushGateway>,
    mpsc::UnboundedReceiver<Task>,
) {
    let generator = Arc::new(TemplateListingGenerator::new());
    let push = Arc::new(InMemoryPushGateway::new());
    let (publisher, rx) = task_channel();

    let worker = TaskWorker::new(
        store.clone(),
        generator.clone(),
        push,
        config.stale_listing_max_age(),
    );

    let state = Arc::new(AppState {
        catalog: CatalogService::new(store.clone()),
        cart: CartService::new(store.clone()),
        checkout: CheckoutService::new(store.clone()),
        orders: OrderService::new(store.clone()),
        reviews: ReviewService::new(store.clone()),
        devices: DeviceService::new(store.clone()),
        gestures: GestureService::new(store),
        tasks: publisher,
        generator,
        ai_generation_timeout: config.ai_generation_timeout(),
    });

    (state, worker, rx)
}
