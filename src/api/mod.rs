pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::search::{ConsumerState, IndexBootstrap, SearchModule, SearchService};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchService>,
    pub bootstrap: Arc<IndexBootstrap>,
    pub consumer: Option<watch::Receiver<ConsumerState>>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(search: Arc<SearchService>, bootstrap: Arc<IndexBootstrap>) -> Self {
        Self {
            search,
            bootstrap,
            consumer: None,
            started_at: Instant::now(),
        }
    }

    /// State over a wired search module, reporting its consumer in health checks
    pub fn from_module(module: &SearchModule) -> Self {
        Self::new(module.search.clone(), module.bootstrap.clone())
            .with_consumer(module.consumer.state())
    }

    pub fn with_consumer(mut self, consumer: watch::Receiver<ConsumerState>) -> Self {
        self.consumer = Some(consumer);
        self
    }
}
