//! Shared fixtures for the integration suites
//!
//! [`FaultyEngine`] wraps the in-memory Tantivy engine so tests can take the
//! engine down or slow searches down. [`Harness`] wires a full search module
//! over it with an in-process broker.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use webook_search::messaging::{InMemoryBroker, SyncEventProducer, SYNC_TOPIC};
use webook_search::search::{
    ConsumerError, EngineError, EngineHit, EngineQuery, IndexMapping, IndexStatus,
    MappingRegistry, SearchConfig, SearchEngine, SearchModule, SyncConfig, TantivyEngine,
    UpsertOutcome,
};

/// Engine wrapper injecting outages and slow searches
pub struct FaultyEngine {
    inner: TantivyEngine,
    down: AtomicBool,
    search_delay: Mutex<Option<Duration>>,
    pub searches_started: AtomicUsize,
    pub searches_finished: AtomicUsize,
}

impl FaultyEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: TantivyEngine::in_memory(),
            down: AtomicBool::new(false),
            search_delay: Mutex::new(None),
            searches_started: AtomicUsize::new(0),
            searches_finished: AtomicUsize::new(0),
        })
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn slow_searches(&self, delay: Duration) {
        *self.search_delay.lock() = Some(delay);
    }

    fn check(&self) -> Result<(), EngineError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(EngineError::Unavailable("injected outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchEngine for FaultyEngine {
    async fn ensure_index(&self, mapping: &IndexMapping) -> Result<IndexStatus, EngineError> {
        self.check()?;
        self.inner.ensure_index(mapping).await
    }

    async fn has_index(&self, index: &str) -> bool {
        self.inner.has_index(index).await
    }

    async fn upsert(
        &self,
        index: &str,
        doc_id: &str,
        source: &str,
    ) -> Result<UpsertOutcome, EngineError> {
        self.check()?;
        self.inner.upsert(index, doc_id, source).await
    }

    async fn get(&self, index: &str, doc_id: &str) -> Result<Option<Value>, EngineError> {
        self.inner.get(index, doc_id).await
    }

    async fn search(&self, index: &str, query: &EngineQuery) -> Result<Vec<EngineHit>, EngineError> {
        self.searches_started.fetch_add(1, Ordering::SeqCst);
        let delay = *self.search_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check()?;
        let hits = self.inner.search(index, query).await;
        self.searches_finished.fetch_add(1, Ordering::SeqCst);
        hits
    }

    async fn count(&self, index: &str) -> Result<u64, EngineError> {
        self.inner.count(index).await
    }
}

pub fn fast_sync_config() -> SyncConfig {
    SyncConfig {
        backoff_base_ms: 10,
        backoff_cap_ms: 50,
        max_subscribe_attempts: 3,
        ..Default::default()
    }
}

/// Full search module over a [`FaultyEngine`] and an in-process broker
pub struct Harness {
    pub engine: Arc<FaultyEngine>,
    pub broker: Arc<InMemoryBroker>,
    pub module: SearchModule,
    pub producer: SyncEventProducer,
    stop: watch::Sender<bool>,
    consumer: Option<JoinHandle<Result<(), ConsumerError>>>,
}

impl Harness {
    /// Bootstrapped module; the consumer is not running yet
    pub async fn new(sync: SyncConfig) -> Self {
        let engine = FaultyEngine::new();
        let broker = Arc::new(InMemoryBroker::new());
        let registry = Arc::new(MappingRegistry::embedded().unwrap());

        let module = SearchModule::with_engine(
            engine.clone(),
            registry,
            &SearchConfig::default(),
            sync,
            broker.clone(),
            broker.clone(),
        );
        module.bootstrap().await.unwrap();

        let (stop, _) = watch::channel(false);
        Self {
            producer: SyncEventProducer::new(broker.clone()),
            engine,
            broker,
            module,
            stop,
            consumer: None,
        }
    }

    /// Bootstrapped module with its consumer running
    pub async fn started() -> Self {
        let mut harness = Self::new(fast_sync_config()).await;
        harness.start_consumer();
        harness
    }

    pub fn start_consumer(&mut self) {
        let shutdown = self.stop.subscribe();
        self.consumer = Some(self.module.consumer.clone().start(shutdown));
    }

    pub async fn publish(&self, index: &str, doc_id: &str, document: Value) {
        self.producer
            .produce_document(index, doc_id, &document)
            .await
            .unwrap();
    }

    /// Wait until every published event has been settled
    pub async fn quiesce(&self, acked: u64) {
        let broker = self.broker.clone();
        wait_until(move || {
            let broker = broker.clone();
            async move { broker.acked(SYNC_TOPIC) >= acked && broker.pending(SYNC_TOPIC) == 0 }
        })
        .await;
    }

    pub async fn stop(mut self) {
        let _ = self.stop.send(true);
        if let Some(handle) = self.consumer.take() {
            handle.await.unwrap().unwrap();
        }
    }
}

/// Poll `condition` every 10ms for up to 5s
pub async fn wait_until<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..500 {
        if condition().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 5s");
}

pub fn question(id: i64, title: &str, status: &str, utime: i64) -> Value {
    json!({
        "id": id,
        "uid": 1,
        "title": title,
        "labels": ["backend"],
        "content": "",
        "status": status,
        "ctime": 1,
        "utime": utime,
    })
}

pub fn case(id: i64, title: &str, status: &str, utime: i64) -> Value {
    json!({
        "id": id,
        "uid": 1,
        "title": title,
        "labels": [],
        "content": "",
        "status": status,
        "ctime": 1,
        "utime": utime,
    })
}

pub fn skill(id: i64, name: &str, utime: i64) -> Value {
    json!({
        "id": id,
        "labels": [],
        "name": name,
        "desc": "",
        "ctime": 1,
        "utime": utime,
    })
}

pub fn question_set(id: i64, title: &str, utime: i64) -> Value {
    json!({
        "id": id,
        "uid": 1,
        "title": title,
        "description": "",
        "questions": [],
        "ctime": 1,
        "utime": utime,
    })
}
